//! Pipeline configuration - every tuning knob in one place.
//!
//! The thresholds were empirically tuned on the production query corpus;
//! they are plain fields here so tests can pin them and operators can
//! override them without rebuilding.

use serde::{Deserialize, Serialize};

/// Minimum confidence to dispatch a generic intent to its handler.
pub const CONFIDENCE_FLOOR: u8 = 20;

/// Minimum confidence for intents on the critical allowlist (inventory
/// codes, warranty dates, financial totals). Below this the query goes to
/// the fallback chain instead of a possibly-wrong precise answer.
pub const CRITICAL_CONFIDENCE_FLOOR: u8 = 50;

/// Minimum cosine similarity for the semantic tier to accept a match.
pub const SEMANTIC_SIMILARITY_FLOOR: f32 = 0.8;

/// Score a rule-scored intent must reach before it beats the help fallback.
pub const RULE_SCORE_FLOOR: u8 = 20;

/// Points granted per matching compiled pattern during rule scoring.
pub const PATTERN_POINTS: u8 = 10;

/// Points granted per matching keyword during rule scoring.
pub const KEYWORD_POINTS: u8 = 5;

/// Points granted per keyword within fuzzy distance of a query token.
pub const FUZZY_POINTS: u8 = 3;

/// Points granted per matching phrase boost during rule scoring.
pub const BOOST_POINTS: u8 = 15;

/// Configuration injected into the pipeline at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Confidence floor for generic intents.
    pub confidence_floor: u8,
    /// Confidence floor for critical intents.
    pub critical_confidence_floor: u8,
    /// Cosine similarity floor for the semantic tier.
    pub semantic_floor: f32,
    /// Maximum Levenshtein distance for fuzzy keyword matching.
    pub fuzzy_max_distance: usize,
    /// Bounded timeout for embedding / language model HTTP calls.
    pub service_timeout_secs: u64,
    /// How many records the retrieval step hands to the language model.
    pub retrieval_top_k: usize,
    /// TTL for cached reference lists, in seconds.
    pub reference_cache_ttl_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_floor: CONFIDENCE_FLOOR,
            critical_confidence_floor: CRITICAL_CONFIDENCE_FLOOR,
            semantic_floor: SEMANTIC_SIMILARITY_FLOOR,
            fuzzy_max_distance: 2,
            service_timeout_secs: 10,
            retrieval_top_k: 5,
            reference_cache_ttl_secs: 300,
        }
    }
}
