//! Classifier / arbiter - orchestrates every matching tier in strict
//! priority order and produces exactly one `ClassificationResult`.
//!
//! Tier order, each stage short-circuiting on a confident result:
//! 1. phrase boosts        (fixed weight >= 90)
//! 2. early-override guards
//! 3. category detectors + sub-classifiers
//! 4. semantic similarity  (only when an embedding service is configured)
//! 5. weighted rule scoring, falling back to the help intent
//!
//! Classification never fails: unclassifiable input degrades to `help`
//! with a sub-floor confidence.

use tracing::debug;

use crate::categories::{run_categories, CATEGORY_CONFIDENCE};
use crate::config::{
    PipelineConfig, BOOST_POINTS, FUZZY_POINTS, KEYWORD_POINTS, PATTERN_POINTS, RULE_SCORE_FLOOR,
};
use crate::entities::EntityMap;
use crate::fuzzy::keyword_fuzzy_matches;
use crate::guards::run_guards;
use crate::intent::{ClassificationResult, Intent, Tier};
use crate::rules::RulePatternTable;
use crate::semantic::SemanticMatcher;

pub struct Classifier {
    table: RulePatternTable,
    semantic: Option<SemanticMatcher>,
    config: PipelineConfig,
}

impl Classifier {
    pub fn new(table: RulePatternTable, semantic: Option<SemanticMatcher>, config: PipelineConfig) -> Self {
        Self {
            table,
            semantic,
            config,
        }
    }

    pub fn table(&self) -> &RulePatternTable {
        &self.table
    }

    /// Classify normalized text with its extracted entities.
    /// `raw` is carried through for the result and the handlers.
    pub fn classify(&self, raw: &str, text: &str, entities: &EntityMap) -> ClassificationResult {
        if text.is_empty() {
            return ClassificationResult::new(
                Intent::Help,
                0,
                Tier::RuleScore,
                "help_fallback",
                entities.clone(),
                raw,
            );
        }

        // Tier 1: phrase boosts.
        if let Some(boost) = self.table.matching_boost(text) {
            debug!("phrase boost hit: {} at {}", boost.intent, boost.weight);
            return ClassificationResult::new(
                boost.intent,
                boost.weight,
                Tier::PhraseBoost,
                "phrase_boost",
                entities.clone(),
                raw,
            );
        }

        // Tier 2: early-override guards.
        if let Some(hit) = run_guards(text, entities) {
            debug!("guard hit: {} ({})", hit.intent, hit.reason);
            return ClassificationResult::new(
                hit.intent,
                hit.confidence,
                Tier::EarlyOverride,
                format!("early_override:{}", hit.reason),
                entities.clone(),
                raw,
            );
        }

        // Tier 3: category detectors.
        if let Some(hit) = run_categories(text, entities) {
            debug!("category hit: {} ({})", hit.intent, hit.category);
            return ClassificationResult::new(
                hit.intent,
                CATEGORY_CONFIDENCE,
                Tier::RuleScore,
                format!("category:{}", hit.category),
                entities.clone(),
                raw,
            );
        }

        // Tier 4: semantic similarity.
        if let Some(matcher) = &self.semantic {
            if let Some((intent, sim)) = matcher.best_match(text, self.config.semantic_floor) {
                let confidence = (sim * 100.0).round().clamp(0.0, 100.0) as u8;
                debug!("semantic hit: {} at {:.2}", intent, sim);
                return ClassificationResult::new(
                    intent,
                    confidence,
                    Tier::Semantic,
                    "semantic",
                    entities.clone(),
                    raw,
                );
            }
        }

        // Tier 5: weighted rule scoring.
        let (intent, with_fuzzy, without_fuzzy) = self.score_rules(text);
        match decide_rule_tier(with_fuzzy, without_fuzzy, RULE_SCORE_FLOOR) {
            Some(tier) => {
                debug!("rule scoring: {} at {} ({})", intent, with_fuzzy, tier);
                ClassificationResult::new(
                    intent,
                    clamp_confidence(with_fuzzy),
                    tier,
                    tier.to_string(),
                    entities.clone(),
                    raw,
                )
            }
            None => ClassificationResult::new(
                Intent::Help,
                clamp_confidence(with_fuzzy),
                Tier::RuleScore,
                "help_fallback",
                entities.clone(),
                raw,
            ),
        }
    }

    /// Score every intent; return the arg-max (declaration order breaks
    /// ties) with its score including and excluding fuzzy contributions.
    fn score_rules(&self, text: &str) -> (Intent, u32, u32) {
        let tokens: Vec<&str> = text
            .split(|c: char| !c.is_alphanumeric() && c != '-')
            .filter(|t| !t.is_empty())
            .collect();

        let mut best: Option<(Intent, u32, u32)> = None;
        for rule in self.table.rules() {
            let mut score: u32 = 0;
            let mut fuzzy: u32 = 0;

            for pattern in &rule.patterns {
                if pattern.is_match(text) {
                    score += PATTERN_POINTS as u32;
                }
            }
            for keyword in &rule.keywords {
                if keyword_contained(text, &tokens, keyword) {
                    score += KEYWORD_POINTS as u32;
                } else if keyword_fuzzy_matches(keyword, &tokens, self.config.fuzzy_max_distance) {
                    fuzzy += FUZZY_POINTS as u32;
                }
            }
            if self.table.boost_matches_intent(rule.intent, text) {
                score += BOOST_POINTS as u32;
            }

            let total = score + fuzzy;
            // Strictly greater: earlier declaration wins ties.
            if best.map_or(true, |(_, b, _)| total > b) {
                best = Some((rule.intent, total, score));
            }
        }

        best.unwrap_or((Intent::Help, 0, 0))
    }
}

/// Keywords of 4+ characters match as substrings ("commande" inside
/// "commandes"); shorter ones must match a whole token so "dh" never fires
/// inside "dhimmi" or "ice" inside "service".
fn keyword_contained(text: &str, tokens: &[&str], keyword: &str) -> bool {
    if keyword.chars().count() >= 4 {
        text.contains(keyword)
    } else {
        tokens.contains(&keyword)
    }
}

/// Rule-scoring verdict: `None` below the floor, otherwise the tier -
/// `FuzzyRule` when fuzzy points were what pushed the score over.
fn decide_rule_tier(with_fuzzy: u32, without_fuzzy: u32, floor: u8) -> Option<Tier> {
    if with_fuzzy < floor as u32 {
        return None;
    }
    if without_fuzzy < floor as u32 {
        Some(Tier::FuzzyRule)
    } else {
        Some(Tier::RuleScore)
    }
}

fn clamp_confidence(score: u32) -> u8 {
    score.min(100) as u8
}
