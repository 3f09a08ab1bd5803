//! Semantic tier - embedding similarity against example utterances.
//!
//! The embedding service is optional. When it is absent or a call fails,
//! the tier is skipped and classification degrades to rule-based operation;
//! no error ever escapes this module.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use crate::intent::Intent;

/// Embedding backend contract. Absence degrades the classifier; failure is
/// never fatal.
pub trait EmbeddingService: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("request timeout after {0} seconds")]
    Timeout(u64),
}

/// Cosine similarity between two vectors. Zero for mismatched or empty input.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na * nb)
}

/// One example utterance with its pre-computed embedding.
struct IntentTemplate {
    intent: Intent,
    embedding: Vec<f32>,
}

/// Matches queries against per-intent example utterances embedded once at
/// construction.
pub struct SemanticMatcher {
    service: Box<dyn EmbeddingService>,
    templates: Vec<IntentTemplate>,
}

impl SemanticMatcher {
    /// Embed the example utterances. Examples whose embedding fails are
    /// dropped with a warning; an empty template set disables the tier.
    pub fn new(service: Box<dyn EmbeddingService>) -> Self {
        let mut templates = Vec::new();
        for (intent, examples) in example_utterances() {
            for example in examples {
                match service.encode(example) {
                    Ok(embedding) => templates.push(IntentTemplate { intent, embedding }),
                    Err(e) => warn!("embedding example {:?} failed: {}", example, e),
                }
            }
        }
        Self { service, templates }
    }

    /// Best intent above the similarity floor, if any.
    pub fn best_match(&self, text: &str, floor: f32) -> Option<(Intent, f32)> {
        if self.templates.is_empty() {
            return None;
        }
        let query = match self.service.encode(text) {
            Ok(v) => v,
            Err(e) => {
                warn!("embedding query failed, skipping semantic tier: {}", e);
                return None;
            }
        };

        let mut best: Option<(Intent, f32)> = None;
        for t in &self.templates {
            let sim = cosine_similarity(&query, &t.embedding);
            if best.map_or(true, |(_, b)| sim > b) {
                best = Some((t.intent, sim));
            }
        }
        best.filter(|(_, sim)| *sim >= floor)
    }
}

/// Example utterances per intent, in catalogue order. Kept short: the
/// semantic tier only backstops queries the deterministic tiers missed.
fn example_utterances() -> Vec<(Intent, &'static [&'static str])> {
    vec![
        (
            Intent::ListeFournisseurs,
            &["quels sont nos fournisseurs", "avec qui travaillons nous"],
        ),
        (
            Intent::ListeMateriel,
            &["qu'est ce qu'on a comme equipement", "montre moi le parc informatique"],
        ),
        (
            Intent::MaterielEnPanne,
            &["qu'est ce qui ne marche plus", "quels appareils sont casses"],
        ),
        (
            Intent::CountPendingCommands,
            &["combien de bons de commande ne sont pas encore traites"],
        ),
        (
            Intent::MontantCommandes,
            &["combien avons nous depense en achats", "quel budget est parti en commandes"],
        ),
        (
            Intent::LivraisonsEnRetard,
            &["quelles receptions n'arrivent pas", "qu'est ce qui traine a la livraison"],
        ),
        (
            Intent::StatsGlobales,
            &["donne moi une vue d'ensemble", "fais le point sur le parc"],
        ),
        (
            Intent::Help,
            &["je ne sais pas quoi demander", "a quoi sers tu"],
        ),
    ]
}

/// HTTP embedding client (Ollama-style `/api/embeddings`) with a bounded
/// timeout so an unresponsive service degrades to the rule-based path.
pub struct HttpEmbeddingService {
    endpoint: String,
    model: String,
    timeout_secs: u64,
    client: reqwest::blocking::Client,
}

impl HttpEmbeddingService {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, timeout_secs: u64) -> Result<Self, EmbeddingError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::Http(e.to_string()))?;
        Ok(Self {
            endpoint: endpoint.into(),
            model: model.into(),
            timeout_secs,
            client,
        })
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl EmbeddingService for HttpEmbeddingService {
    fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{}/api/embeddings", self.endpoint.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&EmbeddingRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout(self.timeout_secs)
                } else {
                    EmbeddingError::Http(e.to_string())
                }
            })?;

        let parsed: EmbeddingResponse = response
            .json()
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;
        if parsed.embedding.is_empty() {
            return Err(EmbeddingError::InvalidResponse("empty embedding".to_string()));
        }
        Ok(parsed.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic fake: embeds text as normalized token-hash buckets so
    /// similar wording lands close together.
    pub struct FakeEmbedding;

    impl EmbeddingService for FakeEmbedding {
        fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            let mut v = vec![0.0f32; 64];
            for token in text.split_whitespace() {
                let mut h: u32 = 2166136261;
                for b in token.bytes() {
                    h ^= b as u32;
                    h = h.wrapping_mul(16777619);
                }
                v[(h % 64) as usize] += 1.0;
            }
            Ok(v)
        }
    }

    /// Always-failing service: the tier must degrade, never error.
    struct BrokenEmbedding;

    impl EmbeddingService for BrokenEmbedding {
        fn encode(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::Http("connection refused".to_string()))
        }
    }

    #[test]
    fn test_cosine_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_identical_utterance_matches() {
        let matcher = SemanticMatcher::new(Box::new(FakeEmbedding));
        let hit = matcher.best_match("quels sont nos fournisseurs", 0.8);
        assert_eq!(hit.map(|(i, _)| i), Some(Intent::ListeFournisseurs));
    }

    #[test]
    fn test_unrelated_text_below_floor() {
        let matcher = SemanticMatcher::new(Box::new(FakeEmbedding));
        assert!(matcher.best_match("xyzzy frobnicate wibble", 0.8).is_none());
    }

    #[test]
    fn test_broken_service_degrades_silently() {
        let matcher = SemanticMatcher::new(Box::new(BrokenEmbedding));
        assert!(matcher.best_match("liste des fournisseurs", 0.8).is_none());
    }
}
