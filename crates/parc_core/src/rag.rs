//! Retrieval-augmented language model responder - last informative rung of
//! the fallback chain.
//!
//! Retrieval is deterministic keyword scoring over one-line record
//! summaries; the language model only ever sees those records and must
//! produce a non-empty answer grounded in them. The service is optional
//! and every failure path degrades to the static help text.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use crate::store::DataStore;

/// Language model contract: answer a query given retrieved context lines.
pub trait LanguageModelService: Send + Sync {
    fn answer(&self, query: &str, context: &[String]) -> Result<String, LlmError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("request timeout after {0} seconds")]
    Timeout(u64),

    #[error("language model returned an empty answer")]
    EmptyAnswer,
}

/// Deterministic top-k retrieval: score summaries by shared tokens with the
/// normalized query (tokens of 3+ characters), stable order on ties.
pub fn retrieve_top_k(normalized_query: &str, summaries: &[String], k: usize) -> Vec<String> {
    let query_tokens: Vec<&str> = normalized_query
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .filter(|t| t.len() >= 3)
        .collect();
    if query_tokens.is_empty() || k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(usize, usize)> = summaries
        .iter()
        .enumerate()
        .map(|(idx, summary)| {
            let folded = crate::normalize::normalize(summary);
            let score = query_tokens.iter().filter(|t| folded.contains(*t)).count();
            (idx, score)
        })
        .filter(|(_, score)| *score > 0)
        .collect();

    // Highest score first; original order breaks ties deterministically.
    scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    scored
        .into_iter()
        .take(k)
        .map(|(idx, _)| summaries[idx].clone())
        .collect()
}

/// Full retrieval + answer + validation. `None` means the chain should
/// fall through to static help.
pub fn grounded_answer(
    llm: &dyn LanguageModelService,
    raw_query: &str,
    normalized_query: &str,
    store: &dyn DataStore,
    top_k: usize,
) -> Option<String> {
    let summaries = match store.summaries() {
        Ok(s) => s,
        Err(e) => {
            warn!("retrieval skipped, store fault: {}", e);
            return None;
        }
    };

    let context = retrieve_top_k(normalized_query, &summaries, top_k);
    if context.is_empty() {
        return None;
    }

    match llm.answer(raw_query, &context) {
        Ok(answer) => {
            let trimmed = answer.trim();
            if trimmed.is_empty() {
                warn!("language model returned empty answer");
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Err(e) => {
            warn!("language model unavailable, degrading: {}", e);
            None
        }
    }
}

/// HTTP language model client (Ollama-style `/api/generate`) with a bounded
/// timeout so an unresponsive service cannot hang the request thread.
pub struct HttpLanguageModel {
    endpoint: String,
    model: String,
    timeout_secs: u64,
    client: reqwest::blocking::Client,
}

impl HttpLanguageModel {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, LlmError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LlmError::Http(e.to_string()))?;
        Ok(Self {
            endpoint: endpoint.into(),
            model: model.into(),
            timeout_secs,
            client,
        })
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl LanguageModelService for HttpLanguageModel {
    fn answer(&self, query: &str, context: &[String]) -> Result<String, LlmError> {
        let prompt = format!(
            "Tu es un assistant d'inventaire. Réponds uniquement à partir des \
             enregistrements ci-dessous, en une ou deux phrases.\n\n\
             Enregistrements :\n{}\n\nQuestion : {}\nRéponse :",
            context.join("\n"),
            query
        );

        let url = format!("{}/api/generate", self.endpoint.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.timeout_secs)
                } else {
                    LlmError::Http(e.to_string())
                }
            })?;

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        if parsed.response.trim().is_empty() {
            return Err(LlmError::EmptyAnswer);
        }
        Ok(parsed.response)
    }
}
