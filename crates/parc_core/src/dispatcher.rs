//! Dispatcher - routes a classification to its handler and manages the
//! fallback chain.
//!
//! Four terminal outcomes per request: early-override hit, handler
//! success, handler failure -> fallback, low confidence -> fallback. Every
//! terminal state returns the same envelope shape; no state propagates an
//! error or a panic to the caller.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::entities::EntityMap;
use crate::generic_query::generic_answer;
use crate::humanize::static_help;
use crate::intent::ClassificationResult;
use crate::normalize::normalize;
use crate::rag::{grounded_answer, LanguageModelService};
use crate::registry::{HandlerRegistry, HandlerReply};
use crate::store::DataStore;

/// Uniform result of `process()`: text plus routing metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub response: String,
    pub intent: String,
    pub confidence: u8,
    /// Terminal state: validation | phrase_boost | early_override |
    /// rule_score | semantic | fuzzy_rule | generic | fallback | static_help
    pub source: String,
    /// Finer-grained label of the path taken
    pub method: String,
}

pub struct Dispatcher {
    registry: HandlerRegistry,
    store: Arc<dyn DataStore>,
    llm: Option<Box<dyn LanguageModelService>>,
    config: PipelineConfig,
}

impl Dispatcher {
    pub fn new(
        registry: HandlerRegistry,
        store: Arc<dyn DataStore>,
        llm: Option<Box<dyn LanguageModelService>>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            registry,
            store,
            llm,
            config,
        }
    }

    /// Route one classified query to a terminal outcome.
    pub fn dispatch(&self, classification: &ClassificationResult) -> ResponseEnvelope {
        // Critical intents must not be guessed: they need deterministic
        // handling or an honest fallback, never a low-confidence dispatch.
        let floor = if classification.intent.is_critical() {
            self.config.critical_confidence_floor
        } else {
            self.config.confidence_floor
        };

        if classification.confidence < floor {
            info!(
                "confidence {} below floor {} for {}, falling back",
                classification.confidence, floor, classification.intent
            );
            return self.fallback(classification);
        }

        let handler = match self.registry.get(classification.intent) {
            Some(h) => h,
            None => {
                warn!("no handler registered for {}", classification.intent);
                return self.fallback(classification);
            }
        };

        match self.invoke(handler, &classification.entities, &classification.query) {
            Some(reply) => ResponseEnvelope {
                response: reply.text,
                intent: classification.intent.to_string(),
                confidence: classification.confidence,
                source: classification.tier.to_string(),
                method: classification.method.clone(),
            },
            None => self.fallback(classification),
        }
    }

    /// Isolating boundary around handler execution: an error, a panic or
    /// an empty reply all count as "no match".
    fn invoke(
        &self,
        handler: &dyn crate::registry::Handler,
        entities: &EntityMap,
        raw: &str,
    ) -> Option<HandlerReply> {
        let outcome = catch_unwind(AssertUnwindSafe(|| handler.handle(entities, raw)));
        match outcome {
            Ok(Ok(reply)) if !reply.text.trim().is_empty() => Some(reply),
            Ok(Ok(_)) => {
                warn!("handler returned an empty reply, treating as no match");
                None
            }
            Ok(Err(e)) => {
                warn!("handler fault: {}", e);
                None
            }
            Err(_) => {
                warn!("handler panicked, treating as no match");
                None
            }
        }
    }

    /// Fallback chain: generic cross-entity lookup, then retrieval + LLM,
    /// then static help.
    fn fallback(&self, classification: &ClassificationResult) -> ResponseEnvelope {
        if let Some(answer) = generic_answer(&classification.entities, self.store.as_ref()) {
            return ResponseEnvelope {
                response: answer,
                intent: classification.intent.to_string(),
                confidence: classification.confidence,
                source: "generic".to_string(),
                method: "generic_entity_query".to_string(),
            };
        }

        if let Some(llm) = &self.llm {
            let normalized = normalize(&classification.query);
            if let Some(answer) = grounded_answer(
                llm.as_ref(),
                &classification.query,
                &normalized,
                self.store.as_ref(),
                self.config.retrieval_top_k,
            ) {
                return ResponseEnvelope {
                    response: answer,
                    intent: classification.intent.to_string(),
                    confidence: classification.confidence,
                    source: "fallback".to_string(),
                    method: "rag_llm".to_string(),
                };
            }
        }

        ResponseEnvelope {
            response: static_help(),
            intent: classification.intent.to_string(),
            confidence: classification.confidence,
            source: "static_help".to_string(),
            method: "static_help".to_string(),
        }
    }
}
