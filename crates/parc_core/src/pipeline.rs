//! Pipeline - the explicit context object tying every stage together.
//!
//! Constructed once at startup and shared by reference across requests:
//! compiled tables, the handler registry and the reference cache are
//! read-only (or internally synchronized) after this point. Per-request
//! processing is synchronous end to end.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::TtlCache;
use crate::classifier::Classifier;
use crate::config::PipelineConfig;
use crate::dispatcher::{Dispatcher, ResponseEnvelope};
use crate::entities::{EntityExtractor, EntityMap};
use crate::error::ParcError;
use crate::guards::run_guards;
use crate::handlers::default_registry;
use crate::humanize::empty_prompt;
use crate::intent::{ClassificationResult, Intent, Tier};
use crate::normalize::normalize;
use crate::rag::LanguageModelService;
use crate::registry::HandlerRegistry;
use crate::rules::RulePatternTable;
use crate::semantic::{EmbeddingService, SemanticMatcher};
use crate::store::DataStore;

pub struct Pipeline {
    extractor: EntityExtractor,
    classifier: Classifier,
    dispatcher: Dispatcher,
}

impl Pipeline {
    /// Standard construction: compile the tables, build the default
    /// registry, pre-embed the semantic examples if a service is given.
    pub fn new(
        config: PipelineConfig,
        store: Arc<dyn DataStore>,
        embedding: Option<Box<dyn EmbeddingService>>,
        llm: Option<Box<dyn LanguageModelService>>,
    ) -> Result<Self, ParcError> {
        let cache = Arc::new(TtlCache::new(64));
        let registry = default_registry(
            Arc::clone(&store),
            cache,
            Duration::from_secs(config.reference_cache_ttl_secs),
        )?;
        Self::with_registry(config, store, registry, embedding, llm)
    }

    /// Construction with a caller-supplied registry (tests inject faulty
    /// handlers through this).
    pub fn with_registry(
        config: PipelineConfig,
        store: Arc<dyn DataStore>,
        registry: HandlerRegistry,
        embedding: Option<Box<dyn EmbeddingService>>,
        llm: Option<Box<dyn LanguageModelService>>,
    ) -> Result<Self, ParcError> {
        let table = RulePatternTable::compile()?;
        let semantic = embedding.map(SemanticMatcher::new);
        let classifier = Classifier::new(table, semantic, config.clone());
        let dispatcher = Dispatcher::new(registry, store, llm, config);
        Ok(Self {
            extractor: EntityExtractor::new(),
            classifier,
            dispatcher,
        })
    }

    /// Primary entry point: normalize -> extract -> classify -> dispatch.
    /// Always returns a well-formed envelope, whatever the input.
    pub fn process(&self, query: &str) -> ResponseEnvelope {
        if query.trim().is_empty() {
            return ResponseEnvelope {
                response: empty_prompt(),
                intent: Intent::EmptyQuery.to_string(),
                confidence: 0,
                source: "validation".to_string(),
                method: "empty_input".to_string(),
            };
        }

        let classification = self.classify_only(query);
        self.dispatcher.dispatch(&classification)
    }

    /// Classification without dispatch, for corpus tests and debugging.
    pub fn classify_only(&self, query: &str) -> ClassificationResult {
        if query.trim().is_empty() {
            return ClassificationResult::new(
                Intent::EmptyQuery,
                0,
                Tier::RuleScore,
                "empty_input",
                EntityMap::default(),
                query,
            );
        }
        let text = normalize(query);
        let entities = self.extractor.extract(&text);

        // Early-override guards bypass the arbiter entirely; first match
        // wins. Anything else goes through the full tier ladder.
        match run_guards(&text, &entities) {
            Some(hit) => ClassificationResult::new(
                hit.intent,
                hit.confidence,
                Tier::EarlyOverride,
                format!("early_override:{}", hit.reason),
                entities,
                query,
            ),
            None => self.classifier.classify(query, &text, &entities),
        }
    }
}
