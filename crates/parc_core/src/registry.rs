//! Handler registry - one handler per intent, registered once at startup.

use std::collections::HashMap;

use crate::entities::EntityMap;
use crate::error::{HandlerError, ParcError};
use crate::intent::Intent;

/// What a handler returns on success.
#[derive(Debug, Clone)]
pub struct HandlerReply {
    /// User-facing text. An empty reply is treated as "no match" by the
    /// dispatcher.
    pub text: String,
    /// Optional structured payload for presentation layers.
    pub data: Option<serde_json::Value>,
}

impl HandlerReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// The handler contract: an idempotent read keyed by the extracted
/// entities and the raw query. Failure is equivalent to "no match".
pub trait Handler: Send + Sync {
    fn handle(&self, entities: &EntityMap, raw_query: &str) -> Result<HandlerReply, HandlerError>;
}

/// Lookup table from intent to handler. Built once; duplicate registration
/// is a startup error, not a silent overwrite.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<Intent, Box<dyn Handler>>,
    order: Vec<Intent>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, intent: Intent, handler: Box<dyn Handler>) -> Result<(), ParcError> {
        if self.handlers.contains_key(&intent) {
            return Err(ParcError::Internal(format!(
                "handler for {} registered twice",
                intent
            )));
        }
        self.order.push(intent);
        self.handlers.insert(intent, handler);
        Ok(())
    }

    pub fn get(&self, intent: Intent) -> Option<&dyn Handler> {
        self.handlers.get(&intent).map(|h| h.as_ref())
    }

    /// Registered intents in registration order (for coverage tests).
    pub fn intents(&self) -> &[Intent] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    impl Handler for Fixed {
        fn handle(&self, _e: &EntityMap, _q: &str) -> Result<HandlerReply, HandlerError> {
            Ok(HandlerReply::text(self.0))
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut reg = HandlerRegistry::new();
        reg.register(Intent::Help, Box::new(Fixed("aide"))).unwrap();
        let reply = reg
            .get(Intent::Help)
            .unwrap()
            .handle(&EntityMap::default(), "aide")
            .unwrap();
        assert_eq!(reply.text, "aide");
        assert!(reg.get(Intent::ListeMateriel).is_none());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut reg = HandlerRegistry::new();
        reg.register(Intent::Help, Box::new(Fixed("a"))).unwrap();
        assert!(reg.register(Intent::Help, Box::new(Fixed("b"))).is_err());
        assert_eq!(reg.len(), 1);
    }
}
