//! Event transformer pipeline

use crate::event::EventInfo;
use crate::Result;
use std::sync::Arc;

/// Rewrites an event's data before webhooks are built from it
pub trait EventTransformer: Send + Sync {
    /// Whether this transformer applies to the given event
    fn handles(&self, event: &EventInfo) -> bool;

    /// Produce the replacement data for the event
    fn transform(&self, event: &EventInfo) -> Result<serde_json::Value>;
}

/// An ordered chain of transformers.
///
/// Every transformer whose `handles` predicate accepts the current event
/// replaces its data, and later transformers see the updated event. This is
/// a chain, not a first-match-wins dispatch.
#[derive(Clone, Default)]
pub struct TransformerPipeline {
    transformers: Vec<Arc<dyn EventTransformer>>,
}

impl TransformerPipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transformer to the chain
    pub fn push(&mut self, transformer: Arc<dyn EventTransformer>) {
        self.transformers.push(transformer);
    }

    /// Append a transformer, builder-style
    pub fn with(mut self, transformer: Arc<dyn EventTransformer>) -> Self {
        self.transformers.push(transformer);
        self
    }

    /// Number of transformers in the chain
    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    /// Whether the pipeline has no transformers
    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    /// Run the chain over an event, yielding a new event with the final data
    pub fn apply(&self, event: EventInfo) -> Result<EventInfo> {
        let mut current = event;
        for transformer in &self.transformers {
            if transformer.handles(&current) {
                let data = transformer.transform(&current)?;
                current = current.replace_data(data);
            }
        }
        Ok(current)
    }
}

impl std::fmt::Debug for TransformerPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformerPipeline")
            .field("transformers", &self.transformers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WebhookError;

    struct AddField {
        key: &'static str,
        value: i64,
    }

    impl EventTransformer for AddField {
        fn handles(&self, event: &EventInfo) -> bool {
            event.data.is_object()
        }

        fn transform(&self, event: &EventInfo) -> Result<serde_json::Value> {
            let mut data = event.data.clone();
            if let Some(object) = data.as_object_mut() {
                object.insert(self.key.to_string(), serde_json::json!(self.value));
            }
            Ok(data)
        }
    }

    struct Failing;

    impl EventTransformer for Failing {
        fn handles(&self, _event: &EventInfo) -> bool {
            true
        }

        fn transform(&self, _event: &EventInfo) -> Result<serde_json::Value> {
            Err(WebhookError::Transform("boom".to_string()))
        }
    }

    #[test]
    fn test_empty_pipeline_is_identity() {
        let pipeline = TransformerPipeline::new();
        let event = EventInfo::new("orders/1", "order.created")
            .with_data(serde_json::json!({"a": 1}));

        let out = pipeline.apply(event.clone()).unwrap();
        assert_eq!(out.data, event.data);
    }

    #[test]
    fn test_transformers_chain_over_updated_event() {
        let pipeline = TransformerPipeline::new()
            .with(Arc::new(AddField { key: "first", value: 1 }))
            .with(Arc::new(AddField { key: "second", value: 2 }));

        let event = EventInfo::new("orders/1", "order.created").with_data(serde_json::json!({}));
        let out = pipeline.apply(event).unwrap();

        // Both transformers ran; the second saw the first's output
        assert_eq!(out.data, serde_json::json!({"first": 1, "second": 2}));
    }

    #[test]
    fn test_non_handling_transformer_skipped() {
        let pipeline = TransformerPipeline::new().with(Arc::new(AddField { key: "x", value: 1 }));

        // Data is not an object, so the transformer does not handle it
        let event = EventInfo::new("orders/1", "order.created")
            .with_data(serde_json::json!("scalar"));
        let out = pipeline.apply(event).unwrap();

        assert_eq!(out.data, serde_json::json!("scalar"));
    }

    #[test]
    fn test_transform_error_propagates() {
        let pipeline = TransformerPipeline::new().with(Arc::new(Failing));
        let event = EventInfo::new("orders/1", "order.created");

        assert!(matches!(
            pipeline.apply(event),
            Err(WebhookError::Transform(_))
        ));
    }
}
