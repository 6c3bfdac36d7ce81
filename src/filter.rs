//! Subscription filter evaluation

use crate::subscription::WebhookSubscription;
use crate::webhook::Webhook;
use crate::{Result, WebhookError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Sentinel expression that matches every webhook without evaluation
pub const WILDCARD_FILTER: &str = "*";

/// A subscription's filters collected into one request for evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRequest {
    /// Filter-language format shared by all expressions
    pub format: String,

    /// The filter expressions
    pub expressions: Vec<String>,
}

impl FilterRequest {
    /// Build the filter request for a subscription.
    ///
    /// Returns `None` for a subscription without filters (match-all). A
    /// subscription carrying filters of more than one format is a
    /// configuration error.
    pub fn for_subscription(subscription: &WebhookSubscription) -> Result<Option<Self>> {
        let Some(first) = subscription.filters.first() else {
            return Ok(None);
        };

        let format = first.format.clone();
        if subscription.filters.iter().any(|f| f.format != format) {
            return Err(WebhookError::Config(format!(
                "subscription '{}' mixes filter formats",
                subscription.subscription_id
            )));
        }

        Ok(Some(Self {
            format,
            expressions: subscription
                .filters
                .iter()
                .map(|f| f.expression.clone())
                .collect(),
        }))
    }

    /// Whether this request is the single wildcard sentinel
    pub fn is_wildcard(&self) -> bool {
        self.expressions.len() == 1 && self.expressions[0] == WILDCARD_FILTER
    }
}

/// Evaluates filter expressions of one format against webhooks
#[async_trait]
pub trait FilterEvaluator: Send + Sync {
    /// The filter-language format this evaluator answers to
    fn format(&self) -> &str;

    /// Whether the webhook matches the request's expressions
    async fn matches(&self, request: &FilterRequest, webhook: &Webhook) -> Result<bool>;
}

/// Dispatches filter requests to the evaluator registered for their format
#[derive(Clone, Default)]
pub struct FilterEvaluatorRegistry {
    evaluators: HashMap<String, Arc<dyn FilterEvaluator>>,
}

impl FilterEvaluatorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an evaluator under its format
    pub fn register(&mut self, evaluator: Arc<dyn FilterEvaluator>) {
        self.evaluators
            .insert(evaluator.format().to_string(), evaluator);
    }

    /// Register an evaluator, builder-style
    pub fn with(mut self, evaluator: Arc<dyn FilterEvaluator>) -> Self {
        self.register(evaluator);
        self
    }

    /// Whether an evaluator is registered for the format
    pub fn supports(&self, format: &str) -> bool {
        self.evaluators.contains_key(format)
    }

    /// Decide whether a webhook passes the subscription's filters.
    ///
    /// A missing or empty request and the wildcard sentinel both match
    /// without dispatching. An unregistered format is a configuration
    /// error, fatal for the owning subscription only.
    pub async fn matches(
        &self,
        request: Option<&FilterRequest>,
        webhook: &Webhook,
    ) -> Result<bool> {
        let Some(request) = request else {
            return Ok(true);
        };

        if request.expressions.is_empty() || request.is_wildcard() {
            return Ok(true);
        }

        match self.evaluators.get(&request.format) {
            Some(evaluator) => evaluator.matches(request, webhook).await,
            None => Err(WebhookError::Config(format!(
                "no filter evaluator registered for format '{}'",
                request.format
            ))),
        }
    }
}

impl std::fmt::Debug for FilterEvaluatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterEvaluatorRegistry")
            .field("formats", &self.evaluators.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Reference evaluator: a webhook matches when any expression occurs as a
/// substring of its serialized JSON payload
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainsFilterEvaluator;

#[async_trait]
impl FilterEvaluator for ContainsFilterEvaluator {
    fn format(&self) -> &str {
        "contains"
    }

    async fn matches(&self, request: &FilterRequest, webhook: &Webhook) -> Result<bool> {
        let body = serde_json::to_string(webhook)?;
        Ok(request
            .expressions
            .iter()
            .any(|expression| body.contains(expression.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn webhook(data: serde_json::Value) -> Webhook {
        Webhook {
            id: "evt-1".to_string(),
            event_type: "order.created".to_string(),
            timestamp: Utc::now(),
            name: "orders".to_string(),
            data,
            subscription_id: "sub-1".to_string(),
            destination: "https://example.com".to_string(),
            secret: None,
            headers: HashMap::new(),
        }
    }

    fn registry() -> FilterEvaluatorRegistry {
        FilterEvaluatorRegistry::new().with(Arc::new(ContainsFilterEvaluator))
    }

    #[tokio::test]
    async fn test_no_filters_matches() {
        let matched = registry()
            .matches(None, &webhook(serde_json::json!({})))
            .await
            .unwrap();
        assert!(matched);
    }

    #[tokio::test]
    async fn test_wildcard_matches_without_evaluator() {
        // No evaluator registered at all; the wildcard must still match
        let registry = FilterEvaluatorRegistry::new();
        let request = FilterRequest {
            format: "unregistered".to_string(),
            expressions: vec![WILDCARD_FILTER.to_string()],
        };

        let matched = registry
            .matches(Some(&request), &webhook(serde_json::json!({})))
            .await
            .unwrap();
        assert!(matched);
    }

    #[tokio::test]
    async fn test_unregistered_format_is_config_error() {
        let request = FilterRequest {
            format: "jsonpath".to_string(),
            expressions: vec!["$.data".to_string()],
        };

        let result = registry()
            .matches(Some(&request), &webhook(serde_json::json!({})))
            .await;
        assert!(matches!(result, Err(WebhookError::Config(_))));
    }

    #[tokio::test]
    async fn test_contains_evaluator() {
        let request = FilterRequest {
            format: "contains".to_string(),
            expressions: vec!["priority".to_string()],
        };

        let matched = registry()
            .matches(Some(&request), &webhook(serde_json::json!({"priority": "high"})))
            .await
            .unwrap();
        assert!(matched);

        let matched = registry()
            .matches(Some(&request), &webhook(serde_json::json!({"routine": true})))
            .await
            .unwrap();
        assert!(!matched);
    }

    #[test]
    fn test_mixed_formats_rejected() {
        let subscription = WebhookSubscription::builder("acme", "orders", "https://example.com")
            .filter("contains", "a")
            .filter("jsonpath", "$.b")
            .build();

        let result = FilterRequest::for_subscription(&subscription);
        assert!(matches!(result, Err(WebhookError::Config(_))));
    }

    #[test]
    fn test_no_filters_yields_none() {
        let subscription = WebhookSubscription::new("acme", "orders", "https://example.com");
        assert!(FilterRequest::for_subscription(&subscription)
            .unwrap()
            .is_none());
    }
}
