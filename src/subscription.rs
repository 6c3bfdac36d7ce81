//! Webhook subscription configuration

use crate::retry::RetryPolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Lifecycle status of a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Subscription receives deliveries
    #[default]
    Active,

    /// Subscription is registered but receives no deliveries
    Inactive,
}

/// A subscription-scoped predicate expressed in a pluggable format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionFilter {
    /// Filter-language format (e.g., "contains", "jsonpath")
    pub format: String,

    /// The filter expression
    pub expression: String,
}

impl SubscriptionFilter {
    /// Create a filter in the given format
    pub fn new(format: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            expression: expression.into(),
        }
    }
}

/// A tenant-owned registration expressing interest in event types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookSubscription {
    /// Unique subscription id
    pub subscription_id: String,

    /// Owning tenant
    pub tenant_id: String,

    /// Human-readable name, echoed in delivered payloads
    pub name: String,

    /// Target URL for webhook delivery
    pub destination_url: String,

    /// Signing secret for this subscription
    #[serde(default, skip_serializing)]
    pub secret: Option<String>,

    /// Current status
    pub status: SubscriptionStatus,

    /// Event types this subscription is interested in
    pub event_types: HashSet<String>,

    /// Filters gating whether a matched webhook is actually sent
    #[serde(default)]
    pub filters: Vec<SubscriptionFilter>,

    /// Custom headers to include with deliveries
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Per-subscription retry overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_options: Option<RetryPolicy>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl WebhookSubscription {
    /// Create a new active subscription with a generated id
    pub fn new(
        tenant_id: impl Into<String>,
        name: impl Into<String>,
        destination_url: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            subscription_id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.into(),
            name: name.into(),
            destination_url: destination_url.into(),
            secret: None,
            status: SubscriptionStatus::Active,
            event_types: HashSet::new(),
            filters: Vec::new(),
            headers: HashMap::new(),
            retry_options: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a builder for custom configuration
    pub fn builder(
        tenant_id: impl Into<String>,
        name: impl Into<String>,
        destination_url: impl Into<String>,
    ) -> WebhookSubscriptionBuilder {
        WebhookSubscriptionBuilder::new(tenant_id, name, destination_url)
    }

    /// Whether this subscription currently receives deliveries
    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    /// Check if this subscription is interested in an event type.
    ///
    /// Supports exact matches, the `"*"` wildcard, and `"prefix.*"`
    /// wildcards (e.g., `"order.*"` matches `"order.created"`).
    pub fn is_interested_in(&self, event_type: &str) -> bool {
        if self.event_types.contains(event_type) {
            return true;
        }

        for interest in &self.event_types {
            if interest == "*" {
                return true;
            }
            if let Some(prefix) = interest.strip_suffix(".*") {
                if event_type.starts_with(prefix) {
                    return true;
                }
            }
        }

        false
    }

    /// Subscribe to an additional event type
    pub fn subscribe(&mut self, event_type: impl Into<String>) {
        self.event_types.insert(event_type.into());
        self.updated_at = Utc::now();
    }

    /// Remove an event-type interest
    pub fn unsubscribe(&mut self, event_type: &str) {
        self.event_types.remove(event_type);
        self.updated_at = Utc::now();
    }

    /// Deactivate the subscription
    pub fn deactivate(&mut self) {
        self.status = SubscriptionStatus::Inactive;
        self.updated_at = Utc::now();
    }

    /// Reactivate the subscription
    pub fn activate(&mut self) {
        self.status = SubscriptionStatus::Active;
        self.updated_at = Utc::now();
    }
}

/// Builder for [`WebhookSubscription`]
#[derive(Debug, Clone)]
pub struct WebhookSubscriptionBuilder {
    subscription: WebhookSubscription,
}

impl WebhookSubscriptionBuilder {
    /// Create a new builder
    pub fn new(
        tenant_id: impl Into<String>,
        name: impl Into<String>,
        destination_url: impl Into<String>,
    ) -> Self {
        Self {
            subscription: WebhookSubscription::new(tenant_id, name, destination_url),
        }
    }

    /// Set a custom subscription id
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.subscription.subscription_id = id.into();
        self
    }

    /// Set the signing secret
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.subscription.secret = Some(secret.into());
        self
    }

    /// Register interest in event types
    pub fn event_types(mut self, event_types: Vec<&str>) -> Self {
        self.subscription.event_types = event_types.into_iter().map(String::from).collect();
        self
    }

    /// Register interest in all event types
    pub fn all_event_types(mut self) -> Self {
        self.subscription.event_types.insert("*".to_string());
        self
    }

    /// Add a filter
    pub fn filter(mut self, format: impl Into<String>, expression: impl Into<String>) -> Self {
        self.subscription
            .filters
            .push(SubscriptionFilter::new(format, expression));
        self
    }

    /// Add a custom header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.subscription.headers.insert(key.into(), value.into());
        self
    }

    /// Set the subscription status
    pub fn status(mut self, status: SubscriptionStatus) -> Self {
        self.subscription.status = status;
        self
    }

    /// Set per-subscription retry overrides
    pub fn retry_options(mut self, policy: RetryPolicy) -> Self {
        self.subscription.retry_options = Some(policy);
        self
    }

    /// Build the subscription
    pub fn build(self) -> WebhookSubscription {
        self.subscription
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_creation() {
        let subscription = WebhookSubscription::new("acme", "orders", "https://example.com/hook");

        assert!(!subscription.subscription_id.is_empty());
        assert!(subscription.is_active());
        assert!(subscription.event_types.is_empty());
        assert!(subscription.secret.is_none());
    }

    #[test]
    fn test_subscription_builder() {
        let subscription = WebhookSubscription::builder("acme", "orders", "https://example.com")
            .secret("shhh")
            .event_types(vec!["order.created", "order.updated"])
            .filter("contains", "priority")
            .header("X-Custom", "value")
            .build();

        assert_eq!(subscription.secret.as_deref(), Some("shhh"));
        assert!(subscription.event_types.contains("order.created"));
        assert_eq!(subscription.filters.len(), 1);
        assert_eq!(
            subscription.headers.get("X-Custom"),
            Some(&"value".to_string())
        );
    }

    #[test]
    fn test_event_type_interest() {
        let mut subscription = WebhookSubscription::new("acme", "orders", "https://example.com");

        subscription.subscribe("order.created");
        assert!(subscription.is_interested_in("order.created"));
        assert!(!subscription.is_interested_in("order.deleted"));

        subscription.unsubscribe("order.created");
        assert!(!subscription.is_interested_in("order.created"));
    }

    #[test]
    fn test_wildcard_interest() {
        let subscription = WebhookSubscription::builder("acme", "orders", "https://example.com")
            .event_types(vec!["order.*", "invoice.paid"])
            .build();

        assert!(subscription.is_interested_in("order.created"));
        assert!(subscription.is_interested_in("order.updated"));
        assert!(subscription.is_interested_in("invoice.paid"));
        assert!(!subscription.is_interested_in("invoice.voided"));
        assert!(!subscription.is_interested_in("user.created"));
    }

    #[test]
    fn test_all_event_types() {
        let subscription = WebhookSubscription::builder("acme", "all", "https://example.com")
            .all_event_types()
            .build();

        assert!(subscription.is_interested_in("anything"));
        assert!(subscription.is_interested_in("order.shipped"));
    }

    #[test]
    fn test_status_transitions() {
        let mut subscription = WebhookSubscription::new("acme", "orders", "https://example.com");

        subscription.deactivate();
        assert!(!subscription.is_active());

        subscription.activate();
        assert!(subscription.is_active());
    }

    #[test]
    fn test_secret_not_serialized() {
        let subscription = WebhookSubscription::builder("acme", "orders", "https://example.com")
            .secret("shhh")
            .build();

        let json = serde_json::to_string(&subscription).unwrap();
        assert!(!json.contains("shhh"));
    }
}
