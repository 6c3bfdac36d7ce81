//! Subscription resolution and the in-memory store

use crate::subscription::WebhookSubscription;
use crate::{Result, WebhookError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Supplies the subscriptions interested in an event type for a tenant.
///
/// Production deployments typically back this with their own storage; the
/// notifier only consumes the trait.
#[async_trait]
pub trait SubscriptionResolver: Send + Sync {
    /// Resolve subscriptions for `(tenant_id, event_type)`, optionally
    /// restricted to active ones
    async fn resolve(
        &self,
        tenant_id: &str,
        event_type: &str,
        active_only: bool,
    ) -> Result<Vec<WebhookSubscription>>;
}

/// Thread-safe in-memory subscription store
#[derive(Debug, Clone, Default)]
pub struct SubscriptionStore {
    subscriptions: Arc<RwLock<HashMap<String, WebhookSubscription>>>,
}

impl SubscriptionStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscription, returning its id
    pub fn register(&self, subscription: WebhookSubscription) -> String {
        let id = subscription.subscription_id.clone();
        let mut subscriptions = self.subscriptions.write().unwrap();
        subscriptions.insert(id.clone(), subscription);
        id
    }

    /// Remove a subscription by id
    pub fn unregister(&self, id: &str) -> Option<WebhookSubscription> {
        let mut subscriptions = self.subscriptions.write().unwrap();
        subscriptions.remove(id)
    }

    /// Get a subscription by id
    pub fn get(&self, id: &str) -> Option<WebhookSubscription> {
        let subscriptions = self.subscriptions.read().unwrap();
        subscriptions.get(id).cloned()
    }

    /// Whether a subscription exists
    pub fn exists(&self, id: &str) -> bool {
        let subscriptions = self.subscriptions.read().unwrap();
        subscriptions.contains_key(id)
    }

    /// Replace a subscription
    pub fn update(&self, id: &str, subscription: WebhookSubscription) -> Result<()> {
        let mut subscriptions = self.subscriptions.write().unwrap();
        if subscriptions.contains_key(id) {
            subscriptions.insert(id.to_string(), subscription);
            Ok(())
        } else {
            Err(WebhookError::SubscriptionNotFound(id.to_string()))
        }
    }

    /// Mutate a subscription in place (via callback)
    pub fn with_subscription<F, R>(&self, id: &str, f: F) -> Result<R>
    where
        F: FnOnce(&mut WebhookSubscription) -> R,
    {
        let mut subscriptions = self.subscriptions.write().unwrap();
        match subscriptions.get_mut(id) {
            Some(subscription) => Ok(f(subscription)),
            None => Err(WebhookError::SubscriptionNotFound(id.to_string())),
        }
    }

    /// Activate a subscription
    pub fn activate(&self, id: &str) -> Result<()> {
        self.with_subscription(id, |s| s.activate())
    }

    /// Deactivate a subscription
    pub fn deactivate(&self, id: &str) -> Result<()> {
        self.with_subscription(id, |s| s.deactivate())
    }

    /// All subscriptions owned by a tenant
    pub fn for_tenant(&self, tenant_id: &str) -> Vec<WebhookSubscription> {
        let subscriptions = self.subscriptions.read().unwrap();
        subscriptions
            .values()
            .filter(|s| s.tenant_id == tenant_id)
            .cloned()
            .collect()
    }

    /// Number of registered subscriptions
    pub fn count(&self) -> usize {
        let subscriptions = self.subscriptions.read().unwrap();
        subscriptions.len()
    }

    /// Remove all subscriptions
    pub fn clear(&self) {
        let mut subscriptions = self.subscriptions.write().unwrap();
        subscriptions.clear();
    }
}

#[async_trait]
impl SubscriptionResolver for SubscriptionStore {
    async fn resolve(
        &self,
        tenant_id: &str,
        event_type: &str,
        active_only: bool,
    ) -> Result<Vec<WebhookSubscription>> {
        let subscriptions = self.subscriptions.read().unwrap();
        Ok(subscriptions
            .values()
            .filter(|s| {
                s.tenant_id == tenant_id
                    && (!active_only || s.is_active())
                    && s.is_interested_in(event_type)
            })
            .cloned()
            .collect())
    }
}
