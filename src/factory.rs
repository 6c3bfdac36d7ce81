//! Webhook construction strategies

use crate::destination::WebhookDestination;
use crate::event::{EventInfo, EventNotification};
use crate::subscription::WebhookSubscription;
use crate::webhook::Webhook;
use chrono::Utc;

/// How a notification maps onto delivered webhooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FactoryStrategy {
    /// One webhook per event in the notification (N events, N webhooks)
    #[default]
    OnePerEvent,

    /// One webhook per subscription; `data` is the single event's data, or a
    /// JSON array of per-event data when the notification is batched
    OnePerNotification,
}

/// Builds webhook objects from a subscription and a notification
#[derive(Debug, Clone, Copy, Default)]
pub struct WebhookFactory {
    strategy: FactoryStrategy,
}

impl WebhookFactory {
    /// Create a factory with the given strategy
    pub fn new(strategy: FactoryStrategy) -> Self {
        Self { strategy }
    }

    /// The configured strategy
    pub fn strategy(&self) -> FactoryStrategy {
        self.strategy
    }

    /// Build the webhook object(s) for a subscription
    pub fn build(
        &self,
        subscription: &WebhookSubscription,
        destination: &WebhookDestination,
        notification: &EventNotification,
    ) -> Vec<Webhook> {
        match self.strategy {
            FactoryStrategy::OnePerEvent => notification
                .events()
                .iter()
                .map(|event| self.for_event(subscription, destination, event))
                .collect(),
            FactoryStrategy::OnePerNotification => {
                if notification.has_single_event() {
                    notification
                        .events()
                        .first()
                        .map(|event| self.for_event(subscription, destination, event))
                        .into_iter()
                        .collect()
                } else {
                    let data: Vec<serde_json::Value> = notification
                        .events()
                        .iter()
                        .map(|event| event.data.clone())
                        .collect();

                    vec![Webhook {
                        id: notification.notification_id().to_string(),
                        event_type: notification.event_type().to_string(),
                        timestamp: Utc::now(),
                        name: subscription.name.clone(),
                        data: serde_json::Value::Array(data),
                        subscription_id: subscription.subscription_id.clone(),
                        destination: destination.url.clone(),
                        secret: subscription.secret.clone(),
                        headers: destination.headers.clone(),
                    }]
                }
            }
        }
    }

    fn for_event(
        &self,
        subscription: &WebhookSubscription,
        destination: &WebhookDestination,
        event: &EventInfo,
    ) -> Webhook {
        Webhook {
            id: event.id.clone(),
            event_type: event.event_type.clone(),
            timestamp: event.timestamp,
            name: subscription.name.clone(),
            data: event.data.clone(),
            subscription_id: subscription.subscription_id.clone(),
            destination: destination.url.clone(),
            secret: subscription.secret.clone(),
            headers: destination.headers.clone(),
        }
    }
}
