//! Domain event types

use crate::{Result, WebhookError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// An immutable record of a fact that occurred in the owning system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventInfo {
    /// Unique identifier for this event
    pub id: String,

    /// The resource the event is about (e.g., "orders/1234")
    pub subject: String,

    /// Event type (e.g., "order.created", "user.updated")
    pub event_type: String,

    /// Timestamp when the event occurred
    pub timestamp: DateTime<Utc>,

    /// Optional schema version of the data payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_version: Option<String>,

    /// The actual event data
    pub data: serde_json::Value,
}

impl EventInfo {
    /// Create a new event with a generated id and the current timestamp
    pub fn new(subject: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            subject: subject.into(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            data_version: None,
            data: serde_json::Value::Null,
        }
    }

    /// Set a custom id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set a custom timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set the data version
    pub fn with_data_version(mut self, version: impl Into<String>) -> Self {
        self.data_version = Some(version.into());
        self
    }

    /// Set the event data
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    /// Produce a new event identical to this one but with replaced data.
    /// Events are never mutated in place.
    pub fn replace_data(&self, data: serde_json::Value) -> Self {
        let mut next = self.clone();
        next.data = data;
        next
    }
}

/// One or more same-typed events batched for a single delivery pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventNotification {
    notification_id: String,
    event_type: String,
    events: Vec<EventInfo>,
    #[serde(default)]
    properties: HashMap<String, serde_json::Value>,
}

impl EventNotification {
    /// Create a notification from an ordered, non-empty list of events.
    ///
    /// Fails if the list is empty or the events do not all share one type.
    pub fn new(events: Vec<EventInfo>) -> Result<Self> {
        let Some(first) = events.first() else {
            return Err(WebhookError::Notification(
                "notification requires at least one event".to_string(),
            ));
        };

        let event_type = first.event_type.clone();
        if let Some(other) = events.iter().find(|e| e.event_type != event_type) {
            return Err(WebhookError::Notification(format!(
                "mismatched event type '{}' in notification of '{}'",
                other.event_type, event_type
            )));
        }

        Ok(Self {
            notification_id: Uuid::new_v4().to_string(),
            event_type,
            events,
            properties: HashMap::new(),
        })
    }

    /// Create a notification for a single event
    pub fn single(event: EventInfo) -> Self {
        Self {
            notification_id: Uuid::new_v4().to_string(),
            event_type: event.event_type.clone(),
            events: vec![event],
            properties: HashMap::new(),
        }
    }

    /// Attach a free-form property
    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Produce a notification with the same id and properties but replaced
    /// events (used after the transformer pipeline runs)
    pub fn with_events(&self, events: Vec<EventInfo>) -> Result<Self> {
        let mut next = Self::new(events)?;
        next.notification_id = self.notification_id.clone();
        next.properties = self.properties.clone();
        Ok(next)
    }

    /// The generated notification id
    pub fn notification_id(&self) -> &str {
        &self.notification_id
    }

    /// The shared event type
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// The events in this notification, in order
    pub fn events(&self) -> &[EventInfo] {
        &self.events
    }

    /// Free-form notification properties
    pub fn properties(&self) -> &HashMap<String, serde_json::Value> {
        &self.properties
    }

    /// Whether this notification collapses to the single-event case
    pub fn has_single_event(&self) -> bool {
        self.events.len() == 1
    }

    /// Number of events in the notification
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Always false; empty notifications are rejected at construction
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
