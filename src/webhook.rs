//! The delivered webhook object

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The concrete payload object delivered to a subscriber for one
/// (subscription, event) pairing.
///
/// Only `id`, `eventType`, `timestamp`, `name`, and `data` go on the wire;
/// the remaining fields carry delivery context and are never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    /// Event id (or notification id for batched payloads)
    pub id: String,

    /// Event type (e.g., "order.created")
    pub event_type: String,

    /// Timestamp when the event occurred
    pub timestamp: DateTime<Utc>,

    /// Subscription name, echoed for the receiver's benefit
    pub name: String,

    /// The event data
    pub data: serde_json::Value,

    /// Owning subscription id
    #[serde(skip)]
    pub subscription_id: String,

    /// Destination URL
    #[serde(skip)]
    pub destination: String,

    /// Signing secret
    #[serde(skip)]
    pub secret: Option<String>,

    /// Headers attached to the delivery
    #[serde(skip)]
    pub headers: HashMap<String, String>,
}
