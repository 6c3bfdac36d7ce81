//! Delivery attempt and result records

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One HTTP try toward a destination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookDeliveryAttempt {
    /// 1-based attempt number, monotonically increasing within a delivery
    pub number: u32,

    /// When the try started
    pub started_at: DateTime<Utc>,

    /// When the try completed, if it did
    pub completed_at: Option<DateTime<Utc>>,

    /// HTTP status code, when a response was received
    pub response_code: Option<u16>,

    /// HTTP reason phrase or local error message
    pub response_message: Option<String>,
}

impl WebhookDeliveryAttempt {
    /// Start a new attempt with the given number
    pub fn started(number: u32) -> Self {
        Self {
            number,
            started_at: Utc::now(),
            completed_at: None,
            response_code: None,
            response_message: None,
        }
    }

    /// Record an HTTP completion
    pub fn complete_with_status(&mut self, code: u16, message: Option<String>) {
        self.completed_at = Some(Utc::now());
        self.response_code = Some(code);
        self.response_message = message;
    }

    /// Record a local failure (transport error, timeout, cancellation)
    pub fn complete_with_error(&mut self, message: impl Into<String>) {
        self.completed_at = Some(Utc::now());
        self.response_message = Some(message.into());
    }

    /// An attempt failed if it yielded no response code or a code >= 400
    pub fn failed(&self) -> bool {
        self.response_code.is_none_or(|code| code >= 400)
    }

    /// Wall-clock duration of the attempt, once completed
    pub fn elapsed(&self) -> Option<Duration> {
        self.completed_at.map(|done| done - self.started_at)
    }
}

/// The ordered attempts toward one (destination, webhook) pair.
///
/// The attempt list is append-only and shared: cloning the result shares the
/// list, so a logger can observe attempts while a retry is still appending.
#[derive(Debug, Clone)]
pub struct WebhookDeliveryResult {
    /// Id of the webhook being delivered
    pub webhook_id: String,

    /// Destination URL
    pub destination: String,

    attempts: Arc<Mutex<Vec<WebhookDeliveryAttempt>>>,
    failure: Option<String>,
}

impl WebhookDeliveryResult {
    /// Create an empty result for a delivery about to start
    pub fn new(webhook_id: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            webhook_id: webhook_id.into(),
            destination: destination.into(),
            attempts: Arc::new(Mutex::new(Vec::new())),
            failure: None,
        }
    }

    /// Create a result that failed before any attempt could run (e.g., the
    /// request could not be constructed)
    pub fn failed(
        webhook_id: impl Into<String>,
        destination: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            webhook_id: webhook_id.into(),
            destination: destination.into(),
            attempts: Arc::new(Mutex::new(Vec::new())),
            failure: Some(reason.into()),
        }
    }

    /// Append a completed attempt
    pub fn push_attempt(&self, attempt: WebhookDeliveryAttempt) {
        self.attempts.lock().unwrap().push(attempt);
    }

    /// Snapshot of the attempts recorded so far, in order
    pub fn attempts(&self) -> Vec<WebhookDeliveryAttempt> {
        self.attempts.lock().unwrap().clone()
    }

    /// Number of attempts recorded so far
    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }

    /// The attempt with the highest number
    pub fn last_attempt(&self) -> Option<WebhookDeliveryAttempt> {
        self.attempts.lock().unwrap().last().cloned()
    }

    /// Why the delivery failed before any attempt, if it did
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// A delivery succeeded only if it was not pre-failed, at least one
    /// attempt ran, and no recorded attempt failed
    pub fn successful(&self) -> bool {
        if self.failure.is_some() {
            return false;
        }
        let attempts = self.attempts.lock().unwrap();
        !attempts.is_empty() && attempts.iter().all(|a| !a.failed())
    }
}

/// Delivery results for one notification, keyed by subscription id
#[derive(Debug, Clone, Default)]
pub struct NotificationResult {
    results: HashMap<String, Vec<WebhookDeliveryResult>>,
}

impl NotificationResult {
    /// Create an empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a delivery result under a subscription
    pub fn append(&mut self, subscription_id: impl Into<String>, result: WebhookDeliveryResult) {
        self.results
            .entry(subscription_id.into())
            .or_default()
            .push(result);
    }

    /// All results, keyed by subscription id
    pub fn results(&self) -> &HashMap<String, Vec<WebhookDeliveryResult>> {
        &self.results
    }

    /// Results for one subscription
    pub fn for_subscription(&self, subscription_id: &str) -> Option<&[WebhookDeliveryResult]> {
        self.results.get(subscription_id).map(Vec::as_slice)
    }

    /// The successful deliveries, as (subscription id, result) pairs
    pub fn successful(&self) -> Vec<(&str, &WebhookDeliveryResult)> {
        self.partition(true)
    }

    /// The failed deliveries, as (subscription id, result) pairs
    pub fn failed(&self) -> Vec<(&str, &WebhookDeliveryResult)> {
        self.partition(false)
    }

    fn partition(&self, want_success: bool) -> Vec<(&str, &WebhookDeliveryResult)> {
        self.results
            .iter()
            .flat_map(|(id, results)| results.iter().map(move |r| (id.as_str(), r)))
            .filter(|(_, r)| r.successful() == want_success)
            .collect()
    }

    /// Whether every delivery succeeded (vacuously true when empty)
    pub fn all_successful(&self) -> bool {
        self.results
            .values()
            .flatten()
            .all(WebhookDeliveryResult::successful)
    }

    /// Number of subscriptions with at least one result
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether no deliveries were recorded
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Total number of delivery results across all subscriptions
    pub fn delivery_count(&self) -> usize {
        self.results.values().map(Vec::len).sum()
    }
}
