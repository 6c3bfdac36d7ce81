//! Webhook notification and delivery engine
//!
//! This crate turns domain events into signed HTTP callbacks: it resolves
//! which subscriptions care about an event, builds the webhook payload(s),
//! evaluates per-subscription filters, then signs and POSTs each payload
//! with bounded retries — concurrently across subscriptions, with one
//! subscriber's failure isolated from all others.
//!
//! # Features
//!
//! - **Subscription resolution**: tenant-scoped subscriptions with exact and
//!   wildcard event-type interest
//! - **Payload construction**: one webhook per event, or one batched webhook
//!   per notification
//! - **Filtering**: pluggable filter-language evaluators with a wildcard
//!   sentinel and default-accept semantics
//! - **Signing**: HMAC-SHA256/SHA512 signatures carried in a header or in
//!   query parameters
//! - **Bounded retries**: quadratic backoff, per-attempt timeouts, and
//!   per-attempt delivery records
//! - **Failure isolation**: per-subscription errors are folded into the
//!   result, never thrown past the orchestrator
//!
//! # Example: notifying subscribers
//!
//! ```rust,no_run
//! use hookwire::{
//!     EventInfo, Notifier, SenderConfig, SubscriptionStore, WebhookSender,
//!     WebhookSubscription,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SubscriptionStore::new();
//!     store.register(
//!         WebhookSubscription::builder("acme", "orders", "https://example.com/hook")
//!             .secret("whsec_abc123")
//!             .event_types(vec!["order.*"])
//!             .build(),
//!     );
//!
//!     let notifier = Notifier::new(
//!         Arc::new(store),
//!         WebhookSender::new(SenderConfig::default()),
//!     );
//!
//!     let event = EventInfo::new("orders/1234", "order.created")
//!         .with_data(serde_json::json!({"order_id": "1234", "total": 42}));
//!
//!     let result = notifier.notify("acme", event).await?;
//!     println!("{} subscriptions notified", result.len());
//!     Ok(())
//! }
//! ```
//!
//! # Example: sending a single webhook
//!
//! ```rust,no_run
//! use hookwire::{SenderConfig, WebhookDestination, WebhookSender};
//!
//! # async fn example(webhook: hookwire::Webhook) {
//! let sender = WebhookSender::new(SenderConfig::default());
//! let destination = WebhookDestination::new("https://example.com/hook")
//!     .with_secret("whsec_abc123");
//!
//! let result = sender.send(&destination, &webhook).await;
//! assert!(result.successful() || result.last_attempt().is_some());
//! # }
//! ```

mod config;
mod delivery;
mod destination;
mod error;
mod event;
mod factory;
mod filter;
mod notifier;
mod retry;
mod sender;
mod serialize;
mod signer;
mod store;
mod subscription;
mod transform;
mod webhook;

pub use config::{NotifierConfig, SenderConfig, SenderConfigBuilder};
pub use delivery::{NotificationResult, WebhookDeliveryAttempt, WebhookDeliveryResult};
pub use destination::{SignatureLocation, SignatureOptions, WebhookDestination};
pub use error::WebhookError;
pub use event::{EventInfo, EventNotification};
pub use factory::{FactoryStrategy, WebhookFactory};
pub use filter::{
    ContainsFilterEvaluator, FilterEvaluator, FilterEvaluatorRegistry, FilterRequest,
    WILDCARD_FILTER,
};
pub use notifier::{DeliveryObserver, DeliveryResultLogger, Notifier, NotifierBuilder};
pub use retry::RetryPolicy;
pub use sender::WebhookSender;
pub use serialize::{JsonSerializer, PayloadSerializer, SerializerRegistry, XmlSerializer};
pub use signer::{HmacSha256Signer, HmacSha512Signer, SignerRegistry, WebhookSigner};
pub use store::{SubscriptionResolver, SubscriptionStore};
pub use subscription::{
    SubscriptionFilter, SubscriptionStatus, WebhookSubscription, WebhookSubscriptionBuilder,
};
pub use transform::{EventTransformer, TransformerPipeline};
pub use webhook::Webhook;

/// Result type for webhook operations
pub type Result<T> = std::result::Result<T, WebhookError>;
