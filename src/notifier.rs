//! Notification orchestrator

use crate::config::NotifierConfig;
use crate::delivery::{NotificationResult, WebhookDeliveryResult};
use crate::destination::WebhookDestination;
use crate::event::{EventInfo, EventNotification};
use crate::factory::WebhookFactory;
use crate::filter::{FilterEvaluatorRegistry, FilterRequest};
use crate::sender::WebhookSender;
use crate::store::SubscriptionResolver;
use crate::subscription::WebhookSubscription;
use crate::transform::TransformerPipeline;
use crate::{Result, WebhookError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Receives each delivery result for persistence. Best-effort: failures are
/// logged and swallowed, never folded into the notification outcome.
#[async_trait]
pub trait DeliveryResultLogger: Send + Sync {
    /// Record one delivery result
    async fn log(
        &self,
        subscription: &WebhookSubscription,
        result: &WebhookDeliveryResult,
    ) -> Result<()>;
}

/// Extensibility hooks invoked as subscriptions are processed
#[async_trait]
pub trait DeliveryObserver: Send + Sync {
    /// Called after each delivery completes
    async fn on_delivery_result(
        &self,
        _subscription: &WebhookSubscription,
        _result: &WebhookDeliveryResult,
    ) {
    }

    /// Called when a subscription fails before delivery could run
    async fn on_delivery_error(&self, _subscription: &WebhookSubscription, _error: &WebhookError) {}
}

/// Orchestrates a notification pass: resolve subscriptions, then per
/// subscription transform, build, filter, sign and send — concurrently,
/// with each subscription's failure isolated from the others.
#[derive(Clone)]
pub struct Notifier {
    resolver: Arc<dyn SubscriptionResolver>,
    sender: Arc<WebhookSender>,
    factory: WebhookFactory,
    transformers: Arc<TransformerPipeline>,
    filters: Arc<FilterEvaluatorRegistry>,
    logger: Option<Arc<dyn DeliveryResultLogger>>,
    observer: Option<Arc<dyn DeliveryObserver>>,
    semaphore: Arc<Semaphore>,
}

impl Notifier {
    /// Create a notifier with default configuration
    pub fn new(resolver: Arc<dyn SubscriptionResolver>, sender: WebhookSender) -> Self {
        Self::builder(resolver, sender).build()
    }

    /// Create a builder for custom configuration
    pub fn builder(resolver: Arc<dyn SubscriptionResolver>, sender: WebhookSender) -> NotifierBuilder {
        NotifierBuilder::new(resolver, sender)
    }

    /// Notify all interested subscriptions of a single event
    pub async fn notify(&self, tenant_id: &str, event: EventInfo) -> Result<NotificationResult> {
        self.notify_all(tenant_id, EventNotification::single(event))
            .await
    }

    /// Notify all interested subscriptions of a batched notification
    pub async fn notify_all(
        &self,
        tenant_id: &str,
        notification: EventNotification,
    ) -> Result<NotificationResult> {
        self.notify_with_cancellation(tenant_id, notification, CancellationToken::new())
            .await
    }

    /// Notify with a cancellation signal that propagates to every in-flight
    /// subscription task, HTTP call, and backoff wait
    pub async fn notify_with_cancellation(
        &self,
        tenant_id: &str,
        notification: EventNotification,
        cancel: CancellationToken,
    ) -> Result<NotificationResult> {
        // Resolution failure is fatal to the whole call
        let subscriptions = self
            .resolver
            .resolve(tenant_id, notification.event_type(), true)
            .await?;

        if subscriptions.is_empty() {
            debug!(
                tenant_id,
                event_type = notification.event_type(),
                "No subscriptions for event"
            );
            return Ok(NotificationResult::new());
        }

        debug!(
            tenant_id,
            event_type = notification.event_type(),
            subscriptions = subscriptions.len(),
            "Dispatching notification"
        );

        let notification = Arc::new(notification);
        let mut tasks = JoinSet::new();

        for subscription in subscriptions {
            let notifier = self.clone();
            let notification = notification.clone();
            let cancel = cancel.clone();
            let semaphore = self.semaphore.clone();

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (subscription.subscription_id.clone(), Vec::new());
                };
                if cancel.is_cancelled() {
                    return (subscription.subscription_id.clone(), Vec::new());
                }
                let results = notifier
                    .process_subscription(&subscription, &notification, &cancel)
                    .await;
                (subscription.subscription_id.clone(), results)
            });
        }

        let mut result = NotificationResult::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((subscription_id, results)) => {
                    for delivery in results {
                        result.append(&subscription_id, delivery);
                    }
                }
                Err(e) => {
                    error!("Subscription task failed to join: {e}");
                }
            }
        }

        Ok(result)
    }

    /// Run one subscription end to end. Errors are folded into a pre-failed
    /// result and reported through the observer, never propagated. Deliveries
    /// already made before the error stay in the returned list.
    async fn process_subscription(
        &self,
        subscription: &WebhookSubscription,
        notification: &EventNotification,
        cancel: &CancellationToken,
    ) -> Vec<WebhookDeliveryResult> {
        let mut results = Vec::new();
        if let Err(e) = self
            .try_process_subscription(subscription, notification, cancel, &mut results)
            .await
        {
            error!(
                subscription_id = %subscription.subscription_id,
                "Subscription processing failed: {e}"
            );
            if let Some(observer) = &self.observer {
                observer.on_delivery_error(subscription, &e).await;
            }
            results.push(WebhookDeliveryResult::failed(
                notification.notification_id(),
                &subscription.destination_url,
                e.to_string(),
            ));
        }
        results
    }

    async fn try_process_subscription(
        &self,
        subscription: &WebhookSubscription,
        notification: &EventNotification,
        cancel: &CancellationToken,
        results: &mut Vec<WebhookDeliveryResult>,
    ) -> Result<()> {
        // Transformer pipeline runs over every event before webhooks are built
        let notification = if self.transformers.is_empty() {
            notification.clone()
        } else {
            let mut events = Vec::with_capacity(notification.len());
            for event in notification.events() {
                events.push(self.transformers.apply(event.clone())?);
            }
            notification.with_events(events)?
        };

        let destination = WebhookDestination::merged(subscription, self.sender.config());
        let webhooks = self
            .factory
            .build(subscription, &destination, &notification);

        if webhooks.is_empty() {
            warn!(
                subscription_id = %subscription.subscription_id,
                "Webhook factory produced no payloads; skipping subscription"
            );
            return Ok(());
        }

        let filter_request = FilterRequest::for_subscription(subscription)?;

        for webhook in webhooks {
            if !self
                .filters
                .matches(filter_request.as_ref(), &webhook)
                .await?
            {
                debug!(
                    subscription_id = %subscription.subscription_id,
                    webhook_id = %webhook.id,
                    "Webhook filtered out"
                );
                continue;
            }

            let result = self
                .sender
                .send_cancellable(&destination, &webhook, cancel)
                .await;

            if let Some(logger) = &self.logger {
                if let Err(e) = logger.log(subscription, &result).await {
                    warn!(
                        subscription_id = %subscription.subscription_id,
                        "Delivery result logger failed: {e}"
                    );
                }
            }
            if let Some(observer) = &self.observer {
                observer.on_delivery_result(subscription, &result).await;
            }

            results.push(result);
        }

        Ok(())
    }
}

/// Builder for [`Notifier`]
pub struct NotifierBuilder {
    config: NotifierConfig,
    resolver: Arc<dyn SubscriptionResolver>,
    sender: WebhookSender,
    factory: WebhookFactory,
    transformers: TransformerPipeline,
    filters: FilterEvaluatorRegistry,
    logger: Option<Arc<dyn DeliveryResultLogger>>,
    observer: Option<Arc<dyn DeliveryObserver>>,
}

impl NotifierBuilder {
    /// Create a builder over the two required collaborators
    pub fn new(resolver: Arc<dyn SubscriptionResolver>, sender: WebhookSender) -> Self {
        Self {
            config: NotifierConfig::default(),
            resolver,
            sender,
            factory: WebhookFactory::default(),
            transformers: TransformerPipeline::new(),
            filters: FilterEvaluatorRegistry::new(),
            logger: None,
            observer: None,
        }
    }

    /// Set the notifier configuration
    pub fn config(mut self, config: NotifierConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the webhook factory
    pub fn factory(mut self, factory: WebhookFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Set the transformer pipeline
    pub fn transformers(mut self, transformers: TransformerPipeline) -> Self {
        self.transformers = transformers;
        self
    }

    /// Set the filter evaluator registry
    pub fn filters(mut self, filters: FilterEvaluatorRegistry) -> Self {
        self.filters = filters;
        self
    }

    /// Set the delivery result logger
    pub fn logger(mut self, logger: Arc<dyn DeliveryResultLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Set the delivery observer
    pub fn observer(mut self, observer: Arc<dyn DeliveryObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Build the notifier
    pub fn build(self) -> Notifier {
        Notifier {
            resolver: self.resolver,
            sender: Arc::new(self.sender),
            factory: self.factory,
            transformers: Arc::new(self.transformers),
            filters: Arc::new(self.filters),
            logger: self.logger,
            observer: self.observer,
            semaphore: Arc::new(Semaphore::new(self.config.max_parallelism)),
        }
    }
}
