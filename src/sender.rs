//! Webhook sender: signs and POSTs payloads under a retry policy

use crate::config::SenderConfig;
use crate::delivery::{WebhookDeliveryAttempt, WebhookDeliveryResult};
use crate::destination::{SignatureLocation, WebhookDestination};
use crate::serialize::SerializerRegistry;
use crate::signer::{self, SignerRegistry};
use crate::webhook::Webhook;
use crate::{Result, WebhookError};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

/// Sends webhook deliveries over a shared, pooled HTTP transport.
///
/// The transport is created once (or injected) and reused across
/// deliveries; the sender never recreates it per request.
#[derive(Debug, Clone)]
pub struct WebhookSender {
    config: SenderConfig,
    http_client: Client,
    serializers: SerializerRegistry,
    signers: SignerRegistry,
}

impl WebhookSender {
    /// Create a sender with its own HTTP transport
    pub fn new(config: SenderConfig) -> Self {
        let http_client = Client::builder()
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            http_client,
            serializers: SerializerRegistry::new(),
            signers: SignerRegistry::new(),
        }
    }

    /// Create a sender over an injected HTTP transport
    pub fn with_http_client(config: SenderConfig, http_client: Client) -> Self {
        Self {
            config,
            http_client,
            serializers: SerializerRegistry::new(),
            signers: SignerRegistry::new(),
        }
    }

    /// Replace the serializer registry
    pub fn with_serializers(mut self, serializers: SerializerRegistry) -> Self {
        self.serializers = serializers;
        self
    }

    /// Replace the signer registry
    pub fn with_signers(mut self, signers: SignerRegistry) -> Self {
        self.signers = signers;
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &SenderConfig {
        &self.config
    }

    /// Sign and send one webhook, retrying per the destination's policy
    pub async fn send(
        &self,
        destination: &WebhookDestination,
        webhook: &Webhook,
    ) -> WebhookDeliveryResult {
        self.send_cancellable(destination, webhook, &CancellationToken::new())
            .await
    }

    /// Sign and send one webhook; the token aborts the in-flight request
    /// and any backoff wait, keeping already-recorded attempts intact
    pub async fn send_cancellable(
        &self,
        destination: &WebhookDestination,
        webhook: &Webhook,
        cancel: &CancellationToken,
    ) -> WebhookDeliveryResult {
        let prepared = match self.prepare(destination, webhook) {
            Ok(prepared) => prepared,
            Err(e) => {
                error!(
                    webhook_id = %webhook.id,
                    url = %destination.url,
                    "Failed to construct webhook request: {e}"
                );
                return WebhookDeliveryResult::failed(&webhook.id, &destination.url, e.to_string());
            }
        };

        let result = WebhookDeliveryResult::new(&webhook.id, &destination.url);
        let policy = destination
            .retry_options
            .clone()
            .unwrap_or_else(|| self.config.retry_policy.clone());
        let attempt_timeout = policy.timeout.unwrap_or(self.config.timeout);

        let mut attempt_number = 0u32;
        loop {
            attempt_number += 1;
            let mut attempt = WebhookDeliveryAttempt::started(attempt_number);
            debug!(
                webhook_id = %webhook.id,
                url = %prepared.url,
                attempt = attempt_number,
                "Webhook delivery attempt"
            );

            let mut request = self
                .http_client
                .post(&prepared.url)
                .header(CONTENT_TYPE, &prepared.content_type);
            // Sender-wide defaults first; destination entries override by name
            for (key, value) in &self.config.default_headers {
                if !destination.headers.contains_key(key) {
                    request = request.header(key, value);
                }
            }
            for (key, value) in &destination.headers {
                request = request.header(key, value);
            }
            if let Some((name, value)) = &prepared.signature_header {
                request = request.header(name, value);
            }
            let request = request.body(prepared.body.clone());

            let outcome = tokio::select! {
                () = cancel.cancelled() => {
                    attempt.complete_with_error("delivery cancelled");
                    result.push_attempt(attempt);
                    warn!(webhook_id = %webhook.id, "Webhook delivery cancelled");
                    return result;
                }
                sent = tokio::time::timeout(attempt_timeout, request.send()) => sent,
            };

            let retryable = match outcome {
                Ok(Ok(response)) => {
                    let status = response.status();
                    attempt.complete_with_status(
                        status.as_u16(),
                        status.canonical_reason().map(String::from),
                    );
                    result.push_attempt(attempt);

                    if status.is_success() {
                        info!(
                            webhook_id = %webhook.id,
                            url = %prepared.url,
                            attempt = attempt_number,
                            "Webhook delivered"
                        );
                        return result;
                    }

                    warn!(
                        webhook_id = %webhook.id,
                        status = status.as_u16(),
                        attempt = attempt_number,
                        "Webhook delivery failed"
                    );
                    Self::should_retry_status(status.as_u16())
                }
                Ok(Err(e)) => {
                    error!(
                        webhook_id = %webhook.id,
                        attempt = attempt_number,
                        "Webhook delivery error: {e}"
                    );
                    attempt.complete_with_error(e.to_string());
                    result.push_attempt(attempt);
                    true
                }
                Err(_) => {
                    warn!(
                        webhook_id = %webhook.id,
                        attempt = attempt_number,
                        timeout = ?attempt_timeout,
                        "Webhook delivery attempt timed out"
                    );
                    attempt.complete_with_error(format!(
                        "attempt timed out after {attempt_timeout:?}"
                    ));
                    result.push_attempt(attempt);
                    true
                }
            };

            if !retryable || !policy.should_retry(attempt_number) {
                return result;
            }

            // Quadratic backoff keyed by the 0-based attempt just completed
            let delay = policy.delay_after_attempt(attempt_number - 1);
            if !delay.is_zero() {
                debug!(
                    webhook_id = %webhook.id,
                    delay = ?delay,
                    "Waiting before retry"
                );
                tokio::select! {
                    () = cancel.cancelled() => {
                        warn!(webhook_id = %webhook.id, "Webhook delivery cancelled during backoff");
                        return result;
                    }
                    () = tokio::time::sleep(delay) => {}
                }
            }
        }
    }

    /// Serialize and sign, producing everything needed to build each try's
    /// request. Failures here are configuration errors: the whole delivery
    /// fails without an attempt and is never retried.
    fn prepare(
        &self,
        destination: &WebhookDestination,
        webhook: &Webhook,
    ) -> Result<PreparedRequest> {
        let serializer = self.serializers.get(&self.config.payload_format)?;
        let body = serializer.serialize(webhook)?;

        if body.len() > self.config.max_payload_size {
            return Err(WebhookError::Payload(format!(
                "payload too large: {} bytes (max: {})",
                body.len(),
                self.config.max_payload_size
            )));
        }

        let mut url = destination.url.clone();
        let mut signature_header = None;

        if destination.sign {
            if let Some(secret) = &destination.secret {
                let options = destination
                    .signature_options
                    .clone()
                    .unwrap_or_else(|| self.config.signature_options.clone());
                let signature = self.signers.sign(&options.algorithm, &body, secret)?;

                match &options.location {
                    SignatureLocation::Header { name } => {
                        signature_header = Some((
                            name.clone(),
                            signer::header_value(&options.algorithm, &signature),
                        ));
                    }
                    SignatureLocation::Query {
                        param,
                        algorithm_param,
                    } => {
                        url = append_signature_query(
                            &url,
                            param,
                            algorithm_param.as_deref(),
                            &options.algorithm,
                            &signature,
                        )?;
                    }
                }
            }
        }

        Ok(PreparedRequest {
            url,
            body,
            content_type: serializer.content_type().to_string(),
            signature_header,
        })
    }

    /// 408 is classified like a local timeout; other 4xx codes are final.
    /// Rate limiting and server errors are worth another try.
    fn should_retry_status(status: u16) -> bool {
        matches!(status, 408 | 429) || (500..=599).contains(&status)
    }
}

struct PreparedRequest {
    url: String,
    body: Vec<u8>,
    content_type: String,
    signature_header: Option<(String, String)>,
}

fn append_signature_query(
    url: &str,
    param: &str,
    algorithm_param: Option<&str>,
    algorithm: &str,
    signature: &str,
) -> Result<String> {
    let mut parsed = Url::parse(url)?;
    {
        let mut pairs = parsed.query_pairs_mut();
        pairs.append_pair(param, signature);
        if let Some(algorithm_param) = algorithm_param {
            pairs.append_pair(algorithm_param, algorithm);
        }
    }
    Ok(parsed.into())
}
