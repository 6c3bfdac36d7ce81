//! Configuration for the sender and notifier

use crate::destination::SignatureOptions;
use crate::retry::RetryPolicy;
use std::collections::HashMap;
use std::time::Duration;

/// Configuration for the webhook sender
#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// Default per-attempt timeout
    pub timeout: Duration,

    /// User-Agent header for outgoing requests
    pub user_agent: String,

    /// Whether to verify SSL certificates
    pub verify_ssl: bool,

    /// Maximum payload size in bytes
    pub max_payload_size: usize,

    /// Default retry policy, overridable per subscription
    pub retry_policy: RetryPolicy,

    /// Default signature options
    pub signature_options: SignatureOptions,

    /// Whether to sign payloads when a secret is present
    pub sign_payloads: bool,

    /// Wire format for payloads ("json" or "xml")
    pub payload_format: String,

    /// Headers attached to every delivery unless overridden
    pub default_headers: HashMap<String, String>,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("hookwire/{}", env!("CARGO_PKG_VERSION")),
            verify_ssl: true,
            max_payload_size: 1024 * 1024, // 1MB
            retry_policy: RetryPolicy::default(),
            signature_options: SignatureOptions::default(),
            sign_payloads: true,
            payload_format: "json".to_string(),
            default_headers: HashMap::new(),
        }
    }
}

impl SenderConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for custom configuration
    pub fn builder() -> SenderConfigBuilder {
        SenderConfigBuilder::new()
    }
}

/// Builder for [`SenderConfig`]
#[derive(Debug, Clone, Default)]
pub struct SenderConfigBuilder {
    config: SenderConfig,
}

impl SenderConfigBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            config: SenderConfig::default(),
        }
    }

    /// Set the per-attempt timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the per-attempt timeout in seconds
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout = Duration::from_secs(secs);
        self
    }

    /// Set the User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set SSL verification
    pub fn verify_ssl(mut self, verify: bool) -> Self {
        self.config.verify_ssl = verify;
        self
    }

    /// Set maximum payload size
    pub fn max_payload_size(mut self, size: usize) -> Self {
        self.config.max_payload_size = size;
        self
    }

    /// Set the default retry policy
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.config.retry_policy = policy;
        self
    }

    /// Disable retries
    pub fn no_retries(mut self) -> Self {
        self.config.retry_policy = RetryPolicy::none();
        self
    }

    /// Set the default signature options
    pub fn signature_options(mut self, options: SignatureOptions) -> Self {
        self.config.signature_options = options;
        self
    }

    /// Enable or disable signing
    pub fn sign_payloads(mut self, sign: bool) -> Self {
        self.config.sign_payloads = sign;
        self
    }

    /// Set the payload wire format
    pub fn payload_format(mut self, format: impl Into<String>) -> Self {
        self.config.payload_format = format.into();
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> SenderConfig {
        self.config
    }
}

/// Configuration for the notifier
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Maximum number of subscriptions processed concurrently
    pub max_parallelism: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            max_parallelism: default_parallelism(),
        }
    }
}

impl NotifierConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap concurrent subscription processing (minimum 1)
    pub fn max_parallelism(mut self, max: usize) -> Self {
        self.max_parallelism = max.max(1);
        self
    }
}

/// Available processors minus one, with a floor of 1
fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
        .saturating_sub(1)
        .max(1)
}
