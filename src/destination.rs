//! Delivery destination derived from a subscription

use crate::config::SenderConfig;
use crate::retry::RetryPolicy;
use crate::subscription::WebhookSubscription;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where the signature is carried on the outgoing request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureLocation {
    /// In an HTTP header, formatted as `<algorithm>=<hex>`
    Header {
        /// Header name
        name: String,
    },

    /// As query-string parameters on the destination URL
    Query {
        /// Parameter carrying the hex-encoded signature
        param: String,
        /// Optional second parameter carrying the algorithm name
        algorithm_param: Option<String>,
    },
}

impl Default for SignatureLocation {
    fn default() -> Self {
        Self::Header {
            name: "X-Webhook-Signature".to_string(),
        }
    }
}

/// How outgoing payloads are signed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureOptions {
    /// Signing algorithm identifier (e.g., "sha256")
    pub algorithm: String,

    /// Signature transport
    pub location: SignatureLocation,
}

impl Default for SignatureOptions {
    fn default() -> Self {
        Self {
            algorithm: "sha256".to_string(),
            location: SignatureLocation::default(),
        }
    }
}

impl SignatureOptions {
    /// Sign with the given algorithm in the default header
    pub fn with_algorithm(algorithm: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            ..Default::default()
        }
    }

    /// Carry the signature in the named header
    pub fn in_header(mut self, name: impl Into<String>) -> Self {
        self.location = SignatureLocation::Header { name: name.into() };
        self
    }

    /// Carry the signature in query parameters
    pub fn in_query(
        mut self,
        param: impl Into<String>,
        algorithm_param: Option<String>,
    ) -> Self {
        self.location = SignatureLocation::Query {
            param: param.into(),
            algorithm_param,
        };
        self
    }
}

/// A concrete delivery target, derived by merging a subscription's
/// overrides onto sender-wide defaults (subscription-level values win)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookDestination {
    /// Target URL
    pub url: String,

    /// Signing secret
    #[serde(default, skip_serializing)]
    pub secret: Option<String>,

    /// Whether payloads are signed for this destination
    pub sign: bool,

    /// Signature transport configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_options: Option<SignatureOptions>,

    /// Retry overrides for this destination
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_options: Option<RetryPolicy>,

    /// Headers attached to every delivery
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl WebhookDestination {
    /// Create an unsigned destination with no headers
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            secret: None,
            sign: false,
            signature_options: None,
            retry_options: None,
            headers: HashMap::new(),
        }
    }

    /// Set the signing secret and enable signing
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self.sign = true;
        self
    }

    /// Set the signature options
    pub fn with_signature_options(mut self, options: SignatureOptions) -> Self {
        self.signature_options = Some(options);
        self
    }

    /// Set the retry policy
    pub fn with_retry_options(mut self, policy: RetryPolicy) -> Self {
        self.retry_options = Some(policy);
        self
    }

    /// Add a header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Derive the destination for a subscription, merging its overrides onto
    /// sender-wide defaults. Subscription headers override default headers of
    /// the same name; a subscription retry policy replaces the default one.
    pub fn merged(subscription: &WebhookSubscription, defaults: &SenderConfig) -> Self {
        let mut headers = defaults.default_headers.clone();
        headers.extend(
            subscription
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        Self {
            url: subscription.destination_url.clone(),
            secret: subscription.secret.clone(),
            sign: defaults.sign_payloads && subscription.secret.is_some(),
            signature_options: Some(defaults.signature_options.clone()),
            retry_options: Some(
                subscription
                    .retry_options
                    .clone()
                    .unwrap_or_else(|| defaults.retry_policy.clone()),
            ),
            headers,
        }
    }
}
