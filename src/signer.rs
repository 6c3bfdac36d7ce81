//! Webhook payload signing

use crate::{Result, WebhookError};
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha512};
use std::collections::HashMap;
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

/// Computes a message authentication code over a serialized payload
pub trait WebhookSigner: Send + Sync {
    /// Algorithm identifiers this signer answers to (a signer may carry
    /// more than one alias, e.g. `sha256` and `sha-256`)
    fn algorithms(&self) -> &[&str];

    /// Sign the body with the given secret, returning the encoded hash
    fn sign(&self, body: &[u8], secret: &str) -> String;
}

/// HMAC-SHA256 over the UTF-8 bytes of body and secret, hex-encoded
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSha256Signer;

impl WebhookSigner for HmacSha256Signer {
    fn algorithms(&self) -> &[&str] {
        &["sha256", "sha-256"]
    }

    fn sign(&self, body: &[u8], secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("HMAC can take any size key");
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }
}

/// HMAC-SHA512 over the UTF-8 bytes of body and secret, hex-encoded
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSha512Signer;

impl WebhookSigner for HmacSha512Signer {
    fn algorithms(&self) -> &[&str] {
        &["sha512", "sha-512"]
    }

    fn sign(&self, body: &[u8], secret: &str) -> String {
        let mut mac = HmacSha512::new_from_slice(secret.as_bytes())
            .expect("HMAC can take any size key");
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }
}

/// Looks up signers by algorithm identifier
#[derive(Clone)]
pub struct SignerRegistry {
    signers: HashMap<String, Arc<dyn WebhookSigner>>,
}

impl Default for SignerRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(HmacSha256Signer));
        registry.register(Arc::new(HmacSha512Signer));
        registry
    }
}

impl SignerRegistry {
    /// Create a registry with the built-in HMAC signers
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with no signers registered
    pub fn empty() -> Self {
        Self {
            signers: HashMap::new(),
        }
    }

    /// Register a signer under every algorithm alias it carries
    pub fn register(&mut self, signer: Arc<dyn WebhookSigner>) {
        for algorithm in signer.algorithms() {
            self.signers
                .insert(algorithm.to_lowercase(), signer.clone());
        }
    }

    /// Whether a signer is registered for the algorithm
    pub fn supports(&self, algorithm: &str) -> bool {
        self.signers.contains_key(&algorithm.to_lowercase())
    }

    /// Sign the body using the named algorithm.
    ///
    /// An unknown algorithm is a configuration error, never retried.
    pub fn sign(&self, algorithm: &str, body: &[u8], secret: &str) -> Result<String> {
        match self.signers.get(&algorithm.to_lowercase()) {
            Some(signer) => Ok(signer.sign(body, secret)),
            None => Err(WebhookError::Config(format!(
                "no signer registered for algorithm '{algorithm}'"
            ))),
        }
    }
}

impl std::fmt::Debug for SignerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignerRegistry")
            .field("algorithms", &self.signers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Format a signature for header transport: `<algorithm>=<hash>`
pub fn header_value(algorithm: &str, signature: &str) -> String {
    format!("{algorithm}={signature}")
}
