//! Key-set (JWKS) fetch + signature verification.
//!
//! The key set is fetched on every call and never cached here; repeated
//! tokens are absorbed by the verification cache one layer up.
use std::{str::FromStr, sync::Arc, time::Duration};

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{
    Algorithm, DecodingKey,
    jwk::{Jwk, JwkSet},
};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::services::auth::error::AuthError;

#[derive(Debug, Error)]
pub enum KeySetError {
    #[error("key set request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("key set fetch timed out after {0:?}")]
    Timeout(Duration),
    #[error("key set document is invalid: {0}")]
    Invalid(String),
}

/// Where signing keys come from.
///
/// Production uses [`HttpKeySetSource`]; tests swap in an in-memory set.
#[async_trait]
pub trait KeySetSource: Send + Sync + 'static {
    // Backend name (for logging).
    fn name(&self) -> &'static str;

    async fn fetch(&self, url: &str) -> Result<JwkSet, KeySetError>;
}

/// Fetches the issuer's published key set over HTTP(S).
#[derive(Clone, Debug)]
pub struct HttpKeySetSource {
    client: reqwest::Client,
}

impl HttpKeySetSource {
    pub fn new(timeout: Duration) -> Result<Self, KeySetError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl KeySetSource for HttpKeySetSource {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self, url: &str) -> Result<JwkSet, KeySetError> {
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        serde_json::from_slice(&body).map_err(|e| KeySetError::Invalid(e.to_string()))
    }
}

/// Verifies token signatures against the key set published at `endpoint`.
#[derive(Clone)]
pub struct KeySetVerifier {
    source: Arc<dyn KeySetSource>,
    endpoint: String,
    fetch_timeout: Duration,
}

impl std::fmt::Debug for KeySetVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySetVerifier")
            .field("source", &self.source.name())
            .field("endpoint", &self.endpoint)
            .field("fetch_timeout", &self.fetch_timeout)
            .finish()
    }
}

impl KeySetVerifier {
    pub fn new(
        source: Arc<dyn KeySetSource>,
        endpoint: impl Into<String>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            source,
            endpoint: endpoint.into(),
            fetch_timeout,
        }
    }

    /// Fetch the current key set and verify `token` against it.
    ///
    /// Returns the (still unvalidated) claim payload of the token.
    pub async fn verify(&self, token: &str) -> Result<Value, AuthError> {
        let key_set = self
            .fetch_key_set()
            .await
            .map_err(AuthError::KeySetUnavailable)?;

        verify_signature(token, &key_set)
    }

    async fn fetch_key_set(&self) -> Result<JwkSet, KeySetError> {
        // Bound the fetch regardless of which source is plugged in.
        tokio::time::timeout(self.fetch_timeout, self.source.fetch(&self.endpoint))
            .await
            .map_err(|_| KeySetError::Timeout(self.fetch_timeout))?
    }
}

/// Try every key in order and stop at the first one that validates.
///
/// On failure the reasons of all attempted keys are joined into one message.
/// Once a key confirms the signature, a payload that is not JSON is a
/// `ClaimsDecodeError`, not a signature failure.
pub fn verify_signature(token: &str, key_set: &JwkSet) -> Result<Value, AuthError> {
    let header = jsonwebtoken::decode_header(token)
        .map_err(|e| AuthError::InvalidSignature(format!("token header: {e}")))?;

    let Some((message, signature)) = token.rsplit_once('.') else {
        return Err(AuthError::InvalidSignature("token is not a JWS".to_string()));
    };
    let Some((_, payload)) = message.split_once('.') else {
        return Err(AuthError::InvalidSignature("token is not a JWS".to_string()));
    };

    if key_set.keys.is_empty() {
        return Err(AuthError::InvalidSignature(
            "key set contains no keys".to_string(),
        ));
    }

    let mut failures = Vec::with_capacity(key_set.keys.len());
    for (index, jwk) in key_set.keys.iter().enumerate() {
        let kid = jwk.common.key_id.as_deref().unwrap_or("-");
        match verify_with_key(message, signature, header.alg, jwk) {
            Ok(()) => {
                debug!(key = index, kid, "token signature verified");
                return decode_payload(payload);
            }
            Err(e) => failures.push(format!("key[{index}] (kid={kid}): {e}")),
        }
    }

    Err(AuthError::InvalidSignature(failures.join("; ")))
}

fn verify_with_key(
    message: &str,
    signature: &str,
    alg: Algorithm,
    jwk: &Jwk,
) -> Result<(), String> {
    // A key pinned to one algorithm only verifies that algorithm.
    if let Some(key_alg) = jwk.common.key_algorithm
        && Algorithm::from_str(&key_alg.to_string()).ok() != Some(alg)
    {
        return Err(format!("key is for {key_alg}, token uses {alg:?}"));
    }

    let key = DecodingKey::from_jwk(jwk).map_err(|e| e.to_string())?;

    // Signature only: exp/nbf/aud/iss belong to the claims validator.
    match jsonwebtoken::crypto::verify(signature, message.as_bytes(), &key, alg) {
        Ok(true) => Ok(()),
        Ok(false) => Err("signature mismatch".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

fn decode_payload(payload: &str) -> Result<Value, AuthError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| AuthError::ClaimsDecodeError(format!("payload encoding: {e}")))?;

    serde_json::from_slice(&bytes).map_err(|e| AuthError::ClaimsDecodeError(e.to_string()))
}
