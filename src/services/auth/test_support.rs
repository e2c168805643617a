//! Keys, tokens and key-set doubles shared by the auth tests.
use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ed25519_dalek::{SigningKey, pkcs8::EncodePrivateKey};
use jsonwebtoken::{Algorithm, EncodingKey, Header, jwk::JwkSet};
use serde_json::{Value, json};

use crate::services::auth::{
    claims::Claims,
    key_set::{KeySetError, KeySetSource},
};

pub const AUDIENCE: &str = "https://api.example.com/";
pub const ISSUER: &str = "https://issuer.example.com/";
pub const JWK_ENDPOINT: &str = "https://issuer.example.com/.well-known/jwks.json";

/// Deterministic Ed25519 signing key published under `kid`.
pub struct TestKey {
    kid: String,
    signing: SigningKey,
}

impl TestKey {
    pub fn new(kid: &str, seed: u8) -> Self {
        Self {
            kid: kid.to_string(),
            signing: SigningKey::from_bytes(&[seed; 32]),
        }
    }

    pub fn jwk(&self) -> Value {
        json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "alg": "EdDSA",
            "use": "sig",
            "kid": self.kid,
            "x": URL_SAFE_NO_PAD.encode(self.signing.verifying_key().to_bytes()),
        })
    }

    pub fn sign(&self, claims: &Value) -> String {
        let der = self.signing.to_pkcs8_der().expect("pkcs8 der");
        let mut header = Header::new(Algorithm::EdDSA);
        header.kid = Some(self.kid.clone());
        jsonwebtoken::encode(&header, claims, &EncodingKey::from_ed_der(der.as_bytes()))
            .expect("token")
    }

    /// Signs an arbitrary payload, JSON or not.
    pub fn sign_raw(&self, payload: &[u8]) -> String {
        let der = self.signing.to_pkcs8_der().expect("pkcs8 der");
        let mut header = Header::new(Algorithm::EdDSA);
        header.kid = Some(self.kid.clone());
        let message = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header).expect("header")),
            URL_SAFE_NO_PAD.encode(payload),
        );
        let signature = jsonwebtoken::crypto::sign(
            message.as_bytes(),
            &EncodingKey::from_ed_der(der.as_bytes()),
            Algorithm::EdDSA,
        )
        .expect("signature");
        format!("{message}.{signature}")
    }
}

pub fn key_set(keys: &[&TestKey]) -> JwkSet {
    let keys: Vec<Value> = keys.iter().map(|k| k.jwk()).collect();
    serde_json::from_value(json!({ "keys": keys })).expect("jwk set")
}

/// Claim payload accepted by a validator configured with `AUDIENCE`/`ISSUER`.
pub fn claims_for(scope: &str) -> Value {
    let now = chrono::Utc::now().timestamp();
    json!({
        "iss": ISSUER,
        "aud": AUDIENCE,
        "sub": "auth0|user-1",
        "iat": now,
        "exp": now + 3600,
        "scope": scope,
    })
}

pub fn verified_claims(scope: &str) -> Claims {
    serde_json::from_value(claims_for(scope)).expect("claims")
}

pub fn verified_claims_expiring_in(seconds: i64) -> Claims {
    let mut payload = claims_for("get:clients");
    payload["exp"] = json!(chrono::Utc::now().timestamp() + seconds);
    serde_json::from_value(payload).expect("claims")
}

/// In-memory key set that counts how often it was fetched.
pub struct StaticKeySet {
    keys: JwkSet,
    fetches: AtomicUsize,
    delay: Option<Duration>,
}

impl StaticKeySet {
    pub fn new(keys: JwkSet) -> Self {
        Self {
            keys,
            fetches: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeySetSource for StaticKeySet {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn fetch(&self, _url: &str) -> Result<JwkSet, KeySetError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.keys.clone())
    }
}

/// Issuer that is never reachable.
pub struct FailingKeySet;

#[async_trait]
impl KeySetSource for FailingKeySet {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn fetch(&self, _url: &str) -> Result<JwkSet, KeySetError> {
        Err(KeySetError::Invalid("issuer unreachable".to_string()))
    }
}
