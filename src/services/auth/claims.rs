//! Claim decoding and validation for signature-confirmed tokens.
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::services::auth::error::AuthError;

/// `aud` may be a single string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn contains(&self, expected: &str) -> bool {
        match self {
            Audience::Single(aud) => aud == expected,
            Audience::Many(auds) => auds.iter().any(|aud| aud == expected),
        }
    }
}

/// Decoded claims of a verified access token.
///
/// Unknown claims (e.g. namespaced custom claims) are kept in `extra`.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default)]
    pub aud: Option<Audience>,
    pub exp: i64,

    #[serde(default)]
    pub nbf: Option<i64>,
    #[serde(default)]
    pub sub: Option<String>,

    // Space-separated `method:resource` pairs.
    #[serde(default)]
    pub scope: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// Raw scope items, in token order.
    pub fn scopes(&self) -> Vec<&str> {
        self.scope
            .as_deref()
            .map(|s| s.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// A string-valued custom claim published under `<namespace><name>`.
    pub fn namespaced(&self, namespace: &str, name: &str) -> Option<&str> {
        self.extra
            .get(&format!("{namespace}{name}"))
            .and_then(Value::as_str)
    }

    /// Email of the subject; identity providers namespace it by the API audience.
    pub fn email(&self, audience: &str) -> Option<&str> {
        self.namespaced(audience, "email")
    }

    /// Time left before `exp`, or `None` once it has passed.
    pub fn remaining_lifetime(&self, now: i64) -> Option<Duration> {
        let left = self.exp.checked_sub(now)?;
        (left > 0).then(|| Duration::from_secs(left as u64))
    }
}

/// Checks expiry, audience and issuer against the configured values.
#[derive(Debug, Clone)]
pub struct ClaimsValidator {
    audience: String,
    issuer: String,
    leeway_seconds: u64,
}

impl ClaimsValidator {
    pub fn new(audience: impl Into<String>, issuer: impl Into<String>, leeway_seconds: u64) -> Self {
        Self {
            audience: audience.into(),
            issuer: issuer.into(),
            leeway_seconds,
        }
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn validate(&self, payload: Value) -> Result<Claims, AuthError> {
        self.validate_at(payload, chrono::Utc::now().timestamp())
    }

    pub fn validate_at(&self, payload: Value, now: i64) -> Result<Claims, AuthError> {
        let claims: Claims = serde_json::from_value(payload)
            .map_err(|e| AuthError::ClaimsDecodeError(e.to_string()))?;

        let leeway = i64::try_from(self.leeway_seconds).unwrap_or(i64::MAX);

        // Expired at or after `exp`.
        if now >= claims.exp.saturating_add(leeway) {
            return Err(AuthError::TokenExpired);
        }
        if let Some(nbf) = claims.nbf
            && nbf > now.saturating_add(leeway)
        {
            return Err(AuthError::TokenNotYetValid);
        }

        if !claims
            .aud
            .as_ref()
            .is_some_and(|aud| aud.contains(&self.audience))
        {
            return Err(AuthError::AudienceMismatch);
        }

        if claims.iss.as_deref() != Some(self.issuer.as_str()) {
            return Err(AuthError::IssuerMismatch);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::test_support::{AUDIENCE, ISSUER, claims_for};
    use serde_json::json;

    fn validator() -> ClaimsValidator {
        ClaimsValidator::new(AUDIENCE, ISSUER, 0)
    }

    #[test]
    fn accepts_matching_claims() {
        let claims = validator().validate(claims_for("post:clients")).expect("valid");
        assert_eq!(claims.iss.as_deref(), Some(ISSUER));
        assert_eq!(claims.scopes(), vec!["post:clients"]);
    }

    #[test]
    fn expired_one_second_ago_is_rejected() {
        let now = 1_700_000_000;
        let mut payload = claims_for("post:clients");
        payload["exp"] = json!(now - 1);

        let err = validator().validate_at(payload, now).unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[test]
    fn leeway_extends_expiry() {
        let now = 1_700_000_000;
        let mut payload = claims_for("post:clients");
        payload["exp"] = json!(now - 1);

        let lenient = ClaimsValidator::new(AUDIENCE, ISSUER, 30);
        assert!(lenient.validate_at(payload, now).is_ok());
    }

    #[test]
    fn future_nbf_is_rejected() {
        let now = 1_700_000_000;
        let mut payload = claims_for("post:clients");
        payload["exp"] = json!(now + 600);
        payload["nbf"] = json!(now + 60);

        let err = validator().validate_at(payload, now).unwrap_err();
        assert!(matches!(err, AuthError::TokenNotYetValid));
    }

    #[test]
    fn audience_must_match_exactly() {
        let mut payload = claims_for("post:clients");
        payload["aud"] = json!("https://api.example.com");
        assert!(matches!(
            validator().validate(payload).unwrap_err(),
            AuthError::AudienceMismatch
        ));

        let mut missing = claims_for("post:clients");
        missing.as_object_mut().unwrap().remove("aud");
        assert!(matches!(
            validator().validate(missing).unwrap_err(),
            AuthError::AudienceMismatch
        ));
    }

    #[test]
    fn audience_array_containing_expected_value_matches() {
        let mut payload = claims_for("post:clients");
        payload["aud"] = json!(["https://other.example.com/", AUDIENCE]);
        assert!(validator().validate(payload).is_ok());
    }

    #[test]
    fn issuer_must_match_exactly() {
        let mut payload = claims_for("post:clients");
        payload["iss"] = json!("https://evil.example.com/");
        assert!(matches!(
            validator().validate(payload).unwrap_err(),
            AuthError::IssuerMismatch
        ));
    }

    #[test]
    fn undecodable_payload_is_claims_decode_error() {
        for payload in [
            json!("just a string"),
            json!({ "iss": ISSUER, "aud": AUDIENCE }),
            json!({ "iss": ISSUER, "aud": AUDIENCE, "exp": "tomorrow" }),
        ] {
            assert!(matches!(
                validator().validate(payload).unwrap_err(),
                AuthError::ClaimsDecodeError(_)
            ));
        }
    }

    #[test]
    fn email_is_namespaced_by_audience() {
        let mut payload = claims_for("post:clients");
        payload[format!("{AUDIENCE}email")] = json!("someone@example.com");
        let claims = validator().validate(payload).expect("valid");

        assert_eq!(claims.email(AUDIENCE), Some("someone@example.com"));
        assert_eq!(claims.email("https://other.example.com/"), None);
    }

    #[test]
    fn remaining_lifetime_is_none_after_expiry() {
        let claims = validator().validate(claims_for("get:clients")).expect("valid");
        assert!(claims.remaining_lifetime(claims.exp - 10).is_some());
        assert_eq!(claims.remaining_lifetime(claims.exp), None);
    }
}
