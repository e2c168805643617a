//! Failure taxonomy of the auth pipeline.
//!
//! Every variant is terminal for the current request. `is_forbidden` splits
//! the taxonomy into authentication (401) and authorization (403) failures.
use thiserror::Error;

use crate::services::auth::key_set::KeySetError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization header must carry a Bearer token")]
    MissingOrMalformedCredential,

    #[error("signing key set unavailable: {0}")]
    KeySetUnavailable(#[source] KeySetError),

    #[error("token signature did not match any signing key: {0}")]
    InvalidSignature(String),

    #[error("token claims could not be decoded: {0}")]
    ClaimsDecodeError(String),

    #[error("audience is not valid")]
    AudienceMismatch,

    #[error("issuer is not valid")]
    IssuerMismatch,

    #[error("token has expired")]
    TokenExpired,

    #[error("token is not valid yet")]
    TokenNotYetValid,

    #[error("token carries no scope claim")]
    NoScopeClaim,

    #[error("RBAC validation failed for {method} /{resource}")]
    RbacDenied { method: String, resource: String },
}

impl AuthError {
    /// Stable machine-readable code, used in response bodies and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingOrMalformedCredential => "MISSING_OR_MALFORMED_CREDENTIAL",
            Self::KeySetUnavailable(_) => "KEY_SET_UNAVAILABLE",
            Self::InvalidSignature(_) => "INVALID_SIGNATURE",
            Self::ClaimsDecodeError(_) => "CLAIMS_DECODE_ERROR",
            Self::AudienceMismatch => "AUDIENCE_MISMATCH",
            Self::IssuerMismatch => "ISSUER_MISMATCH",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenNotYetValid => "TOKEN_NOT_YET_VALID",
            Self::NoScopeClaim => "NO_SCOPE_CLAIM",
            Self::RbacDenied { .. } => "RBAC_DENIED",
        }
    }

    /// Message safe to hand back to the end client.
    ///
    /// Fetch errors and per-key reasons stay in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::MissingOrMalformedCredential => "authorization header must have a Bearer token",
            Self::KeySetUnavailable(_) => "token could not be verified",
            Self::InvalidSignature(_) => "token signature is not valid",
            Self::ClaimsDecodeError(_) => "token claims are malformed",
            Self::AudienceMismatch => "audience is not valid",
            Self::IssuerMismatch => "issuer is not valid",
            Self::TokenExpired => "token has expired",
            Self::TokenNotYetValid => "token is not valid yet",
            Self::NoScopeClaim => "token has no scope",
            Self::RbacDenied { .. } => "RBAC validation failed",
        }
    }

    /// `true` for authorization failures (403); authentication failures are 401.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::NoScopeClaim | Self::RbacDenied { .. })
    }
}
