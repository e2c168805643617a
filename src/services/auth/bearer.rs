//! Bearer token extraction.
//!
//! `parse_bearer` is the single parser; transport types only say where their
//! `Authorization` header lives through [`AuthorizationSource`].
use axum::http::{HeaderMap, Request, header, request::Parts};

use crate::services::auth::error::AuthError;

const SCHEME: &str = "Bearer";

/// Parse an `Authorization` header value into the raw token.
///
/// The value must be exactly `Bearer <token>` (scheme is case-sensitive).
pub fn parse_bearer(value: Option<&str>) -> Result<&str, AuthError> {
    let value = value.ok_or(AuthError::MissingOrMalformedCredential)?;

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(SCHEME), Some(token), None) => Ok(token),
        _ => Err(AuthError::MissingOrMalformedCredential),
    }
}

/// Anything that can hand out its `Authorization` header.
pub trait AuthorizationSource {
    fn authorization(&self) -> Option<&str>;

    fn bearer_token(&self) -> Result<&str, AuthError> {
        parse_bearer(self.authorization())
    }
}

impl AuthorizationSource for HeaderMap {
    fn authorization(&self) -> Option<&str> {
        // Non-ASCII header bytes are treated the same as a missing header.
        self.get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
    }
}

impl AuthorizationSource for Parts {
    fn authorization(&self) -> Option<&str> {
        self.headers.authorization()
    }
}

impl<B> AuthorizationSource for Request<B> {
    fn authorization(&self) -> Option<&str> {
        self.headers().authorization()
    }
}
