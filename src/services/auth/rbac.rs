//! Scope-based access control.
//!
//! A scope `method:resource` grants `method` on a resource class. Only the
//! first path segment of the request is compared: `get:clients` covers
//! `GET /clients` and `GET /clients/abc123` alike, but never `GET /client`.
use crate::services::auth::{claims::Claims, error::AuthError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub method: String,
    pub resource: String,
}

impl Scope {
    /// Parse one `method:resource` item. Anything after a second `:` is ignored.
    pub fn parse(item: &str) -> Option<Self> {
        let mut parts = item.split(':');
        let method = parts.next().filter(|m| !m.is_empty())?;
        let resource = parts.next().filter(|r| !r.is_empty())?;
        Some(Self {
            method: method.to_string(),
            resource: resource.to_string(),
        })
    }

    pub fn permits(&self, method: &str, resource: &str) -> bool {
        self.method.eq_ignore_ascii_case(method) && self.resource.eq_ignore_ascii_case(resource)
    }
}

pub fn parse_scopes(scope: &str) -> Vec<Scope> {
    scope.split_whitespace().filter_map(Scope::parse).collect()
}

/// First segment of a path with surrounding slashes trimmed (`/clients/42/` -> `clients`).
pub fn base_resource(path: &str) -> &str {
    path.trim_matches('/').split('/').next().unwrap_or_default()
}

/// Allow the request if any scope of `claims` matches `method` and the
/// first segment of `path`.
pub fn authorize(claims: &Claims, method: &str, path: &str) -> Result<(), AuthError> {
    let scope = claims
        .scope
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or(AuthError::NoScopeClaim)?;

    let resource = base_resource(path);
    if parse_scopes(scope)
        .iter()
        .any(|granted| granted.permits(method, resource))
    {
        return Ok(());
    }

    Err(AuthError::RbacDenied {
        method: method.to_string(),
        resource: resource.to_string(),
    })
}
