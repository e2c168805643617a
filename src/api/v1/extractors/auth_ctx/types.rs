/*
 * Responsibility
 * - The "authenticated context" type handlers see
 * - Built by the access middleware from verified claims and stored in request extensions
 */
use crate::services::auth::claims::Claims;

/// Context attached to every request that passed the access middleware.
///
/// - `subject` is the identity provider's `sub`
/// - `scopes` are the raw scope items (`method:resource`)
/// - `email` comes from the `<audience>email` custom claim, when present
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub subject: Option<String>,
    pub scopes: Vec<String>,
    pub email: Option<String>,
}

impl AuthCtx {
    pub fn from_claims(claims: &Claims, audience: &str) -> Self {
        Self {
            subject: claims.sub.clone(),
            scopes: claims.scopes().into_iter().map(str::to_string).collect(),
            email: claims.email(audience).map(str::to_string),
        }
    }
}
