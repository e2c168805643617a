use serde::Serialize;

use crate::api::v1::extractors::AuthCtx;

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub subject: Option<String>,
    pub email: Option<String>,
    pub scopes: Vec<String>,
}

impl From<AuthCtx> for SessionResponse {
    fn from(ctx: AuthCtx) -> Self {
        Self {
            subject: ctx.subject,
            email: ctx.email,
            scopes: ctx.scopes,
        }
    }
}
