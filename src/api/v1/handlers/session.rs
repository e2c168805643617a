/*
 * Responsibility
 * - GET /api/v1/session: echo the authenticated context (requires `get:session`)
 */
use axum::Json;

use crate::api::v1::{dto::session::SessionResponse, extractors::AuthCtxExtractor};

pub async fn session(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<SessionResponse> {
    Json(SessionResponse::from(ctx))
}
