/*
 * Responsibility
 * - URL layout of v1
 * - Everything nested here sits behind the access middleware; paths are
 *   relative to /api/v1, so the first segment is the RBAC resource class
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::session::session;
use crate::middleware::auth::access;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let router = Router::new().route("/session", get(session));

    access::apply(router, state)
}
