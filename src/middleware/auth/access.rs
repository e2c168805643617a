//! Access gate: bearer token → verification → RBAC → `AuthCtx` in extensions.
//!
//! Failures are terminal: 401 for authentication, 403 for scope failures.
//! The reason (with internal detail) is logged; the client only sees the code.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::state::AppState;

/// Put every route of `router` behind the access middleware.
///
/// ```ignore
/// let v1 = Router::new().route("/session", get(session));
/// let v1 = middleware::auth::access::apply(v1, state.clone());
/// app = app.nest("/api/v1", v1);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // Inside a nested router the URI is relative to the mount point
    // (`/api/v1/clients/42` arrives as `/clients/42`).
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let claims = match state
        .auth
        .authorize(req.headers(), method.as_str(), &path)
        .await
    {
        Ok(claims) => claims,
        Err(err) => {
            tracing::warn!(
                code = err.code(),
                error = %err,
                method = %method,
                path = %path,
                "request denied"
            );
            return Err(err.into());
        }
    };

    let auth_ctx = AuthCtx::from_claims(&claims, state.auth.audience());

    // middleware → extractor
    req.extensions_mut().insert(auth_ctx);

    Ok(next.run(req).await)
}
