/*
 * Responsibility
 * - Config -> dependencies -> Router
 * - Apply middleware (auth on /api/v1, CORS, request tracing)
 * - Start with axum::serve()
 */
use anyhow::Result;
use axum::{Router, routing::get};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api::{self, v1::handlers::health::health},
    config::Config,
    middleware,
    services::auth::build_auth_pipeline,
    state::AppState,
};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,intake_auth=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    tracing::info!(
        addr = %config.addr,
        env = ?config.app_env,
        jwk_endpoint = %config.jwk_endpoint,
        cache_capacity = config.auth_cache_capacity.get(),
        cache_ttl = ?config.auth_cache_ttl,
        "starting intake API"
    );

    let auth = build_auth_pipeline(&config)?;
    let state = AppState::new(auth);
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api::v1::routes(state.clone()))
        .with_state(state);

    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router, config.request_timeout)
}
