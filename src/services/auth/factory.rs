/// Factory: build `AuthPipeline` from application `Config`.
use std::sync::Arc;

use tracing::error;

use crate::config::Config;
use crate::error::AppError;
use crate::services::auth::{
    AuthPipeline,
    claims::ClaimsValidator,
    key_set::{HttpKeySetSource, KeySetVerifier},
};
use crate::services::cache::VerificationCache;

pub fn build_auth_pipeline(config: &Config) -> Result<Arc<AuthPipeline>, AppError> {
    let source = HttpKeySetSource::new(config.jwk_fetch_timeout).map_err(|e| {
        error!(error = %e, "failed to build key set http client");
        AppError::Internal
    })?;

    let verifier = KeySetVerifier::new(
        Arc::new(source),
        config.jwk_endpoint.as_str(),
        config.jwk_fetch_timeout,
    );
    let validator = ClaimsValidator::new(
        &config.auth_audience,
        &config.auth_issuer,
        config.access_token_leeway_seconds,
    );
    let cache = Arc::new(VerificationCache::new(
        config.auth_cache_capacity,
        config.auth_cache_ttl,
    ));

    Ok(Arc::new(AuthPipeline::new(verifier, validator, cache)))
}
