//! Request gate: bearer → cache → key set → claims → cache insert → RBAC.
use std::sync::Arc;

use tracing::debug;

use crate::services::auth::{
    bearer::AuthorizationSource,
    claims::{Claims, ClaimsValidator},
    error::AuthError,
    key_set::KeySetVerifier,
    rbac,
};
use crate::services::cache::VerificationCache;

pub struct AuthPipeline {
    verifier: KeySetVerifier,
    validator: ClaimsValidator,
    cache: Arc<VerificationCache>,
}

impl std::fmt::Debug for AuthPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthPipeline")
            .field("verifier", &self.verifier)
            .field("validator", &self.validator)
            .field("cache_ttl", &self.cache.ttl())
            .finish()
    }
}

impl AuthPipeline {
    pub fn new(
        verifier: KeySetVerifier,
        validator: ClaimsValidator,
        cache: Arc<VerificationCache>,
    ) -> Self {
        Self {
            verifier,
            validator,
            cache,
        }
    }

    pub fn audience(&self) -> &str {
        self.validator.audience()
    }

    /// Authenticate the bearer token of `request`, then authorize `method` on `path`.
    ///
    /// `path` must be relative to the API mount point so its first segment
    /// names the resource class.
    pub async fn authorize<R>(
        &self,
        request: &R,
        method: &str,
        path: &str,
    ) -> Result<Arc<Claims>, AuthError>
    where
        R: AuthorizationSource + ?Sized,
    {
        let token = request.bearer_token()?;
        let claims = self.authenticate(token).await?;

        // RBAC always runs against the current request, hit or miss.
        rbac::authorize(&claims, method, path)?;
        Ok(claims)
    }

    /// Verify `token` (or reuse a cached verification) and return its claims.
    pub async fn authenticate(&self, token: &str) -> Result<Arc<Claims>, AuthError> {
        if let Some(claims) = self.cache.lookup(token) {
            debug!(stats = ?self.cache.stats(), "verification cache hit");
            return Ok(claims);
        }

        let payload = self.verifier.verify(token).await?;
        let claims = Arc::new(self.validator.validate(payload)?);

        self.cache.store(token, Arc::clone(&claims));
        debug!(stats = ?self.cache.stats(), "token verified and cached");

        Ok(claims)
    }
}
