/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - Hand the verified request context (AuthCtx) to handlers
 * - axum-specific code lives in `core`, the type itself in `types`
 */

mod core;
mod types;

pub use self::core::AuthCtxExtractor;
pub use self::types::AuthCtx;
