pub mod bearer;
pub mod claims;
pub mod error;
pub mod factory;
pub mod key_set;
pub mod pipeline;
pub mod rbac;

#[cfg(test)]
pub mod test_support;

pub use error::AuthError;
pub use factory::build_auth_pipeline;
pub use pipeline::AuthPipeline;
