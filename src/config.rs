/*
 * Responsibility
 * - Load settings from the environment (.env honoured): listen port, CORS, auth
 * - Validate values up front (missing or invalid -> startup fails)
 */
use std::fmt;
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,
    pub request_timeout: Duration,

    // Key set published by the identity provider (JWKS).
    pub jwk_endpoint: Url,
    pub jwk_fetch_timeout: Duration,

    pub auth_issuer: String,
    pub auth_audience: String,
    pub access_token_leeway_seconds: u64,

    pub auth_cache_capacity: NonZeroUsize,
    pub auth_cache_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the process env in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = parse_or(&lookup, "PORT", 3000)?;
        let addr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV"));

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let request_timeout = Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECONDS", 30)?);
        if request_timeout.is_zero() {
            return Err(ConfigError::Invalid("REQUEST_TIMEOUT_SECONDS"));
        }

        let jwk_endpoint = required(&lookup, "JWK_ENDPOINT")?;
        let jwk_endpoint =
            Url::parse(&jwk_endpoint).map_err(|_| ConfigError::Invalid("JWK_ENDPOINT"))?;
        if !matches!(jwk_endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid("JWK_ENDPOINT"));
        }

        let jwk_fetch_timeout =
            Duration::from_secs(parse_or(&lookup, "JWK_FETCH_TIMEOUT_SECONDS", 5)?);
        if jwk_fetch_timeout.is_zero() {
            return Err(ConfigError::Invalid("JWK_FETCH_TIMEOUT_SECONDS"));
        }

        let auth_issuer = required(&lookup, "AUTH_ISSUER")?;
        let auth_audience = required(&lookup, "AUTH_AUDIENCE")?;
        let access_token_leeway_seconds = parse_or(&lookup, "ACCESS_TOKEN_LEEWAY_SECONDS", 0)?;

        let auth_cache_capacity: usize = parse_or(&lookup, "AUTH_CACHE_CAPACITY", 128)?;
        let auth_cache_capacity = NonZeroUsize::new(auth_cache_capacity)
            .ok_or(ConfigError::Invalid("AUTH_CACHE_CAPACITY"))?;

        let auth_cache_ttl = Duration::from_secs(parse_or(&lookup, "AUTH_CACHE_TTL_SECONDS", 3600)?);

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            request_timeout,
            jwk_endpoint,
            jwk_fetch_timeout,
            auth_issuer,
            auth_audience,
            access_token_leeway_seconds,
            auth_cache_capacity,
            auth_cache_ttl,
        })
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(key))
}

// Unset falls back to `default`; set-but-unparsable is an error.
fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}
