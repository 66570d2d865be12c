use anyhow::{Context, Result, anyhow};
use chrono::{FixedOffset, Offset, Utc};
use std::env;
use std::str::FromStr;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,

    /// Enforce bearer tokens and the role policy on `/api` routes
    pub auth_required: bool,

    /// Every date is normalized to this offset before it is stored or compared
    pub service_offset: FixedOffset,

    pub json_limit_bytes: usize,
    pub cors_origins: Vec<String>,

    pub api_prefix: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_string()),
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", "10")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            access_token_ttl: parse_var("ACCESS_TOKEN_TTL", "28800")?, // default 8h, one school day
            auth_required: parse_var("AUTH_REQUIRED", "false")?,
            service_offset: parse_offset(
                &env::var("SERVICE_UTC_OFFSET").unwrap_or_else(|_| "+08:00".to_string()),
            )?,
            json_limit_bytes: parse_var("JSON_LIMIT_BYTES", "10485760")?,
            cors_origins: env::var("CORS_ORIGINS")
                .map(|v| split_origins(&v))
                .unwrap_or_default(),
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
        })
    }
}

fn parse_var<T>(name: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .map_err(|e| anyhow!("{name} has invalid value {raw:?}: {e}"))
}

pub fn parse_offset(raw: &str) -> Result<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("utc") || raw.eq_ignore_ascii_case("z") {
        return Ok(Utc.fix());
    }
    FixedOffset::from_str(raw)
        .map_err(|e| anyhow!("SERVICE_UTC_OFFSET must look like +08:00, got {raw:?}: {e}"))
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
