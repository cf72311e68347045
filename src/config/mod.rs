use std::env;
use std::time::Duration;

use crate::reasoning::client::{DEFAULT_ENDPOINT, DEFAULT_MODEL};

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3039";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Auth
    pub secret_key: String,
    pub access_token_expire_minutes: i64,
    pub cors_origins: Vec<String>,

    // Reasoning service (optional; import and ask are unavailable without a token)
    pub reasoning_api_key: Option<String>,
    pub reasoning_endpoint: String,
    pub reasoning_model: String,
    pub reasoning_timeout_secs: u64,

    // Uploads
    pub avatar_dir: String,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            host: env::var("BACKEND_HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: env::var("BACKEND_PORT")
                .unwrap_or_else(|_| "8000".into())
                .parse()?,
            environment: env::var("PROJECT_ENV").unwrap_or_else(|_| "development".into()),

            secret_key: env::var("SECRET_KEY")
                .ok()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| anyhow::anyhow!("SECRET_KEY must be set"))?,
            access_token_expire_minutes: env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
                .unwrap_or_else(|_| "30".into())
                .parse()
                .unwrap_or(30),
            cors_origins: parse_list(
                &env::var("CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.into()),
            ),

            reasoning_api_key: env::var("GITHUB_TOKEN").ok().filter(|s| !s.is_empty()),
            reasoning_endpoint: env::var("REASONING_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_ENDPOINT.into()),
            reasoning_model: env::var("REASONING_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
            reasoning_timeout_secs: env::var("REASONING_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".into())
                .parse()
                .unwrap_or(30),

            avatar_dir: env::var("AVATAR_DIR").unwrap_or_else(|_| "uploads/avatars".into()),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| "10485760".into())
                .parse()
                .unwrap_or(10 * 1024 * 1024),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn reasoning_timeout(&self) -> Duration {
        Duration::from_secs(self.reasoning_timeout_secs)
    }
}

/// Split a comma-separated list, dropping blanks.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
