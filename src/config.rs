use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Single-user JSON files under the data dir.
    Local,
    /// Per-user Postgres store with JWT accounts.
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Where nutrition estimates come from: any OpenAI-chat-shaped endpoint.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: StorageBackend,
    pub database_url: Option<String>,
    pub data_dir: PathBuf,
    pub model: ModelConfig,
    pub jwt: Option<JwtConfig>,
    pub utc_offset_hours: i8,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let backend = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".into())
            .to_lowercase()
            .as_str()
        {
            "local" => StorageBackend::Local,
            "postgres" | "pg" => StorageBackend::Postgres,
            other => anyhow::bail!("unknown STORAGE_BACKEND '{other}' (expected local or postgres)"),
        };

        let database_url = std::env::var("DATABASE_URL").ok();
        if backend == StorageBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL is required when STORAGE_BACKEND=postgres");
        }

        let jwt = std::env::var("JWT_SECRET").ok().map(|secret| JwtConfig {
            secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "nutridiary".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "nutridiary-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        });
        if backend == StorageBackend::Postgres && jwt.is_none() {
            anyhow::bail!("JWT_SECRET is required when STORAGE_BACKEND=postgres");
        }

        let model = ModelConfig {
            base_url: std::env::var("MODEL_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:11434/v1".into()),
            api_key: std::env::var("MODEL_API_KEY").ok(),
            model: std::env::var("MODEL_NAME").unwrap_or_else(|_| "qwen2.5:14b-instruct".into()),
        };

        Ok(Self {
            backend,
            database_url,
            data_dir: std::env::var("APP_DATA_DIR")
                .unwrap_or_else(|_| "./data".into())
                .into(),
            model,
            jwt,
            utc_offset_hours: std::env::var("APP_UTC_OFFSET_HOURS")
                .ok()
                .and_then(|v| v.parse::<i8>().ok())
                .unwrap_or(0),
        })
    }

    /// Offset used for every calendar-date decision (rollups, display labels).
    pub fn utc_offset(&self) -> time::UtcOffset {
        time::UtcOffset::from_hms(self.utc_offset_hours, 0, 0).unwrap_or(time::UtcOffset::UTC)
    }
}
