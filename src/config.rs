//! Process configuration, read once at startup.

use anyhow::{bail, Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_FAL_RUN_URL: &str = "https://fal.run";
pub const DEFAULT_FAL_REST_URL: &str = "https://rest.alpha.fal.ai";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Provider credential, sent as `Authorization: Key <fal_key>`.
    pub fal_key: String,
    pub fal_run_url: String,
    pub fal_rest_url: String,
    pub storage_dir: PathBuf,
    pub frontend_dist: PathBuf,
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Values are trimmed and empty
    /// values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let Some(fal_key) = get("FAL_KEY") else {
            bail!("Set FAL_KEY in your environment or .env file; it is required to reach the inference provider.");
        };

        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("PORT must be a valid port number, got {raw:?}"))?,
            None => 8000,
        };

        let max_upload_mb = match get("MAX_UPLOAD_MB") {
            Some(raw) => raw
                .parse::<usize>()
                .with_context(|| format!("MAX_UPLOAD_MB must be a whole number, got {raw:?}"))?,
            None => 50,
        };
        let Some(max_upload_bytes) = max_upload_mb.checked_mul(1024 * 1024) else {
            bail!("MAX_UPLOAD_MB must be a whole number of megabytes that fits in memory, got {max_upload_mb}");
        };

        Ok(Self {
            fal_key,
            fal_run_url: get("FAL_RUN_URL")
                .unwrap_or_else(|| DEFAULT_FAL_RUN_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            fal_rest_url: get("FAL_REST_URL")
                .unwrap_or_else(|| DEFAULT_FAL_REST_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            storage_dir: get("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("storage")),
            frontend_dist: get("FRONTEND_DIST")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("frontend/dist")),
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            max_upload_bytes,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}
