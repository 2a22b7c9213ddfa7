use crate::error::WranglerError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// EmbedWrangler application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Embedding resource (GloVe / word2vec text format)
    pub embeddings_path: PathBuf,

    /// Download URL used when the embedding file is missing
    pub embeddings_url: Option<String>,

    /// Expected SHA256 of the downloaded embedding file
    pub embeddings_sha256: Option<String>,

    /// Load at most this many tokens
    pub embeddings_limit: Option<usize>,

    /// Server bind address
    pub server_host: String,

    /// Server port
    pub server_port: u16,

    /// Frontend origin allowed by CORS
    pub cors_origin: String,

    /// Log directory
    pub log_dir: PathBuf,

    /// Log level
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            embeddings_path: PathBuf::from("./data/glove-wiki-gigaword-100.txt"),
            embeddings_url: None,
            embeddings_sha256: None,
            embeddings_limit: None,
            server_host: "0.0.0.0".to_string(),
            server_port: 8000,
            cors_origin: "http://localhost:3000".to_string(),
            log_dir: PathBuf::from("./log"),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self, WranglerError> {
        // Load .env file (ignore if not exists)
        let _ = dotenv::dotenv();

        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WranglerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let server_port = match non_empty("SERVER_PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                WranglerError::config(format!("SERVER_PORT is not a valid port: {}", raw))
            })?,
            None => defaults.server_port,
        };

        let embeddings_limit = match non_empty("EMBEDDINGS_LIMIT") {
            Some(raw) => Some(raw.trim().parse().map_err(|_| {
                WranglerError::config(format!("EMBEDDINGS_LIMIT is not a number: {}", raw))
            })?),
            None => None,
        };

        Ok(Self {
            embeddings_path: non_empty("EMBEDDINGS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.embeddings_path),
            embeddings_url: non_empty("EMBEDDINGS_URL"),
            embeddings_sha256: non_empty("EMBEDDINGS_SHA256").map(|h| h.to_lowercase()),
            embeddings_limit,
            server_host: non_empty("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port,
            cors_origin: non_empty("CORS_ORIGIN").unwrap_or(defaults.cors_origin),
            log_dir: non_empty("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
            log_level: non_empty("LOG_LEVEL").unwrap_or(defaults.log_level),
        })
    }

    /// Get server bind address (host:port)
    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), WranglerError> {
        if self.embeddings_path.as_os_str().is_empty() {
            return Err(WranglerError::config("Embeddings path cannot be empty"));
        }

        if let Some(url) = &self.embeddings_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(WranglerError::config(
                    "Embeddings URL must start with http:// or https://",
                ));
            }
        }

        if self.embeddings_limit == Some(0) {
            return Err(WranglerError::config("Embeddings limit must be at least 1"));
        }

        if !self.cors_origin.starts_with("http://") && !self.cors_origin.starts_with("https://") {
            return Err(WranglerError::config(
                "CORS origin must start with http:// or https://",
            ));
        }

        if self.server_port == 0 {
            return Err(WranglerError::config("Server port cannot be 0"));
        }

        Ok(())
    }
}
