use embedwrangler_common::AppConfig;
use embedwrangler_vector::EmbeddingStore;
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,

    /// Embedding table, loaded once before the listener starts
    pub store: Arc<EmbeddingStore>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: AppConfig, store: Arc<EmbeddingStore>) -> Self {
        Self { config, store }
    }
}
