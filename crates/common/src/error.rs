/// EmbedWrangler error types
#[derive(Debug, thiserror::Error)]
pub enum WranglerError {
    /// Token is not part of the embedding vocabulary
    #[error("Word not found in the embedding vocabulary: {0}")]
    VocabularyNotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Embedding resource could not be loaded or parsed
    #[error("Embedding load error: {0}")]
    EmbeddingLoad(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network/HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General error (anyhow integration)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WranglerError {
    /// Create vocabulary miss error
    pub fn not_found<S: Into<String>>(token: S) -> Self {
        Self::VocabularyNotFound(token.into())
    }

    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create embedding load error
    pub fn embedding_load<S: Into<String>>(msg: S) -> Self {
        Self::EmbeddingLoad(msg.into())
    }

    /// Create config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Create internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            Self::VocabularyNotFound(_) => 404,
            Self::InvalidInput(_) => 400,
            Self::Network(_) => 503,
            Self::EmbeddingLoad(_)
            | Self::Config(_)
            | Self::Internal(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Other(_) => 500,
        }
    }

    /// Whether this is a vocabulary miss
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::VocabularyNotFound(_))
    }
}
