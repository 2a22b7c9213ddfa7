pub mod config;
pub mod downloader;
pub mod error;
pub mod logger;

// Re-export commonly used types
pub use config::AppConfig;
pub use downloader::{EmbeddingSource, ResourceDownloader};
pub use error::WranglerError;
pub type Result<T> = std::result::Result<T, WranglerError>;
