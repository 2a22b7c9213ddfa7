//! Embedding resource downloader
//!
//! Fetches the embedding file on first start when it is not present locally

use crate::{AppConfig, Result, WranglerError};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, Response};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{info, warn};

/// Where the embedding table comes from
#[derive(Debug, Clone)]
pub struct EmbeddingSource {
    /// Local file path
    pub path: PathBuf,

    /// Download URL used when the file is missing
    pub url: Option<String>,

    /// Expected SHA256 (lowercase hex)
    pub sha256: Option<String>,
}

impl EmbeddingSource {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            path: config.embeddings_path.clone(),
            url: config.embeddings_url.clone(),
            sha256: config.embeddings_sha256.clone(),
        }
    }
}

/// Resource downloader
pub struct ResourceDownloader {
    client: Client,
}

impl ResourceDownloader {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(3600)) // 1 hour for large downloads
            .build()
            .map_err(|e| WranglerError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Ensure the embedding file exists, download if missing
    ///
    /// A present file is checked against the configured digest. On a
    /// mismatch it is fetched again when a URL is known, otherwise the
    /// load fails.
    pub async fn ensure(&self, source: &EmbeddingSource) -> Result<PathBuf> {
        if source.path.exists() {
            if self.verify(&source.path, source.sha256.as_deref()).await? {
                info!("Embedding file present: {}", source.path.display());
                return Ok(source.path.clone());
            }

            if source.url.is_none() {
                return Err(WranglerError::embedding_load(format!(
                    "Embedding file {} does not match EMBEDDINGS_SHA256",
                    source.path.display()
                )));
            }
            warn!(
                "Embedding file {} does not match EMBEDDINGS_SHA256, downloading again",
                source.path.display()
            );
        }

        let Some(url) = &source.url else {
            return Err(WranglerError::embedding_load(format!(
                "Embedding file {} not found and EMBEDDINGS_URL is not set",
                source.path.display()
            )));
        };

        info!("Downloading embedding file: {}", url);
        self.download(url, &source.path, source.sha256.as_deref())
            .await?;

        Ok(source.path.clone())
    }

    /// Stream `url` into `dest`, verifying the digest when one is given
    ///
    /// The body goes to `<dest>.tmp` first and only replaces `dest` once it
    /// is complete and verified. The temp file is removed on any failure.
    pub async fn download(&self, url: &str, dest: &Path, expected_sha256: Option<&str>) -> Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| WranglerError::network(format!("Failed to download: {}", e)))?;

        if !response.status().is_success() {
            return Err(WranglerError::network(format!(
                "Download failed with status: {}",
                response.status()
            )));
        }

        let temp_path = dest.with_extension("tmp");
        let outcome = async {
            let (downloaded, actual) = write_body(response, &temp_path).await?;

            if downloaded == 0 {
                return Err(WranglerError::embedding_load("Downloaded embedding file is empty"));
            }

            if let Some(expected) = expected_sha256 {
                if !actual.eq_ignore_ascii_case(expected) {
                    warn!("Checksum mismatch for {}: expected {}, got {}", url, expected, actual);
                    return Err(WranglerError::embedding_load(format!(
                        "Checksum mismatch: expected {}, got {}",
                        expected, actual
                    )));
                }
            }

            Ok(downloaded)
        }
        .await;

        let downloaded = match outcome {
            Ok(downloaded) => downloaded,
            Err(e) => {
                discard(&temp_path).await;
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&temp_path, dest).await {
            discard(&temp_path).await;
            return Err(e.into());
        }

        info!("Download successful: {} ({} bytes)", dest.display(), downloaded);

        Ok(())
    }

    /// Verify file integrity
    pub async fn verify(&self, path: &Path, expected_hash: Option<&str>) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }

        let Some(expected) = expected_hash else {
            return Ok(true);
        };

        info!("Verifying embedding file: {}", path.display());
        Ok(sha256_file(path).await?.eq_ignore_ascii_case(expected))
    }
}

/// Write the response body to `path`, returning its size and hex SHA256
async fn write_body(response: Response, path: &Path) -> Result<(u64, String)> {
    let pb = progress_bar(response.content_length())?;
    let mut file = fs::File::create(path).await?;
    let mut hasher = Sha256::new();
    let mut downloaded: u64 = 0;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                pb.abandon_with_message("Download failed");
                return Err(WranglerError::network(format!("Download error: {}", e)));
            }
        };
        file.write_all(&chunk).await?;
        hasher.update(&chunk);
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }

    pb.finish_with_message("Download complete");
    file.sync_all().await?;

    Ok((downloaded, hex::encode(hasher.finalize())))
}

async fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

/// Hex SHA256 of a file, read in chunks
async fn sha256_file(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];

    loop {
        let read = file.read(&mut buf).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

fn progress_bar(total: Option<u64>) -> Result<ProgressBar> {
    let (pb, template) = match total {
        Some(len) => (
            ProgressBar::new(len),
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
        ),
        None => (
            ProgressBar::new_spinner(),
            "[{elapsed_precise}] {spinner} {bytes} ({bytes_per_sec})",
        ),
    };

    let style = ProgressStyle::default_bar()
        .template(template)
        .map_err(|e| WranglerError::internal(format!("Invalid progress template: {}", e)))?
        .progress_chars("#>-");
    pb.set_style(style);

    Ok(pb)
}
