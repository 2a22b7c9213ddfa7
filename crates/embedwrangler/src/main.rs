use anyhow::Result;
use clap::{Parser, Subcommand};
use embedwrangler_common::{logger, AppConfig, EmbeddingSource, ResourceDownloader};
use embedwrangler_vector::EmbeddingStore;
use std::path::PathBuf;
use std::sync::Arc;

/// Find project root by looking for .git directory
fn find_project_root() -> Option<PathBuf> {
    let mut current_dir = std::env::current_dir().ok()?;

    loop {
        if current_dir.join(".git").exists() {
            return Some(current_dir);
        }

        if !current_dir.pop() {
            break;
        }
    }

    None
}

/// Load .env file from project root
fn load_dotenv_from_project_root() {
    if let Some(env_path) = find_project_root()
        .map(|root| root.join(".env"))
        .filter(|path| path.exists())
    {
        dotenv::from_path(&env_path).ok();
    } else {
        dotenv::dotenv().ok();
    }
}

#[derive(Parser)]
#[command(name = "embedwrangler")]
#[command(about = "EmbedWrangler - word embedding similarity, analogy and projection API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the embeddings and start the HTTP server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long)]
        port: Option<u16>,

        /// Embedding file (GloVe / word2vec text format)
        #[arg(long)]
        embeddings: Option<PathBuf>,

        /// Load at most this many tokens
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Load the embedding file and print its statistics
    Check {
        /// Embedding file (defaults to EMBEDDINGS_PATH)
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    load_dotenv_from_project_root();
    let mut config = AppConfig::from_env()?;

    match cli.command {
        Some(Commands::Serve {
            host,
            port,
            embeddings,
            limit,
        }) => {
            if let Some(host) = host {
                config.server_host = host;
            }
            if let Some(port) = port {
                config.server_port = port;
            }
            if let Some(path) = embeddings {
                config.embeddings_path = path;
            }
            if limit.is_some() {
                config.embeddings_limit = limit;
            }
            config.validate()?;

            logger::setup_logging(&config.log_dir, &config.log_level)?;
            serve(config).await?;
        }
        Some(Commands::Check { path }) => {
            logger::setup_console_logging(&config.log_level)?;

            let path = path.unwrap_or(config.embeddings_path);
            let limit = config.embeddings_limit;
            let store = tokio::task::spawn_blocking(move || EmbeddingStore::load(&path, limit))
                .await??;

            let stats = store.stats();
            println!("Source:      {}", stats.source);
            println!("Vocabulary:  {}", stats.vocabulary_size);
            println!("Dimensions:  {}", stats.dimensions);
        }
        None => {
            logger::setup_logging(&config.log_dir, &config.log_level)?;
            serve(config).await?;
        }
    }

    Ok(())
}

async fn serve(config: AppConfig) -> Result<()> {
    tracing::info!("EmbedWrangler starting...");
    tracing::info!("Configuration loaded:");
    tracing::info!("  Bind: {}", config.server_bind_address());
    tracing::info!("  Embeddings: {}", config.embeddings_path.display());
    tracing::info!("  CORS origin: {}", config.cors_origin);

    // Fetch the embedding file on first start if a URL is configured
    let source = EmbeddingSource::from_config(&config);
    let path = ResourceDownloader::new()?.ensure(&source).await?;

    // The table must be fully loaded before the listener accepts traffic
    let limit = config.embeddings_limit;
    let store = tokio::task::spawn_blocking(move || EmbeddingStore::load(&path, limit)).await??;

    println!("Server listening on http://{}", config.server_bind_address());

    embedwrangler_server::start_server(config, Arc::new(store)).await?;

    Ok(())
}
