//! EmbedWrangler HTTP Server
//!
//! Actix-web REST API over the in-memory embedding store

mod error;
mod routes;
mod state;
mod types;


use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use embedwrangler_common::{AppConfig, Result};
use embedwrangler_vector::EmbeddingStore;
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;

pub use error::ApiError;
pub use routes::configure;
pub use state::AppState;
pub use types::{ErrorResponse, NeighborsQuery, WordList, WordPair, ANALOGY_TOP_K, MIN_WORDS};

/// CORS policy: one frontend origin, any method and header, credentials allowed
pub fn cors(origin: &str) -> Cors {
    Cors::default()
        .allowed_origin(origin)
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}

/// Run the HTTP server until shutdown
///
/// The store must already be loaded; the listener only binds afterwards.
pub async fn start_server(config: AppConfig, store: Arc<EmbeddingStore>) -> Result<()> {
    let bind_addr = config.server_bind_address();
    let state = web::Data::new(AppState::new(config, store));

    info!(
        "HTTP server listening on http://{} (CORS origin: {})",
        bind_addr, state.config.cors_origin
    );

    HttpServer::new(move || {
        App::new()
            .wrap(cors(&state.config.cors_origin))
            .wrap(TracingLogger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind(&bind_addr)?
    .run()
    .await?;

    info!("HTTP server stopped");
    Ok(())
}
