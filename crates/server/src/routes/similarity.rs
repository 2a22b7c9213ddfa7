use actix_web::{post, web, HttpResponse};
use tracing::debug;

use crate::error::{lookup_failed, ApiError};
use crate::state::AppState;
use crate::types::WordPair;

/// Cosine similarity and Euclidean distance between two words
#[post("/similarity")]
pub async fn similarity(
    req: web::Json<WordPair>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    debug!("similarity: {:?} / {:?}", req.word1, req.word2);

    let scores = state
        .store
        .similarity(&req.word1, &req.word2)
        .map_err(lookup_failed(
            "One or both words not found in the embedding vocabulary",
        ))?;

    Ok(HttpResponse::Ok().json(scores))
}
