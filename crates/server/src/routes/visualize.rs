use actix_web::{post, web, HttpResponse};
use tracing::debug;

use crate::error::{lookup_failed, ApiError};
use crate::state::AppState;
use crate::types::{WordList, MIN_WORDS};

/// 2-D PCA coordinates for the given words, in request order
#[post("/visualize_embeddings")]
pub async fn visualize_embeddings(
    req: web::Json<WordList>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    if req.words.len() < MIN_WORDS {
        return Err(ApiError::bad_request(format!(
            "Visualization needs at least {} words",
            MIN_WORDS
        )));
    }

    debug!("visualize_embeddings: {} words", req.words.len());

    let projection = state
        .store
        .project(req.words.as_slice())
        .map_err(lookup_failed(
            "One or more words not found in the embedding vocabulary",
        ))?;

    Ok(HttpResponse::Ok().json(projection))
}
