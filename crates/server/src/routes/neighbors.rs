use actix_web::{get, web, HttpResponse};
use tracing::debug;

use crate::error::{lookup_failed, ApiError};
use crate::state::AppState;
use crate::types::NeighborsQuery;

/// Most similar words to `word`, best first
#[get("/nearest_neighbors")]
pub async fn nearest_neighbors(
    query: web::Query<NeighborsQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    if query.n == 0 {
        return Err(ApiError::bad_request("n must be at least 1"));
    }

    debug!("nearest_neighbors: {:?} (n={})", query.word, query.n);

    // most_similar caps n at the vocabulary size
    let neighbors = state
        .store
        .most_similar(&query.word, query.n)
        .map_err(lookup_failed("Word not found in the embedding vocabulary"))?;

    Ok(HttpResponse::Ok().json(neighbors))
}
