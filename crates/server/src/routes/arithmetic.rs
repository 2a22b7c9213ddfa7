use actix_web::{post, web, HttpResponse};
use tracing::debug;

use crate::error::{lookup_failed, ApiError};
use crate::state::AppState;
use crate::types::{WordList, ANALOGY_TOP_K, MIN_WORDS};

/// Word arithmetic: every word but the last is added, the last is subtracted
#[post("/word_arithmetic")]
pub async fn word_arithmetic(
    req: web::Json<WordList>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let words = &req.words;
    if words.len() < MIN_WORDS {
        return Err(ApiError::bad_request(format!(
            "Word arithmetic needs at least {} words",
            MIN_WORDS
        )));
    }

    let (positive, negative) = words.split_at(words.len() - 1);
    debug!("word_arithmetic: +{:?} -{:?}", positive, negative);

    let results = state
        .store
        .nearest_by_analogy(positive, negative, ANALOGY_TOP_K)
        .map_err(lookup_failed(
            "One or more words not found in the embedding vocabulary",
        ))?;

    Ok(HttpResponse::Ok().json(results))
}
