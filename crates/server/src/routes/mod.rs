mod arithmetic;
mod neighbors;
mod similarity;
mod system;
mod visualize;

use actix_web::web;

use crate::error::ApiError;

/// Register every route plus extractor error handling
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::bad_request(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::bad_request(err.to_string()).into()),
    )
    .service(similarity::similarity)
    .service(neighbors::nearest_neighbors)
    .service(arithmetic::word_arithmetic)
    .service(visualize::visualize_embeddings)
    .service(system::health)
    .service(system::stats);
}
