//! EmbedWrangler Vector Engine
//!
//! In-memory word embedding table with similarity, ranked neighbour
//! search, analogy arithmetic and 2-D projection

mod loader;
mod projection;
mod similarity;
mod store;
mod types;

pub use loader::{parse_embeddings, RawTable};
pub use projection::{project_2d, PROJECTION_COMPONENTS};
pub use similarity::{cosine_similarity, euclidean_distance, l2_norm, unit_vector};
pub use store::EmbeddingStore;
pub use types::{Neighbor, Projection, SimilarityScores, StoreStats};
