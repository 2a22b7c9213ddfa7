use chrono::{DateTime, Utc};
use serde::Serialize;

/// Pairwise similarity between two tokens
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimilarityScores {
    /// Cosine similarity (-1.0 to 1.0)
    pub cosine_similarity: f32,

    /// Euclidean (L2) distance
    pub euclidean_distance: f32,
}

/// Ranked neighbour
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighbor {
    /// Vocabulary token
    pub word: String,

    /// Cosine similarity to the query
    pub similarity: f32,
}

impl Neighbor {
    pub fn new(word: impl Into<String>, similarity: f32) -> Self {
        Self {
            word: word.into(),
            similarity,
        }
    }
}

/// 2-D projection of a batch of tokens, in input order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub words: Vec<String>,
    pub coordinates: Vec<[f32; 2]>,
}

/// Embedding store statistics
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    /// Number of tokens
    pub vocabulary_size: usize,

    /// Vector dimensionality
    pub dimensions: usize,

    /// Where the table was loaded from
    pub source: String,

    /// When the table was loaded
    pub loaded_at: DateTime<Utc>,
}
