use serde::{Deserialize, Serialize};

/// Number of matches returned by word arithmetic
pub const ANALOGY_TOP_K: usize = 5;

/// Minimum words for arithmetic and visualization
pub const MIN_WORDS: usize = 2;

/// Similarity request
#[derive(Debug, Deserialize)]
pub struct WordPair {
    pub word1: String,
    pub word2: String,
}

/// Word list request (arithmetic, visualization)
#[derive(Debug, Deserialize)]
pub struct WordList {
    pub words: Vec<String>,
}

/// Nearest neighbours query
#[derive(Debug, Deserialize)]
pub struct NeighborsQuery {
    /// Query word
    pub word: String,

    /// Number of neighbours
    #[serde(default = "default_neighbors")]
    pub n: usize,
}

fn default_neighbors() -> usize {
    10
}

/// Error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
