use chrono::{DateTime, Utc};
use embedwrangler_common::{Result, WranglerError};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use crate::loader::{parse_embeddings, RawTable};
use crate::projection::project_2d;
use crate::similarity::{cosine_similarity, euclidean_distance, unit_vector};
use crate::types::{Neighbor, Projection, SimilarityScores, StoreStats};

/// Read-only word embedding table
///
/// Built once at startup and shared by every request. Lookups are exact
/// match; ranking uses cosine similarity against pre-normalised rows.
pub struct EmbeddingStore {
    tokens: Vec<String>,
    index: HashMap<String, usize>,
    vectors: Array2<f32>,
    unit_vectors: Array2<f32>,
    source: String,
    loaded_at: DateTime<Utc>,
}

impl EmbeddingStore {
    /// Load a GloVe / word2vec text file
    pub fn load(path: &Path, limit: Option<usize>) -> Result<Self> {
        let started = Instant::now();
        info!("Loading word embeddings from {}", path.display());

        let file = File::open(path).map_err(|e| {
            WranglerError::embedding_load(format!("Cannot open {}: {}", path.display(), e))
        })?;
        let table = parse_embeddings(BufReader::new(file), limit)?;
        let store = Self::from_table(table, path.display().to_string())?;

        info!(
            "Word embeddings loaded: {} tokens x {} dimensions in {:.2?}",
            store.len(),
            store.dimensions(),
            started.elapsed()
        );
        Ok(store)
    }

    /// Build from in-memory `(token, vector)` pairs; first occurrence wins
    pub fn from_entries<I, S>(entries: I, source: impl Into<String>) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: Into<String>,
    {
        let mut table = RawTable::default();
        for (token, vector) in entries {
            table.push(token.into(), &vector)?;
        }
        Self::from_table(table, source)
    }

    fn from_table(table: RawTable, source: impl Into<String>) -> Result<Self> {
        if table.is_empty() {
            return Err(WranglerError::embedding_load("Embedding table is empty"));
        }

        let RawTable {
            tokens,
            index,
            dim,
            values,
        } = table;

        let vectors = Array2::from_shape_vec((tokens.len(), dim), values)
            .map_err(|e| WranglerError::embedding_load(format!("Bad table shape: {}", e)))?;

        let mut unit_vectors = vectors.clone();
        for mut row in unit_vectors.axis_iter_mut(Axis(0)) {
            let unit = unit_vector(row.view());
            row.assign(&unit);
        }

        Ok(Self {
            tokens,
            index,
            vectors,
            unit_vectors,
            source: source.into(),
            loaded_at: Utc::now(),
        })
    }

    /// Number of tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Vector dimensionality
    pub fn dimensions(&self) -> usize {
        self.vectors.ncols()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            vocabulary_size: self.len(),
            dimensions: self.dimensions(),
            source: self.source.clone(),
            loaded_at: self.loaded_at,
        }
    }

    /// Vector for `token`, if present
    pub fn get(&self, token: &str) -> Option<ArrayView1<'_, f32>> {
        self.index.get(token).map(|&i| self.vectors.row(i))
    }

    /// Vector for `token`, or `VocabularyNotFound`
    pub fn lookup(&self, token: &str) -> Result<ArrayView1<'_, f32>> {
        self.get(token).ok_or_else(|| WranglerError::not_found(token))
    }

    fn index_of(&self, token: &str) -> Result<usize> {
        self.index
            .get(token)
            .copied()
            .ok_or_else(|| WranglerError::not_found(token))
    }

    /// Gather vectors for `tokens` in order; fails on the first missing token
    pub fn lookup_all<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Array2<f32>> {
        let rows = tokens
            .iter()
            .map(|t| self.index_of(t.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.vectors.select(Axis(0), &rows))
    }

    /// Cosine similarity and Euclidean distance between two tokens
    pub fn similarity(&self, word1: &str, word2: &str) -> Result<SimilarityScores> {
        let v1 = self.lookup(word1)?;
        let v2 = self.lookup(word2)?;

        Ok(SimilarityScores {
            cosine_similarity: cosine_similarity(v1, v2),
            euclidean_distance: euclidean_distance(v1, v2),
        })
    }

    /// Top `k` tokens by cosine similarity to `query`, excluding `exclude`
    ///
    /// Ties are ordered by vocabulary position.
    pub fn nearest<S: AsRef<str>>(
        &self,
        query: ArrayView1<f32>,
        k: usize,
        exclude: &[S],
    ) -> Vec<Neighbor> {
        let query = unit_vector(query);
        let excluded: HashSet<usize> = exclude
            .iter()
            .filter_map(|t| self.index.get(t.as_ref()).copied())
            .collect();

        self.rank(&query, k, &excluded)
    }

    /// Neighbours of a vocabulary token, excluding the token itself
    pub fn most_similar(&self, token: &str, k: usize) -> Result<Vec<Neighbor>> {
        let idx = self.index_of(token)?;
        debug!("most_similar: {} (k={})", token, k);

        let excluded = HashSet::from([idx]);
        Ok(self.rank(&self.unit_vectors.row(idx).to_owned(), k, &excluded))
    }

    /// Analogy search: rank by the normalised mean of the unit-length
    /// positive vectors minus the negative ones, excluding every input token
    pub fn nearest_by_analogy<S: AsRef<str>>(
        &self,
        positive: &[S],
        negative: &[S],
        k: usize,
    ) -> Result<Vec<Neighbor>> {
        if positive.is_empty() && negative.is_empty() {
            return Err(WranglerError::invalid_input(
                "Analogy needs at least one positive or negative word",
            ));
        }

        let positive_idx = positive
            .iter()
            .map(|t| self.index_of(t.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let negative_idx = negative
            .iter()
            .map(|t| self.index_of(t.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let mut target = Array1::<f32>::zeros(self.dimensions());
        for &i in &positive_idx {
            target += &self.unit_vectors.row(i);
        }
        for &i in &negative_idx {
            target -= &self.unit_vectors.row(i);
        }
        target /= (positive_idx.len() + negative_idx.len()) as f32;
        let target = unit_vector(target.view());

        let excluded: HashSet<usize> = positive_idx.into_iter().chain(negative_idx).collect();
        Ok(self.rank(&target, k, &excluded))
    }

    /// PCA projection of `tokens` to 2-D, fitted on exactly this batch
    pub fn project<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Projection> {
        let matrix = self.lookup_all(tokens)?;
        let coordinates = project_2d(matrix.view())?;

        Ok(Projection {
            words: tokens.iter().map(|t| t.as_ref().to_string()).collect(),
            coordinates,
        })
    }

    fn rank(&self, unit_query: &Array1<f32>, k: usize, excluded: &HashSet<usize>) -> Vec<Neighbor> {
        let scores = self.unit_vectors.dot(unit_query);

        let mut candidates: Vec<(usize, f32)> = scores
            .iter()
            .copied()
            .enumerate()
            .filter(|(i, _)| !excluded.contains(i))
            .collect();

        let k = k.min(candidates.len());
        if k == 0 {
            return Vec::new();
        }

        let by_rank = |a: &(usize, f32), b: &(usize, f32)| -> Ordering {
            b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
        };

        if k < candidates.len() {
            candidates.select_nth_unstable_by(k - 1, by_rank);
            candidates.truncate(k);
        }
        candidates.sort_by(by_rank);

        candidates
            .into_iter()
            .map(|(i, score)| Neighbor::new(self.tokens[i].clone(), score.clamp(-1.0, 1.0)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const EPSILON: f32 = 1e-5;

    fn store() -> EmbeddingStore {
        EmbeddingStore::from_entries(
            vec![
                ("king", vec![1.0, 1.0, 0.0, 0.1]),
                ("queen", vec![1.0, -1.0, 0.0, 0.1]),
                ("man", vec![0.0, 1.0, 0.0, 0.0]),
                ("woman", vec![0.0, -1.0, 0.0, 0.0]),
                ("prince", vec![0.8, 0.9, 0.0, 0.3]),
                ("apple", vec![0.0, 0.0, 1.0, 0.0]),
                ("orange", vec![0.0, 0.0, 0.9, 0.3]),
                ("pear", vec![0.0, 0.0, 2.0, 0.0]),
            ],
            "test",
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_exact_match_only() {
        let store = store();
        assert_eq!(store.len(), 8);
        assert_eq!(store.dimensions(), 4);
        assert!(store.lookup("king").is_ok());
        assert!(store.lookup("King").unwrap_err().is_not_found());
        assert!(store.lookup(" king").is_err());
        assert!(store.get("zzqxnotaword").is_none());
    }

    #[test]
    fn test_similarity_self() {
        let store = store();
        let scores = store.similarity("prince", "prince").unwrap();
        assert!((scores.cosine_similarity - 1.0).abs() < EPSILON);
        assert_eq!(scores.euclidean_distance, 0.0);
    }

    #[test]
    fn test_similarity_values() {
        let store = store();
        let scores = store.similarity("man", "woman").unwrap();
        assert!((scores.cosine_similarity + 1.0).abs() < EPSILON);
        assert!((scores.euclidean_distance - 2.0).abs() < EPSILON);

        let scores = store.similarity("apple", "man").unwrap();
        assert!(scores.cosine_similarity.abs() < EPSILON);
    }

    #[test]
    fn test_similarity_missing_either_word() {
        let store = store();
        assert!(store.similarity("zzqxnotaword", "king").unwrap_err().is_not_found());
        assert!(store.similarity("king", "zzqxnotaword").unwrap_err().is_not_found());
    }

    #[test]
    fn test_most_similar_excludes_query_and_ranks() {
        let store = store();
        let neighbors = store.most_similar("king", 3).unwrap();

        assert_eq!(neighbors.len(), 3);
        assert_eq!(neighbors[0].word, "prince");
        assert!(neighbors.iter().all(|n| n.word != "king"));
        assert!(neighbors
            .windows(2)
            .all(|w| w[0].similarity >= w[1].similarity));
    }

    #[test]
    fn test_most_similar_caps_at_vocabulary() {
        let store = store();
        let neighbors = store.most_similar("apple", 100).unwrap();
        assert_eq!(neighbors.len(), store.len() - 1);
    }

    #[test]
    fn test_ties_follow_vocabulary_order() {
        let store = store();
        // pear is apple scaled: identical cosine to any query
        let neighbors = store.most_similar("orange", 2).unwrap();
        assert_eq!(neighbors[0].word, "apple");
        assert_eq!(neighbors[1].word, "pear");
        assert_eq!(neighbors[0].similarity, neighbors[1].similarity);
    }

    #[test]
    fn test_nearest_by_vector_with_exclusions() {
        let store = store();
        let query = store.lookup("apple").unwrap().to_owned();

        let neighbors = store.nearest(query.view(), 2, &["apple"]);
        assert_eq!(neighbors[0].word, "pear");
        assert!((neighbors[0].similarity - 1.0).abs() < EPSILON);

        let neighbors = store.nearest(query.view(), 1, &[] as &[&str]);
        assert_eq!(neighbors[0].word, "apple");
    }

    #[test]
    fn test_nearest_zero_query_is_finite() {
        let store = store();
        let zero = Array1::<f32>::zeros(4);
        let neighbors = store.nearest(zero.view(), 3, &[] as &[&str]);
        assert_eq!(neighbors.len(), 3);
        assert!(neighbors.iter().all(|n| n.similarity == 0.0));
    }

    #[test]
    fn test_analogy() {
        let store = store();
        let results = store
            .nearest_by_analogy(&["king", "woman"], &["man"], 5)
            .unwrap();

        assert_eq!(results[0].word, "queen");
        assert!(results.len() <= 5);
        assert!(results
            .iter()
            .all(|n| !["king", "woman", "man"].contains(&n.word.as_str())));
    }

    #[test]
    fn test_analogy_missing_word_fails_whole_request() {
        let store = store();
        let err = store
            .nearest_by_analogy(&["king", "zzqxnotaword"], &["man"], 5)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_analogy_requires_terms() {
        let store = store();
        let empty: [&str; 0] = [];
        let err = store.nearest_by_analogy(&empty, &empty, 5).unwrap_err();
        assert!(matches!(err, WranglerError::InvalidInput(_)));
    }

    #[test]
    fn test_project_keeps_order_and_duplicates() {
        let store = store();
        let words = ["queen", "king", "apple", "king"];
        let projection = store.project(&words).unwrap();

        assert_eq!(projection.words, words);
        assert_eq!(projection.coordinates.len(), 4);
        assert_eq!(projection.coordinates[1], projection.coordinates[3]);
    }

    #[test]
    fn test_project_missing_word() {
        let store = store();
        let err = store.project(&["king", "zzqxnotaword"]).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_from_entries_rejects_ragged_rows() {
        let result = EmbeddingStore::from_entries(
            vec![("a", vec![1.0, 2.0]), ("b", vec![1.0])],
            "test",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "3 2").unwrap();
        writeln!(file, "cat 1.0 0.0").unwrap();
        writeln!(file, "dog 0.9 0.1").unwrap();
        writeln!(file, "car 0.0 1.0").unwrap();

        let store = EmbeddingStore::load(file.path(), None).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.most_similar("cat", 1).unwrap()[0].word, "dog");

        let stats = store.stats();
        assert_eq!(stats.vocabulary_size, 3);
        assert_eq!(stats.dimensions, 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = EmbeddingStore::load(Path::new("/nonexistent/vectors.txt"), None)
            .err()
            .unwrap();
        assert!(matches!(err, WranglerError::EmbeddingLoad(_)));
    }
}
