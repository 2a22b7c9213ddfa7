use ndarray::{Array1, ArrayView1};

/// L2 (Euclidean) norm of a vector
pub fn l2_norm(v: ArrayView1<f32>) -> f32 {
    v.dot(&v).sqrt()
}

/// Cosine similarity in [-1, 1]; zero-norm input yields 0
pub fn cosine_similarity(a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have equal dimensions");
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (a.dot(&b) / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Euclidean distance between two vectors
pub fn euclidean_distance(a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have equal dimensions");
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Unit-length copy of `v`. Zero vectors stay zero.
pub fn unit_vector(v: ArrayView1<f32>) -> Array1<f32> {
    let norm = l2_norm(v);
    if norm > 0.0 {
        v.mapv(|x| x / norm)
    } else {
        v.to_owned()
    }
}
