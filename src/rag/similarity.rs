//! Cosine similarity and top-K selection over scored items.

/// Calculate cosine similarity between two vectors.
///
/// Returns 0.0 when the vectors have different lengths (a provider or model
/// mismatch must not crash the search path) and when either magnitude is
/// zero. Dot product and both squared norms accumulate in `f64` over a
/// single pass; `f32` accumulation loses precision on the 1536-dimension
/// vectors common with hosted embedding models.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
}

/// Select the top `k` items scoring at or above `threshold`.
///
/// Items strictly below the threshold are discarded, the rest are sorted by
/// score descending (stable, so equal scores keep their input order) and
/// truncated to `k`.
pub fn top_k<T>(scored: Vec<(T, f32)>, k: usize, threshold: f32) -> Vec<(T, f32)> {
    let mut results: Vec<(T, f32)> = scored
        .into_iter()
        .filter(|(_, score)| *score >= threshold)
        .collect();

    results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(k);
    results
}
