//! Vector similarity ranking.

use cipher_core::memory::MemoryRecord;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical direction. Returns 0.0
/// if the vectors differ in length, are empty, or either is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Rank records by similarity to a query embedding.
///
/// Returns up to `top_k` records sorted by descending similarity, with
/// `score` set on each. Records without an embedding are skipped. Equal
/// scores are broken by `created_at`, most recent first.
pub fn rank_by_similarity(
    records: &[MemoryRecord],
    query_embedding: &[f32],
    top_k: usize,
) -> Vec<MemoryRecord> {
    let mut scored: Vec<MemoryRecord> = records
        .iter()
        .filter_map(|record| {
            let embedding = record.embedding.as_ref()?;
            let mut r = record.clone();
            r.score = cosine_similarity(embedding, query_embedding);
            Some(r)
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    scored.truncate(top_k);
    scored
}
