//! Text embedding for semantic recall.
//!
//! The default embedder is a deterministic feature-hashing bag-of-words:
//! each token is hashed into a fixed-dimension vector which is then
//! L2-normalized. No network, no model weights, identical output for
//! identical input — which keeps recall reproducible in tests and usable
//! offline. A provider-backed embedder can implement the same trait.

/// Produces a fixed-dimension vector for a piece of text.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Deterministic feature-hashing embedder.
pub struct HashEmbedder {
    dim: usize,
}

/// Default embedding dimension.
pub const DEFAULT_DIM: usize = 256;

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(8) }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIM)
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dim];

        for token in tokenize(text) {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dim as u64) as usize;
            // Second hash decides the sign, spreading collisions apart.
            let sign = if (hash >> 32) & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        l2_normalize(&mut vector);
        vector
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for b in bytes {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 1e-10 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::cosine_similarity;

    #[test]
    fn deterministic_for_identical_input() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed("the quick brown fox");
        let b = embedder.embed("the quick brown fox");
        assert_eq!(a, b);
    }

    #[test]
    fn output_is_normalized() {
        let embedder = HashEmbedder::default();
        let v = embedder.embed("some text to embed with several tokens");
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_text_embeds_to_zero_vector() {
        let embedder = HashEmbedder::default();
        let v = embedder.embed("");
        assert_eq!(v.len(), DEFAULT_DIM);
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn case_and_punctuation_insensitive() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed("Hello, World!");
        let b = embedder.embed("hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn overlapping_text_is_closer_than_unrelated() {
        let embedder = HashEmbedder::default();
        let base = embedder.embed("nvidia stock price history daily records");
        let related = embedder.embed("nvidia stock price for the last ten days");
        let unrelated = embedder.embed("recipe for sourdough bread with olives");

        let sim_related = cosine_similarity(&base, &related);
        let sim_unrelated = cosine_similarity(&base, &unrelated);
        assert!(
            sim_related > sim_unrelated,
            "related={sim_related} unrelated={sim_unrelated}"
        );
    }

    #[test]
    fn respects_requested_dimension() {
        let embedder = HashEmbedder::new(64);
        assert_eq!(embedder.dim(), 64);
        assert_eq!(embedder.embed("text").len(), 64);
    }
}
