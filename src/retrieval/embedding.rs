use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use regex::Regex;

pub const DIMENSIONS: usize = 384;

fn word_pattern() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    // SAFETY: the pattern is a constant and known to compile.
    WORD.get_or_init(|| Regex::new(r"\w+").expect("valid word regex"))
}

/// Hashed bag-of-words embedding.
///
/// Each lowercased word is hashed into one of [`DIMENSIONS`] buckets with a
/// hash-derived sign, and the result is L2-normalised so that a dot product
/// is the cosine similarity. Identical texts always map to identical vectors.
pub fn embed(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; DIMENSIONS];
    let lowered = text.to_lowercase();
    for word in word_pattern().find_iter(&lowered) {
        let mut hasher = DefaultHasher::new();
        word.as_str().hash(&mut hasher);
        let h = hasher.finish();
        let bucket = (h % DIMENSIONS as u64) as usize;
        let sign = if (h >> 63) == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign;
    }

    let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for val in &mut vector {
            *val /= norm;
        }
    }
    vector
}

pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_is_deterministic_and_normalised() {
        let a = embed("Rust ownership rules");
        let b = embed("Rust ownership rules");
        assert_eq!(a, b);
        assert_eq!(a.len(), DIMENSIONS);
        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn case_and_punctuation_are_ignored() {
        let a = embed("Hello, World!");
        let b = embed("hello world");
        assert!((cosine(&a, &b) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn shared_words_score_higher() {
        let query = embed("borrow checker");
        let related = embed("the borrow checker enforces aliasing rules");
        let unrelated = embed("bread recipe with flour");
        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
    }

    #[test]
    fn empty_text_is_zero_vector() {
        assert!(embed("  ...  ").iter().all(|v| *v == 0.0));
    }
}
