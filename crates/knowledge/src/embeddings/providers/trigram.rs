//! Deterministic trigram-based embedding provider.
//!
//! Generates embeddings from character trigrams and word frequencies.
//! Not semantically accurate like a neural model, but deterministic and
//! content-dependent, which makes it the offline/test default.

use crate::embeddings::provider::EmbeddingProvider;
use std::collections::{HashMap, HashSet};
use techmate_core::AppResult;

/// Common English words excluded before hashing; they carry no signal and
/// drown out the discriminating tokens.
const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them",
];

/// Trigram embedding provider.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
}

impl TrigramProvider {
    /// Create a new trigram provider with specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];

        let stop_words: HashSet<&str> = STOP_WORDS.iter().copied().collect();
        let lower = text.to_lowercase();

        let mut word_freq: HashMap<&str, u32> = HashMap::new();
        for word in lower
            .split_whitespace()
            .filter(|w| !stop_words.contains(w) && w.len() > 2)
        {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            // Each character trigram contributes to one dimension, sqrt-scaled
            // so frequent words do not dominate.
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let dim = (hash_chars(window, 37) as usize) % self.dimensions;
                embedding[dim] += (*freq as f32).sqrt();
            }

            // The whole word contributes once more at full weight.
            let dim = (hash_chars(&chars, 31) as usize) % self.dimensions;
            embedding[dim] += *freq as f32;
        }

        normalize(&mut embedding);
        embedding
    }
}

/// FNV-style multiplicative hash over a character slice.
fn hash_chars(chars: &[char], multiplier: u64) -> u64 {
    let mut hash = 0u64;
    for ch in chars {
        let mut buf = [0u8; 4];
        for b in ch.encode_utf8(&mut buf).bytes() {
            hash = hash.wrapping_mul(multiplier).wrapping_add(b as u64);
        }
    }
    hash
}

/// Scale to a unit vector in place; the zero vector stays zero.
fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v {
            *x /= norm;
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}
