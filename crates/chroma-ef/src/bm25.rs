//! Built-in BM25 sparse embedding function.
//!
//! Tokenizes, drops stopwords, lightly stems, hashes surviving terms to
//! stable integer indices, and scores each term with the BM25 saturation
//! term:
//!
//! ```text
//! tf * (k + 1) / (tf + k * (1 - b + b * |doc| / avgDocLen))
//! ```
//!
//! Documents get the saturated score above; queries get raw term
//! frequency, the usual BM25 asymmetry (a query term either matches or it
//! doesn't — saturating it would just rescale every query uniformly).
//! Output is sorted by token (before hashing to an index) so two calls
//! over the same text always produce byte-identical wire output.

use crate::contract::SparseEmbeddingFunction;
use crate::error::EfError;
use chroma_types::SparseVector;
use std::collections::BTreeMap;

/// Standard BM25 saturation constant.
pub const DEFAULT_K: f32 = 1.2;
/// Standard BM25 length-normalization constant.
pub const DEFAULT_B: f32 = 0.75;
/// Default upper bound on token length (characters); longer tokens are
/// dropped rather than truncated, since a token this long is almost always
/// noise (a hash, a run-on, a URL fragment) rather than a real term.
pub const DEFAULT_TOKEN_MAX_LENGTH: usize = 40;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is",
    "it", "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there",
    "these", "they", "this", "to", "was", "will", "with",
];

fn tokenize(text: &str, token_max_length: usize) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty() && s.chars().count() <= token_max_length)
        .map(|s| s.to_lowercase())
        .filter(|s| !STOPWORDS.contains(&s.as_str()))
        .map(|s| stem(&s))
        .collect()
}

/// A light suffix-stripping stemmer — not a full Porter implementation,
/// just enough to collapse the common plural/verb-inflection cases.
fn stem(token: &str) -> String {
    if let Some(stripped) = token.strip_suffix("ies") {
        if stripped.len() >= 2 {
            return format!("{stripped}y");
        }
    }
    if let Some(stripped) = token.strip_suffix("ing") {
        if stripped.len() >= 3 {
            return stripped.to_string();
        }
    }
    if let Some(stripped) = token.strip_suffix("ed") {
        if stripped.len() >= 3 {
            return stripped.to_string();
        }
    }
    if let Some(stripped) = token.strip_suffix('s') {
        if !token.ends_with("ss") && stripped.len() >= 2 {
            return stripped.to_string();
        }
    }
    token.to_string()
}

/// Stable (process- and run-independent) hash of a token into a
/// non-negative index, via FNV-1a.
fn token_index(token: &str) -> i32 {
    const OFFSET: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    let mut hash = OFFSET;
    for byte in token.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    (hash % (i32::MAX as u64)) as i32
}

/// Term frequencies keyed on the token itself, so iteration order (and
/// therefore the order in which tokens are later hashed into `indices`)
/// is sorted by token text, not by its hashed index.
fn term_counts(tokens: &[String]) -> BTreeMap<&str, u32> {
    let mut counts = BTreeMap::new();
    for token in tokens {
        *counts.entry(token.as_str()).or_insert(0) += 1;
    }
    counts
}

/// The built-in BM25 sparse embedding function.
#[derive(Debug, Clone)]
pub struct Bm25EmbeddingFunction {
    name: String,
    k: f32,
    b: f32,
    /// A fixed corpus average document length, overriding the per-call
    /// batch average. `None` means "derive it from each `embed_documents`
    /// batch", the common case when the corpus isn't known ahead of time.
    avg_doc_len: Option<f32>,
    token_max_length: usize,
}

impl Default for Bm25EmbeddingFunction {
    fn default() -> Self {
        Bm25EmbeddingFunction {
            name: "bm25".to_string(),
            k: DEFAULT_K,
            b: DEFAULT_B,
            avg_doc_len: None,
            token_max_length: DEFAULT_TOKEN_MAX_LENGTH,
        }
    }
}

impl Bm25EmbeddingFunction {
    /// A BM25 function with the standard `k=1.2, b=0.75` constants.
    pub fn new() -> Self {
        Self::default()
    }

    /// A BM25 function with custom saturation constants.
    ///
    /// Falls back to the default constant for any parameter outside its
    /// valid range (`k >= 0`, `0 <= b <= 1`) rather than producing a
    /// function whose scores would be meaningless — the same "always
    /// constructs" posture as `chroma_types`' filter/rank trees.
    pub fn with_params(k: f32, b: f32) -> Self {
        Bm25EmbeddingFunction {
            k: if k >= 0.0 { k } else { DEFAULT_K },
            b: if (0.0..=1.0).contains(&b) { b } else { DEFAULT_B },
            ..Self::default()
        }
    }

    /// Override the corpus average document length instead of deriving it
    /// from each `embed_documents` batch. Ignored if `avg_doc_len <= 0`.
    pub fn with_avg_doc_len(mut self, avg_doc_len: f32) -> Self {
        if avg_doc_len > 0.0 {
            self.avg_doc_len = Some(avg_doc_len);
        }
        self
    }

    /// Override the maximum token length (characters); tokens longer than
    /// this are dropped. Ignored if `token_max_length == 0`.
    pub fn with_token_max_length(mut self, token_max_length: usize) -> Self {
        if token_max_length > 0 {
            self.token_max_length = token_max_length;
        }
        self
    }
}

impl SparseEmbeddingFunction for Bm25EmbeddingFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn embed_documents(&self, documents: &[String]) -> Result<Vec<SparseVector>, EfError> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        let tokenized: Vec<Vec<String>> =
            documents.iter().map(|d| tokenize(d, self.token_max_length)).collect();
        let lengths: Vec<usize> = tokenized.iter().map(|t| t.len()).collect();
        let avg_doc_len = self
            .avg_doc_len
            .unwrap_or_else(|| lengths.iter().sum::<usize>() as f32 / lengths.len() as f32);

        let mut out = Vec::with_capacity(documents.len());
        for (tokens, &doc_len) in tokenized.iter().zip(&lengths) {
            let counts = term_counts(tokens);
            let mut indices = Vec::with_capacity(counts.len());
            let mut values = Vec::with_capacity(counts.len());
            for (&token, &tf) in &counts {
                let tf = tf as f32;
                let denom = tf + self.k * (1.0 - self.b + self.b * doc_len as f32 / avg_doc_len.max(1.0));
                let score = tf * (self.k + 1.0) / denom;
                indices.push(token_index(token));
                values.push(score);
            }
            out.push(
                SparseVector::new(indices, values)
                    .map_err(|e| EfError::ComputationFailed { name: self.name.clone(), message: e.to_string() })?,
            );
        }
        Ok(out)
    }

    fn embed_query(&self, query: &str) -> Result<SparseVector, EfError> {
        let tokens = tokenize(query, self.token_max_length);
        let counts = term_counts(&tokens);
        let mut indices = Vec::with_capacity(counts.len());
        let mut values = Vec::with_capacity(counts.len());
        for (&token, &tf) in &counts {
            indices.push(token_index(token));
            values.push(tf as f32);
        }
        SparseVector::new(indices, values)
            .map_err(|e| EfError::ComputationFailed { name: self.name.clone(), message: e.to_string() })
    }

    fn get_config(&self) -> BTreeMap<String, serde_json::Value> {
        let mut config = BTreeMap::new();
        config.insert("k".to_string(), serde_json::json!(self.k));
        config.insert("b".to_string(), serde_json::json!(self.b));
        if let Some(avg_doc_len) = self.avg_doc_len {
            config.insert("avg_doc_len".to_string(), serde_json::json!(avg_doc_len));
        }
        config.insert("token_max_length".to_string(), serde_json::json!(self.token_max_length));
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_sorted_by_token_and_deterministic() {
        let ef = Bm25EmbeddingFunction::new();
        let a = ef.embed_documents(&["the quick brown fox jumps".to_string()]).unwrap();
        let b = ef.embed_documents(&["the quick brown fox jumps".to_string()]).unwrap();
        assert_eq!(a, b);

        // surviving tokens (stopwords/stemming aside): brown, fox, jump, quick
        let expected_indices: Vec<i32> =
            ["brown", "fox", "jump", "quick"].iter().map(|t| token_index(t)).collect();
        assert_eq!(a[0].indices(), expected_indices.as_slice());
    }

    #[test]
    fn stopwords_are_dropped() {
        let ef = Bm25EmbeddingFunction::new();
        let empty = ef.embed_documents(&["the a an".to_string()]).unwrap();
        assert_eq!(empty[0].nnz(), 0);
    }

    #[test]
    fn config_round_trips_without_secrets() {
        let ef = Bm25EmbeddingFunction::with_params(1.5, 0.6);
        let config = ef.get_config();
        assert_eq!(config.get("k").unwrap(), &serde_json::json!(1.5));
        assert_eq!(config.get("b").unwrap(), &serde_json::json!(0.6));
        assert_eq!(config.get("token_max_length").unwrap(), &serde_json::json!(DEFAULT_TOKEN_MAX_LENGTH));
        assert!(config.get("avg_doc_len").is_none());
    }

    #[test]
    fn avg_doc_len_override_is_persisted_in_config() {
        let ef = Bm25EmbeddingFunction::new().with_avg_doc_len(12.5);
        let config = ef.get_config();
        assert_eq!(config.get("avg_doc_len").unwrap(), &serde_json::json!(12.5));
    }

    #[test]
    fn out_of_range_params_fall_back_to_defaults() {
        let ef = Bm25EmbeddingFunction::with_params(-1.0, 2.0);
        let config = ef.get_config();
        assert_eq!(config.get("k").unwrap(), &serde_json::json!(DEFAULT_K));
        assert_eq!(config.get("b").unwrap(), &serde_json::json!(DEFAULT_B));
    }

    #[test]
    fn tokens_longer_than_max_length_are_dropped() {
        let long_token = "a".repeat(50);
        let ef = Bm25EmbeddingFunction::new().with_token_max_length(10);
        let with_long = ef.embed_documents(&[format!("short {long_token} words")]).unwrap();
        // "short" and "word" survive (after stemming), the 50-char token doesn't.
        assert_eq!(with_long[0].nnz(), 2);
    }

    #[test]
    fn avg_doc_len_override_changes_scores_versus_batch_derived_default() {
        let documents = vec!["quick brown fox".to_string(), "quick brown fox jumps high".to_string()];
        let default_ef = Bm25EmbeddingFunction::new();
        let overridden_ef = Bm25EmbeddingFunction::new().with_avg_doc_len(100.0);
        let default_scores = default_ef.embed_documents(&documents).unwrap();
        let overridden_scores = overridden_ef.embed_documents(&documents).unwrap();
        assert_ne!(default_scores, overridden_scores);
    }

    #[test]
    fn embed_documents_on_empty_input_returns_empty_without_computing() {
        let ef = Bm25EmbeddingFunction::new();
        let result = ef.embed_documents(&[]).unwrap();
        assert!(result.is_empty());
    }
}
