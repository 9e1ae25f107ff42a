//! Dense and sparse embedding value types.

use crate::error::EmbeddingError;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Distance metric a collection's HNSW/vector index is configured with.
///
/// Only `L2` and `Cosine` have a non-negative range; `Ip` (inner product)
/// can be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Squared Euclidean distance.
    L2,
    /// Negative inner product.
    Ip,
    /// Cosine distance, `1 - cosine_similarity`.
    Cosine,
}

impl DistanceMetric {
    /// The wire string chroma servers expect for `hnsw:space`.
    pub fn as_str(self) -> &'static str {
        match self {
            DistanceMetric::L2 => "l2",
            DistanceMetric::Ip => "ip",
            DistanceMetric::Cosine => "cosine",
        }
    }

    /// Whether this metric's distance is guaranteed to be non-negative.
    pub fn is_non_negative(self) -> bool {
        matches!(self, DistanceMetric::L2 | DistanceMetric::Cosine)
    }
}

/// A dense embedding vector.
///
/// Chroma servers accept both float32 and (for quantized collections)
/// int32 embeddings; we keep both representations rather than forcing a
/// lossy upcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Embedding {
    /// Float32 dense vector, the common case.
    F32(Vec<f32>),
    /// Int32 dense vector, used by quantized collections.
    I32(Vec<i32>),
}

impl Embedding {
    /// Build a float32 embedding.
    pub fn f32(values: Vec<f32>) -> Self {
        Embedding::F32(values)
    }

    /// Build an int32 embedding.
    pub fn i32(values: Vec<i32>) -> Self {
        Embedding::I32(values)
    }

    /// Dimensionality of this embedding.
    pub fn len(&self) -> usize {
        match self {
            Embedding::F32(v) => v.len(),
            Embedding::I32(v) => v.len(),
        }
    }

    /// Whether this embedding has zero dimensions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn as_f32_vec(&self) -> Vec<f32> {
        match self {
            Embedding::F32(v) => v.clone(),
            Embedding::I32(v) => v.iter().map(|&x| x as f32).collect(),
        }
    }

    /// Compute the distance between two embeddings under `metric`.
    ///
    /// Returns `None` when the two embeddings have different lengths;
    /// no panic.
    pub fn distance(&self, other: &Embedding, metric: DistanceMetric) -> Option<f32> {
        if self.len() != other.len() {
            return None;
        }
        let a = self.as_f32_vec();
        let b = other.as_f32_vec();
        Some(match metric {
            DistanceMetric::L2 => a.iter().zip(&b).map(|(x, y)| (x - y).powi(2)).sum(),
            DistanceMetric::Ip => -a.iter().zip(&b).map(|(x, y)| x * y).sum::<f32>(),
            DistanceMetric::Cosine => {
                let dot: f32 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
                let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm_a == 0.0 || norm_b == 0.0 {
                    1.0
                } else {
                    1.0 - dot / (norm_a * norm_b)
                }
            }
        })
    }

    /// Sentinel-bearing variant of [`Embedding::distance`]: returns `-1.0`
    /// when the two embeddings have mismatched lengths instead of `None`.
    ///
    /// Prefer `distance` in new code; this exists for callers matching the
    /// no-panic, sentinel-value comparison contract.
    pub fn compare(&self, other: &Embedding, metric: DistanceMetric) -> f32 {
        self.distance(other, metric).unwrap_or(-1.0)
    }
}

/// A sparse embedding: parallel arrays of non-negative, unique indices and
/// their associated finite values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SparseVector {
    indices: Vec<i32>,
    values: Vec<f32>,
}

impl SparseVector {
    /// Construct a sparse vector, validating that `indices` and `values`
    /// have equal length and that every index is non-negative, unique,
    /// and paired with a finite value.
    pub fn new(indices: Vec<i32>, values: Vec<f32>) -> Result<Self, EmbeddingError> {
        if indices.len() != values.len() {
            return Err(EmbeddingError::LengthMismatch {
                indices: indices.len(),
                values: values.len(),
            });
        }
        let mut seen = std::collections::HashSet::with_capacity(indices.len());
        for (&idx, &val) in indices.iter().zip(values.iter()) {
            if idx < 0 {
                return Err(EmbeddingError::NegativeIndex(idx as i64));
            }
            if !seen.insert(idx) {
                return Err(EmbeddingError::DuplicateIndex(idx));
            }
            if !val.is_finite() {
                return Err(EmbeddingError::NonFiniteValue { index: idx, value: val });
            }
        }
        Ok(SparseVector { indices, values })
    }

    /// The non-zero indices, in construction order.
    pub fn indices(&self) -> &[i32] {
        &self.indices
    }

    /// The values at each index, parallel to [`SparseVector::indices`].
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Number of non-zero entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }
}

/// Deserializes through [`SparseVector::new`] so a sparse vector read back
/// off the wire is held to the same invariants as one built in-process.
impl<'de> Deserialize<'de> for SparseVector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            indices: Vec<i32>,
            values: Vec<f32>,
        }
        let raw = Raw::deserialize(deserializer)?;
        SparseVector::new(raw.indices, raw.values).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_index_is_rejected() {
        let err = SparseVector::new(vec![1, 5, 1], vec![0.1, 0.2, 0.3]).unwrap_err();
        assert!(err.to_string().contains("duplicate index"));
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let err = SparseVector::new(vec![1, 2], vec![0.1]).unwrap_err();
        assert!(matches!(err, EmbeddingError::LengthMismatch { indices: 2, values: 1 }));
    }

    #[test]
    fn deserialize_reruns_validation() {
        let result: Result<SparseVector, _> =
            serde_json::from_value(serde_json::json!({"indices": [1, 1], "values": [0.1, 0.2]}));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("duplicate index"));
    }

    #[test]
    fn deserialize_accepts_a_valid_vector() {
        let vector: SparseVector =
            serde_json::from_value(serde_json::json!({"indices": [3, 1], "values": [0.5, 0.25]})).unwrap();
        assert_eq!(vector.indices(), &[3, 1]);
    }

    #[test]
    fn compare_returns_sentinel_on_mismatched_length() {
        let a = Embedding::f32(vec![1.0, 0.0]);
        let b = Embedding::f32(vec![1.0, 0.0, 0.0]);
        assert_eq!(a.compare(&b, DistanceMetric::L2), -1.0);
    }

    #[test]
    fn non_negative_metrics_stay_non_negative() {
        let a = Embedding::f32(vec![1.0, 2.0, 3.0]);
        let b = Embedding::f32(vec![-1.0, -2.0, 5.0]);
        assert!(a.distance(&b, DistanceMetric::L2).unwrap() >= 0.0);
        assert!(a.distance(&b, DistanceMetric::Cosine).unwrap() >= 0.0);
    }
}
