//! `RankExpression` rank algebra tree.
//!
//! Like [`crate::filter::WhereClause`], a `RankExpression` always
//! constructs successfully; the client's job is to guarantee *structural*
//! validity (arities, finite constants, a bounded tree depth) and ship the
//! tree — the actual score arithmetic (outer-join semantics on missing
//! scores, division by zero) is the server's concern, not this crate's.

use crate::error::ValidationError;
use compact_str::CompactString;
use serde::{Serialize, Serializer};

/// Maximum nesting depth a rank tree may reach before `validate` rejects it.
pub const MAX_DEPTH: usize = 64;

/// A k-nearest-neighbor leaf: either text queries (routed through a
/// collection's embedding function) or already-embedded query vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct KnnRank {
    query_texts: Vec<CompactString>,
    query_embeddings: Vec<Vec<f32>>,
    k: u32,
}

impl KnnRank {
    /// A k-NN leaf over raw text queries.
    pub fn from_texts(texts: impl IntoIterator<Item = impl Into<CompactString>>, k: u32) -> Self {
        KnnRank { query_texts: texts.into_iter().map(Into::into).collect(), query_embeddings: Vec::new(), k }
    }

    /// A k-NN leaf over pre-computed embedding vectors.
    pub fn from_embeddings(embeddings: impl IntoIterator<Item = Vec<f32>>, k: u32) -> Self {
        KnnRank { query_texts: Vec::new(), query_embeddings: embeddings.into_iter().collect(), k }
    }

    /// A k-NN leaf that supplies neither texts nor embeddings, inheriting
    /// its queries from the request context (valid only as a non-root node
    /// — see [`RankExpression::validate`]).
    pub fn inherit(k: u32) -> Self {
        KnnRank { query_texts: Vec::new(), query_embeddings: Vec::new(), k }
    }

    fn validate(&self, is_root: bool) -> Result<(), ValidationError> {
        if self.k == 0 {
            return Err(ValidationError::InvalidK { k: self.k });
        }
        let has_texts = !self.query_texts.is_empty();
        let has_embeddings = !self.query_embeddings.is_empty();
        match (has_texts, has_embeddings) {
            (true, true) => Err(ValidationError::ConflictingKnnInput),
            (false, false) if is_root => Err(ValidationError::AmbiguousKnnInput),
            _ => Ok(()),
        }
    }
}

impl Serialize for KnnRank {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde_json::json;
        let query = if !self.query_texts.is_empty() {
            json!({ "texts": self.query_texts })
        } else if !self.query_embeddings.is_empty() {
            json!({ "embeddings": self.query_embeddings })
        } else {
            json!({})
        };
        json!({ "query": query, "k": self.k }).serialize(serializer)
    }
}

/// The rank algebra tree: a k-NN leaf, a constant, reciprocal-rank fusion
/// of children, or an arithmetic combination of sub-expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum RankExpression {
    /// A k-nearest-neighbor leaf.
    Knn(KnnRank),
    /// A literal constant score.
    Val(f64),
    /// Reciprocal rank fusion of its children.
    Rrf {
        /// The rankings being fused.
        children: Vec<RankExpression>,
        /// The RRF smoothing constant.
        k: u32,
        /// Whether fused scores are normalized into `[0, 1]`.
        normalize: bool,
    },
    /// Elementwise sum.
    Add(Box<RankExpression>, Box<RankExpression>),
    /// Elementwise difference.
    Sub(Box<RankExpression>, Box<RankExpression>),
    /// Elementwise product.
    Mul(Box<RankExpression>, Box<RankExpression>),
    /// Elementwise quotient.
    Div(Box<RankExpression>, Box<RankExpression>),
    /// Elementwise exponential.
    Exp(Box<RankExpression>),
    /// Elementwise natural log.
    Log(Box<RankExpression>),
}

impl RankExpression {
    /// A k-NN leaf.
    pub fn knn(leaf: KnnRank) -> Self {
        RankExpression::Knn(leaf)
    }

    /// A literal constant.
    pub fn val(value: f64) -> Self {
        RankExpression::Val(value)
    }

    /// Reciprocal rank fusion, defaulting to the conventional `k = 60`.
    pub fn rrf(children: impl IntoIterator<Item = RankExpression>, k: u32, normalize: bool) -> Self {
        RankExpression::Rrf { children: children.into_iter().collect(), k, normalize }
    }

    /// Elementwise sum.
    pub fn add(a: RankExpression, b: RankExpression) -> Self {
        RankExpression::Add(Box::new(a), Box::new(b))
    }

    /// Elementwise difference.
    pub fn sub(a: RankExpression, b: RankExpression) -> Self {
        RankExpression::Sub(Box::new(a), Box::new(b))
    }

    /// Elementwise product.
    pub fn mul(a: RankExpression, b: RankExpression) -> Self {
        RankExpression::Mul(Box::new(a), Box::new(b))
    }

    /// Elementwise quotient.
    pub fn div(a: RankExpression, b: RankExpression) -> Self {
        RankExpression::Div(Box::new(a), Box::new(b))
    }

    /// Elementwise exponential.
    pub fn exp(a: RankExpression) -> Self {
        RankExpression::Exp(Box::new(a))
    }

    /// Elementwise natural log.
    pub fn log(a: RankExpression) -> Self {
        RankExpression::Log(Box::new(a))
    }

    /// Validate structural well-formedness: arities, finite constants, and
    /// a bounded nesting depth. Does not evaluate or compute any score.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_at(0, true)
    }

    fn validate_at(&self, depth: usize, is_root: bool) -> Result<(), ValidationError> {
        if depth > MAX_DEPTH {
            return Err(ValidationError::MaxDepthExceeded { max: MAX_DEPTH });
        }
        match self {
            RankExpression::Knn(leaf) => leaf.validate(is_root),
            RankExpression::Val(value) => {
                if value.is_finite() {
                    Ok(())
                } else {
                    Err(ValidationError::NonFiniteConstant { value: *value })
                }
            }
            RankExpression::Rrf { children, .. } => {
                if children.is_empty() {
                    return Err(ValidationError::EmptyRrf);
                }
                for child in children {
                    child.validate_at(depth + 1, false)?;
                }
                Ok(())
            }
            RankExpression::Add(a, b)
            | RankExpression::Sub(a, b)
            | RankExpression::Mul(a, b)
            | RankExpression::Div(a, b) => {
                a.validate_at(depth + 1, false)?;
                b.validate_at(depth + 1, false)
            }
            RankExpression::Exp(a) | RankExpression::Log(a) => a.validate_at(depth + 1, false),
        }
    }

    /// Validate then marshal to the server's wire JSON shape.
    pub fn to_wire_json(&self) -> Result<serde_json::Value, ValidationError> {
        self.validate()?;
        Ok(self.to_value_unchecked())
    }

    fn to_value_unchecked(&self) -> serde_json::Value {
        use serde_json::json;
        match self {
            RankExpression::Knn(leaf) => json!({ "knn": leaf }),
            RankExpression::Val(value) => json!({ "val": value }),
            RankExpression::Rrf { children, k, normalize } => {
                json!({
                    "rrf": {
                        "ranks": children.iter().map(Self::to_value_unchecked).collect::<Vec<_>>(),
                        "k": k,
                        "normalize": normalize,
                    }
                })
            }
            RankExpression::Add(a, b) => json!({ "add": [a.to_value_unchecked(), b.to_value_unchecked()] }),
            RankExpression::Sub(a, b) => json!({ "sub": [a.to_value_unchecked(), b.to_value_unchecked()] }),
            RankExpression::Mul(a, b) => json!({ "mul": [a.to_value_unchecked(), b.to_value_unchecked()] }),
            RankExpression::Div(a, b) => json!({ "div": [a.to_value_unchecked(), b.to_value_unchecked()] }),
            RankExpression::Exp(a) => json!({ "exp": a.to_value_unchecked() }),
            RankExpression::Log(a) => json!({ "log": a.to_value_unchecked() }),
        }
    }
}

impl Serialize for RankExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::Error as _;
        self.validate().map_err(S::Error::custom)?;
        self.to_value_unchecked().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knn_root_with_no_queries_is_ambiguous() {
        let expr = RankExpression::knn(KnnRank::inherit(10));
        assert_eq!(expr.validate(), Err(ValidationError::AmbiguousKnnInput));
    }

    #[test]
    fn knn_with_both_texts_and_embeddings_conflicts() {
        let mut leaf = KnnRank::from_texts(vec!["hello"], 5);
        leaf.query_embeddings.push(vec![1.0, 2.0]);
        assert_eq!(leaf.validate(true), Err(ValidationError::ConflictingKnnInput));
    }

    #[test]
    fn knn_inherit_is_fine_as_rrf_child() {
        let expr = RankExpression::rrf(
            vec![
                RankExpression::knn(KnnRank::from_texts(vec!["hi"], 10)),
                RankExpression::knn(KnnRank::inherit(10)),
            ],
            60,
            true,
        );
        assert!(expr.validate().is_ok());
    }

    #[test]
    fn empty_rrf_is_rejected() {
        let expr = RankExpression::rrf(Vec::new(), 60, false);
        assert_eq!(expr.validate(), Err(ValidationError::EmptyRrf));
    }

    #[test]
    fn non_finite_constant_is_rejected() {
        let expr = RankExpression::val(f64::NAN);
        assert!(matches!(expr.validate(), Err(ValidationError::NonFiniteConstant { .. })));
    }

    #[test]
    fn depth_limit_is_enforced() {
        let mut expr = RankExpression::val(1.0);
        for _ in 0..MAX_DEPTH + 1 {
            expr = RankExpression::exp(expr);
        }
        assert_eq!(expr.validate(), Err(ValidationError::MaxDepthExceeded { max: MAX_DEPTH }));
    }

    #[test]
    fn construction_never_fails() {
        let _ = RankExpression::knn(KnnRank::from_texts(Vec::<String>::new(), 0));
    }
}
