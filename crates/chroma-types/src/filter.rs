//! `WhereClause` filter tree.
//!
//! Construction always succeeds — even a comparator with an empty `$in`
//! list builds fine. Validity is checked lazily, either by calling
//! [`WhereClause::validate`] directly or implicitly whenever the tree is
//! serialized.

use crate::error::ValidationError;
use serde::ser::{Error as _, SerializeMap};
use serde::{Serialize, Serializer};

const ID_KEY: &str = "#id";
const DOCUMENT_KEY: &str = "#document";

/// A scalar operand to a comparator.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// A string operand.
    Str(String),
    /// An integer operand.
    Int(i64),
    /// A float operand.
    Float(f64),
    /// A boolean operand.
    Bool(bool),
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Str(s) => serializer.serialize_str(s),
            Scalar::Int(i) => serializer.serialize_i64(*i),
            Scalar::Float(f) => serializer.serialize_f64(*f),
            Scalar::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

/// The operator of a single-key comparator node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// `$eq`
    Eq,
    /// `$ne`
    NotEq,
    /// `$gt`
    Gt,
    /// `$gte`
    Gte,
    /// `$lt`
    Lt,
    /// `$lte`
    Lte,
    /// `$in`
    In,
    /// `$nin`
    Nin,
    /// `$contains`
    Contains,
    /// `$not_contains`
    NotContains,
}

impl Op {
    fn wire_tag(self) -> &'static str {
        match self {
            Op::Eq => "$eq",
            Op::NotEq => "$ne",
            Op::Gt => "$gt",
            Op::Gte => "$gte",
            Op::Lt => "$lt",
            Op::Lte => "$lte",
            Op::In => "$in",
            Op::Nin => "$nin",
            Op::Contains => "$contains",
            Op::NotContains => "$not_contains",
        }
    }
}

/// The operand attached to a comparator: a single scalar, or a list (for
/// `$in`/`$nin`).
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A single scalar operand.
    One(Scalar),
    /// A list of scalar operands, for `$in`/`$nin`.
    Many(Vec<Scalar>),
}

impl Serialize for Operand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Operand::One(v) => v.serialize(serializer),
            Operand::Many(items) => items.serialize(serializer),
        }
    }
}

/// A filter tree node: a single-key comparator, or a logical `And`/`Or`
/// combination of child nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereClause {
    /// A single-key comparator, e.g. `{"price": {"$gt": 10}}`.
    Comparator {
        /// The metadata key (or `#id`/`#document`) this comparator targets.
        key: String,
        /// The comparison operator.
        op: Op,
        /// The operand.
        value: Operand,
    },
    /// Logical conjunction of children.
    And(Vec<WhereClause>),
    /// Logical disjunction of children.
    Or(Vec<WhereClause>),
}

impl WhereClause {
    fn comparator(key: impl Into<String>, op: Op, value: Operand) -> Self {
        WhereClause::Comparator { key: key.into(), op, value }
    }

    /// `{key: {"$eq": value}}` over a string attribute.
    pub fn eq_string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::comparator(key, Op::Eq, Operand::One(Scalar::Str(value.into())))
    }

    /// `{key: {"$eq": value}}` over an integer attribute.
    pub fn eq_int(key: impl Into<String>, value: i64) -> Self {
        Self::comparator(key, Op::Eq, Operand::One(Scalar::Int(value)))
    }

    /// `{key: {"$eq": value}}` over a float attribute.
    pub fn eq_float(key: impl Into<String>, value: f64) -> Self {
        Self::comparator(key, Op::Eq, Operand::One(Scalar::Float(value)))
    }

    /// `{key: {"$eq": value}}` over a boolean attribute.
    pub fn eq_bool(key: impl Into<String>, value: bool) -> Self {
        Self::comparator(key, Op::Eq, Operand::One(Scalar::Bool(value)))
    }

    /// `{key: {"$ne": value}}` over a string attribute.
    pub fn not_eq_string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::comparator(key, Op::NotEq, Operand::One(Scalar::Str(value.into())))
    }

    /// `{key: {"$ne": value}}` over an integer attribute.
    pub fn not_eq_int(key: impl Into<String>, value: i64) -> Self {
        Self::comparator(key, Op::NotEq, Operand::One(Scalar::Int(value)))
    }

    /// `{key: {"$ne": value}}` over a float attribute.
    pub fn not_eq_float(key: impl Into<String>, value: f64) -> Self {
        Self::comparator(key, Op::NotEq, Operand::One(Scalar::Float(value)))
    }

    /// `{key: {"$ne": value}}` over a boolean attribute.
    pub fn not_eq_bool(key: impl Into<String>, value: bool) -> Self {
        Self::comparator(key, Op::NotEq, Operand::One(Scalar::Bool(value)))
    }

    /// `{key: {"$gt": value}}` over an integer attribute.
    pub fn gt_int(key: impl Into<String>, value: i64) -> Self {
        Self::comparator(key, Op::Gt, Operand::One(Scalar::Int(value)))
    }

    /// `{key: {"$gt": value}}` over a float attribute.
    pub fn gt_float(key: impl Into<String>, value: f64) -> Self {
        Self::comparator(key, Op::Gt, Operand::One(Scalar::Float(value)))
    }

    /// `{key: {"$gte": value}}` over an integer attribute.
    pub fn gte_int(key: impl Into<String>, value: i64) -> Self {
        Self::comparator(key, Op::Gte, Operand::One(Scalar::Int(value)))
    }

    /// `{key: {"$gte": value}}` over a float attribute.
    pub fn gte_float(key: impl Into<String>, value: f64) -> Self {
        Self::comparator(key, Op::Gte, Operand::One(Scalar::Float(value)))
    }

    /// `{key: {"$lt": value}}` over an integer attribute.
    pub fn lt_int(key: impl Into<String>, value: i64) -> Self {
        Self::comparator(key, Op::Lt, Operand::One(Scalar::Int(value)))
    }

    /// `{key: {"$lt": value}}` over a float attribute.
    pub fn lt_float(key: impl Into<String>, value: f64) -> Self {
        Self::comparator(key, Op::Lt, Operand::One(Scalar::Float(value)))
    }

    /// `{key: {"$lte": value}}` over an integer attribute.
    pub fn lte_int(key: impl Into<String>, value: i64) -> Self {
        Self::comparator(key, Op::Lte, Operand::One(Scalar::Int(value)))
    }

    /// `{key: {"$lte": value}}` over a float attribute.
    pub fn lte_float(key: impl Into<String>, value: f64) -> Self {
        Self::comparator(key, Op::Lte, Operand::One(Scalar::Float(value)))
    }

    /// `{key: {"$in": [..]}}` over string attributes.
    pub fn in_string(key: impl Into<String>, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::comparator(key, Op::In, Operand::Many(values.into_iter().map(|v| Scalar::Str(v.into())).collect()))
    }

    /// `{key: {"$in": [..]}}` over integer attributes.
    pub fn in_int(key: impl Into<String>, values: impl IntoIterator<Item = i64>) -> Self {
        Self::comparator(key, Op::In, Operand::Many(values.into_iter().map(Scalar::Int).collect()))
    }

    /// `{key: {"$in": [..]}}` over float attributes.
    pub fn in_float(key: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self::comparator(key, Op::In, Operand::Many(values.into_iter().map(Scalar::Float).collect()))
    }

    /// `{key: {"$in": [..]}}` over boolean attributes.
    pub fn in_bool(key: impl Into<String>, values: impl IntoIterator<Item = bool>) -> Self {
        Self::comparator(key, Op::In, Operand::Many(values.into_iter().map(Scalar::Bool).collect()))
    }

    /// `{key: {"$nin": [..]}}` over string attributes.
    pub fn nin_string(key: impl Into<String>, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::comparator(key, Op::Nin, Operand::Many(values.into_iter().map(|v| Scalar::Str(v.into())).collect()))
    }

    /// `{key: {"$nin": [..]}}` over integer attributes.
    pub fn nin_int(key: impl Into<String>, values: impl IntoIterator<Item = i64>) -> Self {
        Self::comparator(key, Op::Nin, Operand::Many(values.into_iter().map(Scalar::Int).collect()))
    }

    /// `{key: {"$nin": [..]}}` over float attributes.
    pub fn nin_float(key: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self::comparator(key, Op::Nin, Operand::Many(values.into_iter().map(Scalar::Float).collect()))
    }

    /// `{key: {"$nin": [..]}}` over boolean attributes.
    pub fn nin_bool(key: impl Into<String>, values: impl IntoIterator<Item = bool>) -> Self {
        Self::comparator(key, Op::Nin, Operand::Many(values.into_iter().map(Scalar::Bool).collect()))
    }

    /// `{key: {"$contains": value}}` over an array-valued metadata key.
    pub fn metadata_contains_string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::comparator(key, Op::Contains, Operand::One(Scalar::Str(value.into())))
    }

    /// `{key: {"$contains": value}}` over an array-of-int metadata key.
    pub fn metadata_contains_int(key: impl Into<String>, value: i64) -> Self {
        Self::comparator(key, Op::Contains, Operand::One(Scalar::Int(value)))
    }

    /// `{key: {"$contains": value}}` over an array-of-float metadata key.
    pub fn metadata_contains_float(key: impl Into<String>, value: f64) -> Self {
        Self::comparator(key, Op::Contains, Operand::One(Scalar::Float(value)))
    }

    /// `{key: {"$contains": value}}` over an array-of-bool metadata key.
    pub fn metadata_contains_bool(key: impl Into<String>, value: bool) -> Self {
        Self::comparator(key, Op::Contains, Operand::One(Scalar::Bool(value)))
    }

    /// `{key: {"$not_contains": value}}` over an array-valued metadata key.
    pub fn metadata_not_contains_string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::comparator(key, Op::NotContains, Operand::One(Scalar::Str(value.into())))
    }

    /// `{key: {"$not_contains": value}}` over an array-of-int metadata key.
    pub fn metadata_not_contains_int(key: impl Into<String>, value: i64) -> Self {
        Self::comparator(key, Op::NotContains, Operand::One(Scalar::Int(value)))
    }

    /// `{key: {"$not_contains": value}}` over an array-of-float metadata key.
    pub fn metadata_not_contains_float(key: impl Into<String>, value: f64) -> Self {
        Self::comparator(key, Op::NotContains, Operand::One(Scalar::Float(value)))
    }

    /// `{key: {"$not_contains": value}}` over an array-of-bool metadata key.
    pub fn metadata_not_contains_bool(key: impl Into<String>, value: bool) -> Self {
        Self::comparator(key, Op::NotContains, Operand::One(Scalar::Bool(value)))
    }

    /// `{"#id": {"$in": [..]}}` — filter by record id.
    pub fn id_in(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::comparator(ID_KEY, Op::In, Operand::Many(ids.into_iter().map(|v| Scalar::Str(v.into())).collect()))
    }

    /// `{"#id": {"$nin": [..]}}` — exclude by record id.
    pub fn id_nin(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::comparator(ID_KEY, Op::Nin, Operand::Many(ids.into_iter().map(|v| Scalar::Str(v.into())).collect()))
    }

    /// `{"#document": {"$contains": text}}` — full-text document filter.
    pub fn document_contains(text: impl Into<String>) -> Self {
        Self::comparator(DOCUMENT_KEY, Op::Contains, Operand::One(Scalar::Str(text.into())))
    }

    /// `{"#document": {"$not_contains": text}}` — negated full-text filter.
    pub fn document_not_contains(text: impl Into<String>) -> Self {
        Self::comparator(DOCUMENT_KEY, Op::NotContains, Operand::One(Scalar::Str(text.into())))
    }

    /// Logical conjunction.
    pub fn and(children: impl IntoIterator<Item = WhereClause>) -> Self {
        WhereClause::And(children.into_iter().collect())
    }

    /// Logical disjunction.
    pub fn or(children: impl IntoIterator<Item = WhereClause>) -> Self {
        WhereClause::Or(children.into_iter().collect())
    }

    /// Validate this tree, depth-first left-to-right, returning the first
    /// violation found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            WhereClause::Comparator { key, op, value } => Self::validate_comparator(key, *op, value),
            WhereClause::And(children) | WhereClause::Or(children) => {
                if children.is_empty() {
                    return Err(ValidationError::EmptyLogical);
                }
                for child in children {
                    child.validate()?;
                }
                Ok(())
            }
        }
    }

    fn validate_comparator(key: &str, op: Op, value: &Operand) -> Result<(), ValidationError> {
        if key == ID_KEY && !matches!(op, Op::In | Op::Nin) {
            return Err(ValidationError::ReservedKeyMisuse { key: key.to_string(), allowed: "$in/$nin" });
        }
        if key == DOCUMENT_KEY && !matches!(op, Op::Contains | Op::NotContains) {
            return Err(ValidationError::ReservedKeyMisuse {
                key: key.to_string(),
                allowed: "$contains/$not_contains",
            });
        }
        match (op, value) {
            (Op::In, Operand::Many(items)) if items.is_empty() => {
                Err(ValidationError::EmptyIn { key: key.to_string() })
            }
            (Op::Nin, Operand::Many(items)) if items.is_empty() => {
                Err(ValidationError::EmptyNin { key: key.to_string() })
            }
            (Op::Contains, Operand::One(Scalar::Str(s))) if s.is_empty() => {
                Err(ValidationError::EmptyContains { key: key.to_string() })
            }
            (Op::NotContains, Operand::One(Scalar::Str(s))) if s.is_empty() => {
                Err(ValidationError::EmptyNotContains { key: key.to_string() })
            }
            _ => Ok(()),
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
            WhereClause::Comparator { key, op, value } => {
                json!({ key: { op.wire_tag(): value } })
            }
            WhereClause::And(children) => {
                json!({ "$and": children.iter().map(Self::to_value_unchecked).collect::<Vec<_>>() })
            }
            WhereClause::Or(children) => {
                json!({ "$or": children.iter().map(Self::to_value_unchecked).collect::<Vec<_>>() })
            }
        }
    }
}

impl Serialize for WhereClause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.validate().map_err(S::Error::custom)?;
        match self {
            WhereClause::Comparator { key, op, value } => {
                let mut outer = serializer.serialize_map(Some(1))?;
                let mut inner = serde_json::Map::new();
                inner.insert(op.wire_tag().to_string(), serde_json::to_value(value).map_err(S::Error::custom)?);
                outer.serialize_entry(key, &inner)?;
                outer.end()
            }
            WhereClause::And(children) => {
                let mut outer = serializer.serialize_map(Some(1))?;
                outer.serialize_entry("$and", children)?;
                outer.end()
            }
            WhereClause::Or(children) => {
                let mut outer = serializer.serialize_map(Some(1))?;
                outer.serialize_entry("$or", children)?;
                outer.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_in_with_wrong_op_is_rejected() {
        let clause = WhereClause::comparator(ID_KEY, Op::Eq, Operand::One(Scalar::Str("x".into())));
        assert!(matches!(clause.validate(), Err(ValidationError::ReservedKeyMisuse { .. })));
    }

    #[test]
    fn empty_document_contains_is_rejected() {
        let clause = WhereClause::document_contains("");
        let err = clause.validate().unwrap_err();
        assert!(err.to_string().contains("$contains"));
    }

    #[test]
    fn metadata_contains_covers_every_scalar_kind() {
        assert_eq!(
            WhereClause::metadata_contains_int("tags", 3).to_wire_json().unwrap(),
            serde_json::json!({ "tags": { "$contains": 3 } })
        );
        assert_eq!(
            WhereClause::metadata_contains_float("scores", 1.5).to_wire_json().unwrap(),
            serde_json::json!({ "scores": { "$contains": 1.5 } })
        );
        assert_eq!(
            WhereClause::metadata_not_contains_bool("flags", true).to_wire_json().unwrap(),
            serde_json::json!({ "flags": { "$not_contains": true } })
        );
    }

    #[test]
    fn and_or_preserve_child_order_in_marshal() {
        let clause = WhereClause::and(vec![
            WhereClause::eq_string("color", "red"),
            WhereClause::gt_int("price", 10),
        ]);
        let value = clause.to_wire_json().unwrap();
        let children = value["$and"].as_array().unwrap();
        assert_eq!(children.len(), 2);
        assert!(children[0]["color"].is_object());
        assert!(children[1]["price"].is_object());
    }

    #[test]
    fn empty_logical_node_is_rejected() {
        let clause = WhereClause::and(Vec::new());
        assert_eq!(clause.validate(), Err(ValidationError::EmptyLogical));
    }

    #[test]
    fn construction_never_fails_even_when_invalid() {
        let _clause = WhereClause::id_in(Vec::<String>::new());
    }
}
