//! Marshal round-trip coverage for the filter and rank trees: every shape
//! that validates must serialize to the exact wire JSON `to_wire_json`
//! predicts, and `serde_json::to_value` must agree with it (the `Serialize`
//! impl and `to_wire_json` are two independent code paths to the same
//! shape, and they must never drift apart).

use chroma_types::{KnnRank, RankExpression, WhereClause};
use serde_json::json;

#[test]
fn comparator_serialize_matches_to_wire_json() {
    let clause = WhereClause::gt_int("price", 10);
    let wire = clause.to_wire_json().unwrap();
    let serialized = serde_json::to_value(&clause).unwrap();
    assert_eq!(wire, serialized);
    assert_eq!(wire, json!({ "price": { "$gt": 10 } }));
}

#[test]
fn nested_and_or_preserves_structure_through_both_paths() {
    let clause = WhereClause::or(vec![
        WhereClause::and(vec![WhereClause::eq_string("color", "red"), WhereClause::lt_float("price", 9.99)]),
        WhereClause::id_in(["a", "b", "c"]),
    ]);
    let wire = clause.to_wire_json().unwrap();
    let serialized = serde_json::to_value(&clause).unwrap();
    assert_eq!(wire, serialized);

    let or_children = wire["$or"].as_array().unwrap();
    assert_eq!(or_children.len(), 2);
    assert_eq!(or_children[0]["$and"].as_array().unwrap().len(), 2);
    assert_eq!(or_children[1]["#id"]["$in"], json!(["a", "b", "c"]));
}

#[test]
fn invalid_tree_fails_both_marshal_paths_identically() {
    let clause = WhereClause::and(Vec::new());
    assert!(clause.to_wire_json().is_err());
    assert!(serde_json::to_value(&clause).is_err());
}

#[test]
fn document_filters_use_the_reserved_document_key() {
    let clause = WhereClause::document_contains("needle");
    let wire = clause.to_wire_json().unwrap();
    assert_eq!(wire, json!({ "#document": { "$contains": "needle" } }));
}

#[test]
fn knn_leaf_serialize_matches_to_wire_json() {
    let expr = RankExpression::knn(KnnRank::from_texts(vec!["hello", "world"], 10));
    let wire = expr.to_wire_json().unwrap();
    let serialized = serde_json::to_value(&expr).unwrap();
    assert_eq!(wire, serialized);
    assert_eq!(wire["knn"]["query"]["texts"], json!(["hello", "world"]));
    assert_eq!(wire["knn"]["k"], json!(10));
}

#[test]
fn arithmetic_tree_round_trips_through_both_marshal_paths() {
    let expr = RankExpression::div(
        RankExpression::add(RankExpression::knn(KnnRank::from_texts(vec!["q"], 5)), RankExpression::val(1.0)),
        RankExpression::val(2.0),
    );
    let wire = expr.to_wire_json().unwrap();
    let serialized = serde_json::to_value(&expr).unwrap();
    assert_eq!(wire, serialized);
    assert_eq!(wire["div"][0]["add"][1]["val"], json!(1.0));
    assert_eq!(wire["div"][1]["val"], json!(2.0));
}

#[test]
fn rrf_of_inherited_and_explicit_knn_round_trips() {
    let expr = RankExpression::rrf(
        vec![RankExpression::knn(KnnRank::from_texts(vec!["hi"], 10)), RankExpression::knn(KnnRank::inherit(10))],
        60,
        true,
    );
    let wire = expr.to_wire_json().unwrap();
    let serialized = serde_json::to_value(&expr).unwrap();
    assert_eq!(wire, serialized);
    assert_eq!(wire["rrf"]["k"], json!(60));
    assert_eq!(wire["rrf"]["normalize"], json!(true));
    assert_eq!(wire["rrf"]["ranks"].as_array().unwrap().len(), 2);
}

#[test]
fn invalid_rank_tree_fails_both_marshal_paths_identically() {
    let expr = RankExpression::val(f64::INFINITY);
    assert!(expr.to_wire_json().is_err());
    assert!(serde_json::to_value(&expr).is_err());
}
