//! End-to-end auto-wire coverage: a built-in registry must be able to
//! rebuild any of its own factories purely from the config the same
//! factory produced, with no caller-supplied state beyond what
//! `get_config` persisted.

use chroma_ef::{EfConfig, Registry};

#[test]
fn bm25_with_all_four_options_round_trips_through_the_registry() {
    let registry = Registry::with_builtins();
    let ef = registry.build_sparse("bm25", &EfConfig::new()).unwrap();

    let mut config = ef.get_config();
    config.insert("k".to_string(), serde_json::json!(1.6));
    config.insert("b".to_string(), serde_json::json!(0.5));
    config.insert("avg_doc_len".to_string(), serde_json::json!(25.0));
    config.insert("token_max_length".to_string(), serde_json::json!(12));

    let rebuilt = registry.build_sparse("bm25", &config).unwrap();
    assert_eq!(rebuilt.get_config(), config);

    // The rebuilt function scores documents, it isn't just a config echo.
    let scored = rebuilt.embed_documents(&["a quick brown fox".to_string()]).unwrap();
    assert!(scored[0].nnz() > 0);
}

#[test]
fn mock_dimension_round_trips_and_embeds_at_that_dimension() {
    let registry = Registry::with_builtins();
    let mut config = EfConfig::new();
    config.insert("dimension".to_string(), serde_json::json!(6));
    let ef = registry.build_dense("mock", &config).unwrap();
    assert_eq!(ef.get_config(), config);

    let embedded = ef.embed_documents(&["hello".to_string()]).unwrap();
    assert_eq!(embedded[0].len(), 6);
}

#[test]
fn unknown_dense_and_sparse_names_are_rejected() {
    let registry = Registry::with_builtins();
    assert!(registry.build_dense("does-not-exist", &EfConfig::new()).is_err());
    assert!(registry.build_sparse("does-not-exist", &EfConfig::new()).is_err());
}
