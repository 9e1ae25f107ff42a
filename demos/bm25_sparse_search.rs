//! Register a collection against the built-in BM25 sparse embedding
//! function and inspect its auto-wired config.

use chromadb::prelude::*;
use chromadb::EfConfig;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let registry = Registry::with_builtins();
    let bm25 = registry.build_sparse("bm25", &EfConfig::new())?;

    let corpus = vec![
        "the quick brown fox jumps over the lazy dog".to_string(),
        "pack my box with five dozen liquor jugs".to_string(),
    ];
    let vectors = bm25.embed_documents(&corpus)?;
    for (doc, vector) in corpus.iter().zip(&vectors) {
        println!("{doc:?} -> {} non-zero terms", vector.nnz());
    }

    println!("bm25 config: {:?}", bm25.get_config());
    Ok(())
}
