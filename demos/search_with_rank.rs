//! Compose a rank expression (k-NN plus a reciprocal-rank fusion over a
//! second ranking) and run a search.

use chromadb::prelude::*;
use chromadb::{search, KnnRank};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let client = ChromaClient::builder("http://localhost:8000").without_preflight().connect().await?;
    let collection = client.get_collection("demo-articles").await?;

    let dense = RankExpression::knn(KnnRank::from_texts(vec!["ownership and borrowing"], 10));
    let sparse = RankExpression::knn(KnnRank::from_texts(vec!["ownership and borrowing"], 10));
    let fused = RankExpression::rrf(vec![dense, sparse], 60, true);

    let options = QueryOptions { limit: 5, ..Default::default() };
    let result = search(&collection, fused, options).await?;

    for m in result.group(0) {
        println!("{} (score={:.4}): {:?}", m.id, m.score, m.document);
    }

    Ok(())
}
