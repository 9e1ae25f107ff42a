//! Create a collection wired to an embedding function, then reconnect and
//! reopen it without re-supplying the function — the registry rebuilds it
//! from the name/config persisted on the collection's metadata.

use chromadb::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let client = ChromaClient::builder("http://localhost:8000").without_preflight().connect().await?;

    let ef = MockEmbeddingFunction::new(8);
    let collection = client
        .create_collection_with_ef("demo-auto-wire", &ef, Some(DistanceMetric::Cosine), None)
        .await?;

    collection
        .add(CollectionEntries {
            ids: vec!["doc-1".to_string()],
            documents: Some(vec!["written once, embedded automatically".to_string()]),
            ..Default::default()
        })
        .await?;

    // A second process that only knows the collection's name gets the same
    // embedding function back, reconstructed from the registry.
    let reopened = client.get_or_create_collection("demo-auto-wire", None).await?;
    println!("embedding function on reopen: {:?}", reopened.dense_embedding_function().map(|ef| ef.name().to_string()));

    Ok(())
}
