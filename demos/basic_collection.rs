//! Create a collection, add a few records, and fetch them back.

use chromadb::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let client = ChromaClient::builder("http://localhost:8000").without_preflight().connect().await?;

    let collection = client.get_or_create_collection("demo-articles", None).await?;

    collection
        .add(CollectionEntries {
            ids: vec!["article-1".to_string(), "article-2".to_string()],
            embeddings: Some(vec![Embedding::f32(vec![0.1, 0.2, 0.3]), Embedding::f32(vec![0.4, 0.5, 0.6])]),
            metadatas: Some(vec![
                Metadata::new().with("category", MetadataValue::Str("rust".into())),
                Metadata::new().with("category", MetadataValue::Str("databases".into())),
            ]),
            documents: Some(vec!["An intro to ownership.".to_string(), "How vector indexes work.".to_string()]),
        })
        .await?;

    let found = collection
        .get(GetOptions::new().filter(WhereClause::eq_string("category", "rust")))
        .await?;
    for record in found.records {
        println!("{}: {:?}", record.id, record.document);
    }

    Ok(())
}
