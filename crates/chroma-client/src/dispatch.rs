//! Search dispatcher: composes a [`RankExpression`] with the filter/
//! include/limit/offset options from [`QueryOptions`] into one
//! [`SearchRequest`], then regroups the server's flat [`SearchResponse`]
//! back into one ragged slice of matches per logical query, via
//! `group_sizes`.

use crate::collection::{Collection, QueryOptions};
use crate::error::{Error, Result};
use crate::retry::Idempotency;
use crate::wire::SearchRequest;
use chroma_types::{Metadata, RankExpression};
use reqwest::Method;

/// One matched record within one logical query's results.
#[derive(Debug, Clone, Default)]
pub struct Match {
    /// Record id.
    pub id: String,
    /// Rank score (lower or higher is "better" depending on the rank
    /// expression used — this dispatcher does not reinterpret it).
    pub score: f32,
    /// Document text, when included.
    pub document: Option<String>,
    /// Metadata, when included.
    pub metadata: Option<Metadata>,
    /// Embedding, when included.
    pub embedding: Option<serde_json::Value>,
}

/// The result of a search: one ragged slice of [`Match`]es per logical
/// query, in request order.
#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    /// `groups[i]` holds the matches for the `i`-th query in the rank
    /// expression that produced this result.
    pub groups: Vec<Vec<Match>>,
}

impl SearchResult {
    /// Matches for the query at `index`, or an empty slice if out of
    /// range.
    pub fn group(&self, index: usize) -> &[Match] {
        self.groups.get(index).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Run a search against a collection: `rank` composes k-NN/RRF/arithmetic
/// sub-expressions, `options` narrows and paginates each query's results.
pub async fn search(collection: &Collection, rank: RankExpression, options: QueryOptions) -> Result<SearchResult> {
    let rank_json = rank.to_wire_json()?;
    let filter_json = options.filter.map(|f| f.to_wire_json()).transpose()?;
    let body = SearchRequest {
        rank: rank_json,
        filter: filter_json,
        limit: options.limit,
        offset: options.offset,
        include: include_wire_fields(&options.include),
    };
    let url = collection.client_url("/search")?;
    let response: crate::wire::SearchResponse =
        collection.client_transport().send_json(Method::POST, url, Some(&body), Idempotency::Safe).await?;
    regroup(response)
}

fn include_wire_fields(include: &crate::collection::IncludeFields) -> Vec<String> {
    let mut fields = Vec::new();
    if include.documents {
        fields.push("documents".to_string());
    }
    if include.metadatas {
        fields.push("metadatas".to_string());
    }
    if include.embeddings {
        fields.push("embeddings".to_string());
    }
    if include.distances {
        fields.push("scores".to_string());
    }
    fields
}

fn regroup(response: crate::wire::SearchResponse) -> Result<SearchResult> {
    let total: usize = response.group_sizes.iter().sum();
    if response.ids.len() != total || response.scores.len() != total {
        return Err(Error::Internal {
            status: 0,
            message: format!(
                "search response group_sizes sum to {total} but carried {} ids and {} scores",
                response.ids.len(),
                response.scores.len()
            ),
        });
    }

    let n = total;
    let mut documents = response.documents.unwrap_or_else(|| vec![None; n]);
    let mut metadatas = response.metadatas.unwrap_or_else(|| vec![None; n]);
    let mut embeddings = response.embeddings.unwrap_or_else(|| vec![None; n]);
    documents.resize(n, None);
    metadatas.resize(n, None);
    embeddings.resize(n, None);

    let mut ids = response.ids.into_iter();
    let mut scores = response.scores.into_iter();
    let mut documents = documents.into_iter();
    let mut metadatas = metadatas.into_iter();
    let mut embeddings = embeddings.into_iter();

    let mut groups = Vec::with_capacity(response.group_sizes.len());
    for size in response.group_sizes {
        let mut group = Vec::with_capacity(size);
        for _ in 0..size {
            group.push(Match {
                id: ids.next().expect("group_sizes accounted for every id"),
                score: scores.next().expect("group_sizes accounted for every score"),
                document: documents.next().flatten(),
                metadata: metadatas.next().flatten(),
                embedding: embeddings.next().flatten(),
            });
        }
        groups.push(group);
    }
    Ok(SearchResult { groups })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::SearchResponse;

    #[test]
    fn regroups_flat_response_by_group_sizes() {
        let response = SearchResponse {
            group_sizes: vec![2, 1],
            ids: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            scores: vec![0.1, 0.2, 0.3],
            documents: None,
            metadatas: None,
            embeddings: None,
        };
        let result = regroup(response).unwrap();
        assert_eq!(result.groups.len(), 2);
        assert_eq!(result.group(0).len(), 2);
        assert_eq!(result.group(1).len(), 1);
        assert_eq!(result.group(1)[0].id, "c");
    }

    #[test]
    fn mismatched_group_sizes_is_an_internal_error() {
        let response = SearchResponse {
            group_sizes: vec![2],
            ids: vec!["a".to_string()],
            scores: vec![0.1],
            documents: None,
            metadatas: None,
            embeddings: None,
        };
        assert!(regroup(response).is_err());
    }
}
