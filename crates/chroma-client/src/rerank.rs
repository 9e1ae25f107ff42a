//! Reranker contract and result composer.
//!
//! A [`Reranker`] re-scores an already-fetched candidate set (typically a
//! [`crate::dispatch::SearchResult`] group) against a query, without
//! issuing any further server requests. `compose_reranked` validates that
//! the reranker's returned permutation only ever references indices that
//! were actually offered to it — a reranker that hallucinates an
//! out-of-range index is a programming error in that reranker, not
//! something this crate silently tolerates.

use crate::dispatch::{Match, SearchResult};
use crate::error::{Error, Result};

/// One reranker's verdict on a single candidate: its original index into
/// the input slice, plus the new relevance score.
#[derive(Debug, Clone, Copy)]
pub struct RerankedIndex {
    /// Index into the candidate slice passed to [`Reranker::rerank`].
    pub index: usize,
    /// The reranker's relevance score for that candidate (higher is
    /// better).
    pub score: f32,
}

/// A reranking model: given a query and a batch of candidate documents,
/// returns a relevance-sorted permutation with fresh scores.
pub trait Reranker: Send + Sync {
    /// This reranker's provider name, e.g. `"cohere"`.
    fn provider(&self) -> &str;

    /// This reranker's specific model name, e.g.
    /// `"rerank-english-v3.0"`.
    fn model(&self) -> &str;

    /// A stable `provider-model` identifier, used to namespace cached
    /// rerank results.
    fn id(&self) -> String {
        format!("{}-{}", self.provider(), self.model())
    }

    /// Rerank `candidates` against `query`, returning a relevance-sorted
    /// permutation (best first). Every `RerankedIndex::index` must be
    /// `< candidates.len()`.
    fn rerank(&self, query: &str, candidates: &[String]) -> Result<Vec<RerankedIndex>>;
}

/// Apply a reranker's permutation to an original `SearchResult` group,
/// producing a new ordering with the reranker's scores substituted in.
///
/// Returns [`Error::Internal`] if the reranker referenced an index beyond
/// `candidates.len()` — a contract violation on the reranker's part, not a
/// transport failure, but surfaced through the same error type since
/// callers handle both uniformly.
pub fn compose_reranked(candidates: &[Match], reranked: &[RerankedIndex]) -> Result<Vec<Match>> {
    let mut out = Vec::with_capacity(reranked.len());
    for entry in reranked {
        let Some(candidate) = candidates.get(entry.index) else {
            return Err(Error::Internal {
                status: 0,
                message: format!(
                    "reranker returned index {} but only {} candidates were offered",
                    entry.index,
                    candidates.len()
                ),
            });
        };
        let mut rescored = candidate.clone();
        rescored.score = entry.score;
        out.push(rescored);
    }
    Ok(out)
}

/// Rerank every group of a [`SearchResult`] against its corresponding
/// query text, one query per group in order (`len(queryTexts)` must match
/// the number of result groups).
///
/// A candidate with no document text (not included in the original search,
/// or absent server-side) is offered to the reranker as an empty string
/// rather than skipped, so the returned index set still lines up with
/// `candidates`.
pub fn rerank_search_result(
    result: &SearchResult,
    queries: &[String],
    reranker: &dyn Reranker,
) -> Result<SearchResult> {
    if queries.len() != result.groups.len() {
        return Err(Error::InvalidArgument(format!(
            "reranking {} queries against {} result groups",
            queries.len(),
            result.groups.len()
        )));
    }
    let mut groups = Vec::with_capacity(result.groups.len());
    for (query, candidates) in queries.iter().zip(&result.groups) {
        let documents: Vec<String> = candidates.iter().map(|m| m.document.clone().unwrap_or_default()).collect();
        let reranked = reranker.rerank(query, &documents)?;
        groups.push(compose_reranked(candidates, &reranked)?);
    }
    Ok(SearchResult { groups })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str, score: f32) -> Match {
        Match { id: id.to_string(), score, document: None, metadata: None, embedding: None }
    }

    #[test]
    fn compose_reranked_reorders_and_rescores() {
        let candidates = vec![sample("a", 0.1), sample("b", 0.2), sample("c", 0.3)];
        let reranked = vec![
            RerankedIndex { index: 2, score: 0.9 },
            RerankedIndex { index: 0, score: 0.5 },
        ];
        let result = compose_reranked(&candidates, &reranked).unwrap();
        assert_eq!(result[0].id, "c");
        assert_eq!(result[0].score, 0.9);
        assert_eq!(result[1].id, "a");
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let candidates = vec![sample("a", 0.1)];
        let reranked = vec![RerankedIndex { index: 5, score: 1.0 }];
        assert!(compose_reranked(&candidates, &reranked).is_err());
    }

    struct ReverseReranker;
    impl Reranker for ReverseReranker {
        fn provider(&self) -> &str {
            "reverse"
        }
        fn model(&self) -> &str {
            "test"
        }
        fn rerank(&self, _query: &str, candidates: &[String]) -> Result<Vec<RerankedIndex>> {
            Ok((0..candidates.len())
                .rev()
                .enumerate()
                .map(|(score, index)| RerankedIndex { index, score: score as f32 })
                .collect())
        }
    }

    #[test]
    fn rerank_search_result_reranks_each_group_against_its_query() {
        let result = SearchResult {
            groups: vec![
                vec![sample("a", 0.1), sample("b", 0.2)],
                vec![sample("c", 0.3)],
            ],
        };
        let queries = vec!["q1".to_string(), "q2".to_string()];
        let reranked = rerank_search_result(&result, &queries, &ReverseReranker).unwrap();
        assert_eq!(reranked.groups.len(), 2);
        assert_eq!(reranked.group(0)[0].id, "b");
        assert_eq!(reranked.group(1)[0].id, "c");
    }

    #[test]
    fn rerank_search_result_rejects_a_query_count_mismatch() {
        let result = SearchResult { groups: vec![vec![sample("a", 0.1)]] };
        let queries = vec!["q1".to_string(), "q2".to_string()];
        assert!(rerank_search_result(&result, &queries, &ReverseReranker).is_err());
    }

    #[test]
    fn id_is_namespaced_by_provider_and_model() {
        struct Dummy;
        impl Reranker for Dummy {
            fn provider(&self) -> &str {
                "cohere"
            }
            fn model(&self) -> &str {
                "rerank-v3"
            }
            fn rerank(&self, _query: &str, _candidates: &[String]) -> Result<Vec<RerankedIndex>> {
                Ok(Vec::new())
            }
        }
        assert_eq!(Dummy.id(), "cohere-rerank-v3");
    }
}
