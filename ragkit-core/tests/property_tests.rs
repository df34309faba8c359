//! Property tests for search ordering, rerank filtering, and chunk coverage.

use std::collections::HashMap;

use async_trait::async_trait;
use proptest::prelude::*;

use ragkit_core::chunking::{estimate_tokens, Chunker, TokenChunker};
use ragkit_core::document::{Chunk, Document, SearchResult};
use ragkit_core::inmemory::InMemoryVectorStore;
use ragkit_core::reranker::RerankModel;
use ragkit_core::vectorstore::{CollectionSpec, IndexType, MetricType, VectorStore};
use ragkit_core::Result;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

/// Generate a chunk with a normalized embedding.
fn arb_chunk(dim: usize) -> impl Strategy<Value = Chunk> {
    ("[a-z]{3,8}", "[a-z ]{5,30}", arb_normalized_embedding(dim)).prop_map(
        |(id, text, embedding)| Chunk {
            id,
            text,
            embedding,
            metadata: HashMap::new(),
            document_id: "doc_1".to_string(),
        },
    )
}

fn spec(dim: usize) -> CollectionSpec {
    CollectionSpec {
        name: "test".to_string(),
        database: None,
        dimension: dim,
        index_type: IndexType::Flat,
        metric: MetricType::Cosine,
    }
}

/// For any set of stored chunks, searching returns results ordered by
/// descending similarity score, and the number of results is at most
/// `top_k` and at most the number of stored rows.
mod prop_search_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_descending_and_bounded_by_top_k(
            chunks in proptest::collection::vec(arb_chunk(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            top_k in 1usize..25,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let stored = chunks.len();
            let results = rt.block_on(async {
                let store = InMemoryVectorStore::new();
                store.ensure_collection(&spec(DIM)).await.unwrap();
                // Inserts append, so duplicate ids are just extra rows.
                store.insert("test", &chunks).await.unwrap();
                store.search("test", &query, top_k).await.unwrap()
            });

            prop_assert!(results.len() <= top_k);
            prop_assert!(results.len() <= stored);

            for window in results.windows(2) {
                prop_assert!(
                    window[0].score >= window[1].score,
                    "results not in descending order: {} < {}",
                    window[0].score,
                    window[1].score,
                );
            }
        }
    }
}

/// For any candidate list and threshold, every reranked candidate scores
/// strictly above the threshold and the output is ordered by the rerank
/// score descending — never the original similarity.
mod prop_rerank_threshold {
    use super::*;

    /// Deterministic scorer: text length in characters, scaled.
    struct LengthRerank;

    #[async_trait]
    impl RerankModel for LengthRerank {
        async fn score(&self, _query: &str, text: &str) -> Result<f32> {
            Ok(text.chars().count() as f32 / 10.0)
        }
    }

    fn arb_result() -> impl Strategy<Value = SearchResult> {
        ("[a-z ]{0,40}", 0.0f32..1.0f32).prop_map(|(text, score)| SearchResult {
            chunk: Chunk {
                id: "c".to_string(),
                text,
                embedding: Vec::new(),
                metadata: HashMap::new(),
                document_id: "doc".to_string(),
            },
            score,
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn retained_scores_exceed_threshold_in_descending_order(
            results in proptest::collection::vec(arb_result(), 0..15),
            threshold in 0.0f32..5.0f32,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let input_len = results.len();
            let reranked = rt.block_on(async {
                LengthRerank.rerank("query", results, threshold).await.unwrap()
            });

            prop_assert!(reranked.len() <= input_len);
            for result in &reranked {
                prop_assert!(result.score > threshold);
                let expected = result.chunk.text.chars().count() as f32 / 10.0;
                prop_assert_eq!(result.score, expected);
            }
            for window in reranked.windows(2) {
                prop_assert!(window[0].score >= window[1].score);
            }
        }
    }
}

/// For any document, concatenating the chunker's output in order
/// reproduces the document text exactly, and every chunk stays within the
/// token budget.
mod prop_chunk_coverage {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn chunks_cover_document_within_budget(
            text in "[a-zA-Z 。！？.!?\n今夕是何年handbook]{0,300}",
            max_tokens in 1usize..50,
        ) {
            let document = Document::new("doc", text.clone());
            let chunker = TokenChunker::new(max_tokens);
            let chunks: Vec<_> = chunker.split(&document).collect();

            let joined: String = chunks.iter().map(|c| c.text.as_str()).collect();
            prop_assert_eq!(&joined, &text, "chunks do not cover the document");

            for chunk in &chunks {
                prop_assert!(!chunk.text.is_empty());
                prop_assert!(
                    estimate_tokens(&chunk.text) <= max_tokens,
                    "chunk over budget: {:?}",
                    chunk.text,
                );
            }
        }
    }
}
