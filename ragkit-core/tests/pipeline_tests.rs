//! End-to-end pipeline tests with mock providers.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;

use ragkit_core::{
    ChatModel, ChatStream, Document, EmbeddingProvider, InMemoryVectorStore, PromptTemplate,
    RagConfig, RagError, RagPipeline, RerankModel, Result, TokenChunker,
};

const DIM: usize = 4;

/// Embeds text into a fixed keyword-feature space so similarity is
/// deterministic: axis 0 fires on the calendar question, axis 1 on
/// weather, axis 2 on everything else.
struct KeywordEmbedding;

fn keyword_vector(text: &str) -> Vec<f32> {
    let mut v = vec![0.0; DIM];
    if text.contains('年') {
        v[0] = 1.0;
    }
    if text.contains("weather") {
        v[1] = 1.0;
    }
    if v[0] == 0.0 && v[1] == 0.0 {
        v[2] = 1.0;
    }
    v
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(keyword_vector(text))
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// Scores candidates by substring lookup; unknown text scores 0.0.
struct SubstringRerank {
    scores: Vec<(&'static str, f32)>,
}

#[async_trait]
impl RerankModel for SubstringRerank {
    async fn score(&self, _query: &str, text: &str) -> Result<f32> {
        Ok(self
            .scores
            .iter()
            .find(|(needle, _)| text.contains(needle))
            .map(|(_, score)| *score)
            .unwrap_or(0.0))
    }
}

/// Echoes the received prompt as the sync answer and replays canned
/// fragments as the stream.
struct EchoChat {
    fragments: Vec<&'static str>,
}

#[async_trait]
impl ChatModel for EchoChat {
    fn name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        Ok(prompt.to_string())
    }

    async fn stream(&self, _prompt: &str) -> Result<ChatStream> {
        let fragments: Vec<Result<String>> =
            self.fragments.iter().map(|f| Ok(f.to_string())).collect();
        Ok(Box::pin(tokio_stream::iter(fragments)))
    }
}

const RELEVANT: &str = "今夕是何年：岁在甲辰。";
const IRRELEVANT: &str = "The weather today is sunny with light wind.";

fn build_pipeline(max_tokens: usize, fragments: Vec<&'static str>) -> RagPipeline {
    let config = RagConfig::builder()
        .collection("docs")
        .dimension(DIM)
        .max_tokens(max_tokens)
        .build()
        .unwrap();

    RagPipeline::builder()
        .config(config)
        .template(PromptTemplate::new(
            "Answer using only this context:\n{{question_answer_context}}",
        ))
        .chunker(Arc::new(TokenChunker::new(max_tokens)))
        .embedding_provider(Arc::new(KeywordEmbedding))
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .rerank_model(Arc::new(SubstringRerank {
            scores: vec![("今夕", 0.9), ("weather", 0.3)],
        }))
        .chat_model(Arc::new(EchoChat { fragments }))
        .build()
        .unwrap()
}

fn three_page_document_set() -> Vec<Document> {
    (1..=3)
        .map(|page| {
            let sentence = "The employee handbook covers conduct. ".repeat(20);
            Document::new(format!("handbook_p{page}"), sentence)
        })
        .collect()
}

#[tokio::test]
async fn init_refuses_dimension_mismatch() {
    let config = RagConfig::builder().dimension(DIM + 1).build().unwrap();
    let pipeline = RagPipeline::builder()
        .config(config)
        .template(PromptTemplate::new("{{question_answer_context}}"))
        .chunker(Arc::new(TokenChunker::new(50)))
        .embedding_provider(Arc::new(KeywordEmbedding))
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .rerank_model(Arc::new(SubstringRerank { scores: vec![] }))
        .chat_model(Arc::new(EchoChat { fragments: vec![] }))
        .build()
        .unwrap();

    let err = pipeline.init().await.unwrap_err();
    assert!(matches!(err, RagError::DimensionMismatch { expected, actual }
        if expected == DIM + 1 && actual == DIM));
}

#[tokio::test]
async fn ingest_three_pages_stores_all_chunks() {
    let pipeline = build_pipeline(20, vec![]);
    pipeline.init().await.unwrap();

    let documents = three_page_document_set();
    let report = pipeline.ingest(&documents).await;

    assert!(report.is_complete());
    assert!(report.stored_chunks >= 3, "expected at least one chunk per page");

    // Every stored chunk is searchable.
    let results = pipeline.retrieve("handbook conduct", report.stored_chunks + 10).await.unwrap();
    assert_eq!(results.len(), report.stored_chunks);
}

#[tokio::test]
async fn reingesting_duplicates_chunks() {
    let pipeline = build_pipeline(20, vec![]);
    pipeline.init().await.unwrap();

    let documents = three_page_document_set();
    let first = pipeline.ingest(&documents).await;
    let second = pipeline.ingest(&documents).await;
    assert_eq!(first.stored_chunks, second.stored_chunks);

    // Re-ingestion is documented as non-idempotent: the store now holds
    // twice the chunks.
    let results = pipeline.retrieve("handbook", first.stored_chunks * 2 + 10).await.unwrap();
    assert_eq!(results.len(), first.stored_chunks * 2);
}

#[tokio::test]
async fn answer_keeps_only_candidates_above_threshold() {
    let pipeline = build_pipeline(100, vec![]);
    pipeline.init().await.unwrap();

    let report = pipeline
        .ingest(&[Document::new("rel", RELEVANT), Document::new("irr", IRRELEVANT)])
        .await;
    assert!(report.is_complete());

    // Default threshold 0.8: the 0.9-scored candidate survives, the
    // 0.3-scored one is dropped. EchoChat returns the prompt itself.
    let prompt = pipeline.answer("今夕是何年？").await.unwrap();
    assert!(prompt.contains(RELEVANT));
    assert!(!prompt.contains(IRRELEVANT));
    assert!(!prompt.contains("{{question_answer_context}}"));
    assert!(prompt.contains("今夕是何年？"));
}

#[tokio::test]
async fn answer_with_top_k_bounds_retrieval() {
    let pipeline = build_pipeline(100, vec![]);
    pipeline.init().await.unwrap();
    pipeline
        .ingest(&[Document::new("rel", RELEVANT), Document::new("irr", IRRELEVANT)])
        .await;

    let prompt = pipeline.answer_with_top_k("今夕是何年？", 1).await.unwrap();
    assert!(prompt.contains(RELEVANT));
    assert!(!prompt.contains(IRRELEVANT));
}

#[tokio::test]
async fn answer_tolerates_all_candidates_filtered() {
    let pipeline = build_pipeline(100, vec![]);
    pipeline.init().await.unwrap();
    pipeline.ingest(&[Document::new("irr", IRRELEVANT)]).await;

    // All candidates score below the threshold; the prompt context is
    // empty but the query still completes.
    let prompt = pipeline.answer("今夕是何年？").await.unwrap();
    assert!(!prompt.contains(IRRELEVANT));
    assert!(prompt.contains("今夕是何年？"));
}

#[tokio::test]
async fn answer_with_prefilter_uses_similarity_scores() {
    let pipeline = build_pipeline(100, vec![]);
    pipeline.init().await.unwrap();
    pipeline
        .ingest(&[Document::new("rel", RELEVANT), Document::new("irr", IRRELEVANT)])
        .await;

    let prompt = pipeline.answer_with_prefilter("今夕是何年？").await.unwrap();
    assert!(prompt.starts_with("User question: 今夕是何年？"));
    assert!(prompt.contains(RELEVANT));
    assert!(!prompt.contains(IRRELEVANT));
}

#[tokio::test]
async fn stream_fragments_reassemble_in_arrival_order() {
    let pipeline = build_pipeline(100, vec!["今", "夕", "是", "何", "年"]);
    pipeline.init().await.unwrap();
    pipeline.ingest(&[Document::new("rel", RELEVANT)]).await;

    let mut stream = pipeline.answer_stream("今夕是何年？").await.unwrap();
    let mut reconstructed = String::new();
    while let Some(fragment) = stream.next().await {
        reconstructed.push_str(&fragment.unwrap());
    }
    assert_eq!(reconstructed, "今夕是何年");
}

#[tokio::test]
async fn ingest_reports_failures_per_document() {
    /// Fails on any text mentioning "poison".
    struct FlakyEmbedding;

    #[async_trait]
    impl EmbeddingProvider for FlakyEmbedding {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if text.contains("poison") {
                return Err(RagError::EmbeddingUnavailable {
                    provider: "flaky".into(),
                    message: "provider down".into(),
                });
            }
            Ok(keyword_vector(text))
        }

        fn dimensions(&self) -> usize {
            DIM
        }
    }

    let config = RagConfig::builder().dimension(DIM).max_tokens(50).build().unwrap();
    let pipeline = RagPipeline::builder()
        .config(config)
        .template(PromptTemplate::new("{{question_answer_context}}"))
        .chunker(Arc::new(TokenChunker::new(50)))
        .embedding_provider(Arc::new(FlakyEmbedding))
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .rerank_model(Arc::new(SubstringRerank { scores: vec![] }))
        .chat_model(Arc::new(EchoChat { fragments: vec![] }))
        .build()
        .unwrap();
    pipeline.init().await.unwrap();

    let report = pipeline
        .ingest(&[
            Document::new("good1", "fine text"),
            Document::new("bad", "poison text"),
            Document::new("good2", "more fine text"),
        ])
        .await;

    // The failing document is reported; the batch continues around it.
    assert_eq!(report.stored_chunks, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].document_id, "bad");
    assert!(matches!(report.failures[0].error, RagError::EmbeddingUnavailable { .. }));
}
