//! Integration tests driving the pipeline's HTTP clients against mock
//! services: the wiki (crawl + extract + merge), the embedding endpoint,
//! the vector index data plane, and the completion endpoint.

use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;
use url::Url;

use oresmith::completions::{CompletionProvider, OpenAiCompletionProvider};
use oresmith::crawl::CategoryCrawler;
use oresmith::embeddings::{EmbeddingProvider, OpenAiEmbeddingProvider};
use oresmith::extract::ArticleExtractor;
use oresmith::ingestion::indexer::{Indexer, IndexerConfig};
use oresmith::ingestion::store::{self, DocumentStore, FeatureMap};
use oresmith::ingestion::{Batcher, Chunker, ChunkerConfig};
use oresmith::stores::{PineconeIndex, VectorIndex};
use oresmith::types::{Document, RagError};

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

fn category_page(articles: &[&str], next: Option<&str>, subcategory: Option<&str>) -> String {
    let mut html = String::from(r#"<div class="mw-category-group">"#);
    for href in articles {
        html.push_str(&format!(r#"<a href="{href}">{href}</a>"#));
    }
    html.push_str("</div>");
    if let Some(href) = subcategory {
        html.push_str(&format!(
            r#"<div class="CategoryTreeItem"><a href="{href}">sub</a></div>"#
        ));
    }
    if let Some(href) = next {
        html.push_str(&format!(r#"<a href="{href}">next page</a>"#));
    }
    html
}

fn article_page(title: &str, body: &str) -> String {
    format!(
        r#"<h1 id="firstHeading">{title}</h1>
           <div class="mw-parser-output">
               <div class="infobox">chrome</div>
               <p>{body}</p>
           </div>"#
    )
}

#[tokio::test]
async fn crawl_walks_pagination_and_subcategories_once() {
    let server = MockServer::start_async().await;

    let root = server
        .mock_async(|when, then| {
            when.method(GET).path("/w/Category:Blocks");
            then.status(200).body(category_page(
                &["/w/Stone", "/w/File:Stone.png"],
                Some("/w/Category:Blocks_2"),
                Some("/w/Category:Ores"),
            ));
        })
        .await;
    let page_two = server
        .mock_async(|when, then| {
            when.method(GET).path("/w/Category:Blocks_2");
            // Links back to the first page; the visited set must stop the loop.
            then.status(200)
                .body(category_page(&["/w/Dirt"], Some("/w/Category:Blocks"), None));
        })
        .await;
    let subcategory = server
        .mock_async(|when, then| {
            when.method(GET).path("/w/Category:Ores");
            then.status(200).body(category_page(&["/w/Iron_Ore"], None, None));
        })
        .await;

    let crawler = CategoryCrawler::new(client(), Duration::ZERO).unwrap();
    let seed = Url::parse(&server.url("/w/Category:Blocks")).unwrap();
    let outcome = crawler.crawl(&seed).await;

    let articles: Vec<String> = outcome.articles.iter().map(Url::to_string).collect();
    assert!(articles.contains(&server.url("/w/Stone")));
    assert!(articles.contains(&server.url("/w/Dirt")));
    assert!(articles.contains(&server.url("/w/Iron_Ore")));
    assert!(
        !articles.iter().any(|url| url.contains("File:")),
        "blacklisted namespaces must not reach the article set"
    );

    // Pagination loops back to the root page; the visited set must keep
    // every page at exactly one fetch.
    assert_eq!(root.hits_async().await, 1);
    assert_eq!(page_two.hits_async().await, 1);
    assert_eq!(subcategory.hits_async().await, 1);
    assert_eq!(outcome.pages_visited, 3);
    assert_eq!(outcome.fetch_failures, 0);
}

#[tokio::test]
async fn crawl_survives_a_dead_branch() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/w/Category:Blocks");
            then.status(200).body(category_page(
                &["/w/Stone"],
                None,
                Some("/w/Category:Gone"),
            ));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/w/Category:Gone");
            then.status(500);
        })
        .await;

    let crawler = CategoryCrawler::new(client(), Duration::ZERO).unwrap();
    let seed = Url::parse(&server.url("/w/Category:Blocks")).unwrap();
    let outcome = crawler.crawl(&seed).await;

    assert_eq!(outcome.articles.len(), 1);
    assert_eq!(outcome.fetch_failures, 1);
}

#[tokio::test]
async fn merge_skips_known_urls_and_is_idempotent() {
    let server = MockServer::start_async().await;

    let stone = server
        .mock_async(|when, then| {
            when.method(GET).path("/w/Stone");
            then.status(200)
                .body(article_page("Stone", "Stone is a common block."));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/w/Dirt");
            then.status(200)
                .body(article_page("Dirt", "Dirt is everywhere."));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/w/Lava");
            then.status(200)
                .body(article_page("Lava", "Lava burns."));
        })
        .await;

    let dir = tempfile::tempdir().unwrap();
    let doc_store = DocumentStore::new(dir.path().join("documents.json"));

    // One of the three feature URLs is already captured.
    doc_store
        .save(&[
            Document::new("Stone", server.url("/w/Stone"), "Stone is a common block.")
                .with_category("blocks"),
        ])
        .await
        .unwrap();

    let mut features = FeatureMap::new();
    features.insert(
        "blocks".to_string(),
        vec![
            server.url("/w/Stone"),
            server.url("/w/Dirt"),
            server.url("/w/Lava"),
        ],
    );

    let extractor = ArticleExtractor::new(client()).unwrap();
    let report =
        store::merge_documents(&doc_store, &features, &extractor, Duration::ZERO)
            .await
            .unwrap();

    assert_eq!(report.new_documents, 2);
    assert_eq!(report.skipped_known, 1);
    assert_eq!(report.total, 3);
    assert_eq!(stone.hits_async().await, 0, "known URLs are never refetched");

    let merged = doc_store.load().await.unwrap();
    assert_eq!(merged.len(), 3);
    assert!(merged.iter().all(|doc| doc.category == "blocks"));

    // Second pass over the same features: nothing new, stable count.
    let rerun = store::merge_documents(&doc_store, &features, &extractor, Duration::ZERO)
        .await
        .unwrap();
    assert_eq!(rerun.new_documents, 0);
    assert_eq!(rerun.total, 3);
}

#[tokio::test]
async fn embedding_client_orders_vectors_by_index() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/embeddings")
                .header("authorization", "Bearer test-key")
                .body_contains("text-embedding-3-small");
            // Entries intentionally out of order; the client must sort.
            then.status(200).json_body(json!({
                "data": [
                    { "index": 1, "embedding": [0.0, 1.0] },
                    { "index": 0, "embedding": [1.0, 0.0] },
                ],
                "model": "text-embedding-3-small",
            }));
        })
        .await;

    let provider = OpenAiEmbeddingProvider::new(
        client(),
        server.url("/v1"),
        "test-key",
        "text-embedding-3-small",
    );
    let vectors = provider
        .embed_batch(&["first".to_string(), "second".to_string()])
        .await
        .unwrap();

    assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    mock.assert_async().await;
}

#[tokio::test]
async fn embedding_client_rejects_count_mismatch_and_bad_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/embeddings").body_contains("short");
            then.status(200).json_body(json!({
                "data": [{ "index": 0, "embedding": [1.0] }],
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/embeddings").body_contains("denied");
            then.status(401).body("bad key");
        })
        .await;

    let provider =
        OpenAiEmbeddingProvider::new(client(), server.url("/v1"), "k", "text-embedding-3-small");

    let err = provider
        .embed_batch(&["short one".to_string(), "short two".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::Embedding(_)));

    let err = provider.embed("denied").await.unwrap_err();
    assert!(matches!(err, RagError::Embedding(_)));
}

#[tokio::test]
async fn index_client_speaks_the_data_plane_contract() {
    let server = MockServer::start_async().await;

    let upsert = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/vectors/upsert")
                .header("Api-Key", "index-key")
                .json_body_partial(r#"{ "namespace": "wiki" }"#)
                .body_contains("https://minecraft.wiki/w/Stone#chunk0");
            then.status(200).json_body(json!({ "upsertedCount": 1 }));
        })
        .await;
    let query = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/query")
                .json_body_partial(r#"{ "namespace": "wiki", "topK": 2, "includeMetadata": true }"#);
            then.status(200).json_body(json!({
                "matches": [
                    {
                        "id": "https://minecraft.wiki/w/Stone#chunk0",
                        "score": 0.93,
                        "metadata": {
                            "title": "Stone",
                            "text": "Stone is a common block.",
                            "category": "blocks",
                            "document_url": "https://minecraft.wiki/w/Stone",
                        },
                    },
                ],
            }));
        })
        .await;
    let stats = server
        .mock_async(|when, then| {
            when.method(POST).path("/describe_index_stats");
            then.status(200).json_body(json!({
                "dimension": 2,
                "totalVectorCount": 7,
                "namespaces": { "wiki": { "vectorCount": 7 } },
            }));
        })
        .await;

    let index = PineconeIndex::new(client(), server.base_url(), "index-key");

    let chunker = Chunker::new(ChunkerConfig::default()).unwrap();
    let doc = Document::new("Stone", "https://minecraft.wiki/w/Stone", "Stone is a common block.")
        .with_category("blocks");
    let chunks = chunker.chunk_document(&doc).unwrap();
    let records: Vec<_> = chunks
        .iter()
        .map(|chunk| oresmith::stores::VectorRecord::from_chunk(chunk, vec![1.0, 0.0]))
        .collect();

    let accepted = index.upsert("wiki", &records).await.unwrap();
    assert_eq!(accepted, 1);
    upsert.assert_async().await;

    let matches = index.query("wiki", &[1.0, 0.0], 2).await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].id, "https://minecraft.wiki/w/Stone#chunk0");
    let metadata = matches[0].metadata.as_ref().unwrap();
    assert_eq!(metadata.text, "Stone is a common block.");
    query.assert_async().await;

    let index_stats = index.describe_index_stats().await.unwrap();
    assert_eq!(index_stats.total_vector_count, 7);
    assert_eq!(index_stats.dimension, Some(2));
    assert_eq!(index_stats.namespaces.get("wiki"), Some(&7));
    stats.assert_async().await;
}

#[tokio::test]
async fn text_native_upsert_ships_ndjson_records() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/records/namespaces/wiki/upsert")
                .header("content-type", "application/x-ndjson")
                .body_contains(r#""_id":"https://minecraft.wiki/w/Stone#chunk0""#);
            then.status(201);
        })
        .await;

    let index = PineconeIndex::new(client(), server.base_url(), "index-key");
    let chunker = Chunker::new(ChunkerConfig::default()).unwrap();
    let doc = Document::new("Stone", "https://minecraft.wiki/w/Stone", "Stone is a common block.")
        .with_category("blocks");
    let records: Vec<_> = chunker
        .chunk_document(&doc)
        .unwrap()
        .iter()
        .map(oresmith::stores::TextRecord::from_chunk)
        .collect();

    index.upsert_records("wiki", &records).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn index_client_surfaces_service_errors() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/vectors/upsert");
            then.status(403).body("forbidden");
        })
        .await;

    let index = PineconeIndex::new(client(), server.base_url(), "wrong-key");
    let record = oresmith::stores::VectorRecord {
        id: "a".to_string(),
        values: vec![1.0],
        metadata: oresmith::stores::RecordMetadata {
            title: String::new(),
            text: String::new(),
            category: String::new(),
            document_url: String::new(),
        },
    };
    let err = index.upsert("wiki", &[record]).await.unwrap_err();
    assert!(matches!(err, RagError::Index(_)));
}

#[tokio::test]
async fn completion_client_returns_the_first_choice() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .body_contains("What do creepers do?");
            then.status(200).json_body(json!({
                "choices": [
                    { "message": { "role": "assistant", "content": "They explode." } },
                ],
            }));
        })
        .await;

    let provider =
        OpenAiCompletionProvider::new(client(), server.url("/v1"), "test-key", "gpt-5-nano");
    let answer = provider.complete("What do creepers do?").await.unwrap();
    assert_eq!(answer, "They explode.");
    mock.assert_async().await;
}

#[tokio::test]
async fn ingest_run_skips_failed_batches_and_keeps_going() {
    let server = MockServer::start_async().await;

    // First embedding call fails, the rest succeed with one vector per input.
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/embeddings").body_contains("poison");
            then.status(500).body("boom");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/embeddings")
                .body_contains("Stone is a common block.");
            then.status(200).json_body(json!({
                "data": [{ "index": 0, "embedding": [0.5, 0.5] }],
            }));
        })
        .await;
    let upsert = server
        .mock_async(|when, then| {
            when.method(POST).path("/vectors/upsert");
            then.status(200).json_body(json!({ "upsertedCount": 1 }));
        })
        .await;

    let embedder = Arc::new(OpenAiEmbeddingProvider::new(
        client(),
        server.url("/v1"),
        "k",
        "text-embedding-3-small",
    ));
    let index = Arc::new(PineconeIndex::new(client(), server.base_url(), "k"));
    let indexer = Indexer::new(
        embedder,
        index,
        IndexerConfig {
            namespace: "wiki".to_string(),
            batch_delay: Duration::ZERO,
        },
    );

    let chunker = Chunker::new(ChunkerConfig::default()).unwrap();
    let docs = vec![
        Document::new("Poison Potato", "https://minecraft.wiki/w/Poison_Potato", "poison text"),
        Document::new("Stone", "https://minecraft.wiki/w/Stone", "Stone is a common block."),
    ];
    let chunks = chunker.chunk_documents(&docs).unwrap();
    // A tiny budget keeps each document's chunk in its own batch.
    let batches = Batcher::new(4).split(chunks, &chunker);
    assert_eq!(batches.len(), 2);

    let report = indexer.run(batches).await;
    assert_eq!(report.batches_total, 2);
    assert_eq!(report.batches_failed, 1);
    assert_eq!(report.records_upserted, 1);
    assert_eq!(upsert.hits_async().await, 1);
}
