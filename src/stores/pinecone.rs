//! HTTP client for the hosted vector index data plane.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{IndexStats, QueryMatch, VectorIndex, VectorRecord};
use crate::ingestion::chunk::Chunk;
use crate::types::RagError;

/// Talks to a Pinecone-style index over its per-index host.
pub struct PineconeIndex {
    client: Client,
    host: String,
    api_key: String,
}

impl PineconeIndex {
    /// `host` is the index host from the console, with or without a scheme.
    pub fn new(client: Client, host: impl AsRef<str>, api_key: impl Into<String>) -> Self {
        let host = host.as_ref().trim_end_matches('/');
        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{host}")
        };
        Self {
            client,
            host,
            api_key: api_key.into(),
        }
    }

    async fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, RagError> {
        let response = self
            .client
            .post(format!("{}{path}", self.host))
            .header("Api-Key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::Index(format!(
                "index request to {path} failed ({status}): {body}"
            )));
        }
        Ok(response)
    }
}

/// Text-native record for indexes with integrated embedding: the service
/// embeds `text` on ingest, so no vector is supplied.
#[derive(Clone, Debug, Serialize)]
pub struct TextRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub text: String,
    pub title: String,
    pub category: String,
    pub document_url: String,
}

impl TextRecord {
    pub fn from_chunk(chunk: &Chunk) -> Self {
        Self {
            id: chunk.id.clone(),
            text: chunk.text.clone(),
            title: chunk.title.clone(),
            category: chunk.category.clone(),
            document_url: chunk.document_url.clone(),
        }
    }
}

impl PineconeIndex {
    /// Alternate upsert path: ships text records as NDJSON and lets the
    /// index embed them service-side.
    pub async fn upsert_records(
        &self,
        namespace: &str,
        records: &[TextRecord],
    ) -> Result<(), RagError> {
        if records.is_empty() {
            return Ok(());
        }
        let mut body = String::new();
        for record in records {
            body.push_str(&serde_json::to_string(record)?);
            body.push('\n');
        }

        let response = self
            .client
            .post(format!(
                "{}/records/namespaces/{namespace}/upsert",
                self.host
            ))
            .header("Api-Key", &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::Index(format!(
                "record upsert failed ({status}): {body}"
            )));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct UpsertResponse {
    #[serde(rename = "upsertedCount", default)]
    upserted_count: usize,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct StatsResponse {
    #[serde(default)]
    dimension: Option<usize>,
    #[serde(rename = "totalVectorCount", default)]
    total_vector_count: usize,
    #[serde(default)]
    namespaces: std::collections::BTreeMap<String, NamespaceStats>,
}

#[derive(Deserialize)]
struct NamespaceStats {
    #[serde(rename = "vectorCount", default)]
    vector_count: usize,
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn upsert(&self, namespace: &str, records: &[VectorRecord]) -> Result<usize, RagError> {
        if records.is_empty() {
            return Ok(0);
        }
        let body = json!({
            "vectors": records,
            "namespace": namespace,
        });
        let response = self.post("/vectors/upsert", &body).await?;
        let parsed: UpsertResponse = response
            .json()
            .await
            .map_err(|err| RagError::Index(format!("unparseable upsert response: {err}")))?;
        Ok(parsed.upserted_count)
    }

    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<QueryMatch>, RagError> {
        let body = json!({
            "namespace": namespace,
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
        });
        let response = self.post("/query", &body).await?;
        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|err| RagError::Index(format!("unparseable query response: {err}")))?;
        Ok(parsed.matches)
    }

    async fn describe_index_stats(&self) -> Result<IndexStats, RagError> {
        let response = self.post("/describe_index_stats", &json!({})).await?;
        let parsed: StatsResponse = response
            .json()
            .await
            .map_err(|err| RagError::Index(format!("unparseable stats response: {err}")))?;
        Ok(IndexStats {
            dimension: parsed.dimension,
            total_vector_count: parsed.total_vector_count,
            namespaces: parsed
                .namespaces
                .into_iter()
                .map(|(name, stats)| (name, stats.vector_count))
                .collect(),
        })
    }
}
