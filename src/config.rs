//! Run configuration resolved from environment variables.
//!
//! Every binary loads a `.env` file (when present), resolves the settings it
//! needs, and constructs its clients explicitly from them. Nothing in the
//! library reads the environment on its own.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::ingestion::chunk::ChunkerConfig;
use crate::types::RagError;

/// Credentials and model identifiers for the OpenAI-compatible services.
#[derive(Clone, Debug)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub base_url: String,
    pub embed_model: String,
    pub response_model: String,
}

impl OpenAiSettings {
    pub fn from_env() -> Result<Self, RagError> {
        Ok(Self {
            api_key: require("OPENAI_API_KEY")?,
            base_url: var_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            embed_model: var_or("EMBED_MODEL", "text-embedding-3-small"),
            response_model: var_or("RESPONSE_MODEL", "gpt-5-nano"),
        })
    }
}

/// Connection details for the hosted vector index.
#[derive(Clone, Debug)]
pub struct IndexSettings {
    pub api_key: String,
    pub host: String,
    pub namespace: String,
}

impl IndexSettings {
    pub fn from_env() -> Result<Self, RagError> {
        Ok(Self {
            api_key: require("PINECONE_API_KEY")?,
            host: require("INDEX_HOST")?,
            namespace: var_or("INDEX_NAMESPACE", "__default__"),
        })
    }
}

/// Locations of the persisted pipeline files.
#[derive(Clone, Debug)]
pub struct PathSettings {
    pub features_file: PathBuf,
    pub documents_file: PathBuf,
    pub recipes_dir: PathBuf,
}

impl PathSettings {
    pub fn from_env() -> Self {
        Self {
            features_file: PathBuf::from(var_or(
                "FEATURES_FILE",
                "minecraft_main_features.json",
            )),
            documents_file: PathBuf::from(var_or("DOCUMENTS_FILE", "data/documents.json")),
            recipes_dir: PathBuf::from(var_or("RECIPES_DIR", "data/recipes")),
        }
    }
}

/// Knobs for the ingestion pass: chunk sizes, batch budget, delays.
#[derive(Clone, Debug)]
pub struct IngestSettings {
    pub chunker: ChunkerConfig,
    pub max_batch_tokens: usize,
    pub crawl_delay: Duration,
    pub batch_delay: Duration,
}

impl IngestSettings {
    pub fn from_env() -> Result<Self, RagError> {
        Ok(Self {
            chunker: ChunkerConfig {
                max_tokens: parse_var("MAX_CHUNK_TOKENS", 1000)?,
                overlap_tokens: parse_var("CHUNK_OVERLAP_TOKENS", 200)?,
                max_chars: parse_var("MAX_CHUNK_CHARS", 1000)?,
                overlap_chars: parse_var("CHUNK_OVERLAP_CHARS", 200)?,
            },
            max_batch_tokens: parse_var("MAX_BATCH_TOKENS", 8191)?,
            crawl_delay: Duration::from_millis(parse_var("CRAWL_DELAY_MS", 500)?),
            batch_delay: Duration::from_millis(parse_var("UPSERT_DELAY_MS", 50)?),
        })
    }
}

/// Everything a full pipeline run needs, resolved in one call.
#[derive(Clone, Debug)]
pub struct Settings {
    pub openai: OpenAiSettings,
    pub index: IndexSettings,
    pub paths: PathSettings,
    pub ingest: IngestSettings,
    pub top_k: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self, RagError> {
        Ok(Self {
            openai: OpenAiSettings::from_env()?,
            index: IndexSettings::from_env()?,
            paths: PathSettings::from_env(),
            ingest: IngestSettings::from_env()?,
            top_k: parse_var("TOP_K", 5)?,
        })
    }
}

/// User agent sent on every wiki request.
pub const USER_AGENT: &str = concat!("oresmith/", env!("CARGO_PKG_VERSION"));

/// Builds the shared HTTP client used across the pipeline.
pub fn http_client() -> Result<reqwest::Client, RagError> {
    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .use_rustls_tls()
        .timeout(Duration::from_secs(30))
        .build()?)
}

fn require(key: &str) -> Result<String, RagError> {
    env::var(key).map_err(|_| RagError::Config(format!("{key} is not set")))
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(key: &str, default: T) -> Result<T, RagError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|err| RagError::Config(format!("{key}={raw} is invalid: {err}"))),
        Err(_) => Ok(default),
    }
}
