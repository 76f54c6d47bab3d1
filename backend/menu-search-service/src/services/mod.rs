pub mod elasticsearch;
pub mod memory;

pub use elasticsearch::{ElasticsearchConfig, ElasticsearchIndex};
pub use memory::{InMemoryIndex, IndexOperation};

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("invalid Elasticsearch URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("failed to build transport: {0}")]
    TransportBuild(#[from] ::elasticsearch::http::transport::BuildError),
    #[error("transport error: {0}")]
    Transport(#[from] ::elasticsearch::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("{operation} on '{collection}' rejected with status {status}: {body}")]
    Rejected {
        operation: &'static str,
        collection: String,
        status: u16,
        body: String,
    },
}

/// Document store the projections write into and the HTTP layer reads from.
///
/// Implementations are shared between both domain pipelines and the HTTP
/// workers, so they must tolerate concurrent callers.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Inserts `document` under `id`, replacing any existing document.
    async fn upsert(&self, collection: &str, id: &str, document: &Value) -> Result<(), IndexError>;

    /// Merges `fields` into the document `id`; fields not listed are kept.
    ///
    /// A missing document is created from `fields`.
    async fn partial_update(
        &self,
        collection: &str,
        id: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), IndexError>;

    /// Removes the document `id`. Removing an unknown id succeeds.
    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<(), IndexError>;

    /// Runs a keyword query and returns the backend's raw result payload.
    async fn search(
        &self,
        collection: &str,
        query: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Value, IndexError>;
}
