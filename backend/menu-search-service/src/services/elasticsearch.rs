use async_trait::async_trait;
use elasticsearch::{
    auth::Credentials,
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts},
    DeleteParts, Elasticsearch, IndexParts, SearchParts, UpdateParts,
};
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use url::Url;

use super::{DocumentIndex, IndexError};

#[derive(Debug, Clone)]
pub struct ElasticsearchConfig {
    pub url: String,
    pub api_key: Option<String>,
}

#[derive(Clone)]
pub struct ElasticsearchIndex {
    client: Elasticsearch,
}

impl ElasticsearchIndex {
    pub fn new(config: &ElasticsearchConfig) -> Result<Self, IndexError> {
        let parsed = Url::parse(&config.url)?;
        let pool = SingleNodeConnectionPool::new(parsed);
        let mut builder = TransportBuilder::new(pool);
        if let Some(api_key) = config.api_key.as_ref().filter(|k| !k.is_empty()) {
            builder = builder.auth(Credentials::EncodedApiKey(api_key.clone()));
        }
        let transport = builder.build()?;

        Ok(Self {
            client: Elasticsearch::new(transport),
        })
    }

    /// Creates `collection` with `mappings` unless it already exists.
    pub async fn ensure_index(&self, collection: &str, mappings: Value) -> Result<(), IndexError> {
        let exists_response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[collection]))
            .send()
            .await?;

        if exists_response.status_code().is_success() {
            debug!(collection, "Index already exists");
            return Ok(());
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(collection))
            .body(json!({ "mappings": mappings }))
            .send()
            .await?;
        ensure_success(response, "create index", collection).await?;

        info!(collection, "Created search index");
        Ok(())
    }
}

/// Mappings for the `restaurants` collection.
pub fn restaurant_mappings() -> Value {
    json!({
        "properties": {
            "id": { "type": "keyword" },
            "name": { "type": "text" },
            "address": { "type": "text" },
            "phone": { "type": "keyword" },
            "imageUrl": { "type": "keyword", "index": false }
        }
    })
}

/// Mappings for the `foods` collection.
pub fn food_mappings() -> Value {
    json!({
        "properties": {
            "id": { "type": "keyword" },
            "name": { "type": "text" },
            "restaurant": { "type": "keyword" },
            "description": { "type": "text" },
            "price": { "type": "double" },
            "imageUrl": { "type": "keyword", "index": false }
        }
    })
}

async fn ensure_success(
    response: Response,
    operation: &'static str,
    collection: &str,
) -> Result<Response, IndexError> {
    let status = response.status_code();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(IndexError::Rejected {
        operation,
        collection: collection.to_owned(),
        status: status.as_u16(),
        body,
    })
}

fn search_body(query: &str, offset: usize, limit: usize) -> Value {
    let query = if query.trim().is_empty() {
        json!({ "match_all": {} })
    } else {
        json!({
            "simple_query_string": {
                "query": query,
                "default_operator": "and",
                "lenient": true
            }
        })
    };

    json!({
        "from": offset,
        "size": limit,
        "query": query
    })
}

#[async_trait]
impl DocumentIndex for ElasticsearchIndex {
    async fn upsert(&self, collection: &str, id: &str, document: &Value) -> Result<(), IndexError> {
        let response = self
            .client
            .index(IndexParts::IndexId(collection, id))
            .body(document)
            .send()
            .await?;
        ensure_success(response, "index", collection).await?;
        Ok(())
    }

    async fn partial_update(
        &self,
        collection: &str,
        id: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), IndexError> {
        let response = self
            .client
            .update(UpdateParts::IndexId(collection, id))
            .body(json!({ "doc": fields, "doc_as_upsert": true }))
            .send()
            .await?;
        ensure_success(response, "update", collection).await?;
        Ok(())
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<(), IndexError> {
        let response = self
            .client
            .delete(DeleteParts::IndexId(collection, id))
            .send()
            .await?;

        if response.status_code().as_u16() == 404 {
            debug!(collection, id, "Delete of unknown document ignored");
            return Ok(());
        }
        ensure_success(response, "delete", collection).await?;
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Value, IndexError> {
        let response = self
            .client
            .search(SearchParts::Index(&[collection]))
            .body(search_body(query, offset, limit))
            .send()
            .await?;
        let response = ensure_success(response, "search", collection).await?;

        Ok(response.json::<Value>().await?)
    }
}
