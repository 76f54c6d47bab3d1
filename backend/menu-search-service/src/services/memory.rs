//! In-memory [`DocumentIndex`] for tests and local runs without a search
//! cluster.
//!
//! Every mutation is also appended to an operation log so callers can assert
//! on exactly what the projections sent, not only on the resulting state.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::{DocumentIndex, IndexError};

/// One mutation received by [`InMemoryIndex`].
#[derive(Debug, Clone, PartialEq)]
pub enum IndexOperation {
    Upsert {
        collection: String,
        id: String,
        document: Value,
    },
    PartialUpdate {
        collection: String,
        id: String,
        fields: Map<String, Value>,
    },
    Delete {
        collection: String,
        id: String,
    },
}

type Collection = BTreeMap<String, Map<String, Value>>;

#[derive(Debug, Default)]
pub struct InMemoryIndex {
    collections: RwLock<HashMap<String, Collection>>,
    operations: RwLock<Vec<IndexOperation>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored document, if any.
    pub async fn get(&self, collection: &str, id: &str) -> Option<Value> {
        self.collections
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
            .map(Value::Object)
    }

    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    /// Every mutation received so far, in call order.
    pub async fn operations(&self) -> Vec<IndexOperation> {
        self.operations.read().await.clone()
    }

    async fn record(&self, operation: IndexOperation) {
        self.operations.write().await.push(operation);
    }
}

fn matches_query(document: &Map<String, Value>, terms: &[String]) -> bool {
    terms.iter().all(|term| {
        document.values().any(|value| match value {
            Value::String(s) => s.to_lowercase().contains(term.as_str()),
            _ => false,
        })
    })
}

#[async_trait]
impl DocumentIndex for InMemoryIndex {
    async fn upsert(&self, collection: &str, id: &str, document: &Value) -> Result<(), IndexError> {
        self.record(IndexOperation::Upsert {
            collection: collection.to_owned(),
            id: id.to_owned(),
            document: document.clone(),
        })
        .await;

        let fields = match document {
            Value::Object(map) => map.clone(),
            other => {
                return Err(IndexError::Rejected {
                    operation: "index",
                    collection: collection.to_owned(),
                    status: 400,
                    body: format!("document must be an object, got {other}"),
                })
            }
        };

        self.collections
            .write()
            .await
            .entry(collection.to_owned())
            .or_default()
            .insert(id.to_owned(), fields);
        Ok(())
    }

    async fn partial_update(
        &self,
        collection: &str,
        id: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), IndexError> {
        self.record(IndexOperation::PartialUpdate {
            collection: collection.to_owned(),
            id: id.to_owned(),
            fields: fields.clone(),
        })
        .await;

        let mut collections = self.collections.write().await;
        let stored = collections
            .entry(collection.to_owned())
            .or_default()
            .entry(id.to_owned())
            .or_default();
        for (key, value) in fields {
            stored.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<(), IndexError> {
        self.record(IndexOperation::Delete {
            collection: collection.to_owned(),
            id: id.to_owned(),
        })
        .await;

        if let Some(docs) = self.collections.write().await.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Value, IndexError> {
        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        let collections = self.collections.read().await;

        let matched: Vec<&Map<String, Value>> = collections
            .get(collection)
            .map(|docs| docs.values().filter(|doc| matches_query(doc, &terms)).collect())
            .unwrap_or_default();
        let total = matched.len();
        let hits: Vec<Value> = matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .map(Value::Object)
            .collect();

        Ok(json!({
            "query": query,
            "offset": offset,
            "limit": limit,
            "total": total,
            "hits": hits,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn partial_update_keeps_unlisted_fields() {
        let index = InMemoryIndex::new();
        index
            .upsert("foods", "1", &json!({ "id": "1", "name": "A", "price": 5 }))
            .await
            .unwrap();

        let mut fields = Map::new();
        fields.insert("id".into(), json!("1"));
        fields.insert("price".into(), json!(7));
        index.partial_update("foods", "1", &fields).await.unwrap();

        assert_eq!(
            index.get("foods", "1").await,
            Some(json!({ "id": "1", "name": "A", "price": 7 }))
        );
    }

    #[tokio::test]
    async fn partial_update_creates_missing_document() {
        let index = InMemoryIndex::new();
        let mut fields = Map::new();
        fields.insert("id".into(), json!("9"));
        fields.insert("price".into(), json!(3.5));

        index.partial_update("foods", "9", &fields).await.unwrap();

        assert_eq!(
            index.get("foods", "9").await,
            Some(json!({ "id": "9", "price": 3.5 }))
        );
    }

    #[tokio::test]
    async fn deleting_unknown_id_is_a_no_op() {
        let index = InMemoryIndex::new();
        assert!(index.delete_by_id("restaurants", "missing").await.is_ok());
        assert_eq!(index.len("restaurants").await, 0);
    }

    #[tokio::test]
    async fn search_pages_through_matches() {
        let index = InMemoryIndex::new();
        for (id, name) in [("1", "Beef Pho"), ("2", "Chicken Pho"), ("3", "Burger")] {
            index
                .upsert("foods", id, &json!({ "id": id, "name": name }))
                .await
                .unwrap();
        }

        let result = index.search("foods", "pho", 1, 10).await.unwrap();
        assert_eq!(result["total"], json!(2));
        assert_eq!(result["hits"], json!([{ "id": "2", "name": "Chicken Pho" }]));
    }
}
