//! Bulk load documents from a JSON file into a search collection
//!
//! Used for initial population and for recovering a collection that drifted
//! from the source of truth. Documents are upserted by their `id` field, so
//! running the tool twice is harmless.
//!
//! Usage:
//!   ELASTICSEARCH_URL=http://... SEED_INDEX=foods SEED_FILE=data/foods.json cargo run --bin seed-index
//!
//! Environment variables:
//!   - ELASTICSEARCH_URL: Elasticsearch connection string
//!   - ELASTICSEARCH_API_KEY: optional encoded API key
//!   - SEED_INDEX: target collection (`restaurants`, `foods`, ...)
//!   - SEED_FILE: path to a JSON array of documents
use anyhow::{bail, Context, Result};
use menu_search_service::services::elasticsearch::{
    food_mappings, restaurant_mappings, ElasticsearchConfig,
};
use menu_search_service::{DocumentIndex, ElasticsearchIndex};
use serde_json::Value;
use std::env;
use tracing::{info, warn};

fn document_id(document: &Value) -> Option<String> {
    match document.get("id")? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn mappings_for(index: &str) -> Option<Value> {
    match index {
        "restaurants" => Some(restaurant_mappings()),
        "foods" => Some(food_mappings()),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seed_index=info,menu_search_service=info".into()),
        )
        .init();

    let es_url = env::var("ELASTICSEARCH_URL").context("ELASTICSEARCH_URL must be set")?;
    let index_name = env::var("SEED_INDEX").context("SEED_INDEX must be set")?;
    let file_path = env::var("SEED_FILE").context("SEED_FILE must be set")?;

    let raw = tokio::fs::read(&file_path)
        .await
        .with_context(|| format!("failed to read {file_path}"))?;
    let documents: Vec<Value> = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {file_path} as a JSON array"))?;
    if documents.is_empty() {
        bail!("{file_path} contains no documents");
    }

    let index = ElasticsearchIndex::new(&ElasticsearchConfig {
        url: es_url,
        api_key: env::var("ELASTICSEARCH_API_KEY").ok(),
    })?;
    if let Some(mappings) = mappings_for(&index_name) {
        index.ensure_index(&index_name, mappings).await?;
    }

    info!(
        index = %index_name,
        count = documents.len(),
        "Seeding collection from {}",
        file_path
    );

    let mut indexed = 0usize;
    let mut skipped = 0usize;
    for document in &documents {
        let Some(id) = document_id(document) else {
            warn!("Skipping document without an id: {}", document);
            skipped += 1;
            continue;
        };
        index
            .upsert(&index_name, &id, document)
            .await
            .with_context(|| format!("failed to index document {id}"))?;
        indexed += 1;
    }

    info!(indexed, skipped, "Seed complete");
    Ok(())
}
