//! Domain events consumed from the broker and the search documents they
//! project into.
//!
//! Each domain has two shapes: a sparse wire event (every field but the tag
//! and id may be absent) and a dense index document. The conversion between
//! them lives on the [`DomainEvent`] implementation of the event type.

pub mod food;
pub mod restaurant;

pub use food::{FoodDocument, FoodEvent};
pub use restaurant::{RestaurantDocument, RestaurantEvent};

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The two independent domains kept in sync by this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Restaurant,
    Food,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Restaurant => "restaurant",
            Domain::Food => "food",
        }
    }

    /// Topic pattern matching every action of this domain, e.g. `food.*`.
    pub fn routing_key(&self) -> String {
        format!("{}.*", self.as_str())
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change event for one entity, as published by the owning service.
pub trait DomainEvent: DeserializeOwned + Send + Sync + 'static {
    /// Dense representation written on `create`.
    type Document: Serialize + Send + Sync;

    const DOMAIN: Domain;

    /// Dot-delimited event tag, e.g. `food.update`.
    fn tag(&self) -> &str;

    /// Stable entity identifier, used verbatim as the document id.
    fn id(&self) -> &str;

    /// Builds the full document, defaulting absent fields to empty values.
    fn to_document(&self) -> Self::Document;

    /// Builds the partial document: `id` plus every field carried by the event.
    fn sparse_fields(&self) -> Map<String, Value>;
}

/// Inserts `value` under `key` only when the event actually carried it.
///
/// Empty strings count as absent so an update never blanks a stored field.
pub(crate) fn insert_present<T>(fields: &mut Map<String, Value>, key: &str, value: Option<T>)
where
    T: Into<Value>,
{
    let Some(value) = value.map(Into::into) else {
        return;
    };

    if matches!(&value, Value::String(s) if s.is_empty()) {
        return;
    }

    fields.insert(key.to_owned(), value);
}

/// Deserializes an entity id, rejecting blank strings.
///
/// Every projection addresses the document by this id.
pub(crate) fn entity_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let id = String::deserialize(deserializer)?;
    if id.trim().is_empty() {
        return Err(de::Error::custom("id must not be blank"));
    }
    Ok(id)
}
