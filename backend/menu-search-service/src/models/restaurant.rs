use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{entity_id, insert_present, Domain, DomainEvent};

/// Restaurant change event from `restaurant_topic`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantEvent {
    pub event: String,
    #[serde(deserialize_with = "entity_id")]
    pub id: String,
    #[serde(default)]
    pub restaurant_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Restaurant document stored in the `restaurants` collection.
///
/// `image_url` is owned by the index; events never carry it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantDocument {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub image_url: String,
}

impl DomainEvent for RestaurantEvent {
    type Document = RestaurantDocument;

    const DOMAIN: Domain = Domain::Restaurant;

    fn tag(&self) -> &str {
        &self.event
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn to_document(&self) -> RestaurantDocument {
        RestaurantDocument {
            id: self.id.clone(),
            name: self.restaurant_name.clone().unwrap_or_default(),
            address: self.address.clone().unwrap_or_default(),
            phone: self.phone.clone().unwrap_or_default(),
            image_url: String::new(),
        }
    }

    fn sparse_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("id".to_owned(), Value::String(self.id.clone()));
        insert_present(&mut fields, "name", self.restaurant_name.clone());
        insert_present(&mut fields, "address", self.address.clone());
        insert_present(&mut fields, "phone", self.phone.clone());
        fields
    }
}
