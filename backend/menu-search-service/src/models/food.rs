use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{entity_id, insert_present, Domain, DomainEvent};

/// Food change event from `food_topic`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodEvent {
    pub event: String,
    #[serde(deserialize_with = "entity_id")]
    pub id: String,
    #[serde(default)]
    pub food_name: Option<String>,
    #[serde(default)]
    pub restaurant_id: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "image_url")]
    pub image_url: Option<String>,
}

/// Food document stored in the `foods` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodDocument {
    pub id: String,
    pub name: String,
    pub restaurant: String,
    pub description: String,
    pub price: f64,
    pub image_url: String,
}

impl DomainEvent for FoodEvent {
    type Document = FoodDocument;

    const DOMAIN: Domain = Domain::Food;

    fn tag(&self) -> &str {
        &self.event
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn to_document(&self) -> FoodDocument {
        FoodDocument {
            id: self.id.clone(),
            name: self.food_name.clone().unwrap_or_default(),
            restaurant: self.restaurant_id.clone().unwrap_or_default(),
            description: self.description.clone().unwrap_or_default(),
            price: self.price.unwrap_or_default(),
            image_url: self.image_url.clone().unwrap_or_default(),
        }
    }

    fn sparse_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("id".to_owned(), Value::String(self.id.clone()));
        insert_present(&mut fields, "name", self.food_name.clone());
        insert_present(&mut fields, "restaurant", self.restaurant_id.clone());
        insert_present(&mut fields, "description", self.description.clone());
        insert_present(&mut fields, "price", self.price);
        insert_present(&mut fields, "imageUrl", self.image_url.clone());
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_names_are_renamed_on_projection() {
        let event: FoodEvent = serde_json::from_value(json!({
            "event": "food.create",
            "id": "7",
            "foodName": "Pho",
            "restaurantId": "R1",
            "price": 11.5,
            "image_url": "pho.png",
        }))
        .unwrap();

        let document = event.to_document();
        assert_eq!(document.name, "Pho");
        assert_eq!(document.restaurant, "R1");
        assert_eq!(document.image_url, "pho.png");
        assert_eq!(document.description, "");

        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(value["imageUrl"], json!("pho.png"));
        assert!(value.get("image_url").is_none());
    }

    #[test]
    fn price_must_be_numeric() {
        let result = serde_json::from_value::<FoodEvent>(json!({
            "event": "food.update",
            "id": "7",
            "price": "cheap",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let event: FoodEvent = serde_json::from_value(json!({
            "event": "food.update",
            "id": "7",
            "calories": 640,
        }))
        .unwrap();

        assert_eq!(Value::Object(event.sparse_fields()), json!({ "id": "7" }));
    }
}
