use crate::models::DomainEvent;

use super::EventError;

/// Parses a raw delivery body into a typed event.
///
/// Unknown fields are ignored; `event` and a non-blank `id` are mandatory and known
/// fields must have the declared JSON type.
pub fn decode<E: DomainEvent>(payload: &[u8]) -> Result<E, EventError> {
    Ok(serde_json::from_slice(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FoodEvent, RestaurantEvent};

    #[test]
    fn decodes_restaurant_event() {
        let payload = br#"{"event":"restaurant.update","id":"R1","phone":"555"}"#;
        let event: RestaurantEvent = decode(payload).unwrap();
        assert_eq!(event.event, "restaurant.update");
        assert_eq!(event.phone.as_deref(), Some("555"));
        assert_eq!(event.restaurant_name, None);
    }

    #[test]
    fn missing_event_tag_fails() {
        let payload = br#"{"id":"42","foodName":"Burger"}"#;
        assert!(matches!(
            decode::<FoodEvent>(payload),
            Err(EventError::Decode(_))
        ));
    }

    #[test]
    fn missing_id_fails() {
        let payload = br#"{"event":"food.delete"}"#;
        assert!(decode::<FoodEvent>(payload).is_err());
    }

    #[test]
    fn blank_id_fails() {
        let payload = br#"{"event":"restaurant.create","id":""}"#;
        assert!(matches!(
            decode::<RestaurantEvent>(payload),
            Err(EventError::Decode(_))
        ));
        assert!(decode::<FoodEvent>(br#"{"event":"food.update","id":"  "}"#).is_err());
    }

    #[test]
    fn non_numeric_price_fails() {
        let payload = br#"{"event":"food.update","id":"42","price":"9.0"}"#;
        assert!(decode::<FoodEvent>(payload).is_err());
    }

    #[test]
    fn non_json_payload_fails() {
        assert!(decode::<RestaurantEvent>(b"restaurant.create").is_err());
        assert!(decode::<RestaurantEvent>(b"").is_err());
    }
}
