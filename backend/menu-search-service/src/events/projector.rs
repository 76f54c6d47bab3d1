use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::models::{DomainEvent, FoodEvent, RestaurantEvent};
use crate::services::{DocumentIndex, IndexError};

/// Writes one domain's events into its collection.
pub struct Projector<E> {
    index: Arc<dyn DocumentIndex>,
    collection: String,
    _event: PhantomData<fn() -> E>,
}

pub type RestaurantProjector = Projector<RestaurantEvent>;
pub type FoodProjector = Projector<FoodEvent>;

impl<E> Clone for Projector<E> {
    fn clone(&self) -> Self {
        Self {
            index: self.index.clone(),
            collection: self.collection.clone(),
            _event: PhantomData,
        }
    }
}

impl<E> fmt::Debug for Projector<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projector")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl<E: DomainEvent> Projector<E> {
    pub fn new(index: Arc<dyn DocumentIndex>, collection: impl Into<String>) -> Self {
        Self {
            index,
            collection: collection.into(),
            _event: PhantomData,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Writes the full document, replacing whatever is stored under the id.
    pub async fn insert(&self, event: &E) -> Result<(), IndexError> {
        let document = serde_json::to_value(event.to_document())?;
        self.index
            .upsert(&self.collection, event.id(), &document)
            .await?;

        debug!(
            domain = %E::DOMAIN,
            id = event.id(),
            collection = %self.collection,
            "Indexed document"
        );
        Ok(())
    }

    /// Merges only the fields carried by `event` into the stored document.
    pub async fn partial_update(&self, event: &E) -> Result<(), IndexError> {
        let fields = event.sparse_fields();
        self.index
            .partial_update(&self.collection, event.id(), &fields)
            .await?;

        debug!(
            domain = %E::DOMAIN,
            id = event.id(),
            fields = fields.len(),
            "Updated document fields"
        );
        Ok(())
    }

    pub async fn delete(&self, event: &E) -> Result<(), IndexError> {
        self.index
            .delete_by_id(&self.collection, event.id())
            .await?;

        debug!(domain = %E::DOMAIN, id = event.id(), "Removed document");
        Ok(())
    }
}
