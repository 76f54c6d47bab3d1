//! Broker-driven index synchronisation.
//!
//! A delivery flows through [`decoder`] → [`router`] → [`projector`] inside
//! the per-domain task started by [`pipeline`]; [`amqp`] wires that task to
//! a RabbitMQ subscription.

pub mod amqp;
pub mod decoder;
pub mod pipeline;
pub mod projector;
pub mod router;

pub use amqp::{Binding, SubscriptionError, SubscriptionManager};
pub use pipeline::{process_delivery, spawn_pipeline, PipelineHandle};
pub use projector::{FoodProjector, Projector, RestaurantProjector};
pub use router::{route, Action};

use crate::services::IndexError;
use thiserror::Error;

/// Errors that can occur while processing a single delivery.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("failed to decode event payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("search backend error: {0}")]
    Index(#[from] IndexError),
}

/// What a successfully processed delivery did to the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Indexed,
    Updated,
    Deleted,
    /// The tag carried no supported action; nothing was written.
    Unsupported(String),
}

impl Outcome {
    pub fn as_label(&self) -> &'static str {
        match self {
            Outcome::Indexed => "indexed",
            Outcome::Updated => "updated",
            Outcome::Deleted => "deleted",
            Outcome::Unsupported(_) => "unsupported",
        }
    }
}
