pub mod config;
pub mod events;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;

pub use config::{Config, ConfigError};
pub use services::{DocumentIndex, ElasticsearchIndex, InMemoryIndex, IndexError};

use std::sync::Arc;

/// Shared state for the HTTP workers.
#[derive(Clone)]
pub struct AppState {
    pub index: Arc<dyn DocumentIndex>,
    pub restaurant_index: String,
    pub food_index: String,
}
