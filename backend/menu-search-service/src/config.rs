use serde::Deserialize;
use thiserror::Error;

use crate::services::ElasticsearchConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid environment configuration: {0}")]
    Env(#[from] envy::Error),
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Service configuration, read from the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub rabbitmq_url: String,
    pub elasticsearch_url: String,
    #[serde(default)]
    pub elasticsearch_api_key: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_restaurant_index")]
    pub restaurant_index: String,
    #[serde(default = "default_food_index")]
    pub food_index: String,
    #[serde(default = "default_restaurant_exchange")]
    pub restaurant_exchange: String,
    #[serde(default = "default_food_exchange")]
    pub food_exchange: String,
}

fn default_port() -> u16 {
    8080
}

fn default_restaurant_index() -> String {
    "restaurants".to_string()
}

fn default_food_index() -> String {
    "foods".to_string()
}

fn default_restaurant_exchange() -> String {
    "restaurant_topic".to_string()
}

fn default_food_exchange() -> String {
    "food_topic".to_string()
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        envy::from_env::<Config>()?.validated()
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars)?.validated()
    }

    pub fn elasticsearch(&self) -> ElasticsearchConfig {
        ElasticsearchConfig {
            url: self.elasticsearch_url.clone(),
            api_key: self.elasticsearch_api_key.clone(),
        }
    }

    fn validated(self) -> Result<Self, ConfigError> {
        let required = [
            ("RABBITMQ_URL", &self.rabbitmq_url),
            ("ELASTICSEARCH_URL", &self.elasticsearch_url),
            ("RESTAURANT_INDEX", &self.restaurant_index),
            ("FOOD_INDEX", &self.food_index),
            ("RESTAURANT_EXCHANGE", &self.restaurant_exchange),
            ("FOOD_EXCHANGE", &self.food_exchange),
        ];
        if let Some((name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ConfigError::Empty(*name));
        }
        Ok(self)
    }
}
