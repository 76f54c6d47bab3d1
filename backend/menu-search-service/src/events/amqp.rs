use futures::{stream, Stream, StreamExt};
use lapin::{
    options::{BasicConsumeOptions, QueueBindOptions, QueueDeclareOptions},
    types::FieldTable,
    Channel, Connection, ConnectionProperties, Consumer,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{Domain, DomainEvent};

use super::{spawn_pipeline, PipelineHandle, Projector};

/// Setup failures. Any of these leaves the domain without a pipeline.
#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("failed to connect to broker: {0}")]
    Connect(#[source] lapin::Error),
    #[error("failed to open channel for {domain} events: {source}")]
    Channel {
        domain: Domain,
        #[source]
        source: lapin::Error,
    },
    #[error("failed to declare queue for {domain} events: {source}")]
    Declare {
        domain: Domain,
        #[source]
        source: lapin::Error,
    },
    #[error("failed to bind queue {queue} to {exchange} with '{routing_key}': {source}")]
    Bind {
        queue: String,
        exchange: String,
        routing_key: String,
        #[source]
        source: lapin::Error,
    },
    #[error("failed to consume from queue {queue}: {source}")]
    Consume {
        queue: String,
        #[source]
        source: lapin::Error,
    },
}

/// Where a domain's events are published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub domain: Domain,
    pub exchange: String,
}

impl Binding {
    pub fn new(domain: Domain, exchange: impl Into<String>) -> Self {
        Self {
            domain,
            exchange: exchange.into(),
        }
    }

    pub fn routing_key(&self) -> String {
        self.domain.routing_key()
    }
}

/// Owns the broker connection and starts one consumer per domain on it.
pub struct SubscriptionManager {
    connection: Connection,
}

impl SubscriptionManager {
    pub async fn connect(uri: &str) -> Result<Self, SubscriptionError> {
        let connection = Connection::connect(uri, ConnectionProperties::default())
            .await
            .map_err(SubscriptionError::Connect)?;
        info!("Connected to RabbitMQ");

        Ok(Self { connection })
    }

    /// Declares a private queue, binds it to the domain exchange and opens an
    /// auto-ack consumer on it.
    ///
    /// The queue is anonymous, exclusive to this connection and removed by the
    /// broker once the consumer goes away, so every instance receives its own
    /// copy of each event.
    pub async fn subscribe(&self, binding: &Binding) -> Result<(Channel, Consumer), SubscriptionError> {
        let domain = binding.domain;
        let channel = self
            .connection
            .create_channel()
            .await
            .map_err(|source| SubscriptionError::Channel { domain, source })?;

        let queue = channel
            .queue_declare(
                "",
                QueueDeclareOptions {
                    durable: false,
                    exclusive: true,
                    auto_delete: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|source| SubscriptionError::Declare { domain, source })?;
        let queue_name = queue.name().as_str().to_owned();

        let routing_key = binding.routing_key();
        channel
            .queue_bind(
                &queue_name,
                &binding.exchange,
                &routing_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|source| SubscriptionError::Bind {
                queue: queue_name.clone(),
                exchange: binding.exchange.clone(),
                routing_key: routing_key.clone(),
                source,
            })?;

        let consumer = channel
            .basic_consume(
                &queue_name,
                "",
                BasicConsumeOptions {
                    no_ack: true,
                    ..BasicConsumeOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|source| SubscriptionError::Consume {
                queue: queue_name.clone(),
                source,
            })?;

        info!(
            %domain,
            queue = %queue_name,
            exchange = %binding.exchange,
            routing_key = %routing_key,
            "Subscribed to domain events"
        );
        Ok((channel, consumer))
    }

    /// Subscribes `E`'s domain on `exchange` and spawns its sync pipeline.
    pub async fn start<E: DomainEvent>(
        &self,
        exchange: &str,
        projector: Projector<E>,
    ) -> Result<PipelineHandle, SubscriptionError> {
        let binding = Binding::new(E::DOMAIN, exchange);
        let (channel, consumer) = self.subscribe(&binding).await?;

        let deliveries =
            owned_by(channel, consumer).map(|delivery| delivery.map(|delivery| delivery.data));

        Ok(spawn_pipeline(projector, deliveries))
    }

    pub async fn close(&self) {
        if let Err(err) = self.connection.close(200, "shutting down").await {
            warn!("Failed to close RabbitMQ connection: {err}");
        }
    }
}

/// Yields the items of `items` while keeping `owner` alive in the stream
/// state, so the channel a consumer reads from is closed only once the
/// stream is dropped.
fn owned_by<O, S>(owner: O, items: S) -> impl Stream<Item = S::Item>
where
    S: Stream + Unpin,
{
    stream::unfold((owner, items), |(owner, mut items)| async move {
        let item = items.next().await?;
        Some((item, (owner, items)))
    })
}
