use std::fmt;

use futures::{Stream, StreamExt};
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

use crate::metrics;
use crate::models::{Domain, DomainEvent};

use super::decoder::decode;
use super::{route, EventError, Outcome, Projector};

/// Decodes, routes and projects one delivery body.
pub async fn process_delivery<E: DomainEvent>(
    projector: &Projector<E>,
    payload: &[u8],
) -> Result<Outcome, EventError> {
    let event: E = decode(payload)?;
    route(projector, &event).await
}

/// Handle to one domain's background sync task.
#[derive(Debug)]
pub struct PipelineHandle {
    domain: Domain,
    task: JoinHandle<()>,
}

impl PipelineHandle {
    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn abort(&self) {
        self.task.abort();
    }

    /// Waits for the delivery stream to end.
    pub async fn join(self) -> Result<(), JoinError> {
        self.task.await
    }

    /// Aborts the task and waits until it is gone.
    pub async fn shutdown(self) {
        self.task.abort();
        match self.task.await {
            Ok(()) => {}
            Err(err) if err.is_cancelled() => {}
            Err(err) => error!(domain = %self.domain, "Index sync task panicked: {err}"),
        }
        info!(domain = %self.domain, "Index sync pipeline stopped");
    }
}

/// Spawn a Tokio task that projects every delivery of `deliveries`, one at
/// a time and in order, until the stream ends.
///
/// Failures of individual deliveries are logged and counted; they never stop
/// the task.
pub fn spawn_pipeline<E, S, DeliveryError>(projector: Projector<E>, deliveries: S) -> PipelineHandle
where
    E: DomainEvent,
    S: Stream<Item = Result<Vec<u8>, DeliveryError>> + Send + 'static,
    DeliveryError: fmt::Display + Send + 'static,
{
    PipelineHandle {
        domain: E::DOMAIN,
        task: tokio::spawn(run_pipeline(projector, deliveries)),
    }
}

async fn run_pipeline<E, S, DeliveryError>(projector: Projector<E>, deliveries: S)
where
    E: DomainEvent,
    S: Stream<Item = Result<Vec<u8>, DeliveryError>> + Send + 'static,
    DeliveryError: fmt::Display + Send + 'static,
{
    let domain = E::DOMAIN;
    info!(
        %domain,
        collection = projector.collection(),
        "Starting index sync pipeline"
    );

    let mut deliveries = Box::pin(deliveries);
    while let Some(delivery) = deliveries.next().await {
        let payload = match delivery {
            Ok(payload) => payload,
            Err(err) => {
                error!(%domain, "Broker delivery error: {err}");
                metrics::record_event(domain, "delivery_error");
                continue;
            }
        };

        match process_delivery(&projector, &payload).await {
            Ok(outcome) => metrics::record_event(domain, outcome.as_label()),
            Err(EventError::Decode(err)) => {
                warn!(%domain, "Failed to decode event payload: {err}");
                metrics::record_event(domain, "decode_error");
            }
            Err(EventError::Index(err)) => {
                error!(%domain, "Search backend error while projecting event: {err}");
                metrics::record_event(domain, "failed");
            }
        }
    }

    warn!(%domain, "Delivery stream closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RestaurantProjector;
    use crate::services::InMemoryIndex;
    use std::sync::{Arc, Mutex};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    /// Records the level and field names of every event emitted while installed.
    #[derive(Clone, Default)]
    struct LevelRecorder(Arc<Mutex<Vec<(Level, Vec<&'static str>)>>>);

    impl LevelRecorder {
        fn at_or_above_info(&self) -> Vec<Level> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .map(|(level, _)| *level)
                .filter(|level| [Level::ERROR, Level::WARN, Level::INFO].contains(level))
                .collect()
        }

        fn has_field(&self, name: &str) -> bool {
            self.0
                .lock()
                .unwrap()
                .iter()
                .any(|(_, fields)| fields.iter().any(|field| *field == name))
        }
    }

    impl<S: Subscriber> Layer<S> for LevelRecorder {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let fields = event.metadata().fields().iter().map(|field| field.name()).collect();
            self.0
                .lock()
                .unwrap()
                .push((*event.metadata().level(), fields));
        }
    }

    #[tokio::test]
    async fn unsupported_tag_logs_one_warning_and_writes_nothing() {
        for tag in ["restaurant.archive", "restaurant", "", "restaurant..create"] {
            let recorder = LevelRecorder::default();
            let _guard = tracing::subscriber::set_default(
                tracing_subscriber::registry().with(recorder.clone()),
            );
            let index = Arc::new(InMemoryIndex::new());
            let projector = RestaurantProjector::new(index.clone(), "restaurants");
            let payload = serde_json::json!({ "event": tag, "id": "R1", "restaurantName": "Noodle Bar" });

            let outcome = process_delivery(&projector, payload.to_string().as_bytes())
                .await
                .unwrap();

            assert_eq!(outcome, Outcome::Unsupported(tag.to_string()));
            assert_eq!(recorder.at_or_above_info(), vec![Level::WARN], "tag {tag:?}");
            assert!(index.operations().await.is_empty(), "tag {tag:?} wrote to the index");
        }
    }

    #[tokio::test]
    async fn supported_tag_is_routed_without_warnings() {
        let recorder = LevelRecorder::default();
        let _guard =
            tracing::subscriber::set_default(tracing_subscriber::registry().with(recorder.clone()));
        let index = Arc::new(InMemoryIndex::new());
        let projector = RestaurantProjector::new(index.clone(), "restaurants");

        let outcome = process_delivery(&projector, br#"{"event":"restaurant.create","id":"R1"}"#)
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Indexed);
        assert!(recorder.at_or_above_info().is_empty());
        assert!(recorder.has_field("action"));
        assert_eq!(index.operations().await.len(), 1);
    }
}
