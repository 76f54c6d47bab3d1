use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, Opts, TextEncoder};

use crate::models::Domain;

static EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "menu_search_events_total",
            "Broker deliveries processed by the index sync pipelines",
        ),
        &["domain", "outcome"],
    )
    .expect("failed to create menu_search_events_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register menu_search_events_total");
    counter
});

/// Counts one processed delivery. `outcome` is one of `indexed`, `updated`,
/// `deleted`, `unsupported`, `decode_error`, `delivery_error` or `failed`.
pub fn record_event(domain: Domain, outcome: &str) {
    EVENTS_TOTAL
        .with_label_values(&[domain.as_str(), outcome])
        .inc();
}

pub fn events_total(domain: Domain, outcome: &str) -> u64 {
    EVENTS_TOTAL
        .with_label_values(&[domain.as_str(), outcome])
        .get()
}

pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
