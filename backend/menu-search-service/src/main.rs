use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use menu_search_service::{
    events::{FoodProjector, RestaurantProjector, SubscriptionManager},
    handlers::register_routes,
    metrics,
    services::elasticsearch::{food_mappings, restaurant_mappings},
    AppState, Config, DocumentIndex, ElasticsearchIndex,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "menu_search_service=info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting menu search service");

    let config = Config::from_env().context("failed to load configuration")?;

    let search_backend = ElasticsearchIndex::new(&config.elasticsearch())
        .context("failed to initialize Elasticsearch client")?;
    search_backend
        .ensure_index(&config.restaurant_index, restaurant_mappings())
        .await
        .context("failed to prepare restaurant index")?;
    search_backend
        .ensure_index(&config.food_index, food_mappings())
        .await
        .context("failed to prepare food index")?;
    let index: Arc<dyn DocumentIndex> = Arc::new(search_backend);
    tracing::info!(
        restaurant_index = %config.restaurant_index,
        food_index = %config.food_index,
        "Elasticsearch enabled"
    );

    let subscriptions = SubscriptionManager::connect(&config.rabbitmq_url).await?;
    let restaurant_pipeline = subscriptions
        .start(
            &config.restaurant_exchange,
            RestaurantProjector::new(index.clone(), config.restaurant_index.clone()),
        )
        .await?;
    let food_pipeline = subscriptions
        .start(
            &config.food_exchange,
            FoodProjector::new(index.clone(), config.food_index.clone()),
        )
        .await?;

    let state = AppState {
        index,
        restaurant_index: config.restaurant_index.clone(),
        food_index: config.food_index.clone(),
    };

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("menu-search-service listening on {}", addr);

    let server_result = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(middleware::Logger::default())
            .route("/health", web::get().to(|| async { "OK" }))
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .configure(register_routes)
    })
    .bind(&addr)
    .with_context(|| format!("failed to bind to {addr}"))?
    .run()
    .await;

    restaurant_pipeline.shutdown().await;
    food_pipeline.shutdown().await;
    subscriptions.close().await;

    server_result.context("HTTP server error")
}
