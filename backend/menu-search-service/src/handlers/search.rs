//! Read-only keyword search over the synced collections
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

/// GET /search/restaurants?search=&offset=&limit=
pub async fn search_restaurants(
    state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> HttpResponse {
    run_search(&state, &state.restaurant_index, &params).await
}

/// GET /search/foods?search=&offset=&limit=
pub async fn search_foods(
    state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> HttpResponse {
    run_search(&state, &state.food_index, &params).await
}

async fn run_search(state: &AppState, collection: &str, params: &SearchParams) -> HttpResponse {
    match state
        .index
        .search(collection, &params.search, params.offset, params.limit)
        .await
    {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(err) => {
            warn!(collection, query = %params.search, "Search failed: {err}");
            HttpResponse::InternalServerError().json(json!({ "error": err.to_string() }))
        }
    }
}

/// Register routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/search")
            .route("/restaurants", web::get().to(search_restaurants))
            .route("/foods", web::get().to(search_foods)),
    );
}
