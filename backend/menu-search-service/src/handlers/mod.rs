/// HTTP handlers for the search API
pub mod search;

pub use search::register_routes;
