//! AgriReview server: HTTP API over the record store, ingestion and insights.

pub mod error;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
