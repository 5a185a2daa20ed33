//! AgriReview Store: SQLite persistence for flagged conversations and expert answers.

pub mod schema;
pub mod sqlite;
pub mod types;

pub use sqlite::SqliteStore;
pub use types::*;
