//! AgriReview Ingest: reads exported conversation tables and keeps the negatively rated rows.

pub mod file;
pub mod ingest;

pub use file::{parse_table, FileType, Table};
pub use ingest::{extract_negative_feedback, Ingester};
