//! AgriReview Core: shared record model, errors and configuration.

pub mod config;
pub mod error;
pub mod record;

pub use config::{AllowedOrigins, AppConfig, DataPaths};
pub use error::{Error, Result};
pub use record::{ConversationRecord, ConversationStatus, Field, FieldSet, RecordSet, RecordSource};
