//! Query and result types for the record store.

use agrireview_core::{ConversationRecord, ConversationStatus};
use serde::{Deserialize, Serialize};

/// An expert answer row. One per conversation; re-answering overwrites it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertAnswer {
    pub id: i64,
    pub conversation_id: i64,
    pub expert_answer: String,
}

/// Filters for listing conversations. Empty filter matches everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationFilter {
    pub status: Option<ConversationStatus>,
    /// Exact bot name.
    pub bot: Option<String>,
    /// Case-insensitive substring of the user message.
    pub text: Option<String>,
}

impl ConversationFilter {
    pub fn matches(&self, record: &ConversationRecord) -> bool {
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(bot) = self.bot.as_deref().filter(|b| !b.is_empty()) {
            if record.bot.as_deref() != Some(bot) {
                return false;
            }
        }
        if let Some(text) = self.text.as_deref().filter(|t| !t.is_empty()) {
            let needle = text.to_lowercase();
            let haystack = record.user_message.as_deref().unwrap_or("").to_lowercase();
            if !haystack.contains(&needle) {
                return false;
            }
        }
        true
    }
}
