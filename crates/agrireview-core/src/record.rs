//! Conversation record model and the read contract the insights engine depends on.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Review status of a flagged conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversationStatus {
    #[default]
    Open,
    Closed,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Closed => "Closed",
        }
    }

    /// Decode a stored status. NULL and unknown values read as `Open`.
    pub fn from_db(value: Option<&str>) -> Self {
        match value {
            Some(s) if s.eq_ignore_ascii_case("closed") => Self::Closed,
            _ => Self::Open,
        }
    }
}

impl fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One flagged (negative-feedback) conversation under review.
///
/// Serialized field names follow the column names of the review UI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: i64,
    pub sent_date: Option<String>,
    #[serde(rename = "user_message_en")]
    pub user_message: Option<String>,
    #[serde(rename = "assistant_message_en")]
    pub assistant_message: Option<String>,
    pub bot: Option<String>,
    pub subject: Option<String>,
    pub crop: Option<String>,
    pub feedback_neg: Option<i64>,
    #[serde(rename = "hashedid")]
    pub hashed_id: Option<String>,
    pub expert_answer: Option<String>,
    #[serde(default)]
    pub status: ConversationStatus,
}

impl ConversationRecord {
    /// A fresh, unanswered record.
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// Value of a categorical field (`bot`, `subject`, `crop`). Other fields return `None`.
    pub fn category(&self, field: Field) -> Option<&str> {
        match field {
            Field::Bot => self.bot.as_deref(),
            Field::Subject => self.subject.as_deref(),
            Field::Crop => self.crop.as_deref(),
            _ => None,
        }
    }

    /// True when a non-blank expert answer is attached.
    pub fn has_expert_answer(&self) -> bool {
        self.expert_answer
            .as_deref()
            .is_some_and(|a| !a.trim().is_empty())
    }
}

/// A column of the conversation schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    SentDate,
    UserMessage,
    AssistantMessage,
    Bot,
    Subject,
    Crop,
    FeedbackNeg,
    HashedId,
    ExpertAnswer,
    Status,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::SentDate,
        Field::UserMessage,
        Field::AssistantMessage,
        Field::Bot,
        Field::Subject,
        Field::Crop,
        Field::FeedbackNeg,
        Field::HashedId,
        Field::ExpertAnswer,
        Field::Status,
    ];

    /// Storage column name.
    pub fn column(&self) -> &'static str {
        match self {
            Self::SentDate => "sent_date",
            Self::UserMessage => "user_message_en",
            Self::AssistantMessage => "assistant_message_en",
            Self::Bot => "bot",
            Self::Subject => "subject",
            Self::Crop => "crop",
            Self::FeedbackNeg => "feedback_neg",
            Self::HashedId => "hashedid",
            Self::ExpertAnswer => "expert_answer",
            Self::Status => "status",
        }
    }

    pub fn from_column(column: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column() == column)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// The set of fields that exist in the schema a record set was read from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldSet(BTreeSet<Field>);

impl FieldSet {
    pub fn all() -> Self {
        Self(Field::ALL.into_iter().collect())
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains(&field)
    }

    pub fn insert(&mut self, field: Field) {
        self.0.insert(field);
    }

    /// Copy of this set with `field` removed.
    pub fn without(&self, field: Field) -> Self {
        let mut set = self.0.clone();
        set.remove(&field);
        Self(set)
    }

    pub fn iter(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Field> for FieldSet {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Every record currently held by a store, plus the fields its schema carries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordSet {
    pub records: Vec<ConversationRecord>,
    pub fields: FieldSet,
}

impl RecordSet {
    /// Records read from a schema that has every field.
    pub fn new(records: Vec<ConversationRecord>) -> Self {
        Self {
            records,
            fields: FieldSet::all(),
        }
    }

    pub fn with_fields(records: Vec<ConversationRecord>, fields: FieldSet) -> Self {
        Self { records, fields }
    }

    pub fn has_field(&self, field: Field) -> bool {
        self.fields.contains(field)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Anything that can hand over the full current record set in one read.
pub trait RecordSource: Send + Sync {
    /// Fails with [`crate::Error::DataUnavailable`] when the records cannot be read at all.
    fn fetch_all_records(&self) -> Result<RecordSet>;
}

impl RecordSource for RecordSet {
    fn fetch_all_records(&self) -> Result<RecordSet> {
        Ok(self.clone())
    }
}
