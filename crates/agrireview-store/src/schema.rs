//! Database schema SQL.

/// Name of the conversation table.
pub const CONVERSATIONS_TABLE: &str = "conversations";

/// Core tables: conversations and expert_answers.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS conversations (
    id INTEGER PRIMARY KEY,
    sent_date TEXT,
    user_message_en TEXT,
    assistant_message_en TEXT,
    bot TEXT,
    subject TEXT,
    crop TEXT,
    feedback_neg INTEGER,
    hashedid TEXT,
    expert_answer TEXT,
    status TEXT DEFAULT 'Open'
);

CREATE TABLE IF NOT EXISTS expert_answers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    conversation_id INTEGER NOT NULL,
    expert_answer TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_expert_answers_conversation ON expert_answers(conversation_id);
"#;

/// Columns added after the first schema version, with their DDL.
/// Older databases get these via `ALTER TABLE` on open.
pub const LATE_COLUMNS: &[(&str, &str)] = &[
    ("expert_answer", "ALTER TABLE conversations ADD COLUMN expert_answer TEXT"),
    ("status", "ALTER TABLE conversations ADD COLUMN status TEXT DEFAULT 'Open'"),
];
