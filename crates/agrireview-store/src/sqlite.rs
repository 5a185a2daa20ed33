//! SQLite-backed record store for flagged conversations.
//!
//! Reads tolerate older schemas: columns missing from the `conversations`
//! table are selected as NULL and reported as absent in the returned
//! [`FieldSet`], so the insights engine can degrade per field.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::{debug, info, warn};

use crate::schema::{CONVERSATIONS_TABLE, LATE_COLUMNS, SCHEMA_SQL};
use crate::types::{ConversationFilter, ExpertAnswer};
use agrireview_core::{
    ConversationRecord, ConversationStatus, Error, Field, FieldSet, RecordSet, RecordSource,
    Result,
};

/// SQLite store holding conversations and expert answers.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

fn db_err(e: rusqlite::Error) -> Error {
    Error::Database(e.to_string())
}

impl SqliteStore {
    /// Open or create the store at `db_path`, migrating older schemas in place.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        let conn = Connection::open(&db_path).map_err(db_err)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(db_err)?;

        let store = Self::from_connection(conn, Some(db_path))?;
        info!(
            "SqliteStore initialized: {} conversations, path={}",
            store.count_conversations()?,
            store.path_display()
        );
        Ok(store)
    }

    /// Open a throwaway in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::from_connection(conn, None)
    }

    fn from_connection(conn: Connection, db_path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;
        Self::ensure_columns(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    /// Add review columns to tables created before they existed.
    fn ensure_columns(conn: &Connection) -> Result<()> {
        let existing = Self::table_columns(conn, CONVERSATIONS_TABLE)?;
        for (column, ddl) in LATE_COLUMNS {
            if !existing.iter().any(|c| c.as_str() == *column) {
                info!("Migrating conversations table: adding column {}", column);
                conn.execute_batch(ddl).map_err(db_err)?;
            }
        }
        Ok(())
    }

    fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info('{}')", table))
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .map_err(db_err)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(db_err)
    }

    /// Fields present in the conversations table. Empty if the table is missing.
    fn schema_fields(conn: &Connection) -> Result<FieldSet> {
        Ok(Self::table_columns(conn, CONVERSATIONS_TABLE)?
            .iter()
            .filter_map(|c| Field::from_column(c))
            .collect())
    }

    fn path_display(&self) -> String {
        self.db_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| ":memory:".to_string())
    }

    // ---------------------------------------------------------------
    // SQL builders
    // ---------------------------------------------------------------

    /// `SELECT id, <every field>` with absent columns substituted by NULL,
    /// so `row_to_record` can read by fixed position.
    fn select_sql(fields: &FieldSet) -> String {
        let columns: Vec<String> = Field::ALL
            .iter()
            .map(|f| {
                if fields.contains(*f) {
                    f.column().to_string()
                } else {
                    format!("NULL AS {}", f.column())
                }
            })
            .collect();
        format!(
            "SELECT id, {} FROM {}",
            columns.join(", "),
            CONVERSATIONS_TABLE
        )
    }

    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ConversationRecord> {
        Ok(ConversationRecord {
            id: row.get(0)?,
            sent_date: text_or_none(row.get_ref(1)?),
            user_message: text_or_none(row.get_ref(2)?),
            assistant_message: text_or_none(row.get_ref(3)?),
            bot: text_or_none(row.get_ref(4)?),
            subject: text_or_none(row.get_ref(5)?),
            crop: text_or_none(row.get_ref(6)?),
            feedback_neg: int_or_none(row.get_ref(7)?),
            hashed_id: text_or_none(row.get_ref(8)?),
            expert_answer: text_or_none(row.get_ref(9)?),
            status: ConversationStatus::from_db(text_or_none(row.get_ref(10)?).as_deref()),
        })
    }

    /// Insert into whichever columns the table has; values for absent ones are dropped.
    fn insert_record(
        conn: &Connection,
        fields: &FieldSet,
        record: &ConversationRecord,
    ) -> Result<()> {
        let status = if record.has_expert_answer() {
            ConversationStatus::Closed
        } else {
            ConversationStatus::Open
        };
        let text = |v: &Option<String>| v.clone().map(Value::Text).unwrap_or(Value::Null);

        let mut columns = vec!["id"];
        let mut values = vec![Value::Integer(record.id)];
        for field in Field::ALL {
            if !fields.contains(field) {
                debug!("Column {} absent, dropping value for id={}", field, record.id);
                continue;
            }
            let value = match field {
                Field::SentDate => text(&record.sent_date),
                Field::UserMessage => text(&record.user_message),
                Field::AssistantMessage => text(&record.assistant_message),
                Field::Bot => text(&record.bot),
                Field::Subject => text(&record.subject),
                Field::Crop => text(&record.crop),
                Field::FeedbackNeg => record.feedback_neg.map(Value::Integer).unwrap_or(Value::Null),
                Field::HashedId => text(&record.hashed_id),
                Field::ExpertAnswer => text(&record.expert_answer),
                Field::Status => Value::Text(status.as_str().to_string()),
            };
            columns.push(field.column());
            values.push(value);
        }

        let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            CONVERSATIONS_TABLE,
            columns.join(", "),
            placeholders.join(", ")
        );
        conn.execute(&sql, params_from_iter(values.iter()))
            .map_err(|e| {
                if e.to_string().contains("UNIQUE constraint") {
                    Error::Validation(format!("duplicate conversation id {}", record.id))
                } else {
                    db_err(e)
                }
            })?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Conversation CRUD
    // ---------------------------------------------------------------

    /// Replace every conversation (and all answers) with `records` in one transaction.
    pub fn replace_all(&self, records: &[ConversationRecord]) -> Result<usize> {
        let mut conn = self.conn.lock();
        let fields = Self::schema_fields(&conn)?;
        let tx = conn.transaction().map_err(db_err)?;
        tx.execute("DELETE FROM expert_answers", []).map_err(db_err)?;
        tx.execute(&format!("DELETE FROM {}", CONVERSATIONS_TABLE), [])
            .map_err(db_err)?;
        for record in records {
            Self::insert_record(&tx, &fields, record)?;
        }
        tx.commit().map_err(db_err)?;
        info!("Replaced conversation set: {} records", records.len());
        Ok(records.len())
    }

    /// Insert a single conversation. Fails on a duplicate id.
    pub fn insert_conversation(&self, record: &ConversationRecord) -> Result<i64> {
        let conn = self.conn.lock();
        let fields = Self::schema_fields(&conn)?;
        Self::insert_record(&conn, &fields, record)?;
        Ok(record.id)
    }

    /// Get a conversation by id.
    pub fn get_conversation(&self, id: i64) -> Result<Option<ConversationRecord>> {
        let conn = self.conn.lock();
        let fields = Self::schema_fields(&conn)?;
        let sql = format!("{} WHERE id = ?1", Self::select_sql(&fields));
        conn.query_row(&sql, params![id], Self::row_to_record)
            .optional()
            .map_err(db_err)
    }

    /// List conversations ordered by id, applying `filter`.
    pub fn list_conversations(&self, filter: &ConversationFilter) -> Result<Vec<ConversationRecord>> {
        let conn = self.conn.lock();
        let fields = Self::schema_fields(&conn)?;
        let sql = format!("{} ORDER BY id", Self::select_sql(&fields));
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let rows = stmt.query_map([], Self::row_to_record).map_err(db_err)?;

        let mut records = Vec::new();
        for row in rows {
            let record = row.map_err(db_err)?;
            if filter.matches(&record) {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Delete a conversation and its expert answer.
    pub fn delete_conversation(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(db_err)?;
        tx.execute(
            "DELETE FROM expert_answers WHERE conversation_id = ?1",
            params![id],
        )
        .map_err(db_err)?;
        let count = tx
            .execute(
                &format!("DELETE FROM {} WHERE id = ?1", CONVERSATIONS_TABLE),
                params![id],
            )
            .map_err(db_err)?;
        tx.commit().map_err(db_err)?;
        Ok(count > 0)
    }

    /// Count conversations.
    pub fn count_conversations(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", CONVERSATIONS_TABLE),
            [],
            |row| row.get(0),
        )
        .map_err(db_err)
    }

    // ---------------------------------------------------------------
    // Expert answers
    // ---------------------------------------------------------------

    /// Attach (or overwrite) the expert answer for a conversation and close it.
    /// Returns the expert answer row id.
    pub fn record_expert_answer(&self, conversation_id: i64, answer: &str) -> Result<i64> {
        if answer.trim().is_empty() {
            return Err(Error::Validation("expert answer must not be empty".to_string()));
        }

        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(db_err)?;

        let exists: Option<i64> = tx
            .query_row(
                &format!("SELECT id FROM {} WHERE id = ?1", CONVERSATIONS_TABLE),
                params![conversation_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;
        if exists.is_none() {
            return Err(Error::NotFound(format!("conversation {}", conversation_id)));
        }

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM expert_answers WHERE conversation_id = ?1 ORDER BY id LIMIT 1",
                params![conversation_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;

        let answer_id = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE expert_answers SET expert_answer = ?1 WHERE id = ?2",
                    params![answer, id],
                )
                .map_err(db_err)?;
                id
            }
            None => {
                tx.execute(
                    "INSERT INTO expert_answers (conversation_id, expert_answer) VALUES (?1, ?2)",
                    params![conversation_id, answer],
                )
                .map_err(db_err)?;
                tx.last_insert_rowid()
            }
        };

        tx.execute(
            &format!(
                "UPDATE {} SET expert_answer = ?1, status = ?2 WHERE id = ?3",
                CONVERSATIONS_TABLE
            ),
            params![answer, ConversationStatus::Closed.as_str(), conversation_id],
        )
        .map_err(db_err)?;
        tx.commit().map_err(db_err)?;

        debug!("Recorded expert answer {} for conversation {}", answer_id, conversation_id);
        Ok(answer_id)
    }

    /// The expert answer row for a conversation, if any.
    pub fn get_expert_answer(&self, conversation_id: i64) -> Result<Option<ExpertAnswer>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, conversation_id, expert_answer FROM expert_answers \
             WHERE conversation_id = ?1 ORDER BY id LIMIT 1",
            params![conversation_id],
            |row| {
                Ok(ExpertAnswer {
                    id: row.get(0)?,
                    conversation_id: row.get(1)?,
                    expert_answer: row.get(2)?,
                })
            },
        )
        .optional()
        .map_err(db_err)
    }

    /// Clear all conversations and answers.
    pub fn reset(&self) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(db_err)?;
        tx.execute("DELETE FROM expert_answers", []).map_err(db_err)?;
        tx.execute(&format!("DELETE FROM {}", CONVERSATIONS_TABLE), [])
            .map_err(db_err)?;
        tx.commit().map_err(db_err)?;
        warn!("Store reset: all conversations and answers deleted");
        Ok(())
    }
}

impl RecordSource for SqliteStore {
    fn fetch_all_records(&self) -> Result<RecordSet> {
        let conn = self.conn.lock();
        let fields = Self::schema_fields(&conn)
            .map_err(|e| Error::DataUnavailable(e.to_string()))?;
        if fields == FieldSet::default() {
            // PRAGMA table_info returns nothing for a missing table.
            let exists: bool = conn
                .query_row(
                    "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    params![CONVERSATIONS_TABLE],
                    |row| row.get(0),
                )
                .map_err(|e| Error::DataUnavailable(e.to_string()))?;
            if !exists {
                return Err(Error::DataUnavailable(format!(
                    "table {} does not exist",
                    CONVERSATIONS_TABLE
                )));
            }
        }

        let sql = format!("{} ORDER BY id", Self::select_sql(&fields));
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| Error::DataUnavailable(e.to_string()))?;
        let records = stmt
            .query_map([], Self::row_to_record)
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(|e| Error::DataUnavailable(e.to_string()))?;

        debug!("Fetched {} records ({} fields present)", records.len(), fields.iter().count());
        Ok(RecordSet::with_fields(records, fields))
    }
}

/// Text value of a cell, stringifying numbers. Empty strings read as NULL.
fn text_or_none(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            let s = String::from_utf8_lossy(bytes).into_owned();
            if s.is_empty() {
                None
            } else {
                Some(s)
            }
        }
    }
}

/// Integer value of a cell, accepting numeric text.
fn int_or_none(value: ValueRef<'_>) -> Option<i64> {
    match value {
        ValueRef::Integer(i) => Some(i),
        ValueRef::Real(f) => Some(f as i64),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .map(|f| f as i64),
        _ => None,
    }
}
