//! Upload ingestion: file → table → negative-feedback records → store.

use std::path::Path;

use tracing::{debug, info};

use crate::file::{parse_table, FileType, Table};
use agrireview_core::{ConversationRecord, Error, Result};
use agrireview_store::SqliteStore;

/// Source column headers of the chatbot feedback export.
pub mod columns {
    pub const SENT_DATE: &str = "Sent Date";
    pub const USER_MESSAGE: &str = "User Message (EN)";
    pub const ASSISTANT_MESSAGE: &str = "Assistant Message (EN)";
    pub const BOT: &str = "Bot";
    pub const SUBJECT: &str = "Subject";
    pub const CROP: &str = "Crop";
    pub const FEEDBACK_NEG: &str = "Feedback Neg";
    pub const HASHED_ID: &str = "HashedID";
}

/// Keep the rows flagged with negative feedback (`Feedback Neg == 1`) and map
/// them onto records. The record id is the row's 0-based position in the file.
pub fn extract_negative_feedback(table: &Table) -> Result<Vec<ConversationRecord>> {
    let feedback_col = table.column_index(columns::FEEDBACK_NEG).ok_or_else(|| {
        Error::Ingest(format!(
            "Uploaded file must contain '{}' column",
            columns::FEEDBACK_NEG
        ))
    })?;

    let sent_date = table.column_index(columns::SENT_DATE);
    let user_message = table.column_index(columns::USER_MESSAGE);
    let assistant_message = table.column_index(columns::ASSISTANT_MESSAGE);
    let bot = table.column_index(columns::BOT);
    let subject = table.column_index(columns::SUBJECT);
    let crop = table.column_index(columns::CROP);
    let hashed_id = table.column_index(columns::HASHED_ID);

    let mut records = Vec::new();
    for row in 0..table.rows.len() {
        let feedback = table.cell(row, feedback_col).and_then(parse_number);
        if feedback != Some(1.0) {
            continue;
        }

        let text = |col: Option<usize>| col.and_then(|c| table.cell(row, c)).map(str::to_string);
        records.push(ConversationRecord {
            sent_date: text(sent_date).map(|s| s.trim().to_string()),
            user_message: text(user_message),
            assistant_message: text(assistant_message),
            bot: text(bot),
            subject: text(subject),
            crop: text(crop),
            feedback_neg: feedback.map(|f| f as i64),
            hashed_id: text(hashed_id),
            ..ConversationRecord::new(row as i64)
        });
    }

    debug!(
        "Extracted {} negative-feedback rows out of {}",
        records.len(),
        table.rows.len()
    );
    Ok(records)
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok()
}

/// Handles upload ingestion into the record store.
pub struct Ingester<'a> {
    store: &'a SqliteStore,
}

impl<'a> Ingester<'a> {
    pub fn new(store: &'a SqliteStore) -> Self {
        Self { store }
    }

    /// Parse an uploaded file and replace the stored conversations with its
    /// negative-feedback rows. Returns the number of conversations stored.
    pub fn ingest_bytes(&self, filename: &str, bytes: &[u8]) -> Result<usize> {
        let file_type = FileType::from_filename(filename);
        let table = parse_table(file_type, bytes)?;
        let records = extract_negative_feedback(&table)?;
        let count = self.store.replace_all(&records)?;
        info!(
            "Ingested {}: {} rows read, {} flagged conversations stored",
            filename,
            table.rows.len(),
            count
        );
        Ok(count)
    }

    /// Ingest a file from disk.
    pub fn ingest_file(&self, path: &Path) -> Result<usize> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");
        self.ingest_bytes(filename, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agrireview_core::{ConversationStatus, RecordSource};

    const EXPORT: &str = "Sent Date,User Message (EN),Assistant Message (EN),Bot,Subject,Crop,Feedback Neg,HashedID\n\
        2024-01-05 10:00:00,My wheat has rust,Use fungicide,kisan,Disease,Wheat,1,u1\n\
        2024-01-06,Thanks!,You're welcome,kisan,Other,,0,u2\n\
        2024-02-01,When to sow rice?,In June,agri,Sowing,Rice,1.0,u3\n\
        ,blank date,ok,,,,1,\n";

    fn table() -> Table {
        parse_table(FileType::Csv, EXPORT.as_bytes()).unwrap()
    }

    #[test]
    fn test_extract_keeps_only_negative_rows() {
        let records = extract_negative_feedback(&table()).unwrap();
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 2, 3]);
        assert!(records.iter().all(|r| r.feedback_neg == Some(1)));
        assert!(records.iter().all(|r| r.status == ConversationStatus::Open));
    }

    #[test]
    fn test_extract_maps_columns() {
        let records = extract_negative_feedback(&table()).unwrap();
        let first = &records[0];
        assert_eq!(first.sent_date.as_deref(), Some("2024-01-05 10:00:00"));
        assert_eq!(first.user_message.as_deref(), Some("My wheat has rust"));
        assert_eq!(first.assistant_message.as_deref(), Some("Use fungicide"));
        assert_eq!(first.bot.as_deref(), Some("kisan"));
        assert_eq!(first.subject.as_deref(), Some("Disease"));
        assert_eq!(first.crop.as_deref(), Some("Wheat"));
        assert_eq!(first.hashed_id.as_deref(), Some("u1"));
        assert_eq!(first.expert_answer, None);

        let blank = &records[2];
        assert_eq!(blank.sent_date, None);
        assert_eq!(blank.bot, None);
        assert_eq!(blank.hashed_id, None);
    }

    #[test]
    fn test_extract_requires_feedback_column() {
        let table = parse_table(FileType::Csv, b"Bot,Crop\nkisan,Wheat\n").unwrap();
        let err = extract_negative_feedback(&table).unwrap_err();
        assert!(err.to_string().contains("Feedback Neg"));
    }

    #[test]
    fn test_extract_tolerates_missing_optional_columns() {
        let table = parse_table(FileType::Csv, b"Feedback Neg,Bot\n1,kisan\n").unwrap();
        let records = extract_negative_feedback(&table).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].crop, None);
        assert_eq!(records[0].user_message, None);
    }

    #[test]
    fn test_ingester_replaces_store_contents() {
        let store = SqliteStore::open_in_memory().unwrap();
        let ingester = Ingester::new(&store);

        assert_eq!(ingester.ingest_bytes("export.csv", EXPORT.as_bytes()).unwrap(), 3);
        assert_eq!(
            ingester
                .ingest_bytes("second.json", br#"[{"Feedback Neg": 1, "Bot": "x"}]"#)
                .unwrap(),
            1
        );

        let set = store.fetch_all_records().unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.records[0].bot.as_deref(), Some("x"));
    }

    #[test]
    fn test_ingest_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        std::fs::write(&path, EXPORT).unwrap();

        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(Ingester::new(&store).ingest_file(&path).unwrap(), 3);
    }

    #[test]
    fn test_ingest_xlsx_workbook() {
        let store = SqliteStore::open_in_memory().unwrap();
        let count = Ingester::new(&store)
            .ingest_bytes("export.xlsx", include_bytes!("../tests/fixtures/export.xlsx"))
            .unwrap();
        assert_eq!(count, 2);

        let set = store.fetch_all_records().unwrap();
        let ids: Vec<i64> = set.records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 2]);
        assert_eq!(set.records[0].user_message.as_deref(), Some("My wheat has rust"));
        assert_eq!(set.records[0].feedback_neg, Some(1));
        assert_eq!(set.records[1].crop.as_deref(), Some("Rice"));
    }

    #[test]
    fn test_ingest_rejects_unsupported_or_corrupt_file() {
        let store = SqliteStore::open_in_memory().unwrap();
        let ingester = Ingester::new(&store);

        let err = ingester.ingest_bytes("notes.pdf", b"%PDF-1.4").unwrap_err();
        assert!(matches!(err, Error::Ingest(_)));
        let err = ingester.ingest_bytes("broken.xlsx", b"PK\x03\x04").unwrap_err();
        assert!(matches!(err, Error::Ingest(_)));
    }
}
