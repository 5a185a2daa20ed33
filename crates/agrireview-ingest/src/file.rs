//! Tabular file decoding for uploaded conversation exports.

use std::io::Cursor;

use agrireview_core::{Error, Result};
use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Csv,
    /// Excel workbook; the first worksheet is read.
    Xlsx,
    /// A JSON array of flat row objects.
    Json,
    Unknown,
}

impl FileType {
    /// Detect file type from extension.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "csv" => Self::Csv,
            "xlsx" | "xls" => Self::Xlsx,
            "json" => Self::Json,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from an uploaded filename.
    pub fn from_filename(filename: &str) -> Self {
        std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }
}

/// A decoded table: header names and string cells. Empty cells are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    /// Position of a column by exact header name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell at `row`/`column`, `None` for empty or ragged rows.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .and_then(|c| c.as_deref())
    }
}

/// Decode uploaded bytes into a [`Table`].
pub fn parse_table(file_type: FileType, bytes: &[u8]) -> Result<Table> {
    match file_type {
        FileType::Csv => parse_csv(bytes),
        FileType::Xlsx => parse_xlsx(bytes),
        FileType::Json => parse_json(bytes),
        FileType::Unknown => Err(Error::Ingest(
            "unsupported file type (expected .csv, .xlsx or .json)".to_string(),
        )),
    }
}

fn parse_csv(bytes: &[u8]) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| Error::Ingest(e.to_string()))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::Ingest(e.to_string()))?;
        rows.push(record.iter().map(non_empty).collect());
    }

    Ok(Table { headers, rows })
}

fn parse_xlsx(bytes: &[u8]) -> Result<Table> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| Error::Ingest(format!("unreadable workbook: {}", e)))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::Ingest("workbook has no worksheets".to_string()))?
        .map_err(|e| Error::Ingest(e.to_string()))?;

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = match sheet_rows.next() {
        Some(row) => row
            .iter()
            .map(|c| sheet_cell(c).map(|h| h.trim().to_string()).unwrap_or_default())
            .collect(),
        None => return Ok(Table::default()),
    };
    let rows = sheet_rows
        .map(|row| row.iter().map(sheet_cell).collect())
        .collect();

    Ok(Table { headers, rows })
}

fn sheet_cell(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => non_empty(s),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        other => non_empty(&other.to_string()),
    }
}

fn parse_json(bytes: &[u8]) -> Result<Table> {
    let objects: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_slice(bytes)
        .map_err(|e| Error::Ingest(format!("expected a JSON array of row objects: {}", e)))?;

    // Union of keys across all rows.
    let mut headers: Vec<String> = Vec::new();
    for object in &objects {
        for key in object.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = objects
        .iter()
        .map(|object| {
            headers
                .iter()
                .map(|h| object.get(h).and_then(json_cell))
                .collect()
        })
        .collect();

    Ok(Table { headers, rows })
}

fn json_cell(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => non_empty(s),
        other => Some(other.to_string()),
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_from_filename() {
        assert_eq!(FileType::from_filename("export.CSV"), FileType::Csv);
        assert_eq!(FileType::from_filename("rows.json"), FileType::Json);
        assert_eq!(FileType::from_filename("book.xlsx"), FileType::Xlsx);
        assert_eq!(FileType::from_filename("legacy.XLS"), FileType::Xlsx);
        assert_eq!(FileType::from_filename("notes.pdf"), FileType::Unknown);
        assert_eq!(FileType::from_filename("noext"), FileType::Unknown);
    }

    #[test]
    fn test_parse_csv_quoted_and_empty_cells() {
        let data = "\u{feff}Bot,User Message (EN),Feedback Neg\n\
                    kisan,\"Leaves are yellow, why?\",1\n\
                    agri,,0\n";
        let table = parse_table(FileType::Csv, data.as_bytes()).unwrap();

        assert_eq!(table.headers, vec!["Bot", "User Message (EN)", "Feedback Neg"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.cell(0, 1), Some("Leaves are yellow, why?"));
        assert_eq!(table.cell(1, 1), None);
        assert_eq!(table.column_index("Feedback Neg"), Some(2));
    }

    #[test]
    fn test_parse_csv_ragged_rows() {
        let data = "A,B,C\n1,2\n";
        let table = parse_table(FileType::Csv, data.as_bytes()).unwrap();
        assert_eq!(table.cell(0, 1), Some("2"));
        assert_eq!(table.cell(0, 2), None);
    }

    #[test]
    fn test_parse_json_rows() {
        let data = r#"[
            {"Bot": "kisan", "Feedback Neg": 1, "Crop": null},
            {"Bot": "agri", "Feedback Neg": 0, "Subject": "Pests"}
        ]"#;
        let table = parse_table(FileType::Json, data.as_bytes()).unwrap();

        let bot = table.column_index("Bot").unwrap();
        let feedback = table.column_index("Feedback Neg").unwrap();
        let subject = table.column_index("Subject").unwrap();
        assert_eq!(table.cell(0, bot), Some("kisan"));
        assert_eq!(table.cell(0, feedback), Some("1"));
        assert_eq!(table.cell(0, subject), None);
        assert_eq!(table.cell(1, subject), Some("Pests"));
    }

    #[test]
    fn test_parse_xlsx_first_sheet() {
        let bytes = include_bytes!("../tests/fixtures/export.xlsx");
        let table = parse_table(FileType::Xlsx, bytes).unwrap();

        assert_eq!(table.headers.len(), 8);
        assert_eq!(table.headers[0], "Sent Date");
        assert_eq!(table.rows.len(), 3);

        let feedback = table.column_index("Feedback Neg").unwrap();
        let crop = table.column_index("Crop").unwrap();
        let message = table.column_index("User Message (EN)").unwrap();
        assert_eq!(table.cell(0, feedback), Some("1"));
        assert_eq!(table.cell(1, feedback), Some("0"));
        assert_eq!(table.cell(0, message), Some("My wheat has rust"));
        assert_eq!(table.cell(1, crop), None);
        assert_eq!(table.cell(2, crop), Some("Rice"));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            parse_table(FileType::Json, b"{\"not\": \"an array\"}"),
            Err(Error::Ingest(_))
        ));
        assert!(matches!(
            parse_table(FileType::Unknown, b"whatever"),
            Err(Error::Ingest(_))
        ));
        assert!(matches!(
            parse_table(FileType::Xlsx, b"not a zip archive"),
            Err(Error::Ingest(_))
        ));
    }
}
