//! CSV ingestion and mode detection.
//!
//! Reads an operator CSV with encoding and delimiter auto-detection, infers
//! whether it describes resource creation or modification, and yields one
//! [`ChangeRecord`] per usable row.
//!
//! Mode inference:
//! - header has `action` plus any `new_`-prefixed column → modification
//! - header has `file`, `folder` or `data_items` → creation
//! - otherwise → modification
//!
//! In modification mode only rows whose `action` is `modify` become change
//! records; every other row is kept as a [`SkippedRow`] so the batch result
//! can report it instead of dropping it silently. Unknown columns are
//! collected into an unsupported set and reported as a warning; they never
//! abort ingestion.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::{ChangeMode, ChangeRecord, SkippedRow};
use crate::registry::{FieldRegistry, FIELD_REGISTRY};

/// Columns that drive ingestion itself rather than metadata.
const STRUCTURAL_COLUMNS: &[&str] = &["id", "action"];

/// Result of ingesting one CSV file.
#[derive(Debug)]
pub struct IngestResult {
    /// Change records, in row order.
    pub records: Vec<ChangeRecord>,
    /// Rows that produced no change record, with reasons.
    pub skipped: Vec<SkippedRow>,
    /// Header columns with no field mapping.
    pub unsupported_columns: Vec<String>,
    /// Detected layout mode.
    pub mode: ChangeMode,
    /// Detected or assumed encoding.
    pub encoding: String,
    /// Detected delimiter.
    pub delimiter: char,
}

// =============================================================================
// Encoding and delimiter detection
// =============================================================================

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let (charset, _, _) = chardet::detect(bytes);

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8(bytes.to_vec())
            .unwrap_or_else(|_| String::from_utf8_lossy(bytes).to_string()),
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.to_string()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        // Fallback: lossy UTF-8
        _ => String::from_utf8_lossy(bytes).to_string(),
    };
    Ok(decoded)
}

/// Detect the delimiter by counting occurrences in the header line.
///
/// `|` is deliberately not a candidate: it is the multilingual segment
/// separator inside values.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

// =============================================================================
// Mode detection
// =============================================================================

/// Infer the layout mode from header columns (already lowercased).
pub fn detect_mode(headers: &[String]) -> ChangeMode {
    let has_action = headers.iter().any(|h| h == "action");
    let has_new = headers.iter().any(|h| h.starts_with("new_"));
    if has_action && has_new {
        return ChangeMode::Modify;
    }
    if headers
        .iter()
        .any(|h| h == "file" || h == "folder" || h == "data_items")
    {
        return ChangeMode::Create;
    }
    ChangeMode::Modify
}

// =============================================================================
// Ingestion
// =============================================================================

/// Ingest a CSV file with auto-detection of encoding and delimiter.
pub fn ingest_file<P: AsRef<Path>>(path: P) -> CsvResult<IngestResult> {
    let bytes = std::fs::read(path.as_ref())?;
    ingest_bytes(&bytes)
}

/// Ingest raw CSV bytes.
pub fn ingest_bytes(bytes: &[u8]) -> CsvResult<IngestResult> {
    if bytes.is_empty() {
        return Err(CsvError::EmptyFile);
    }
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    ingest_str(&content, delimiter, encoding)
}

/// Ingest decoded CSV content with an explicit delimiter.
pub fn ingest_str(content: &str, delimiter: char, encoding: String) -> CsvResult<IngestResult> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().trim_matches('"').to_lowercase())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let mode = detect_mode(&headers);
    let unsupported_columns = collect_unsupported(&headers, &FIELD_REGISTRY);

    let mut records = Vec::new();
    let mut skipped = Vec::new();

    for (idx, row) in reader.records().enumerate() {
        let row_num = idx + 1; // 1-based data row
        let row = row.map_err(|e| CsvError::ParseError(format!("row {}: {}", row_num, e)))?;

        let mut cells: BTreeMap<&str, &str> = BTreeMap::new();
        for (i, header) in headers.iter().enumerate() {
            let value = row.get(i).map(|v| v.trim().trim_matches('"')).unwrap_or("");
            cells.insert(header.as_str(), value);
        }

        match mode {
            ChangeMode::Modify => {
                ingest_modification_row(row_num, &cells, &mut records, &mut skipped)
            }
            ChangeMode::Create => ingest_creation_row(row_num, &cells, &mut records, &mut skipped),
        }
    }

    Ok(IngestResult {
        records,
        skipped,
        unsupported_columns,
        mode,
        encoding,
        delimiter,
    })
}

fn collect_unsupported(headers: &[String], registry: &FieldRegistry) -> Vec<String> {
    headers
        .iter()
        .filter(|h| !h.is_empty())
        .filter(|h| !STRUCTURAL_COLUMNS.contains(&h.as_str()))
        .filter(|h| registry.lookup(h).is_none())
        .cloned()
        .collect()
}

fn ingest_modification_row(
    row_num: usize,
    cells: &BTreeMap<&str, &str>,
    records: &mut Vec<ChangeRecord>,
    skipped: &mut Vec<SkippedRow>,
) {
    let resource_id = cells.get("id").copied().unwrap_or("").to_string();
    let action = cells.get("action").copied().unwrap_or("");

    if !action.eq_ignore_ascii_case("modify") {
        skipped.push(SkippedRow {
            row: row_num,
            resource_id,
            reason: format!("action '{}' is not 'modify'", action),
        });
        return;
    }
    if resource_id.is_empty() {
        skipped.push(SkippedRow {
            row: row_num,
            resource_id,
            reason: "missing resource id".to_string(),
        });
        return;
    }

    let changes = collect_changes(cells);
    if changes.is_empty() {
        skipped.push(SkippedRow {
            row: row_num,
            resource_id,
            reason: "no supported field values".to_string(),
        });
        return;
    }

    records.push(ChangeRecord {
        resource_id,
        mode: ChangeMode::Modify,
        changes,
        source_row: row_num,
    });
}

fn ingest_creation_row(
    row_num: usize,
    cells: &BTreeMap<&str, &str>,
    records: &mut Vec<ChangeRecord>,
    skipped: &mut Vec<SkippedRow>,
) {
    let changes = collect_changes(cells);
    if changes.is_empty() {
        skipped.push(SkippedRow {
            row: row_num,
            resource_id: String::new(),
            reason: "no supported field values".to_string(),
        });
        return;
    }

    records.push(ChangeRecord {
        // New resources get their id from the repository on creation.
        resource_id: cells.get("id").copied().unwrap_or("").to_string(),
        mode: ChangeMode::Create,
        changes,
        source_row: row_num,
    });
}

/// Map supported non-empty cells to (semantic field, raw value).
fn collect_changes(cells: &BTreeMap<&str, &str>) -> BTreeMap<String, String> {
    let mut changes = BTreeMap::new();
    for (column, value) in cells {
        if value.is_empty() {
            continue;
        }
        if let Some(mapping) = FIELD_REGISTRY.lookup(column) {
            changes.insert(mapping.semantic_field.to_string(), value.to_string());
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_detect_mode_modification() {
        let headers = vec!["id".into(), "action".into(), "new_title".into()];
        assert_eq!(detect_mode(&headers), ChangeMode::Modify);
    }

    #[test]
    fn test_detect_mode_creation() {
        let headers = vec!["title".into(), "creator".into(), "file".into()];
        assert_eq!(detect_mode(&headers), ChangeMode::Create);
    }

    #[test]
    fn test_detect_mode_defaults_to_modification() {
        let headers = vec!["id".into(), "title".into()];
        assert_eq!(detect_mode(&headers), ChangeMode::Modify);
    }

    #[test]
    fn test_modification_rows_filtered_by_action() {
        let csv = "id,action,new_title\n\
                   abc,modify,Hello\n\
                   def,delete,Bye\n\
                   ghi,modify,World\n";
        let result = ingest_str(csv, ',', "utf-8".into()).unwrap();
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[0].resource_id, "abc");
        assert_eq!(result.records[1].resource_id, "ghi");
        assert_eq!(result.skipped.len(), 1);
        assert!(result.skipped[0].reason.contains("delete"));
    }

    #[test]
    fn test_all_non_modify_yields_zero_records_no_error() {
        let csv = "id,action,new_title\nabc,delete,X\ndef,create,Y\n";
        let result = ingest_str(csv, ',', "utf-8".into()).unwrap();
        assert!(result.records.is_empty());
        assert_eq!(result.skipped.len(), 2);
    }

    #[test]
    fn test_change_record_semantic_fields() {
        let csv = "id,action,new_title,new_keywords\n\
                   abc123,modify,\"fr:Titre|en:Title\",\"fr:un;deux|en:one;two\"\n";
        let result = ingest_str(csv, ',', "utf-8".into()).unwrap();
        assert_eq!(result.records.len(), 1);
        let record = &result.records[0];
        assert_eq!(record.resource_id, "abc123");
        let fields: Vec<_> = record.changes.keys().cloned().collect();
        assert_eq!(fields, vec!["keywords", "title"]);
        assert_eq!(record.changes["title"], "fr:Titre|en:Title");
    }

    #[test]
    fn test_unsupported_columns_reported_not_fatal() {
        let csv = "id,action,new_title,shoe_size\nabc,modify,Hi,42\n";
        let result = ingest_str(csv, ',', "utf-8".into()).unwrap();
        assert_eq!(result.unsupported_columns, vec!["shoe_size"]);
        assert_eq!(result.records.len(), 1);
        assert!(!result.records[0].changes.contains_key("shoe_size"));
    }

    #[test]
    fn test_missing_id_is_skipped() {
        let csv = "id,action,new_title\n,modify,Hi\n";
        let result = ingest_str(csv, ',', "utf-8".into()).unwrap();
        assert!(result.records.is_empty());
        assert!(result.skipped[0].reason.contains("missing resource id"));
    }

    #[test]
    fn test_creation_layout() {
        let csv = "title,creator,description,file\n\
                   en:My dataset,\"Doe, John\",en:About things,data.zip\n";
        let result = ingest_str(csv, ',', "utf-8".into()).unwrap();
        assert_eq!(result.mode, ChangeMode::Create);
        assert_eq!(result.records.len(), 1);
        let record = &result.records[0];
        assert_eq!(record.mode, ChangeMode::Create);
        assert!(record.changes.contains_key("title"));
        assert!(record.changes.contains_key("file"));
    }

    #[test]
    fn test_semicolon_delimiter_detection() {
        let csv = "id;action;new_title\nabc;modify;Hello\n";
        assert_eq!(detect_delimiter(csv), ';');
        let result = ingest_bytes(csv.as_bytes()).unwrap();
        assert_eq!(result.delimiter, ';');
        assert_eq!(result.records.len(), 1);
    }

    #[test]
    fn test_empty_file_error() {
        assert!(matches!(ingest_bytes(b""), Err(CsvError::EmptyFile)));
        assert!(matches!(
            ingest_str("   \n  ", ',', "utf-8".into()),
            Err(CsvError::EmptyFile)
        ));
    }

    #[test]
    fn test_latin1_round_trip_via_file() {
        // "Société" in ISO-8859-1, inside a modification CSV.
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let mut bytes = b"id,action,new_title\nabc,modify,".to_vec();
        bytes.extend_from_slice(&[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9]);
        bytes.push(b'\n');
        file.write_all(&bytes).unwrap();

        let result = ingest_file(file.path()).unwrap();
        assert_eq!(result.records.len(), 1);
        assert!(result.records[0].changes["title"].starts_with("Soci"));
    }
}
