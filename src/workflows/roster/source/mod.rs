//! Roster row sources: the live Google worksheet and offline CSV exports.

mod export;
mod google;

pub use export::CsvRosterSource;
pub use google::{GoogleSheetsClient, SheetLocation};

use std::collections::HashSet;
use std::fmt::Debug;

use super::domain::ApplicantRecord;

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("spreadsheet '{title}' was not found or is not shared with the service account")]
    SpreadsheetNotFound { title: String },
    #[error("duplicate column header '{0}' in roster")]
    DuplicateHeader(String),
    #[error("google authentication failed: {0}")]
    Auth(String),
    #[error("spreadsheet request failed: {0}")]
    Backend(String),
    #[error("spreadsheet runtime unavailable: {0}")]
    Runtime(String),
    #[error("failed to read roster export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid roster CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Anything that can hand back the roster as header-keyed records, in sheet order.
pub trait RosterSource: Debug {
    /// Human-readable origin, recorded in the snapshot.
    fn describe(&self) -> String;
    fn fetch_records(&self) -> Result<Vec<ApplicantRecord>, SheetError>;
}

/// Turns raw worksheet rows into records keyed by the first row's headers.
///
/// Data starts `header_rows` rows down. Short rows are padded with blanks and
/// cells past the last header are dropped. Blank header cells drop their column.
pub fn rows_to_records(
    rows: Vec<Vec<String>>,
    header_rows: usize,
) -> Result<Vec<ApplicantRecord>, SheetError> {
    let mut rows = rows.into_iter();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };

    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(header.len());
    for (index, name) in header.into_iter().enumerate() {
        if name.trim().is_empty() {
            continue;
        }
        if !seen.insert(name.clone()) {
            return Err(SheetError::DuplicateHeader(name));
        }
        columns.push((index, name));
    }

    Ok(rows
        .skip(header_rows.saturating_sub(1))
        .map(|row| {
            columns
                .iter()
                .map(|(index, name)| (name.clone(), row.get(*index).cloned().unwrap_or_default()))
                .collect()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|cell| cell.to_string()).collect()
    }

    #[test]
    fn keys_records_by_header() {
        let records = rows_to_records(
            vec![
                row(&["Name", "Current GSU GPA", "Approved?"]),
                row(&["Ada", "3.9", ""]),
                row(&["Alan", "2.1"]),
            ],
            1,
        )
        .expect("rows convert");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].field("Name"), Some("Ada"));
        assert_eq!(records[1].field("Approved?"), Some(""));
    }

    #[test]
    fn extra_header_rows_are_skipped() {
        let records = rows_to_records(
            vec![
                row(&["Name", "GPA"]),
                row(&["(full name)", "(0.0 - 4.0)"]),
                row(&["Ada", "3.9"]),
            ],
            2,
        )
        .expect("rows convert");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].field("GPA"), Some("3.9"));
    }

    #[test]
    fn blank_rows_keep_their_position() {
        let records = rows_to_records(
            vec![row(&["Name", "GPA"]), row(&[]), row(&["Ada", "3.9"])],
            1,
        )
        .expect("rows convert");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].trimmed("Name"), "");
    }

    #[test]
    fn drops_unlabelled_columns_and_overflow() {
        let records = rows_to_records(
            vec![row(&["Name", "", "GPA"]), row(&["Ada", "note", "3.9", "stray"])],
            1,
        )
        .expect("rows convert");

        assert_eq!(records[0].fields().len(), 2);
        assert_eq!(records[0].field("GPA"), Some("3.9"));
    }

    #[test]
    fn rejects_duplicate_headers() {
        let err = rows_to_records(vec![row(&["Name", "GPA", "Name"])], 1)
            .expect_err("duplicate header");
        assert!(matches!(err, SheetError::DuplicateHeader(name) if name == "Name"));
    }

    #[test]
    fn empty_sheet_has_no_records() {
        assert!(rows_to_records(Vec::new(), 1).expect("empty ok").is_empty());
    }
}
