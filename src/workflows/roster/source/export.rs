use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use super::{rows_to_records, RosterSource, SheetError};
use crate::workflows::roster::domain::ApplicantRecord;

/// Roster read from a CSV download of the worksheet.
#[derive(Debug, Clone)]
pub struct CsvRosterSource {
    path: PathBuf,
    header_rows: usize,
}

impl CsvRosterSource {
    pub fn new(path: impl Into<PathBuf>, header_rows: usize) -> Self {
        Self {
            path: path.into(),
            header_rows,
        }
    }
}

impl RosterSource for CsvRosterSource {
    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }

    fn fetch_records(&self) -> Result<Vec<ApplicantRecord>, SheetError> {
        let file = File::open(&self.path)?;
        parse_records(file, self.header_rows)
    }
}

/// Parses a worksheet export. Blank lines between records come back as empty
/// rows so row numbers line up with the sheet.
pub(crate) fn parse_records<R: Read>(
    mut reader: R,
    header_rows: usize,
) -> Result<Vec<ApplicantRecord>, SheetError> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data.as_slice());

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut record = csv::StringRecord::new();
    while csv_reader.read_record(&mut record)? {
        if !rows.is_empty() {
            let start = record.position().map_or(0, |position| position.byte() as usize);
            let blanks = skipped_blank_lines(&data, start);
            rows.extend(std::iter::repeat_with(Vec::new).take(blanks));
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    rows_to_records(rows, header_rows)
}

/// Counts the empty lines the CSV reader discarded before a record whose read
/// began at byte `start`. A leading `\n` that completes the previous record's
/// `\r\n` terminator is not a blank line.
fn skipped_blank_lines(data: &[u8], start: usize) -> usize {
    let rest = data.get(start..).unwrap_or_default();
    let newlines = rest
        .iter()
        .take_while(|byte| matches!(**byte, b'\r' | b'\n'))
        .filter(|byte| **byte == b'\n')
        .count();
    let finishes_crlf = start.checked_sub(1).and_then(|index| data.get(index)) == Some(&b'\r')
        && rest.first() == Some(&b'\n');
    newlines - usize::from(finishes_crlf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use crate::workflows::roster::classifier::{classify, ClassificationRules};

    #[test]
    fn parses_form_export() {
        let csv = "Timestamp,Name,Email Address,Current GSU GPA,Approved?\n\
                   9/1/2024 10:00:00,Ada Lovelace,ada@example.edu,3.8,\n\
                   9/1/2024 11:30:00,\"Hopper, Grace\",grace@example.edu,2.0,Yes\n";

        let records = parse_records(Cursor::new(csv), 1).expect("csv parses");

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].field("Name"), Some("Hopper, Grace"));
        assert_eq!(records[1].field("Approved?"), Some("Yes"));
    }

    #[test]
    fn tolerates_ragged_rows() {
        let csv = "Name,Current GSU GPA,Approved?\nAda,3.8\n";
        let records = parse_records(Cursor::new(csv), 1).expect("csv parses");
        assert_eq!(records[0].field("Approved?"), Some(""));
    }

    #[test]
    fn blank_lines_keep_row_positions() {
        let csv = "Name,Current GSU GPA,Approved?\nAda,3.0,\n\nKen,abc,\n";
        let records = parse_records(Cursor::new(csv), 1).expect("csv parses");

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].field("Name"), Some("Ada"));
        assert_eq!(records[1].trimmed("Name"), "");
        assert_eq!(records[2].field("Name"), Some("Ken"));

        let rules = ClassificationRules {
            gpa_column: "Current GSU GPA".to_string(),
            reviewed_column: "Approved?".to_string(),
            gpa_threshold: 2.0,
            header_rows: 1,
        };
        let classification = classify(&records, &rules);
        let invalid_rows: Vec<usize> = classification
            .invalid
            .iter()
            .map(|entry| entry.row.0)
            .collect();
        assert_eq!(classification.qualified[0].row.0, 2);
        assert_eq!(invalid_rows, vec![3, 4]);
    }

    #[test]
    fn crlf_exports_count_blank_lines_once() {
        let csv = "Name,Current GSU GPA\r\nAda,3.0\r\n\r\n\r\nKen,2.5\r\n\r\n";
        let records = parse_records(Cursor::new(csv), 1).expect("csv parses");

        let names: Vec<&str> = records.iter().map(|record| record.trimmed("Name")).collect();
        assert_eq!(names, vec!["Ada", "", "", "Ken"]);
    }

    #[test]
    fn quoted_line_breaks_are_not_blank_rows() {
        let csv = "Name,Current GSU GPA\n\"Ada\nLovelace\",3.8\nKen,2.5\n";
        let records = parse_records(Cursor::new(csv), 1).expect("csv parses");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].field("Name"), Some("Ada\nLovelace"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let source = CsvRosterSource::new("does/not/exist.csv", 1);
        assert!(matches!(source.fetch_records(), Err(SheetError::Io(_))));
        assert_eq!(source.describe(), "csv:does/not/exist.csv");
    }
}
