use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One roster row keyed by header name, exactly as read from the sheet.
///
/// Columns keep worksheet order, including through the JSON snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicantRecord(Vec<(String, String)>);

impl ApplicantRecord {
    /// Raw value of a column, if the column exists.
    pub fn field(&self, column: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// Trimmed value of a column, treating a missing column as blank.
    pub fn trimmed(&self, column: &str) -> &str {
        self.field(column).map(str::trim).unwrap_or("")
    }

    /// Header/value pairs in worksheet order.
    pub fn fields(&self) -> &[(String, String)] {
        &self.0
    }

    fn insert(&mut self, column: String, value: String) {
        match self.0.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = value,
            None => self.0.push((column, value)),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for ApplicantRecord
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::default();
        for (key, value) in iter {
            record.insert(key.into(), value.into());
        }
        record
    }
}

impl Serialize for ApplicantRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(name, value)| (name, value)))
    }
}

impl<'de> Deserialize<'de> for ApplicantRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = ApplicantRecord;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of column names to cell text")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut record = ApplicantRecord::default();
                while let Some((column, value)) = map.next_entry::<String, String>()? {
                    record.insert(column, value);
                }
                Ok(record)
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

/// 1-based spreadsheet row, counted from the top of the worksheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowNumber(pub usize);

impl RowNumber {
    /// Row of the `index`-th data row (0-based) below `header_rows` header rows.
    pub fn from_data_index(index: usize, header_rows: usize) -> Self {
        Self(index + header_rows + 1)
    }
}

impl fmt::Display for RowNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_numbers_skip_the_header() {
        assert_eq!(RowNumber::from_data_index(0, 1), RowNumber(2));
        assert_eq!(RowNumber::from_data_index(4, 1), RowNumber(6));
        assert_eq!(RowNumber::from_data_index(0, 3), RowNumber(4));
    }

    #[test]
    fn missing_columns_read_as_blank() {
        let record: ApplicantRecord = [("Name", "  Ada Lovelace ")].into_iter().collect();
        assert_eq!(record.trimmed("Name"), "Ada Lovelace");
        assert_eq!(record.trimmed("Approved?"), "");
        assert!(record.field("Approved?").is_none());
    }

    #[test]
    fn keeps_worksheet_column_order() {
        let record: ApplicantRecord = [
            ("Timestamp", "9/1/2024"),
            ("Name", "Ada Lovelace"),
            ("Current GSU GPA", "3.8"),
            ("Approved?", ""),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&record).expect("record serializes");
        assert_eq!(
            json,
            r#"{"Timestamp":"9/1/2024","Name":"Ada Lovelace","Current GSU GPA":"3.8","Approved?":""}"#
        );

        let restored: ApplicantRecord = serde_json::from_str(&json).expect("record parses");
        let columns: Vec<&str> = restored.fields().iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(columns, vec!["Timestamp", "Name", "Current GSU GPA", "Approved?"]);
        assert_eq!(restored, record);
    }
}
