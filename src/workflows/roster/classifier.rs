use std::num::ParseFloatError;

use serde::{Deserialize, Serialize};

use super::domain::{ApplicantRecord, RowNumber};

/// Column names and the eligibility threshold applied to each roster row.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationRules {
    pub gpa_column: String,
    pub reviewed_column: String,
    /// Inclusive minimum GPA for acceptance.
    pub gpa_threshold: f64,
    pub header_rows: usize,
}

/// The three mutually exclusive outcomes for an unreviewed applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationBucket {
    Qualified,
    Unqualified,
    Invalid,
}

impl ClassificationBucket {
    pub fn label(&self) -> &'static str {
        match self {
            ClassificationBucket::Qualified => "Qualified",
            ClassificationBucket::Unqualified => "Unqualified",
            ClassificationBucket::Invalid => "Invalid",
        }
    }
}

/// Applicant whose GPA parsed cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedApplicant {
    pub row: RowNumber,
    pub gpa: f64,
    pub record: ApplicantRecord,
}

/// Applicant whose GPA could not be read, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidApplicant {
    pub row: RowNumber,
    pub error: String,
    pub record: ApplicantRecord,
}

/// Bucketed roster, each bucket in original sheet order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub qualified: Vec<ClassifiedApplicant>,
    pub unqualified: Vec<ClassifiedApplicant>,
    pub invalid: Vec<InvalidApplicant>,
    #[serde(default)]
    pub skipped_reviewed: usize,
}

impl Classification {
    pub fn counts(&self) -> BucketCounts {
        BucketCounts {
            qualified: self.qualified.len(),
            unqualified: self.unqualified.len(),
            invalid: self.invalid.len(),
            skipped_reviewed: self.skipped_reviewed,
        }
    }

    pub fn bucket_of(&self, row: RowNumber) -> Option<ClassificationBucket> {
        if self.qualified.iter().any(|entry| entry.row == row) {
            Some(ClassificationBucket::Qualified)
        } else if self.unqualified.iter().any(|entry| entry.row == row) {
            Some(ClassificationBucket::Unqualified)
        } else if self.invalid.iter().any(|entry| entry.row == row) {
            Some(ClassificationBucket::Invalid)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCounts {
    pub qualified: usize,
    pub unqualified: usize,
    pub invalid: usize,
    pub skipped_reviewed: usize,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GpaError {
    #[error("GPA field '{column}' is empty")]
    Empty { column: String },
    #[error("could not parse GPA '{value}' as a decimal number: {source}")]
    NotANumber {
        value: String,
        source: ParseFloatError,
    },
    #[error("GPA '{value}' is not a finite number")]
    NonFinite { value: String },
}

pub fn parse_gpa(raw: &str, column: &str) -> Result<f64, GpaError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(GpaError::Empty {
            column: column.to_string(),
        });
    }

    let gpa = value
        .parse::<f64>()
        .map_err(|source| GpaError::NotANumber {
            value: value.to_string(),
            source,
        })?;

    if !gpa.is_finite() {
        return Err(GpaError::NonFinite {
            value: value.to_string(),
        });
    }

    Ok(gpa)
}

/// Partitions unreviewed records into qualified, unqualified, and invalid buckets.
///
/// Rows with anything in the reviewed column were handled by an earlier run and
/// are only counted. Row numbers are derived from each record's position below
/// the header rows.
pub fn classify(records: &[ApplicantRecord], rules: &ClassificationRules) -> Classification {
    let mut classification = Classification::default();

    for (index, record) in records.iter().enumerate() {
        if !record.trimmed(&rules.reviewed_column).is_empty() {
            classification.skipped_reviewed += 1;
            continue;
        }

        let row = RowNumber::from_data_index(index, rules.header_rows);
        match parse_gpa(record.trimmed(&rules.gpa_column), &rules.gpa_column) {
            Ok(gpa) if gpa >= rules.gpa_threshold => {
                classification.qualified.push(ClassifiedApplicant {
                    row,
                    gpa,
                    record: record.clone(),
                });
            }
            Ok(gpa) => {
                classification.unqualified.push(ClassifiedApplicant {
                    row,
                    gpa,
                    record: record.clone(),
                });
            }
            Err(err) => {
                classification.invalid.push(InvalidApplicant {
                    row,
                    error: err.to_string(),
                    record: record.clone(),
                });
            }
        }
    }

    classification
}
