//! Membership roster triage: read applicant rows, bucket them by GPA, record
//! the outcome, and notify the accepted applicants.

pub mod classifier;
pub mod domain;
pub mod notifier;
pub mod service;
pub mod snapshot;
pub mod source;

pub use classifier::{
    classify, parse_gpa, BucketCounts, Classification, ClassificationBucket, ClassificationRules,
    ClassifiedApplicant, GpaError, InvalidApplicant,
};
pub use domain::{ApplicantRecord, RowNumber};
pub use notifier::{
    load_template, MailError, MailTransport, Notifier, NotifyError, OutboxMailer, OutgoingMail,
    SentNotice, SmtpMailer,
};
pub use service::{Delivery, TriageError, TriageService, TriageSummary};
pub use snapshot::{read_snapshot, write_snapshot, ClassificationSnapshot, SnapshotError};
pub use source::{
    rows_to_records, CsvRosterSource, GoogleSheetsClient, RosterSource, SheetError, SheetLocation,
};
