use std::path::{Path, PathBuf};

use tracing::info;

use super::classifier::{classify, BucketCounts, Classification, ClassificationRules};
use super::notifier::{Notifier, NotifyError, SentNotice};
use super::snapshot::{write_snapshot, ClassificationSnapshot, SnapshotError};
use super::source::{RosterSource, SheetError};

/// Where outbound mail goes after classification, if anywhere.
#[derive(Debug, Default)]
pub struct Delivery {
    pub notifier: Option<Notifier>,
    /// Administrator address for the invalid-record report; `None` keeps it off.
    pub error_report_recipient: Option<String>,
}

/// Counts and side effects of one completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriageSummary {
    pub counts: BucketCounts,
    pub snapshot_path: PathBuf,
    pub notices: Vec<SentNotice>,
    pub error_report_sent: bool,
}

/// Read, classify, record, then notify: one pass over the roster.
#[derive(Debug)]
pub struct TriageService {
    source: Box<dyn RosterSource>,
    rules: ClassificationRules,
    delivery: Delivery,
}

impl TriageService {
    pub fn new(source: Box<dyn RosterSource>, rules: ClassificationRules, delivery: Delivery) -> Self {
        Self {
            source,
            rules,
            delivery,
        }
    }

    /// Fetches and classifies without writing or sending anything.
    pub fn preview(&self) -> Result<Classification, TriageError> {
        let records = self.source.fetch_records()?;
        info!(source = %self.source.describe(), records = records.len(), "roster fetched");
        Ok(classify(&records, &self.rules))
    }

    pub fn run(&self, snapshot_path: &Path) -> Result<TriageSummary, TriageError> {
        let classification = self.preview()?;
        let counts = classification.counts();
        info!(
            qualified = counts.qualified,
            unqualified = counts.unqualified,
            invalid = counts.invalid,
            skipped_reviewed = counts.skipped_reviewed,
            "roster classified"
        );

        let snapshot = ClassificationSnapshot::new(
            self.source.describe(),
            self.rules.gpa_threshold,
            classification,
        );
        write_snapshot(snapshot_path, &snapshot)?;
        info!(path = %snapshot_path.display(), "snapshot written");

        let mut notices = Vec::new();
        let mut error_report_sent = false;
        if let Some(notifier) = &self.delivery.notifier {
            notices = notifier.notify_qualified(&snapshot.classification.qualified)?;

            if let Some(recipient) = &self.delivery.error_report_recipient {
                error_report_sent =
                    notifier.send_error_report(recipient, &snapshot.classification.invalid)?;
            }
        } else {
            info!("email delivery disabled; no messages sent");
        }

        Ok(TriageSummary {
            counts,
            snapshot_path: snapshot_path.to_path_buf(),
            notices,
            error_report_sent,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error(transparent)]
    Source(#[from] SheetError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
}
