use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::roster::{MailError, NotifyError, SheetError, TriageError};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Source(SheetError),
    Mail(MailError),
    Notify(NotifyError),
    Triage(TriageError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Source(err) => write!(f, "roster source error: {}", err),
            AppError::Mail(err) => write!(f, "mail transport error: {}", err),
            AppError::Notify(err) => write!(f, "notification error: {}", err),
            AppError::Triage(err) => write!(f, "triage failed: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Source(err) => Some(err),
            AppError::Mail(err) => Some(err),
            AppError::Notify(err) => Some(err),
            AppError::Triage(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<SheetError> for AppError {
    fn from(value: SheetError) -> Self {
        Self::Source(value)
    }
}

impl From<MailError> for AppError {
    fn from(value: MailError) -> Self {
        Self::Mail(value)
    }
}

impl From<NotifyError> for AppError {
    fn from(value: NotifyError) -> Self {
        Self::Notify(value)
    }
}

impl From<TriageError> for AppError {
    fn from(value: TriageError) -> Self {
        Self::Triage(value)
    }
}
