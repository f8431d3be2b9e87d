use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::workflows::roster::ClassificationRules;

/// Distinguishes runtime behavior for different stages of the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for a triage run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub sheet: SheetConfig,
    pub rules: ClassificationRules,
    pub columns: ContactColumns,
    pub output_path: PathBuf,
    pub mail: MailConfig,
    pub error_report: ErrorReportConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(&var_or("APP_ENV", "development"));

        let header_rows = parse_var::<usize>("ROSTER_HEADER_ROWS", "1")?;
        if header_rows == 0 {
            return Err(ConfigError::Invalid {
                key: "ROSTER_HEADER_ROWS",
                value: "0".to_string(),
                expected: "at least one header row",
            });
        }

        let gpa_threshold = parse_var::<f64>("ROSTER_GPA_THRESHOLD", "2.0")?;
        if !gpa_threshold.is_finite() {
            return Err(ConfigError::Invalid {
                key: "ROSTER_GPA_THRESHOLD",
                value: gpa_threshold.to_string(),
                expected: "a finite decimal number",
            });
        }

        let sheet = SheetConfig {
            service_account_key: PathBuf::from(var_or(
                "GOOGLE_SERVICE_ACCOUNT_KEY",
                "service_account.json",
            )),
            spreadsheet_title: var_or("ROSTER_SPREADSHEET", "RTPA Member Roster"),
            spreadsheet_id: optional_var("ROSTER_SPREADSHEET_ID"),
            worksheet_title: var_or("ROSTER_WORKSHEET", "Form Responses 1"),
        };

        let rules = ClassificationRules {
            gpa_column: var_or("ROSTER_GPA_COLUMN", "Current GSU GPA"),
            reviewed_column: var_or("ROSTER_REVIEWED_COLUMN", "Approved?"),
            gpa_threshold,
            header_rows,
        };

        let columns = ContactColumns {
            name: var_or("ROSTER_NAME_COLUMN", "Name"),
            email: var_or("ROSTER_EMAIL_COLUMN", "Email Address"),
        };

        let mail = MailConfig {
            sender: optional_var("OUTLOOK_EMAIL"),
            password: optional_var("OUTLOOK_PASSWORD"),
            smtp_host: var_or("SMTP_HOST", "smtp.office365.com"),
            smtp_port: parse_var::<u16>("SMTP_PORT", "587")?,
            subject: var_or("MAIL_SUBJECT", "Membership Application Update - RTPA"),
            template_path: PathBuf::from(var_or("ACCEPTANCE_TEMPLATE", "acceptance_email.html")),
        };

        let error_report = ErrorReportConfig {
            enabled: parse_bool("ROSTER_SEND_ERROR_REPORT", false)?,
            recipient: optional_var("ERROR_REPORT_EMAIL"),
        };

        Ok(Self {
            environment,
            sheet,
            rules,
            columns,
            output_path: PathBuf::from(var_or("ROSTER_OUTPUT", "data.json")),
            mail,
            error_report,
            telemetry: TelemetryConfig {
                log_level: var_or("APP_LOG_LEVEL", "info"),
            },
        })
    }
}

/// Location of the roster worksheet and the credentials used to read it.
#[derive(Debug, Clone)]
pub struct SheetConfig {
    pub service_account_key: PathBuf,
    pub spreadsheet_title: String,
    pub spreadsheet_id: Option<String>,
    pub worksheet_title: String,
}

/// Header names used to address applicants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactColumns {
    pub name: String,
    pub email: String,
}

/// Mail account and message settings for acceptance notices.
#[derive(Clone)]
pub struct MailConfig {
    pub sender: Option<String>,
    pub password: Option<String>,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub subject: String,
    pub template_path: PathBuf,
}

impl MailConfig {
    pub fn sender(&self) -> Result<&str, ConfigError> {
        self.sender
            .as_deref()
            .ok_or(ConfigError::Missing { key: "OUTLOOK_EMAIL" })
    }

    pub fn password(&self) -> Result<&str, ConfigError> {
        self.password
            .as_deref()
            .ok_or(ConfigError::Missing {
                key: "OUTLOOK_PASSWORD",
            })
    }
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("sender", &self.sender)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("subject", &self.subject)
            .field("template_path", &self.template_path)
            .finish()
    }
}

/// Administrator summary of malformed records. Off unless explicitly enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReportConfig {
    pub enabled: bool,
    pub recipient: Option<String>,
}

impl ErrorReportConfig {
    pub fn recipient(&self) -> Result<&str, ConfigError> {
        self.recipient.as_deref().ok_or(ConfigError::Missing {
            key: "ERROR_REPORT_EMAIL",
        })
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    Missing {
        key: &'static str,
    },
    Invalid {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing { key } => write!(f, "{key} must be set"),
            ConfigError::Invalid {
                key,
                value,
                expected,
            } => write!(f, "{key}='{value}' is invalid: expected {expected}"),
        }
    }
}

impl std::error::Error for ConfigError {}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError> {
    let raw = var_or(key, default);
    raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.clone(),
        expected: std::any::type_name::<T>(),
    })
}

fn parse_bool(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = optional_var(key) else {
        return Ok(default);
    };

    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw,
            expected: "a boolean (true/false)",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    const KEYS: &[&str] = &[
        "APP_ENV",
        "APP_LOG_LEVEL",
        "GOOGLE_SERVICE_ACCOUNT_KEY",
        "ROSTER_SPREADSHEET",
        "ROSTER_SPREADSHEET_ID",
        "ROSTER_WORKSHEET",
        "ROSTER_HEADER_ROWS",
        "ROSTER_GPA_COLUMN",
        "ROSTER_REVIEWED_COLUMN",
        "ROSTER_NAME_COLUMN",
        "ROSTER_EMAIL_COLUMN",
        "ROSTER_GPA_THRESHOLD",
        "ROSTER_OUTPUT",
        "OUTLOOK_EMAIL",
        "OUTLOOK_PASSWORD",
        "SMTP_HOST",
        "SMTP_PORT",
        "MAIL_SUBJECT",
        "ACCEPTANCE_TEMPLATE",
        "ERROR_REPORT_EMAIL",
        "ROSTER_SEND_ERROR_REPORT",
    ];

    fn reset_env() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.sheet.spreadsheet_title, "RTPA Member Roster");
        assert_eq!(config.sheet.worksheet_title, "Form Responses 1");
        assert_eq!(config.rules.gpa_column, "Current GSU GPA");
        assert_eq!(config.rules.reviewed_column, "Approved?");
        assert_eq!(config.rules.header_rows, 1);
        assert!((config.rules.gpa_threshold - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.mail.smtp_host, "smtp.office365.com");
        assert_eq!(config.mail.smtp_port, 587);
        assert_eq!(config.output_path, PathBuf::from("data.json"));
        assert!(!config.error_report.enabled);
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn rejects_non_numeric_threshold() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ROSTER_GPA_THRESHOLD", "two");
        let err = AppConfig::load().expect_err("threshold must parse");
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "ROSTER_GPA_THRESHOLD",
                ..
            }
        ));
        reset_env();
    }

    #[test]
    fn parses_error_report_toggle() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ROSTER_SEND_ERROR_REPORT", "yes");
        env::set_var("ERROR_REPORT_EMAIL", "admin@example.org");
        let config = AppConfig::load().expect("config loads");
        assert!(config.error_report.enabled);
        assert_eq!(
            config.error_report.recipient().expect("recipient set"),
            "admin@example.org"
        );

        env::set_var("ROSTER_SEND_ERROR_REPORT", "sometimes");
        assert!(AppConfig::load().is_err());
        reset_env();
    }

    #[test]
    fn missing_credentials_surface_their_key() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads");
        let err = config.mail.sender().expect_err("sender unset");
        assert_eq!(err.to_string(), "OUTLOOK_EMAIL must be set");
    }

    #[test]
    fn debug_output_redacts_password() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("OUTLOOK_PASSWORD", "hunter2");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.mail.password().expect("password set"), "hunter2");
        assert!(!format!("{:?}", config.mail).contains("hunter2"));
        reset_env();
    }
}
