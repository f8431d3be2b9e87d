use std::path::Path;

use google_drive3::api::Scope as DriveScope;
use google_drive3::DriveHub;
use google_sheets4::hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use google_sheets4::hyper_util::client::legacy::connect::HttpConnector;
use google_sheets4::hyper_util::client::legacy::Client;
use google_sheets4::hyper_util::rt::TokioExecutor;
use google_sheets4::{yup_oauth2, Sheets};
use serde_json::Value;
use tokio::runtime::Runtime;
use tracing::debug;

use super::{rows_to_records, RosterSource, SheetError};
use crate::workflows::roster::domain::ApplicantRecord;

const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

/// Which worksheet to read and how far down its data starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLocation {
    pub spreadsheet_title: String,
    /// Skips the Drive title lookup when set.
    pub spreadsheet_id: Option<String>,
    pub worksheet_title: String,
    pub header_rows: usize,
}

/// Blocking facade over the generated Sheets and Drive clients so the
/// sequential triage run never sees an async boundary.
pub struct GoogleSheetsClient<C>
where
    C: google_sheets4::common::Connector + Send + Sync + 'static,
{
    sheets: Sheets<C>,
    drive: DriveHub<C>,
    runtime: Runtime,
    location: SheetLocation,
}

impl<C> GoogleSheetsClient<C>
where
    C: google_sheets4::common::Connector + Send + Sync + 'static,
{
    pub fn new(sheets: Sheets<C>, drive: DriveHub<C>, runtime: Runtime, location: SheetLocation) -> Self {
        Self {
            sheets,
            drive,
            runtime,
            location,
        }
    }

    fn map_error<E: std::fmt::Display>(err: E) -> SheetError {
        SheetError::Backend(err.to_string())
    }

    fn spreadsheet_id(&self) -> Result<String, SheetError> {
        if let Some(id) = &self.location.spreadsheet_id {
            return Ok(id.clone());
        }

        let title = &self.location.spreadsheet_title;
        let query = format!(
            "name = '{}' and mimeType = '{SPREADSHEET_MIME}' and trashed = false",
            escape_query_literal(title)
        );
        let result = self.runtime.block_on(async {
            self.drive
                .files()
                .list()
                .q(&query)
                .param("fields", "files(id,name)")
                .page_size(10)
                .include_items_from_all_drives(true)
                .supports_all_drives(true)
                .add_scope(DriveScope::Readonly)
                .doit()
                .await
        });

        let (_, file_list) = result.map_err(Self::map_error)?;
        let id = file_list
            .files
            .unwrap_or_default()
            .into_iter()
            .find_map(|file| file.id)
            .ok_or_else(|| SheetError::SpreadsheetNotFound {
                title: title.clone(),
            })?;

        debug!(spreadsheet = %title, %id, "resolved spreadsheet by title");
        Ok(id)
    }
}

impl GoogleSheetsClient<HttpsConnector<HttpConnector>> {
    /// Authenticates with a service-account key and builds both API hubs.
    pub fn connect(key_path: &Path, location: SheetLocation) -> Result<Self, SheetError> {
        let runtime = Runtime::new().map_err(|err| SheetError::Runtime(err.to_string()))?;

        let (sheets, drive) = runtime.block_on(async {
            let key = yup_oauth2::read_service_account_key(key_path)
                .await
                .map_err(|err| SheetError::Auth(format!("{}: {err}", key_path.display())))?;
            let sheets_auth = yup_oauth2::ServiceAccountAuthenticator::builder(key.clone())
                .build()
                .await
                .map_err(|err| SheetError::Auth(err.to_string()))?;
            let drive_auth = yup_oauth2::ServiceAccountAuthenticator::builder(key)
                .build()
                .await
                .map_err(|err| SheetError::Auth(err.to_string()))?;

            let connector = HttpsConnectorBuilder::new()
                .with_native_roots()
                .map_err(|err| SheetError::Runtime(err.to_string()))?
                .https_or_http()
                .enable_http1()
                .build();
            let client = Client::builder(TokioExecutor::new()).build(connector);

            Ok::<_, SheetError>((
                Sheets::new(client.clone(), sheets_auth),
                DriveHub::new(client, drive_auth),
            ))
        })?;

        Ok(Self::new(sheets, drive, runtime, location))
    }
}

impl<C> std::fmt::Debug for GoogleSheetsClient<C>
where
    C: google_sheets4::common::Connector + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSheetsClient")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl<C> RosterSource for GoogleSheetsClient<C>
where
    C: google_sheets4::common::Connector + Send + Sync + 'static,
{
    fn describe(&self) -> String {
        format!(
            "sheet:{}/{}",
            self.location.spreadsheet_title, self.location.worksheet_title
        )
    }

    fn fetch_records(&self) -> Result<Vec<ApplicantRecord>, SheetError> {
        let spreadsheet_id = self.spreadsheet_id()?;
        let range = worksheet_range(&self.location.worksheet_title);

        let result = self.runtime.block_on(async {
            self.sheets
                .spreadsheets()
                .values_get(&spreadsheet_id, &range)
                .major_dimension("ROWS")
                .value_render_option("FORMATTED_VALUE")
                .doit()
                .await
        });

        let (_, value_range) = result.map_err(Self::map_error)?;
        let rows: Vec<Vec<String>> = value_range
            .values
            .unwrap_or_default()
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();

        debug!(rows = rows.len(), %range, "fetched worksheet values");
        rows_to_records(rows, self.location.header_rows)
    }
}

/// A1 range covering a whole worksheet, quoted so titles with spaces work.
fn worksheet_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

fn escape_query_literal(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('\'', "\\'")
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
