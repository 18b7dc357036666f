//! SheetsBackend -- concrete [`TabularBackend`] for a Google spreadsheet.
//!
//! Records live on the first worksheet, one row per participant, keyed by
//! the participant id in column A. Row updates always target the fixed
//! `A{row}:N{row}` range.

use std::time::Duration;

use reqwest::{Method, Url};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use surveybot_core::persist::{RowRef, TabularBackend};
use surveybot_types::config::StorageConfig;
use surveybot_types::error::PersistError;
use surveybot_types::record::{MAX_COLUMNS, column_letter};
use tracing::{debug, info};

use super::auth::TokenSource;
use super::credentials::ServiceAccountKey;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_FILES_API: &str = "https://www.googleapis.com/drive/v3/files";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Which spreadsheet to open.
///
/// Resolution order: an existing spreadsheet titled `name`, then `url`, then
/// a newly created spreadsheet titled `name`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpreadsheetTarget {
    pub name: Option<String>,
    pub url: Option<String>,
}

impl From<&StorageConfig> for SpreadsheetTarget {
    fn from(storage: &StorageConfig) -> Self {
        Self {
            name: storage.sheet_name.clone(),
            url: storage.spreadsheet_url.clone(),
        }
    }
}

/// Authenticated access to the Google REST APIs.
struct GoogleApi {
    http: reqwest::Client,
    auth: TokenSource,
}

impl GoogleApi {
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> Result<T, PersistError> {
        let token = self.auth.access_token().await?;
        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(token.expose_secret());
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PersistError::Transient(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PersistError::Transient(format!("HTTP {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| PersistError::Transient(format!("unexpected response: {e}")))
    }
}

pub struct SheetsBackend {
    api: GoogleApi,
    spreadsheet_id: String,
    sheet_title: String,
}

impl SheetsBackend {
    /// Authenticate, resolve the spreadsheet and its first worksheet.
    ///
    /// Every failure here is [`PersistError::Fatal`]: the caller decides
    /// between exiting and falling back to the local sink.
    pub async fn connect(
        key: ServiceAccountKey,
        target: &SpreadsheetTarget,
    ) -> Result<Self, PersistError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        let api = GoogleApi {
            auth: TokenSource::new(http.clone(), key),
            http,
        };

        let spreadsheet_id = resolve_spreadsheet(&api, target).await.map_err(into_fatal)?;
        let sheet_title = first_sheet_title(&api, &spreadsheet_id)
            .await
            .map_err(into_fatal)?;

        info!(
            spreadsheet = %spreadsheet_id,
            worksheet = %sheet_title,
            account = %api.auth.client_email(),
            "connected to spreadsheet"
        );

        Ok(Self {
            api,
            spreadsheet_id,
            sheet_title,
        })
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    pub fn sheet_title(&self) -> &str {
        &self.sheet_title
    }

    fn values_url(&self, range: &str, action: Option<&str>) -> Url {
        let segment = match action {
            Some(action) => format!("{range}:{action}"),
            None => range.to_string(),
        };
        sheets_url(&[self.spreadsheet_id.as_str(), "values", segment.as_str()])
    }
}

impl TabularBackend for SheetsBackend {
    async fn find_row_by_key(&self, key: &str) -> Result<Option<RowRef>, PersistError> {
        let range = a1_range(&self.sheet_title, "A:A");
        let column: ValueRange = self
            .api
            .request(Method::GET, self.values_url(&range, None), None)
            .await?;
        Ok(row_of_key(&column, key))
    }

    async fn update_row(&self, row: RowRef, columns: &[String]) -> Result<(), PersistError> {
        let range = a1_range(
            &self.sheet_title,
            &format!("A{row}:{last}{row}", row = row.0, last = column_letter(MAX_COLUMNS)),
        );
        let mut url = self.values_url(&range, None);
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let body = json!({ "range": range, "majorDimension": "ROWS", "values": [columns] });
        let _: Value = self.api.request(Method::PUT, url, Some(body)).await?;
        debug!(row = row.0, "updated spreadsheet row");
        Ok(())
    }

    async fn append_row(&self, columns: &[String]) -> Result<(), PersistError> {
        let range = a1_range(&self.sheet_title, "A1");
        let mut url = self.values_url(&range, Some("append"));
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let body = json!({ "majorDimension": "ROWS", "values": [columns] });
        let _: Value = self.api.request(Method::POST, url, Some(body)).await?;
        debug!("appended spreadsheet row");
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedSpreadsheet {
    spreadsheet_id: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

async fn resolve_spreadsheet(
    api: &GoogleApi,
    target: &SpreadsheetTarget,
) -> Result<String, PersistError> {
    if let Some(name) = &target.name {
        let mut url = Url::parse(DRIVE_FILES_API).map_err(|e| PersistError::Fatal(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("q", &drive_name_query(name))
            .append_pair("fields", "files(id)")
            .append_pair("pageSize", "1");
        let found: FileList = api.request(Method::GET, url, None).await?;
        if let Some(file) = found.files.into_iter().next() {
            info!(name = %name, "found spreadsheet by name");
            return Ok(file.id);
        }
    }

    if let Some(url) = &target.url {
        let id = spreadsheet_id_from_url(url)
            .ok_or_else(|| PersistError::Fatal(format!("not a spreadsheet URL or id: {url}")))?;
        info!(spreadsheet = %id, "using spreadsheet from URL");
        return Ok(id);
    }

    if let Some(name) = &target.name {
        let body = json!({ "properties": { "title": name } });
        let created: CreatedSpreadsheet = api
            .request(Method::POST, sheets_url(&[]), Some(body))
            .await?;
        info!(name = %name, spreadsheet = %created.spreadsheet_id, "created spreadsheet");
        return Ok(created.spreadsheet_id);
    }

    Err(PersistError::Fatal(
        "no spreadsheet configured (set GOOGLE_SHEET_NAME or SPREADSHEET_URL)".to_string(),
    ))
}

async fn first_sheet_title(api: &GoogleApi, spreadsheet_id: &str) -> Result<String, PersistError> {
    let mut url = sheets_url(&[spreadsheet_id]);
    url.query_pairs_mut()
        .append_pair("fields", "sheets.properties.title");
    let meta: SpreadsheetMeta = api.request(Method::GET, url, None).await?;
    meta.sheets
        .into_iter()
        .next()
        .map(|sheet| sheet.properties.title)
        .ok_or_else(|| PersistError::Fatal("spreadsheet has no worksheets".to_string()))
}

fn into_fatal(err: PersistError) -> PersistError {
    match err {
        PersistError::Fatal(_) => err,
        PersistError::Transient(msg) | PersistError::Io(msg) => PersistError::Fatal(msg),
    }
}

fn sheets_url(segments: &[&str]) -> Url {
    let mut url = Url::parse(SHEETS_API).expect("SHEETS_API is a valid URL");
    if let Ok(mut path) = url.path_segments_mut() {
        path.extend(segments);
    }
    url
}

/// `'Title'!cells`, quoting the title the way A1 notation requires.
fn a1_range(sheet_title: &str, cells: &str) -> String {
    format!("'{}'!{}", sheet_title.replace('\'', "''"), cells)
}

fn drive_name_query(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
    format!("name = '{escaped}' and mimeType = '{SPREADSHEET_MIME}' and trashed = false")
}

/// Accept a full spreadsheet URL or a bare id.
fn spreadsheet_id_from_url(input: &str) -> Option<String> {
    let input = input.trim();
    if let Some((_, rest)) = input.split_once("/spreadsheets/d/") {
        let id = rest.split(['/', '?', '#']).next().unwrap_or_default();
        return (!id.is_empty()).then(|| id.to_string());
    }
    let is_bare_id = !input.is_empty()
        && input
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    is_bare_id.then(|| input.to_string())
}

fn row_of_key(column: &ValueRange, key: &str) -> Option<RowRef> {
    column
        .values
        .iter()
        .position(|row| row.first().is_some_and(|cell| cell_text(cell) == key))
        .map(|index| RowRef(index as u32 + 1))
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
