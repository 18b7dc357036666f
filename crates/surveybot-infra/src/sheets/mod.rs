//! Google Sheets record store.
//!
//! `SheetsBackend` implements [`TabularBackend`](surveybot_core::persist::TabularBackend)
//! against the Sheets v4 values API, authenticated as a service account
//! (`credentials` + `auth`). The spreadsheet is resolved once, at startup.

pub mod auth;
pub mod backend;
pub mod credentials;

pub use backend::{SheetsBackend, SpreadsheetTarget};
pub use credentials::ServiceAccountKey;
