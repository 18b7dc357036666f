//! Storage port traits.
//!
//! Uses native async fn in traits (RPITIT, Rust 2024 edition), like the
//! other ports in this crate.

use surveybot_types::error::PersistError;

/// 1-based row number in the remote table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowRef(pub u32);

/// A remote table addressed by the value in its first column.
pub trait TabularBackend: Send + Sync {
    /// Find the row whose first column equals `key`.
    fn find_row_by_key(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<RowRef>, PersistError>> + Send;

    /// Overwrite the fixed column range of `row`.
    fn update_row(
        &self,
        row: RowRef,
        columns: &[String],
    ) -> impl std::future::Future<Output = Result<(), PersistError>> + Send;

    fn append_row(
        &self,
        columns: &[String],
    ) -> impl std::future::Future<Output = Result<(), PersistError>> + Send;
}

/// A local append-only record sink with the same column layout.
pub trait AppendSink: Send + Sync {
    fn append(
        &self,
        columns: &[String],
    ) -> impl std::future::Future<Output = Result<(), PersistError>> + Send;

    /// Where records go, for logs.
    fn describe(&self) -> String;
}
