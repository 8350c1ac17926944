use thiserror::Error;

use crate::layout::FieldId;

/// Everything that can go wrong while driving a form.
///
/// None of these are fatal to the host; callers surface them as a visible,
/// recoverable state.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("unknown field {0:?}")]
    UnknownField(FieldId),
    #[error("field '{0}' is read-only")]
    ReadOnly(String),
    #[error("field '{0}' is a checkbox+input field; edit its parts instead")]
    CompositeField(String),
    #[error("field '{0}' is not a checkbox+input field")]
    NotComposite(String),
    #[error("field '{0}' does not hold a list of entries")]
    NotMultiEntry(String),
    #[error("field '{0}' does not open a picker")]
    NotAPicker(String),
    #[error("unknown table '{0}'")]
    UnknownTable(String),
    #[error("table '{table}' has no column '{column}'")]
    UnknownColumn { table: String, column: String },
    #[error("row {row} is out of range for table '{table}' ({len} rows)")]
    RowOutOfRange { table: String, row: usize, len: usize },
    #[error("table '{0}' does not allow adding rows")]
    AddRowDisabled(String),
    #[error("table '{0}' does not allow deleting rows")]
    DeleteRowDisabled(String),
    #[error("entry {index} is out of range for field '{field}'")]
    EntryOutOfRange { field: String, index: usize },
    #[error("tab index {index} is out of range ({count} tabs)")]
    TabOutOfRange { index: usize, count: usize },
    #[error("no picker is open")]
    NoPickerOpen,
    #[error("the picker is still loading its options")]
    PickerLoading,
    #[error("invalid schema document: {0}")]
    Schema(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("schema fetch failed: {0}")]
    SchemaFetch(String),
    #[error("request was cancelled")]
    Cancelled,
}

impl From<serde_yaml::Error> for FormError {
    fn from(e: serde_yaml::Error) -> Self {
        FormError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FormError>;
