use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while loading sheets, exporting, or reading buffer databases.
#[derive(Error, Debug)]
pub enum VizError {
    /// The file name carries neither a `.csv` nor an `.xlsx` extension.
    #[error("unsupported file format: {0} (expected .csv or .xlsx)")]
    UnsupportedFormat(String),

    /// A required column is absent from the header row.
    #[error("missing required column {column:?} in {source_name}")]
    MissingColumn { column: String, source_name: String },

    /// A cell could not be interpreted as the type its column requires.
    #[error("bad value {value:?} in column {column:?} at row {row}")]
    BadCell {
        row: usize,
        column: String,
        value: String,
    },

    /// The sheet has no header row at all.
    #[error("no header row found in {0}")]
    EmptySheet(String),

    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] calamine::XlsxError),

    #[error("spreadsheet write error: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value is missing or inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VizError>;
