use std::collections::BTreeMap;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubmissionError {
    /// A form field could not be turned into a value at all.
    #[error("Parsing error: {0}")]
    Parse(String),

    /// One or more fields are missing or malformed, keyed by field name.
    #[error("Invalid fields: {}", .0.keys().cloned().collect::<Vec<_>>().join(", "))]
    Invalid(BTreeMap<String, String>),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("{0}")]
    UnsupportedImage(String),

    #[error("Archive entry `{name}` is larger than {limit} bytes")]
    EntryTooLarge { name: String, limit: u64 },

    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Could not read spreadsheet: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Spreadsheet has no worksheets")]
    NoWorksheet,

    #[error("Spreadsheet is missing required column `{0}`")]
    MissingColumn(&'static str),

    #[error("Row {row}, column `{column}`: {reason}")]
    InvalidCell {
        row: usize,
        column: &'static str,
        reason: String,
    },
}
