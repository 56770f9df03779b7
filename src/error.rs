use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::PyErr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComexError {
    #[error("Data not loaded: {0}")]
    NotLoaded(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Malformed value header '{header}': {reason}")]
    MalformedHeader { header: String, reason: String },

    #[error("Empty selection: {0}")]
    EmptySelection(String),

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] calamine::XlsxError),

    #[error("{0}")]
    General(String),
}

impl From<ComexError> for PyErr {
    fn from(err: ComexError) -> PyErr {
        match err {
            // Selection problems are user input errors, not engine failures.
            ComexError::EmptySelection(_) | ComexError::Validation(_) => {
                PyValueError::new_err(err.to_string())
            }
            _ => PyRuntimeError::new_err(err.to_string()),
        }
    }
}
