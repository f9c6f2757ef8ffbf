use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    /// A required column is absent from an input table. Reconciliation aborts
    /// with this; the caller keeps the unenriched rows.
    #[error("missing columns in {table} data: {columns:?}")]
    MissingColumns {
        table: &'static str,
        columns: Vec<String>,
    },

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
