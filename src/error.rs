use crate::schema::TableKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Invalid {table} data: {details}")]
    DataFormat { table: TableKind, details: String },

    #[error("The {table} table contains no rows")]
    EmptyDataset { table: TableKind },

    #[error("Chart rendering failed: {0}")]
    Chart(String),

    #[error("Failed to produce {target} report: {details}")]
    Export {
        target: &'static str,
        details: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReportError {
    pub fn data_format(table: TableKind, details: impl Into<String>) -> Self {
        Self::DataFormat {
            table,
            details: details.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
