use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("sheet '{0}' not found")]
    MissingSheet(String),

    #[error("column '{name}' not found in header row of sheet '{sheet}'")]
    MissingColumn { sheet: String, name: String },

    #[error("sheet '{sheet}' needs a header row and a totals row, found {rows} row(s)")]
    TooFewRows { sheet: String, rows: u32 },

    #[error("{action} {path:?}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read workbook {path:?}: {message}")]
    ReadWorkbook { path: PathBuf, message: String },

    #[error("failed to write workbook {path:?}: {message}")]
    WriteWorkbook { path: PathBuf, message: String },

    #[error("failed to tokenize formula '{formula}': {message}")]
    FormulaTokenize { formula: String, message: String },

    #[error("unsupported formula '{formula}' at {address}: {reason}")]
    UnsupportedFormula {
        address: String,
        formula: String,
        reason: String,
    },
}

impl ReportError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Returned by [`crate::ReportUpdater::update`]; the workbook on disk is
/// untouched apart from the backup copy when this is produced.
#[derive(Debug, Error)]
#[error("report update failed: {cause}")]
pub struct UpdateFailed {
    #[source]
    cause: ReportError,
}

impl UpdateFailed {
    pub fn cause(&self) -> &ReportError {
        &self.cause
    }

    pub fn into_cause(self) -> ReportError {
        self.cause
    }
}

impl From<ReportError> for UpdateFailed {
    fn from(cause: ReportError) -> Self {
        Self { cause }
    }
}
