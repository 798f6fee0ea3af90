use crate::errors::{ReportError, UpdateFailed};
use crate::insert::insert_and_populate;
use crate::model::{ColumnConfig, HeaderMap, RowValues, UpdateOutcome};
use crate::styles::DEFAULT_COLUMN_WIDTH;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Appends summary rows to one sheet of one workbook.
///
/// Not safe to run concurrently against the same file; callers schedule at
/// most one update at a time.
#[derive(Debug, Clone)]
pub struct ReportUpdater {
    workbook_path: PathBuf,
    sheet_name: String,
    columns: ColumnConfig,
    default_width: f64,
}

impl ReportUpdater {
    pub fn new(
        workbook_path: impl Into<PathBuf>,
        sheet_name: impl Into<String>,
        columns: ColumnConfig,
    ) -> Self {
        Self {
            workbook_path: workbook_path.into(),
            sheet_name: sheet_name.into(),
            columns,
            default_width: DEFAULT_COLUMN_WIDTH,
        }
    }

    pub fn with_default_width(mut self, width: f64) -> Self {
        self.default_width = width;
        self
    }

    pub fn workbook_path(&self) -> &Path {
        &self.workbook_path
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// Back up the workbook, insert `values` above the totals row and save.
    /// The original file is replaced only when every step succeeded.
    pub fn update(&self, values: &RowValues) -> Result<UpdateOutcome, UpdateFailed> {
        let backup_path = backup_workbook(&self.workbook_path, Local::now())?;
        tracing::info!(
            workbook = %self.workbook_path.display(),
            backup = %backup_path.display(),
            "workbook backed up"
        );

        let mut book = umya_spreadsheet::reader::xlsx::read(&self.workbook_path).map_err(|e| {
            ReportError::ReadWorkbook {
                path: self.workbook_path.clone(),
                message: e.to_string(),
            }
        })?;
        let sheet = book
            .get_sheet_by_name_mut(&self.sheet_name)
            .ok_or_else(|| ReportError::MissingSheet(self.sheet_name.clone()))?;
        let headers = HeaderMap::resolve(sheet, &self.columns)?;
        let inserted = insert_and_populate(sheet, &headers, values, self.default_width)?;

        save_workbook(&book, &self.workbook_path)?;
        tracing::info!(
            workbook = %self.workbook_path.display(),
            sheet = %self.sheet_name,
            row = inserted.new_row,
            totals_row = inserted.totals_row,
            warnings = inserted.warnings.len(),
            "report row appended"
        );

        Ok(UpdateOutcome {
            backup_path,
            new_row: inserted.new_row,
            totals_row: inserted.totals_row,
            warnings: inserted.warnings,
        })
    }
}

/// `<path>.backup_<YYYYMMDD_HHMMSS>`; a numeric suffix is appended when a
/// backup from the same second already exists.
pub fn backup_path_for(path: &Path, at: DateTime<Local>) -> PathBuf {
    let stamp = at.format(BACKUP_TIMESTAMP_FORMAT);
    let base = format!("{}.backup_{stamp}", path.display());
    let mut candidate = PathBuf::from(&base);
    let mut n = 1;
    while candidate.exists() {
        candidate = PathBuf::from(format!("{base}_{n}"));
        n += 1;
    }
    candidate
}

pub fn backup_workbook(path: &Path, at: DateTime<Local>) -> Result<PathBuf, ReportError> {
    if !path.is_file() {
        return Err(ReportError::io(
            "workbook not found",
            path,
            std::io::Error::from(std::io::ErrorKind::NotFound),
        ));
    }
    let backup = backup_path_for(path, at);
    fs::copy(path, &backup).map_err(|e| ReportError::io("failed to back up", path, e))?;
    Ok(backup)
}

/// Write to a sibling temp file, then rename over `path`. A symlinked path is
/// resolved first so the link survives, and the file keeps its permissions.
fn save_workbook(book: &umya_spreadsheet::Spreadsheet, path: &Path) -> Result<(), ReportError> {
    let target =
        fs::canonicalize(path).map_err(|e| ReportError::io("failed to resolve", path, e))?;
    let permissions = fs::metadata(&target)
        .map_err(|e| ReportError::io("failed to stat", &target, e))?
        .permissions();
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let staged = tempfile::Builder::new()
        .prefix(".daily-report-")
        .suffix(".xlsx")
        .tempfile_in(dir)
        .map_err(|e| ReportError::io("failed to stage save in", dir, e))?;

    umya_spreadsheet::writer::xlsx::write(book, staged.path()).map_err(|e| {
        ReportError::WriteWorkbook {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;
    fs::set_permissions(staged.path(), permissions)
        .map_err(|e| ReportError::io("failed to set permissions on", staged.path(), e))?;
    staged
        .persist(&target)
        .map_err(|e| ReportError::io("failed to replace", &target, e.error))?;
    Ok(())
}
