use crate::errors::ReportError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use strum::{Display, EnumIter, IntoEnumIterator};
use umya_spreadsheet::Worksheet;

pub const DEFAULT_START_TIME_COL: &str = "开始时间";
pub const DEFAULT_END_TIME_COL: &str = "结束时间";
pub const DEFAULT_GUEST_COUNT_COL: &str = "入住旅客数";
pub const DEFAULT_LATE_UPLOAD_COL: &str = "15分上传不及时数";
pub const DEFAULT_COMPLETION_RATE_COL: &str = "完成率";

/// The header columns the report knows how to fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReportColumn {
    StartTime,
    EndTime,
    GuestCount,
    LateUpload,
    CompletionRate,
}

impl ReportColumn {
    /// Columns that must be present in the header row for an update to proceed.
    pub fn is_required(self) -> bool {
        !matches!(self, ReportColumn::CompletionRate)
    }
}

/// Header display names used to locate each [`ReportColumn`] in row 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub start_time: String,
    pub end_time: String,
    pub guest_count: String,
    pub late_upload: String,
    pub completion_rate: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            start_time: DEFAULT_START_TIME_COL.to_string(),
            end_time: DEFAULT_END_TIME_COL.to_string(),
            guest_count: DEFAULT_GUEST_COUNT_COL.to_string(),
            late_upload: DEFAULT_LATE_UPLOAD_COL.to_string(),
            completion_rate: DEFAULT_COMPLETION_RATE_COL.to_string(),
        }
    }
}

impl ColumnConfig {
    pub fn name(&self, column: ReportColumn) -> &str {
        match column {
            ReportColumn::StartTime => &self.start_time,
            ReportColumn::EndTime => &self.end_time,
            ReportColumn::GuestCount => &self.guest_count,
            ReportColumn::LateUpload => &self.late_upload,
            ReportColumn::CompletionRate => &self.completion_rate,
        }
    }
}

/// Positions (1-based) of the recognized columns in the header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    names: ColumnConfig,
    start_time: Option<u32>,
    end_time: Option<u32>,
    guest_count: Option<u32>,
    late_upload: Option<u32>,
    completion_rate: Option<u32>,
}

impl HeaderMap {
    /// Scan row 1 for the configured names. When a name appears more than once
    /// the leftmost column wins.
    pub fn scan(sheet: &Worksheet, columns: &ColumnConfig) -> Self {
        let mut map = HeaderMap {
            names: columns.clone(),
            ..HeaderMap::default()
        };
        for col in 1..=sheet.get_highest_column() {
            let Some(cell) = sheet.get_cell((col, 1)) else {
                continue;
            };
            let text = cell.get_value();
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            for column in ReportColumn::iter() {
                if columns.name(column) == text && map.get(column).is_none() {
                    map.set(column, col);
                }
            }
        }
        map
    }

    /// Like [`HeaderMap::scan`] but fails when a required column is absent.
    pub fn resolve(
        sheet: &Worksheet,
        columns: &ColumnConfig,
    ) -> Result<Self, ReportError> {
        let map = Self::scan(sheet, columns);
        for column in ReportColumn::iter().filter(|c| c.is_required()) {
            map.require(sheet.get_name(), column)?;
        }
        Ok(map)
    }

    /// Position of `column`, or `MissingColumn` naming its configured header.
    pub fn require(&self, sheet: &str, column: ReportColumn) -> Result<u32, ReportError> {
        self.get(column).ok_or_else(|| ReportError::MissingColumn {
            sheet: sheet.to_string(),
            name: self.names.name(column).to_string(),
        })
    }

    pub fn get(&self, column: ReportColumn) -> Option<u32> {
        match column {
            ReportColumn::StartTime => self.start_time,
            ReportColumn::EndTime => self.end_time,
            ReportColumn::GuestCount => self.guest_count,
            ReportColumn::LateUpload => self.late_upload,
            ReportColumn::CompletionRate => self.completion_rate,
        }
    }

    pub fn set(&mut self, column: ReportColumn, position: u32) {
        let slot = match column {
            ReportColumn::StartTime => &mut self.start_time,
            ReportColumn::EndTime => &mut self.end_time,
            ReportColumn::GuestCount => &mut self.guest_count,
            ReportColumn::LateUpload => &mut self.late_upload,
            ReportColumn::CompletionRate => &mut self.completion_rate,
        };
        *slot = Some(position);
    }
}

/// One scheduled run's result, ready to be written as a data row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowValues {
    pub start_time: String,
    pub end_time: String,
    pub guest_count: i64,
    pub late_upload_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpdateWarning {
    /// The source column had no explicit width; the default was applied.
    ColumnWidthDefaulted { column: String, width: f64 },
    /// A totals-row formula matched neither the SUM nor the ratio shape.
    FormulaLeftUnchanged { address: String, formula: String },
    /// A SUM range did not end on the last data row before it was repaired.
    StaleSumRange {
        address: String,
        previous_end_row: u32,
        expected_end_row: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateOutcome {
    pub backup_path: PathBuf,
    pub new_row: u32,
    pub totals_row: u32,
    pub warnings: Vec<UpdateWarning>,
}

/// Comparable snapshot of the five style attributes a data row carries over.
/// `None` means the attribute is at its workbook default.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StyleDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<FontDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border: Option<BorderDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<FillDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<AlignmentDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,
}

impl StyleDescriptor {
    pub fn is_default(&self) -> bool {
        self.font.is_none()
            && self.border.is_none()
            && self.fill.is_none()
            && self.alignment.is_none()
            && self.number_format.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontDescriptor {
    pub name: String,
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
    pub underline: String,
    pub color: String,
}

/// Border style and colour per edge, in left/right/top/bottom order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BorderDescriptor {
    pub edges: [(String, String); 4],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FillDescriptor {
    Pattern {
        pattern: String,
        foreground: Option<String>,
        background: Option<String>,
    },
    Gradient {
        degree: f64,
        stops: Vec<(f64, String)>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentDescriptor {
    pub horizontal: String,
    pub vertical: String,
    pub wrap_text: bool,
    pub text_rotation: u32,
}
