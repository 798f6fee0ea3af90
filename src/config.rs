use crate::model::{
    ColumnConfig, DEFAULT_COMPLETION_RATE_COL, DEFAULT_END_TIME_COL, DEFAULT_GUEST_COUNT_COL,
    DEFAULT_LATE_UPLOAD_COL, DEFAULT_START_TIME_COL,
};
use crate::query::{Counts, DEFAULT_GUEST_QUERY, DEFAULT_LATE_UPLOAD_QUERY};
use anyhow::{Context, Result};
use chrono::NaiveTime;
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use strum::{Display, EnumIter};

const SCHEDULE_TIME_FORMAT: &str = "%H:%M";

/// Every option with a built-in default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ConfigOption {
    ExcelPath,
    SheetName,
    ScheduleTime,
    ColStartTime,
    ColEndTime,
    ColGuestCount,
    ColLateUpload,
    ColCompletionRate,
    GuestQuery,
    LateUploadQuery,
    DefaultColumnWidth,
}

impl ConfigOption {
    pub fn default_value(self) -> &'static str {
        match self {
            ConfigOption::ExcelPath => "report.xlsx",
            ConfigOption::SheetName => "Sheet1",
            ConfigOption::ScheduleTime => "09:00",
            ConfigOption::ColStartTime => DEFAULT_START_TIME_COL,
            ConfigOption::ColEndTime => DEFAULT_END_TIME_COL,
            ConfigOption::ColGuestCount => DEFAULT_GUEST_COUNT_COL,
            ConfigOption::ColLateUpload => DEFAULT_LATE_UPLOAD_COL,
            ConfigOption::ColCompletionRate => DEFAULT_COMPLETION_RATE_COL,
            ConfigOption::GuestQuery => DEFAULT_GUEST_QUERY,
            ConfigOption::LateUploadQuery => DEFAULT_LATE_UPLOAD_QUERY,
            ConfigOption::DefaultColumnWidth => "15",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CountsConfig {
    Database {
        path: PathBuf,
        guest_query: String,
        late_upload_query: String,
    },
    Fixed(Counts),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub excel_path: PathBuf,
    pub sheet_name: String,
    pub schedule_time: NaiveTime,
    pub columns: ColumnConfig,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub run_now: bool,
    pub counts: CountsConfig,
    pub default_column_width: f64,
}

impl AppConfig {
    /// CLI (and its environment variables) over the config file over defaults.
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            config,
            excel_path: cli_excel_path,
            sheet_name: cli_sheet_name,
            schedule_time: cli_schedule_time,
            col_start_time: cli_col_start_time,
            col_end_time: cli_col_end_time,
            col_guest_count: cli_col_guest_count,
            col_late_upload: cli_col_late_upload,
            col_completion_rate: cli_col_completion_rate,
            start_time: cli_start_time,
            end_time: cli_end_time,
            run_now,
            database: cli_database,
            guest_query: cli_guest_query,
            late_upload_query: cli_late_upload_query,
            guest_count: cli_guest_count,
            late_upload_count: cli_late_upload_count,
            default_column_width: cli_default_column_width,
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            excel_path: file_excel_path,
            sheet_name: file_sheet_name,
            schedule_time: file_schedule_time,
            columns: file_columns,
            start_time: file_start_time,
            end_time: file_end_time,
            database: file_database,
            guest_query: file_guest_query,
            late_upload_query: file_late_upload_query,
            guest_count: file_guest_count,
            late_upload_count: file_late_upload_count,
            default_column_width: file_default_column_width,
        } = file_config;
        let file_columns = file_columns.unwrap_or_default();

        let pick = |cli: Option<String>, file: Option<String>, option: ConfigOption| {
            cli.or(file)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| option.default_value().to_string())
        };

        let excel_path = cli_excel_path
            .or(file_excel_path)
            .unwrap_or_else(|| PathBuf::from(ConfigOption::ExcelPath.default_value()));
        let sheet_name = pick(cli_sheet_name, file_sheet_name, ConfigOption::SheetName);

        let schedule_text = pick(
            cli_schedule_time,
            file_schedule_time,
            ConfigOption::ScheduleTime,
        );
        let schedule_time = NaiveTime::parse_from_str(&schedule_text, SCHEDULE_TIME_FORMAT)
            .with_context(|| format!("invalid schedule time '{schedule_text}' (expected HH:MM)"))?;

        let columns = ColumnConfig {
            start_time: pick(
                cli_col_start_time,
                file_columns.start_time,
                ConfigOption::ColStartTime,
            ),
            end_time: pick(cli_col_end_time, file_columns.end_time, ConfigOption::ColEndTime),
            guest_count: pick(
                cli_col_guest_count,
                file_columns.guest_count,
                ConfigOption::ColGuestCount,
            ),
            late_upload: pick(
                cli_col_late_upload,
                file_columns.late_upload,
                ConfigOption::ColLateUpload,
            ),
            completion_rate: pick(
                cli_col_completion_rate,
                file_columns.completion_rate,
                ConfigOption::ColCompletionRate,
            ),
        };

        let guest_count = cli_guest_count.or(file_guest_count);
        let late_upload_count = cli_late_upload_count.or(file_late_upload_count);
        let counts = match (guest_count, late_upload_count) {
            (Some(guest_count), Some(late_upload_count)) => {
                anyhow::ensure!(
                    guest_count >= 0 && late_upload_count >= 0,
                    "counts must not be negative"
                );
                CountsConfig::Fixed(Counts {
                    guest_count,
                    late_upload_count,
                })
            }
            (None, None) => {
                let path = cli_database.or(file_database).context(
                    "no count source configured: set --database or both --guest-count and --late-upload-count",
                )?;
                CountsConfig::Database {
                    path,
                    guest_query: pick(
                        cli_guest_query,
                        file_guest_query,
                        ConfigOption::GuestQuery,
                    ),
                    late_upload_query: pick(
                        cli_late_upload_query,
                        file_late_upload_query,
                        ConfigOption::LateUploadQuery,
                    ),
                }
            }
            _ => anyhow::bail!("--guest-count and --late-upload-count must be given together"),
        };

        let default_column_width = match cli_default_column_width.or(file_default_column_width) {
            Some(width) => width,
            None => ConfigOption::DefaultColumnWidth
                .default_value()
                .parse()
                .context("built-in default column width")?,
        };
        anyhow::ensure!(
            default_column_width > 0.0,
            "default column width must be positive"
        );

        Ok(Self {
            excel_path,
            sheet_name,
            schedule_time,
            columns,
            start_time: cli_start_time.or(file_start_time),
            end_time: cli_end_time.or(file_end_time),
            run_now,
            counts,
            default_column_width,
        })
    }

    pub fn ensure_workbook(&self) -> Result<()> {
        anyhow::ensure!(
            self.excel_path.is_file(),
            "configured workbook {:?} does not exist or is not a file",
            self.excel_path
        );
        Ok(())
    }
}

#[derive(Parser, Debug, Default, Clone)]
#[command(
    name = "daily-report",
    about = "Append a daily summary row to an xlsx report",
    version
)]
pub struct CliArgs {
    #[arg(long, value_name = "FILE", help = "Path to a configuration file (YAML or JSON)")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "DAILY_REPORT_EXCEL_PATH", value_name = "FILE", help = "Report workbook")]
    pub excel_path: Option<PathBuf>,

    #[arg(long, env = "DAILY_REPORT_SHEET_NAME", value_name = "NAME", help = "Report sheet")]
    pub sheet_name: Option<String>,

    #[arg(
        long,
        env = "DAILY_REPORT_SCHEDULE_TIME",
        value_name = "HH:MM",
        help = "Local time of day the job runs (default: 09:00)"
    )]
    pub schedule_time: Option<String>,

    #[arg(long, env = "DAILY_REPORT_COL_START_TIME", value_name = "HEADER")]
    pub col_start_time: Option<String>,

    #[arg(long, env = "DAILY_REPORT_COL_END_TIME", value_name = "HEADER")]
    pub col_end_time: Option<String>,

    #[arg(long, env = "DAILY_REPORT_COL_GUEST_COUNT", value_name = "HEADER")]
    pub col_guest_count: Option<String>,

    #[arg(long, env = "DAILY_REPORT_COL_LATE_UPLOAD", value_name = "HEADER")]
    pub col_late_upload: Option<String>,

    #[arg(long, env = "DAILY_REPORT_COL_COMPLETION_RATE", value_name = "HEADER")]
    pub col_completion_rate: Option<String>,

    #[arg(
        long,
        env = "DAILY_REPORT_START_TIME",
        value_name = "TIME",
        help = "Window start: YYYY-MM-DD HH:MM:SS, YYYY-MM-DD or YYYYMMDDHHMMSS"
    )]
    pub start_time: Option<String>,

    #[arg(
        long,
        env = "DAILY_REPORT_END_TIME",
        value_name = "TIME",
        help = "Window end, same formats as --start-time"
    )]
    pub end_time: Option<String>,

    #[arg(long, help = "Run the job once and exit instead of waiting for the schedule")]
    pub run_now: bool,

    #[arg(
        long,
        env = "DAILY_REPORT_DATABASE",
        value_name = "FILE",
        help = "SQLite database the counts are queried from"
    )]
    pub database: Option<PathBuf>,

    #[arg(long, env = "DAILY_REPORT_GUEST_QUERY", value_name = "SQL")]
    pub guest_query: Option<String>,

    #[arg(long, env = "DAILY_REPORT_LATE_UPLOAD_QUERY", value_name = "SQL")]
    pub late_upload_query: Option<String>,

    #[arg(
        long,
        value_name = "N",
        help = "Use this guest count instead of querying",
        value_parser = clap::value_parser!(i64)
    )]
    pub guest_count: Option<i64>,

    #[arg(
        long,
        value_name = "N",
        help = "Use this late-upload count instead of querying",
        value_parser = clap::value_parser!(i64)
    )]
    pub late_upload_count: Option<i64>,

    #[arg(
        long,
        env = "DAILY_REPORT_DEFAULT_COLUMN_WIDTH",
        value_name = "CHARS",
        help = "Width applied when a copied column has none (default: 15)"
    )]
    pub default_column_width: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialColumns {
    start_time: Option<String>,
    end_time: Option<String>,
    guest_count: Option<String>,
    late_upload: Option<String>,
    completion_rate: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    excel_path: Option<PathBuf>,
    sheet_name: Option<String>,
    schedule_time: Option<String>,
    columns: Option<PartialColumns>,
    start_time: Option<String>,
    end_time: Option<String>,
    database: Option<PathBuf>,
    guest_query: Option<String>,
    late_upload_query: Option<String>,
    guest_count: Option<i64>,
    late_upload_count: Option<i64>,
    default_column_width: Option<f64>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn every_option_has_a_nonempty_default() {
        for option in ConfigOption::iter() {
            assert!(!option.default_value().is_empty(), "{option} has no default");
        }
    }

    #[test]
    fn defaults_apply_with_fixed_counts() {
        let args = CliArgs::parse_from([
            "daily-report",
            "--guest-count",
            "10",
            "--late-upload-count",
            "1",
        ]);
        let config = AppConfig::from_args(args).unwrap();
        assert_eq!(config.excel_path, PathBuf::from("report.xlsx"));
        assert_eq!(config.sheet_name, "Sheet1");
        assert_eq!(config.schedule_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(config.columns, ColumnConfig::default());
        assert_eq!(config.default_column_width, 15.0);
        assert_eq!(
            config.counts,
            CountsConfig::Fixed(Counts {
                guest_count: 10,
                late_upload_count: 1
            })
        );
    }
}
