pub mod config;
pub mod errors;
pub mod formula;
pub mod insert;
pub mod model;
pub mod query;
pub mod report;
pub mod schedule;
pub mod styles;
pub mod window;

pub use config::{AppConfig, CliArgs, ConfigOption, CountsConfig};
pub use errors::{ReportError, UpdateFailed};
pub use insert::{InsertedRow, insert_and_populate};
pub use model::{ColumnConfig, HeaderMap, ReportColumn, RowValues, UpdateOutcome, UpdateWarning};
pub use query::{CountSource, Counts, FixedCounts, SqliteCountSource};
pub use report::ReportUpdater;
pub use window::TimeWindow;
