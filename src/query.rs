use crate::window::TimeWindow;
use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags, named_params};
use std::path::{Path, PathBuf};

pub const DEFAULT_GUEST_QUERY: &str = "SELECT COUNT(1) FROM check_ins \
     WHERE check_in_time >= :start_time AND check_in_time < :end_time";

/// Late when the upload came 15 minutes or more after check-in, or after
/// check-out for guests that already left.
pub const DEFAULT_LATE_UPLOAD_QUERY: &str = "SELECT COUNT(1) FROM check_ins \
     WHERE check_in_time >= :start_time AND check_in_time < :end_time \
     AND ((check_out_time IS NULL AND uploaded_minutes_after_check_in >= 15) \
       OR (check_out_time IS NOT NULL AND uploaded_minutes_after_check_out >= 15))";

/// The two aggregates a report row is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub guest_count: i64,
    pub late_upload_count: i64,
}

/// Produces the counts for a window; the database side of the report.
pub trait CountSource: Send + Sync {
    fn counts(&self, window: &TimeWindow) -> Result<Counts>;
}

/// Counts supplied up front, for back-filling a row by hand.
#[derive(Debug, Clone, Copy)]
pub struct FixedCounts(pub Counts);

impl CountSource for FixedCounts {
    fn counts(&self, _window: &TimeWindow) -> Result<Counts> {
        Ok(self.0)
    }
}

/// Runs two scalar queries against a SQLite database. Both receive
/// `:start_time` and `:end_time` as `YYYYMMDDHHMMSS` text.
#[derive(Debug, Clone)]
pub struct SqliteCountSource {
    path: PathBuf,
    guest_query: String,
    late_upload_query: String,
}

impl SqliteCountSource {
    pub fn new(
        path: impl Into<PathBuf>,
        guest_query: impl Into<String>,
        late_upload_query: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            guest_query: guest_query.into(),
            late_upload_query: late_upload_query.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn scalar(&self, conn: &Connection, label: &str, sql: &str, window: &TimeWindow) -> Result<i64> {
        let start = window.start_text();
        let end = window.end_text();
        conn.query_row(
            sql,
            named_params! { ":start_time": start, ":end_time": end },
            |row| row.get::<_, i64>(0),
        )
        .with_context(|| format!("{label} query failed against {:?}", self.path))
    }
}

impl CountSource for SqliteCountSource {
    fn counts(&self, window: &TimeWindow) -> Result<Counts> {
        let conn = Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("failed to open database {:?}", self.path))?;
        let guest_count = self.scalar(&conn, "guest count", &self.guest_query, window)?;
        let late_upload_count =
            self.scalar(&conn, "late upload", &self.late_upload_query, window)?;
        tracing::info!(
            window = %window,
            guest_count,
            late_upload_count,
            "counts queried"
        );
        Ok(Counts {
            guest_count,
            late_upload_count,
        })
    }
}
