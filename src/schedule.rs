use crate::config::{AppConfig, CountsConfig};
use crate::model::{RowValues, UpdateOutcome};
use crate::query::{CountSource, FixedCounts, SqliteCountSource};
use crate::report::ReportUpdater;
use crate::window::TimeWindow;
use anyhow::{Context, Result};
use chrono::{Days, Local, NaiveDateTime, NaiveTime};
use std::sync::Arc;
use std::time::Duration;

pub fn count_source(config: &AppConfig) -> Arc<dyn CountSource> {
    match &config.counts {
        CountsConfig::Database {
            path,
            guest_query,
            late_upload_query,
        } => Arc::new(SqliteCountSource::new(
            path,
            guest_query.as_str(),
            late_upload_query.as_str(),
        )),
        CountsConfig::Fixed(counts) => Arc::new(FixedCounts(*counts)),
    }
}

/// One scheduled run: window, counts, then the report update.
pub fn run_job(
    config: &AppConfig,
    source: &dyn CountSource,
    now: NaiveDateTime,
) -> Result<UpdateOutcome> {
    let window = TimeWindow::resolve(config.start_time.as_deref(), config.end_time.as_deref(), now)?;
    tracing::info!(window = %window, "report job started");

    let counts = source
        .counts(&window)
        .with_context(|| format!("failed to query counts for {window}"))?;
    let values = RowValues {
        start_time: window.start_text(),
        end_time: window.end_text(),
        guest_count: counts.guest_count,
        late_upload_count: counts.late_upload_count,
    };

    let updater = ReportUpdater::new(
        &config.excel_path,
        config.sheet_name.as_str(),
        config.columns.clone(),
    )
    .with_default_width(config.default_column_width);
    let outcome = updater.update(&values)?;

    for warning in &outcome.warnings {
        tracing::warn!(?warning, "report updated with warning");
    }
    tracing::info!(
        window = %window,
        row = outcome.new_row,
        backup = %outcome.backup_path.display(),
        "report job finished"
    );
    Ok(outcome)
}

/// Next local wall-clock instant at `at`, strictly after `now`.
pub fn next_run_after(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today.checked_add_days(Days::new(1)).unwrap_or(today)
    }
}

/// Runs the job every day at `config.schedule_time` until Ctrl-C. A failed
/// run is logged and the loop waits for the next slot.
pub async fn run_scheduler(config: AppConfig) -> Result<()> {
    let config = Arc::new(config);
    let source = count_source(&config);
    tracing::info!(
        at = %config.schedule_time.format("%H:%M"),
        workbook = %config.excel_path.display(),
        "daily schedule armed"
    );

    loop {
        let now = Local::now().naive_local();
        let next = next_run_after(now, config.schedule_time);
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        tracing::debug!(next = %next, wait_secs = wait.as_secs(), "sleeping until next run");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown requested");
                return Ok(());
            }
        }

        let job_config = Arc::clone(&config);
        let job_source = Arc::clone(&source);
        let result = tokio::task::spawn_blocking(move || {
            run_job(&job_config, job_source.as_ref(), Local::now().naive_local())
        })
        .await;

        match result {
            Ok(Ok(_)) => {}
            Ok(Err(error)) => tracing::error!(error = %format!("{error:#}"), "report job failed"),
            Err(join_error) => tracing::error!(error = %join_error, "report job panicked"),
        }
    }
}
