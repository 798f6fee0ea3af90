use anyhow::Result;
use chrono::Local;
use clap::Parser;
use daily_report::{AppConfig, CliArgs, schedule};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_args(CliArgs::parse())?;
    config.ensure_workbook()?;

    if config.run_now {
        let source = schedule::count_source(&config);
        let outcome = tokio::task::spawn_blocking(move || {
            schedule::run_job(&config, source.as_ref(), Local::now().naive_local())
        })
        .await??;
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    schedule::run_scheduler(config).await
}
