use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use townhall_activity::config::{Cli, Command, ConfigFile, Settings};
use townhall_activity::feed::ActivityService;
use townhall_activity::serve::start_server;
use townhall_activity::source::MemoryHistoryStore;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Keep the guard alive so buffered log lines are flushed on exit
    let _guard = init_logging(cli.log_file.as_deref())?;

    let file = ConfigFile::load().unwrap_or_default();
    let settings = Settings::resolve(&cli, &file);

    let store = MemoryHistoryStore::load(&settings.fixture)
        .await
        .wrap_err_with(|| {
            format!(
                "failed to load revision logs from {}",
                settings.fixture.display()
            )
        })?;
    let service = ActivityService::from_store(Arc::new(store)).with_policy(file.diff_policy());

    match cli.command {
        Command::Feed { user_id } => print_feed(&service, &user_id).await,
        Command::Serve { .. } => {
            start_server(settings.port, service, settings.api_key).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::from_default_env();
    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_writer(writer)
                .with_ansi(false)
                .with_env_filter(filter)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(filter)
                .init();
            Ok(None)
        }
    }
}

// Must return instead of exiting: the log guard in `main` flushes on drop.
async fn print_feed(service: &ActivityService, user_id: &str) -> Result<ExitCode> {
    let report = service.feed_report(user_id).await?;
    println!("{}", report.to_json_pretty()?);
    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
