use anyhow::Context;
use clap::Parser;
use extractors::NotificationParser;
use paytally_bot::config::BotConfig;
use paytally_bot::helpers::database::initialize_database;
use paytally_bot::integrations::TelegramClient;
use paytally_bot::jobs::BotRunner;
use paytally_bot::reports::ReportController;
use paytally_bot::storage::{SqliteTransactionStore, TransactionStore};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::prelude::*;

/// Extra time runners get to finish an in-flight long poll at shutdown
const SHUTDOWN_GRACE: Duration = Duration::from_secs(15);

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    log_file_path: Option<String>,
}

fn init_logging(log_file_path: Option<String>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = log_file_path {
        let log_path = std::path::Path::new(&log_path);
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(std::path::Path::new(".")),
            log_path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("paytally.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        std::mem::forget(guard);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stdout),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_file_path);

    let (config, config_path) =
        BotConfig::load(args.config.as_deref()).context("Failed to load config")?;
    tracing::info!("Loaded config from {:?}", config_path);

    let (db, db_path) =
        initialize_database(config.database_path()).context("Failed to initialize database")?;
    tracing::info!("Database initialized at: {:?}", db_path);

    let parser = Arc::new(
        NotificationParser::new().context("Failed to compile notification patterns")?,
    );
    let formats: Vec<String> = parser.formats().iter().map(|f| f.to_string()).collect();
    tracing::info!("Recognised notification formats: {}", formats.join(", "));

    let tz = config.reporting.tz()?;
    tracing::info!("Reports use the {} time zone", tz);

    let store: Arc<dyn TransactionStore> = Arc::new(SqliteTransactionStore::new(
        db.async_connection.clone(),
        tz,
    ));
    let controller = Arc::new(ReportController::new(store.clone(), &config.reporting)?);
    let shutdown = Arc::new(AtomicBool::new(false));

    let mut handles = Vec::with_capacity(config.bots.len());
    for identity in &config.bots {
        let client = Arc::new(
            TelegramClient::new(identity)
                .with_context(|| format!("Failed to create client for bot {}", identity.name))?,
        );
        let runner = BotRunner::new(
            identity.name.clone(),
            client,
            parser.clone(),
            store.clone(),
            controller.clone(),
            config.polling.clone(),
            shutdown.clone(),
        );
        handles.push((identity.name.clone(), tokio::spawn(runner.run())));
    }
    tracing::info!("Started {} bot runner(s)", handles.len());

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    tracing::info!("Shutdown signal received, stopping bot runners");
    shutdown.store(true, Ordering::SeqCst);

    let grace = Duration::from_secs(config.polling.timeout_secs) + SHUTDOWN_GRACE;
    for (name, handle) in handles {
        match tokio::time::timeout(grace, handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("[{}] Bot runner panicked: {}", name, e),
            Err(_) => tracing::warn!("[{}] Bot runner did not stop within {:?}", name, grace),
        }
    }

    Ok(())
}
