//! Tracing subscriber setup for the CLI and the server.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

pub const LOG_FILE: &str = "notekeeper.log";

/// Installs the global tracing subscriber.
///
/// Console output goes to stderr so command output on stdout stays
/// scriptable. When `log_dir` is given, a daily-rolling file is written
/// there as well; keep the returned guard alive until exit or buffered lines
/// are lost. `RUST_LOG` overrides the level chosen by `verbose`.
pub fn setup_logging(verbose: bool, log_dir: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let log_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let console = fmt::layer().with_writer(std::io::stderr);

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let subscriber = tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .with(fmt::layer().with_ansi(false).with_writer(non_blocking));
            tracing::subscriber::set_global_default(subscriber)?;
            Ok(Some(guard))
        }
        None => {
            let subscriber = tracing_subscriber::registry().with(filter).with(console);
            tracing::subscriber::set_global_default(subscriber)?;
            Ok(None)
        }
    }
}
