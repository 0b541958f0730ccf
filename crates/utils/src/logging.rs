//! provides logging helpers

use std::path::Path;

use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::filter::{self};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry;
use tracing_subscriber::registry::LookupSpan;

/// Environment variable naming a directory for daily rolling log files.
pub const LOG_PATH_ENV_VAR: &str = "LOG_PATH";

/// File name prefix used for rolling log files.
pub const LOG_FILE_PREFIX: &str = "workload-gateway";

pub type BoxedLayer<S> = Box<dyn tracing_subscriber::Layer<S> + Send + Sync + 'static>;

/// Build the human readable fmt layer.
///
/// Writes to stderr unless `log_path` names a directory, in which case output
/// goes to a daily rolling file there. The returned guard must be held for as
/// long as file logging is needed.
pub fn get_fmt_layer<S>(log_path: Option<String>) -> (BoxedLayer<S>, Option<WorkerGuard>)
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let Some(log_path) = log_path else {
        return (stderr_layer(), None);
    };

    match rolling_appender(Path::new(&log_path), LOG_FILE_PREFIX) {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .boxed();
            (layer, Some(guard))
        }
        Err(e) => {
            eprintln!("failed to open log directory {log_path}: {e}, logging to stderr");
            (stderr_layer(), None)
        }
    }
}

/// Daily rolling appender keeping a week of files.
pub fn rolling_appender(
    dir: &Path,
    prefix: &str,
) -> Result<RollingFileAppender, tracing_appender::rolling::InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .max_log_files(7)
        .build(dir)
}

fn stderr_layer<S>() -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .boxed()
}

/// initiate a stderr-only global tracing subscriber
pub fn init() {
    let env_filter = filter::EnvFilter::builder()
        .with_default_directive(filter::LevelFilter::INFO.into())
        .from_env_lossy();

    registry()
        .with(stderr_layer().with_filter(env_filter))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_appender_creates_files_in_directory() {
        let dir = tempfile::tempdir().expect("should create temp dir");

        let appender = rolling_appender(dir.path(), "test");

        assert!(appender.is_ok(), "appender should build in a writable directory");
    }

    #[test]
    fn fmt_layer_without_path_has_no_guard() {
        let (_layer, guard) = get_fmt_layer::<tracing_subscriber::Registry>(None);
        assert!(guard.is_none());
    }
}
