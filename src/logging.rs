//! Logging setup
//!
//! Library code only emits `tracing` events; binaries call [`init`] once to
//! install a subscriber. `RUST_LOG` takes precedence over the configured
//! filter directive.
//!
//! When a log file is configured, events are written to it through a
//! non-blocking writer instead of stdout. Keep the returned guard alive until
//! shutdown so buffered lines are flushed.

use crate::config::LoggingSettings;
use crate::error::{PipelineError, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber described by `settings`.
pub fn init(settings: &LoggingSettings) -> Result<Option<WorkerGuard>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => filter_from(&settings.filter)?,
    };

    let (file_layer, guard) = match &settings.file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(open_log_file(path)?);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };
    let stdout_layer = file_layer.is_none().then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| PipelineError::Config(format!("Failed to initialize logging: {}", e)))?;

    Ok(guard)
}

/// Parse an `EnvFilter` directive such as `"info,modupipe=debug"`.
pub fn filter_from(directive: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directive).map_err(|e| {
        PipelineError::Config(format!("Invalid log filter {:?}: {}", directive, e))
    })
}

fn open_log_file(path: &Path) -> Result<tracing_appender::rolling::RollingFileAppender> {
    let file_name = path.file_name().ok_or_else(|| {
        PipelineError::Config(format!("Log file path {:?} has no file name", path))
    })?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    Ok(tracing_appender::rolling::never(dir, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(filter_from(crate::config::DEFAULT_LOG_FILTER).is_ok());
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        let err = filter_from("modupipe=notalevel").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_log_file_needs_a_name() {
        assert!(open_log_file(Path::new("/")).is_err());
    }

    #[test]
    fn test_log_file_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("run.log");
        open_log_file(&path).unwrap();
        assert!(dir.path().join("logs").is_dir());
    }
}
