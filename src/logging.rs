use anyhow::Result;
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_PREFIX: &str = "pourover";

/// Install the global subscriber: daily rolling files under `<data_dir>/logs`,
/// mirrored to stderr when `show_stderr` is set.
///
/// The level comes from `log_level`, else `RUST_LOG`, else `info`.
pub fn enable_logging(data_dir: &Path, log_level: Option<LevelFilter>, show_stderr: bool) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(5)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(data_dir.join("logs"))?;

    // The terminal view owns stdout, so the mirror goes to stderr
    let stderr = std::io::stderr.with_filter(move |_| show_stderr);

    let level = log_level
        .map(|v| v.to_string())
        .unwrap_or_else(|| std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()));

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!(
            "{}={level}",
            env!("CARGO_PKG_NAME").replace('-', "_"),
        )))
        .with_ansi(false)
        .with_writer(stderr.and(appender))
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    Ok(())
}

/// Route log output through the test harness; call at the top of a test
#[cfg(test)]
pub fn init_test_logging() {
    static TEST_LOGGING: std::sync::Once = std::sync::Once::new();
    TEST_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(LevelFilter::TRACE)
            .with_test_writer()
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logs_directory_is_created() {
        let temp_dir = tempfile::tempdir().unwrap();
        // Another test may already own the global subscriber; the directory is
        // created before installation is attempted
        let _ = enable_logging(temp_dir.path(), Some(LevelFilter::DEBUG), false);
        assert!(temp_dir.path().join("logs").is_dir());
    }
}
