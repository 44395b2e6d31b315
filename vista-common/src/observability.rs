//! Logging setup shared by binaries and integration tests.
//!
//! [`init_logging`] installs one global `tracing` subscriber: a daily rolling
//! file, optionally mirrored to `stderr`, filtered by `RUST_LOG` or the
//! configured default. Extraction logs under the `vista.*` targets, so
//! `RUST_LOG=vista.content=debug` shows every slot evaluation and
//! `vista.wait=trace` every poll attempt.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context;
use chrono::Local;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Directory override consulted when [`LogConfig::log_dir`] is unset.
pub const LOG_DIR_ENV: &str = "VISTA_LOG_DIR";

/// What the first successful [`init_logging`] call left behind. The guard
/// flushes the non-blocking writer when the process exits.
struct Installed {
    path: PathBuf,
    _guard: WorkerGuard,
}

static INSTALLED: OnceLock<Installed> = OnceLock::new();

/// Output encoding for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Used for the log file name and the default directory.
    pub app_name: String,
    pub log_dir: Option<PathBuf>,
    /// Mirror events to `stderr` as well as the file.
    pub emit_stderr: bool,
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is unset.
    pub default_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            app_name: "vista".to_string(),
            log_dir: None,
            emit_stderr: false,
            format: LogFormat::Text,
            default_filter: "info".to_string(),
        }
    }
}

impl LogConfig {
    /// Explicit directory, then `VISTA_LOG_DIR`, then
    /// `~/.local/share/<app_name>`. A leading `~/` is expanded.
    pub fn resolved_dir(&self) -> PathBuf {
        match (&self.log_dir, std::env::var_os(LOG_DIR_ENV)) {
            (Some(dir), _) => expand_home(dir),
            (None, Some(dir)) => expand_home(Path::new(&dir)),
            (None, None) => home()
                .map(|home| home.join(".local/share").join(&self.app_name))
                .unwrap_or_else(|| PathBuf::from(&self.app_name)),
        }
    }

    fn file_name(&self) -> String {
        format!("{}.log", self.app_name)
    }
}

/// Install the global subscriber and return today's log file.
///
/// Only the first call configures anything; later calls return the path
/// chosen by the first.
pub fn init_logging(config: LogConfig) -> anyhow::Result<PathBuf> {
    if let Some(installed) = INSTALLED.get() {
        return Ok(installed.path.clone());
    }

    let dir = config.resolved_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("cannot create log directory {}", dir.display()))?;
    let file_name = config.file_name();
    let path = dir.join(format!("{file_name}.{}", Local::now().format("%Y-%m-%d")));

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&dir, &file_name));
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let file_layer = match config.format {
        LogFormat::Text => fmt::layer().with_writer(writer).with_ansi(false).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
    };
    let stderr_layer = config.emit_stderr.then(|| match config.format {
        LogFormat::Text => fmt::layer().with_writer(std::io::stderr).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .with(filter)
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    let installed = INSTALLED.get_or_init(|| Installed {
        path,
        _guard: guard,
    });
    Ok(installed.path.clone())
}

fn home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), home()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dir_wins() {
        let config = LogConfig {
            log_dir: Some(PathBuf::from("/var/log/vista")),
            ..LogConfig::default()
        };
        assert_eq!(config.resolved_dir(), PathBuf::from("/var/log/vista"));
    }

    #[test]
    fn relative_paths_are_left_alone() {
        assert_eq!(expand_home(Path::new("logs/x")), PathBuf::from("logs/x"));
    }

    #[test]
    fn tilde_expands_to_home() {
        if let Some(home) = home() {
            assert_eq!(expand_home(Path::new("~/logs")), home.join("logs"));
        }
    }

    #[test]
    fn default_dir_ends_with_app_name() {
        let config = LogConfig {
            app_name: "vista-tests".into(),
            ..LogConfig::default()
        };
        if std::env::var_os(LOG_DIR_ENV).is_none() {
            assert!(config.resolved_dir().ends_with("vista-tests"));
        }
    }

    #[test]
    fn init_logging_creates_directory_and_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested");
        let config = LogConfig {
            app_name: "vista-unit".into(),
            log_dir: Some(dir.clone()),
            ..LogConfig::default()
        };
        let first = init_logging(config.clone()).unwrap();
        assert!(dir.is_dir());
        assert!(first.starts_with(&dir));
        let second = init_logging(LogConfig::default()).unwrap();
        assert_eq!(first, second);
    }
}
