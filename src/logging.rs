//! Logging setup shared by the binaries

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{Error, Result};

/// Install the global subscriber: stdout, plus `config.file` when set
///
/// `RUST_LOG` takes precedence over `config.level`.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter =
        EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| config.level.clone()));

    let file_layer = match &config.file {
        Some(path) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(open_log_file(path)?)),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to install logger: {}", e)))
}

/// Open `path` for appending, creating it and its parent directory
pub fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_log_file_is_created_and_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("wavlink.log");

        writeln!(open_log_file(&path).unwrap(), "first").unwrap();
        writeln!(open_log_file(&path).unwrap(), "second").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_file_setting_from_toml() {
        let config = crate::config::AppConfig::from_toml(
            r#"
            [logging]
            level = "debug"
            file = "/tmp/wavlink.log"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.logging.file.as_deref(),
            Some(Path::new("/tmp/wavlink.log"))
        );
        assert!(crate::config::AppConfig::default().logging.file.is_none());
    }
}
