//! Config loading and default locations.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::Config;
use crate::error::DaemonError;

/// Load configuration from the given path, or the default location.
///
/// A missing file yields the defaults; an unreadable or invalid one is an error.
pub fn load_config(path: Option<&Path>) -> Result<Config, DaemonError> {
    let config_path = path.map_or_else(default_config_path, Path::to_path_buf);

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| DaemonError::Config(format!("failed to read config: {e}")))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| DaemonError::Config(format!("failed to parse config: {e}")))?;
        info!(path = %config_path.display(), "loaded config");
        Ok(config)
    } else {
        info!("no config file found, using defaults");
        Ok(Config::default())
    }
}

/// Get the default config directory path.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("/etc"))
        .join("devstate")
}

/// Get the default config file path.
pub fn default_config_path() -> PathBuf {
    config_dir().join("config.toml")
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(Some(&dir.path().join("missing.toml"))).unwrap();
        assert!(config.bridge.enabled);
    }

    #[test]
    fn reads_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[thermal]\nshutdown_celsius = 60\n");
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.thermal.shutdown_celsius, 60);
    }

    #[test]
    fn invalid_file_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[thermal]\nshutdown_celsius = \"hot\"\n");
        assert!(matches!(
            load_config(Some(&path)),
            Err(DaemonError::Config(_))
        ));
    }

    #[test]
    fn scratch_files_are_removed_with_their_dir() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "");
        assert!(load_config(Some(&path)).is_ok());
        dir.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn default_path_ends_with_config_toml() {
        assert!(default_config_path().ends_with("devstate/config.toml"));
    }
}
