//! CLI configuration utilities

use anyhow::{Context, Result};
use examkit_core::{ClientConfig, StateDir};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolve the state directory from the CLI override or platform defaults
pub fn state_dir(override_dir: Option<PathBuf>) -> StateDir {
    match override_dir {
        Some(dir) => StateDir::with_override(dir),
        None => StateDir::new(),
    }
}

/// Load client configuration
///
/// An explicit `config_file` must exist. Otherwise the default file in the
/// state directory is used when present, and built-in defaults when not.
pub fn load_client_config(config_file: Option<&Path>, state_dir: &StateDir) -> Result<ClientConfig> {
    let default_path = state_dir.config_path();
    let path = match config_file {
        Some(path) => Some(path),
        None if default_path.exists() => Some(default_path.as_path()),
        None => None,
    };

    match path {
        Some(path) => debug!("Loading configuration from: {}", path.display()),
        None => debug!("Using default configuration with environment overrides"),
    }

    ClientConfig::load(path).context("failed to load configuration")
}

/// Credential file the CLI reads and writes
pub fn credentials_path(config: &ClientConfig, state_dir: &StateDir) -> PathBuf {
    config
        .credentials
        .path
        .clone()
        .unwrap_or_else(|| state_dir.credentials_path())
}

/// Write a default configuration file
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(&ClientConfig::default())?;
    std::fs::write(path, content)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generated_config_loads_back() {
        let temp_dir = TempDir::new().unwrap();
        let state_dir = StateDir::with_override(temp_dir.path());

        generate_default_config(state_dir.config_path()).unwrap();
        let config = load_client_config(None, &state_dir).unwrap();

        assert_eq!(config.auth.routes, ClientConfig::default().auth.routes);
        assert_eq!(config.api.base_url, ClientConfig::default().api.base_url);
    }

    #[test]
    fn test_credentials_path_defaults_to_state_dir() {
        let temp_dir = TempDir::new().unwrap();
        let state_dir = StateDir::with_override(temp_dir.path());

        let mut config = ClientConfig::default();
        assert_eq!(
            credentials_path(&config, &state_dir),
            state_dir.credentials_path()
        );

        config.credentials.path = Some(temp_dir.path().join("custom.json"));
        assert_eq!(
            credentials_path(&config, &state_dir),
            temp_dir.path().join("custom.json")
        );
    }

    #[test]
    fn test_explicit_missing_config_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let state_dir = StateDir::with_override(temp_dir.path());
        let missing = temp_dir.path().join("missing.toml");

        assert!(load_client_config(Some(missing.as_path()), &state_dir).is_err());
    }
}
