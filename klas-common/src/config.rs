//! Configuration loading and database path resolution

use crate::{Error, Result};
use std::path::PathBuf;

/// Environment variable naming the database file
pub const DATABASE_ENV_VAR: &str = "KLAS_DATABASE";

/// Database path resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. KLAS_DATABASE environment variable
/// 3. TOML config file (`database` key)
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_database_path(cli_arg: Option<&str>) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(DATABASE_ENV_VAR) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = find_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(database) = config.get("database").and_then(|v| v.as_str()) {
                    return Ok(PathBuf::from(database));
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    Ok(default_database_path())
}

/// Get configuration file path for the platform
fn find_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/klas/config.toml first, then /etc/klas/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("klas").join("config.toml"));
        let system_config = PathBuf::from("/etc/klas/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        return Err(Error::Config("No config file found".to_string()));
    }

    let config_path = dirs::config_dir()
        .map(|d| d.join("klas").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    if config_path.exists() {
        Ok(config_path)
    } else {
        Err(Error::Config(format!(
            "Config file not found: {:?}",
            config_path
        )))
    }
}

/// OS-dependent default database path
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("klas"))
        .unwrap_or_else(|| PathBuf::from("./klas_data"))
        .join("klas.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_arg_wins() {
        let path = resolve_database_path(Some("/tmp/explicit.db")).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/explicit.db"));
    }

    #[test]
    fn default_path_ends_with_database_file() {
        let path = default_database_path();
        assert!(path.ends_with("klas.db"));
    }
}
