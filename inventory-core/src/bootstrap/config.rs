//! Configuration loading

use anyhow::Result;
use std::path::Path;
use tracing::info;

use crate::Config;

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "INVENTORY_CONFIG_PATH";

/// Pick the config file to load
///
/// Search order:
/// 1. `explicit` (the `--config` flag)
/// 2. INVENTORY_CONFIG_PATH environment variable
/// 3. ./config.yaml (current working directory)
/// 4. /config/config.yaml (Kubernetes mount path)
///
/// A path named by the flag or the environment must exist; only the
/// default locations are optional.
pub fn find_config_file(explicit: Option<&str>) -> Result<Option<String>> {
    let requested = explicit
        .map(str::to_string)
        .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().filter(|p| !p.trim().is_empty()));

    if let Some(path) = requested {
        if !Path::new(&path).is_file() {
            return Err(anyhow::anyhow!("Config file {path} does not exist"));
        }
        return Ok(Some(path));
    }

    Ok(["config.yaml", "/config/config.yaml"]
        .into_iter()
        .find(|p| Path::new(p).is_file())
        .map(str::to_string))
}

/// Load configuration from a config file or environment variables
///
/// Falls back to environment variables only when no file is found. The
/// result is validated before it is returned.
pub fn load_config(explicit: Option<&str>) -> Result<Config> {
    let config = if let Some(path) = find_config_file(explicit)? {
        eprintln!("Loading config from {path}");
        match Config::from_file(&path) {
            Ok(cfg) => {
                eprintln!("Successfully loaded {path}");
                cfg
            }
            Err(e) => {
                return Err(anyhow::anyhow!("Failed to load {path}: {e}"));
            }
        }
    } else {
        eprintln!("No config file found, using environment variables");
        Config::from_env().unwrap_or_else(|e| {
            eprintln!("Failed to load config: {e}");
            eprintln!("Using default configuration");
            Config::default()
        })
    };

    // Fail fast on misconfigurations
    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Config validation error: {error}");
        }
        return Err(anyhow::anyhow!(
            "Configuration validation failed with {} error(s): {}",
            errors.len(),
            errors.join("; ")
        ));
    }

    info!("Configuration loaded and validated successfully");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_explicit_path_wins() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let path = file.path().to_str().unwrap();
        assert_eq!(find_config_file(Some(path)).unwrap().as_deref(), Some(path));
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("inv.yaml");
        let missing = missing.to_str().unwrap();

        let err = find_config_file(Some(missing)).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
        assert!(load_config(Some(missing)).is_err());
    }

    #[test]
    fn test_load_config_rejects_invalid_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "logging:\n  format: xml").unwrap();

        let err = load_config(Some(file.path().to_str().unwrap())).unwrap_err();
        assert!(err.to_string().contains("logging.format"));
    }

    #[test]
    fn test_load_config_from_explicit_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "server:\n  http_port: 9191").unwrap();

        let config = load_config(Some(file.path().to_str().unwrap())).unwrap();
        assert_eq!(config.server.http_port, 9191);
    }
}
