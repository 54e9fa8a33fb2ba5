// Configuration file loader for the transcribe gateway
//
// Seeds environment variables from a flat TOML file so deployments can keep
// settings on disk. Variables already present in the environment win.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use thiserror::Error;
use toml::Value;

/// Default configuration file, relative to the working directory
pub const CONFIG_FILE_PATH: &str = "transcribe_gateway.conf";

/// Environment variable that overrides the configuration file location
pub const ENV_CONFIG_FILE: &str = "TRANSCRIBE_GATEWAY_CONFIG";

/// Errors raised while reading the configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Loads the configuration file into the process environment
///
/// Returns `Ok(false)` when there is no file to load. Parse and read errors
/// are returned so the caller decides whether they are fatal.
pub fn load_config() -> Result<bool, ConfigError> {
    let path = env::var(ENV_CONFIG_FILE).unwrap_or_else(|_| CONFIG_FILE_PATH.to_string());
    let config_path = Path::new(&path);

    if !config_path.exists() {
        debug!("Configuration file not found at: {}", path);
        return Ok(false);
    }

    let content = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;

    let applied = apply_to_env(parse_flat(&content).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?);

    info!("Configuration loaded from {} ({} values applied)", path, applied);
    Ok(true)
}

/// Flattens a TOML document into key/value strings
///
/// Only top level scalars are kept; arrays and tables are skipped.
pub fn parse_flat(content: &str) -> Result<HashMap<String, String>, toml::de::Error> {
    let table: toml::Table = content.parse()?;
    let mut config_map = HashMap::new();

    for (key, value) in table {
        let value = match value {
            Value::String(s) => s,
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Boolean(b) => b.to_string(),
            _ => {
                warn!("Skipping unsupported TOML value type for key: {}", key);
                continue;
            }
        };
        config_map.insert(key, value);
    }

    Ok(config_map)
}

fn apply_to_env(config_map: HashMap<String, String>) -> usize {
    let mut applied = 0;
    for (key, value) in config_map {
        if env::var_os(&key).is_some() {
            debug!("Env var already exists, skipping: {}", key);
            continue;
        }
        // Secrets are never echoed to the log
        debug!("Setting env var from config file: {}", key);
        env::set_var(key, value);
        applied += 1;
    }
    applied
}
