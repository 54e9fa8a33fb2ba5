// Transcribe gateway configuration
//
// This module contains configuration structures and constants for the gateway.
// Values come from environment variables; anything missing or out of range falls
// back to the compiled-in defaults without failing startup.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use log::debug;

/// Default values for configuration
pub mod defaults {
    // Server bind address
    pub const HOST: &str = "0.0.0.0";
    pub const PORT: u16 = 5632;

    // Number of HTTP workers (0 = one per CPU core)
    pub const WORKER_NUMBER: usize = 0;

    // Upload ceiling in megabytes and its accepted range
    pub const MAX_UPLOAD_MB: u64 = 50;
    pub const MAX_UPLOAD_MB_CEILING: u64 = 1024;

    // Sliding window rate limiting
    pub const RATE_LIMIT: usize = 60;
    pub const RATE_WINDOW_SECONDS: u64 = 60;

    // Whisper engine
    pub const MODEL: &str = "medium";
    pub const ALLOWED_MODELS: [&str; 6] = ["tiny", "base", "small", "medium", "large-v2", "large-v3"];
    pub const WHISPER_CMD: &str = "whisper";
    pub const DEVICE: &str = "cpu";
    pub const OUTPUT_DIR_NAME: &str = "transcribe_gateway_output";

    // Longest API key we are willing to compare
    pub const MAX_API_KEY_LEN: usize = 256;
}

// Environment variable names
pub const ENV_API_KEY: &str = "API_KEY";
pub const ENV_MAX_UPLOAD_MB: &str = "MAX_UPLOAD_MB";
pub const ENV_RATE_LIMIT: &str = "RATE_LIMIT";
pub const ENV_RATE_WINDOW_SECONDS: &str = "RATE_WINDOW_SECONDS";
pub const ENV_HOST: &str = "TRANSCRIBE_GATEWAY_HOST";
pub const ENV_PORT: &str = "TRANSCRIBE_GATEWAY_PORT";
pub const ENV_WORKER_NUMBER: &str = "HTTP_WORKER_NUMBER";
pub const ENV_UPLOAD_TMP_DIR: &str = "UPLOAD_TMP_DIR";
pub const ENV_MODEL: &str = "WHISPER_MODEL_NAME";
pub const ENV_WHISPER_CMD: &str = "WHISPER_CMD";
pub const ENV_OUTPUT_DIR: &str = "WHISPER_OUTPUT_DIR";
pub const ENV_DEVICE: &str = "WHISPER_DEVICE";

/// Server settings
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Resolved worker count, never zero
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let workers = match parse_var::<usize>(ENV_WORKER_NUMBER).unwrap_or(defaults::WORKER_NUMBER) {
            0 => num_cpus::get(),
            n => n,
        };
        Self {
            host: env::var(ENV_HOST).unwrap_or_else(|_| String::from(defaults::HOST)),
            port: parse_var(ENV_PORT).unwrap_or(defaults::PORT),
            workers,
        }
    }
}

/// Admission settings: credential and rate limiting
#[derive(Clone, Debug)]
pub struct GuardConfig {
    /// Shared secret; `None` disables authentication
    pub api_key: Option<String>,
    /// Maximum admitted requests per identity per window
    pub rate_limit: usize,
    /// Length of the sliding window
    pub rate_window: Duration,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            api_key: normalize_api_key(env::var(ENV_API_KEY).ok()),
            rate_limit: parse_var::<usize>(ENV_RATE_LIMIT)
                .filter(|n| *n > 0)
                .unwrap_or(defaults::RATE_LIMIT),
            rate_window: Duration::from_secs(
                parse_var::<u64>(ENV_RATE_WINDOW_SECONDS)
                    .filter(|n| *n > 0)
                    .unwrap_or(defaults::RATE_WINDOW_SECONDS),
            ),
        }
    }
}

impl GuardConfig {
    /// Returns true when a secret is configured
    pub fn auth_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Configuration for the request handlers
#[derive(Clone, Debug)]
pub struct HandlerConfig {
    /// Largest accepted request body in bytes
    pub max_body_bytes: usize,
    /// Directory where uploads are staged while they are transcribed
    pub upload_dir: PathBuf,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: max_upload_bytes(env::var(ENV_MAX_UPLOAD_MB).ok().as_deref()),
            upload_dir: env::var(ENV_UPLOAD_TMP_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir()),
        }
    }
}

impl HandlerConfig {
    /// Ensures the upload directory exists
    pub fn ensure_upload_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.upload_dir)
    }
}

/// Configuration for the whisper command
#[derive(Clone, Debug)]
pub struct WhisperConfig {
    /// Path to the whisper executable
    pub command_path: String,
    /// Model name, always one of `defaults::ALLOWED_MODELS`
    pub model: String,
    /// Inference device passed to the command
    pub device: String,
    /// Scratch directory for the command's output files
    pub output_dir: PathBuf,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            command_path: env::var(ENV_WHISPER_CMD)
                .unwrap_or_else(|_| String::from(defaults::WHISPER_CMD)),
            model: select_model(env::var(ENV_MODEL).ok().as_deref()).to_string(),
            device: env::var(ENV_DEVICE).unwrap_or_else(|_| String::from(defaults::DEVICE)),
            output_dir: env::var(ENV_OUTPUT_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir().join(defaults::OUTPUT_DIR_NAME)),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            debug!("Ignoring unparsable value for {}: {:?}", name, raw);
            None
        }
    }
}

/// Trims the configured secret; a blank secret disables authentication
pub fn normalize_api_key(raw: Option<String>) -> Option<String> {
    raw.map(|key| key.trim().to_string()).filter(|key| !key.is_empty())
}

/// Converts a `MAX_UPLOAD_MB` value to bytes, falling back to the default
/// when the value is missing, unparsable or outside 1..=1024
pub fn max_upload_bytes(raw: Option<&str>) -> usize {
    let mb = raw
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|mb| (1..=defaults::MAX_UPLOAD_MB_CEILING).contains(mb))
        .unwrap_or(defaults::MAX_UPLOAD_MB);
    (mb * 1024 * 1024) as usize
}

/// Picks the model from the allow-list, `medium` otherwise
pub fn select_model(raw: Option<&str>) -> &'static str {
    raw.and_then(|name| defaults::ALLOWED_MODELS.iter().copied().find(|m| *m == name))
        .unwrap_or(defaults::MODEL)
}
