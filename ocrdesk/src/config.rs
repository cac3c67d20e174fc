use serde::Deserialize;
use std::env;
use std::fmt;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_opt<T: std::str::FromStr>(var: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Ignoring.", val, var, e);
                None
            }
        },
        Err(_) => None,
    }
}

pub const DEFAULT_OCR_ENDPOINT: &str = "https://api.ocr.space/parse/image";

/// 1 MiB, the OCR.Space free-tier file limit.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub ocr: OcrConfig,
    pub upload: UploadConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base URL that share links are built on.
    pub public_url: String,
}

#[derive(Clone, Deserialize)]
pub struct OcrConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub timeout_secs: u64,
    pub engine: u8,
    pub default_language: String,
}

// Hand-written so the API key never reaches a log line.
impl fmt::Debug for OcrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .field("engine", &self.engine)
            .field("default_language", &self.default_language)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub max_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub history_limit: usize,
    pub idle_timeout_secs: u64,
    pub max_active: usize,
    pub sweep_interval_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_OCR_ENDPOINT.to_string(),
            timeout_secs: 60,
            engine: 2,
            default_language: "eng".to_string(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_limit: 20,
            idle_timeout_secs: 3600,
            max_active: 1024,
            sweep_interval_secs: 60,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let ocr_defaults = OcrConfig::default();
        let session_defaults = SessionConfig::default();

        Self {
            server: ServerConfig {
                host: env::var("OCRDESK_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("OCRDESK_PORT", 8501),
                public_url: env::var("OCRDESK_PUBLIC_URL")
                    .unwrap_or_else(|_| "http://localhost:8501".to_string()),
            },
            ocr: OcrConfig {
                api_key: env::var("OCR_SPACE_API_KEY")
                    .ok()
                    .filter(|key| !key.trim().is_empty()),
                endpoint: env::var("OCR_SPACE_ENDPOINT").unwrap_or(ocr_defaults.endpoint),
                timeout_secs: parse_env_or("OCR_TIMEOUT", ocr_defaults.timeout_secs),
                engine: parse_env_opt("OCR_ENGINE")
                    .filter(|engine| (1..=3).contains(engine))
                    .unwrap_or(ocr_defaults.engine),
                default_language: env::var("OCR_DEFAULT_LANGUAGE")
                    .unwrap_or(ocr_defaults.default_language),
            },
            upload: UploadConfig {
                max_bytes: parse_env_or("UPLOAD_MAX_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            },
            session: SessionConfig {
                history_limit: parse_env_or(
                    "SESSION_HISTORY_LIMIT",
                    session_defaults.history_limit,
                ),
                idle_timeout_secs: parse_env_or(
                    "SESSION_IDLE_TIMEOUT",
                    session_defaults.idle_timeout_secs,
                ),
                max_active: parse_env_or("SESSION_MAX_ACTIVE", session_defaults.max_active),
                sweep_interval_secs: parse_env_or(
                    "SESSION_SWEEP_INTERVAL",
                    session_defaults.sweep_interval_secs,
                ),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}
