use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use redactor_engine::{PollSettings, StorageConfig};
use thiserror::Error;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

/// Everything the process needs, validated up front. A missing bucket name is
/// a fatal configuration error surfaced before any network activity.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub ingest_bucket: String,
    pub output_bucket: String,
    pub listen_addr: SocketAddr,
    pub storage: StorageConfig,
    pub poll: PollSettings,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with the lookup injected, so
    /// tests never have to mutate the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let ingest_bucket = require(&lookup, "REDACTOR_INGEST_BUCKET")?;
        let output_bucket = require(&lookup, "REDACTOR_OUTPUT_BUCKET")?;

        let listen_raw =
            lookup("REDACTOR_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_raw
            .trim()
            .parse()
            .map_err(|err: std::net::AddrParseError| ConfigError::Invalid {
                var: "REDACTOR_LISTEN_ADDR",
                message: err.to_string(),
            })?;

        let storage = match lookup("REDACTOR_STORAGE_BACKEND").as_deref() {
            None | Some("s3") => StorageConfig::S3 {
                endpoint: lookup("REDACTOR_S3_ENDPOINT"),
                region: require(&lookup, "REDACTOR_S3_REGION")?,
                access_key_id: require(&lookup, "AWS_ACCESS_KEY_ID")?,
                secret_access_key: require(&lookup, "AWS_SECRET_ACCESS_KEY")?,
            },
            Some("fs") => StorageConfig::Fs {
                root: PathBuf::from(require(&lookup, "REDACTOR_FS_ROOT")?),
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "REDACTOR_STORAGE_BACKEND",
                    message: format!("unknown backend {other:?}, expected \"s3\" or \"fs\""),
                })
            }
        };

        let mut poll = PollSettings::default();
        if let Some(raw) = lookup("REDACTOR_POLL_MAX_ATTEMPTS") {
            poll.max_attempts = parse(&raw, "REDACTOR_POLL_MAX_ATTEMPTS")?;
            if poll.max_attempts == 0 {
                return Err(ConfigError::Invalid {
                    var: "REDACTOR_POLL_MAX_ATTEMPTS",
                    message: "must be at least 1".to_string(),
                });
            }
        }
        if let Some(raw) = lookup("REDACTOR_POLL_INITIAL_DELAY_MS") {
            poll.initial_delay = Duration::from_millis(parse(&raw, "REDACTOR_POLL_INITIAL_DELAY_MS")?);
        }
        if let Some(raw) = lookup("REDACTOR_POLL_MAX_DELAY_MS") {
            poll.max_delay = Duration::from_millis(parse(&raw, "REDACTOR_POLL_MAX_DELAY_MS")?);
        }

        Ok(Self {
            ingest_bucket,
            output_bucket,
            listen_addr,
            storage,
            poll,
        })
    }
}

fn require(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<String, ConfigError> {
    match lookup(var) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(var)),
    }
}

fn parse<T>(raw: &str, var: &'static str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse().map_err(|err: T::Err| ConfigError::Invalid {
        var,
        message: err.to_string(),
    })
}
