use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_NAMESPACE: &str = "webhooks";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:0";
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Startup configuration, resolved once from the environment and handed to
/// the server. Handlers never read the environment themselves.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the durable store (a directory for the filesystem backend).
    pub bucket: PathBuf,
    /// Key prefix for stored deliveries.
    pub namespace: String,
    pub bind_addr: SocketAddr,
    /// Defensive cap on the inbound request body.
    pub max_body_bytes: usize,
    /// Wall-clock budget for the single store write.
    pub store_timeout: Duration,
    /// When set, deliveries must carry a valid HMAC signature header.
    pub webhook_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bucket = lookup("STORAGE_BUCKET")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing("STORAGE_BUCKET"))?;

        let namespace =
            lookup("STORAGE_NAMESPACE").unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

        let bind_addr = parse(lookup("BIND_ADDR"), "BIND_ADDR", DEFAULT_BIND_ADDR.parse().ok())?;

        let max_body_bytes = parse(
            lookup("MAX_BODY_BYTES"),
            "MAX_BODY_BYTES",
            Some(DEFAULT_MAX_BODY_BYTES),
        )?;

        let timeout_secs = parse(
            lookup("STORE_TIMEOUT_SECS"),
            "STORE_TIMEOUT_SECS",
            Some(DEFAULT_STORE_TIMEOUT_SECS),
        )?;

        let webhook_secret = lookup("WEBHOOK_SECRET").filter(|v| !v.is_empty());

        Ok(Self {
            bucket,
            namespace,
            bind_addr,
            max_body_bytes,
            store_timeout: Duration::from_secs(timeout_secs),
            webhook_secret,
        })
    }
}

fn parse<T: std::str::FromStr>(
    value: Option<String>,
    name: &'static str,
    default: Option<T>,
) -> Result<T, ConfigError> {
    match value {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => default.ok_or(ConfigError::Missing(name)),
    }
}
