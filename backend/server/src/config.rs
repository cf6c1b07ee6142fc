use std::{env, fmt::Display, fs::read_to_string, str::FromStr, time::Duration};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend {other:?}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub store_backend: StoreBackend,
    pub redis_url: String,
    pub table_key: String,
    pub lock_wait: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        let redis_url: String = try_load("REDIS_URL", "redis://127.0.0.1:6379")?;

        let redis_url = match read_secret("REDIS_PASSWORD") {
            Some(password) => with_password(&redis_url, &password)?,
            None => redis_url,
        };

        Ok(Self {
            port: try_load("RUST_PORT", "8080")?,
            store_backend: try_load("STORE_BACKEND", "redis")?,
            redis_url,
            table_key: try_load("TABLE_KEY", "certificates")?,
            lock_wait: Duration::from_millis(try_load("LOCK_WAIT_MS", "10000")?),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            store_backend: StoreBackend::Memory,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            table_key: "certificates".to_string(),
            lock_wait: Duration::from_secs(10),
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        anyhow::anyhow!("Environment misconfigured: {key}={raw}: {e}")
    })
}

fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            info!("No {secret_name} secret loaded: {e}");
        })
        .ok()
        .filter(|s| !s.is_empty())
}

fn with_password(redis_url: &str, password: &str) -> Result<String> {
    let (scheme, rest) = redis_url
        .split_once("://")
        .context("REDIS_URL is missing a scheme")?;

    if rest.contains('@') {
        bail!("REDIS_URL already carries credentials, refusing to splice REDIS_PASSWORD");
    }

    Ok(format!("{scheme}://:{password}@{rest}"))
}
