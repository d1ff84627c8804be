// ⚙️ Configuration - everything comes from the environment
//
// Startup fails here, with the offending variable named, before any network
// activity happens.

use crate::oauth::Credentials;
use crate::types::DetectionMode;
use anyhow::{anyhow, bail, Context, Result};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30 * 60;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Clone)]
pub struct Config {
    /// None only in dry-run mode
    pub credentials: Option<Credentials>,

    pub port: u16,
    pub mode: DetectionMode,
    pub poll_interval: Duration,
    pub http_timeout: Duration,

    /// Announce what the very first bulk cycle finds (normally it only primes the ledger)
    pub announce_first_cycle: bool,

    pub dry_run: bool,
    pub template_seed: Option<u64>,
    pub language: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let dry_run = parse_flag(&get, "DEATHWATCH_DRY_RUN")?.unwrap_or(false);

        let credentials = match read_credentials(&get) {
            Ok(credentials) => Some(credentials),
            Err(_) if dry_run => None,
            Err(e) => return Err(e),
        };

        let mode = match get("DEATHWATCH_MODE") {
            Some(value) => DetectionMode::parse(&value)
                .ok_or_else(|| anyhow!("DEATHWATCH_MODE must be 'bulk' or 'stream', got '{}'", value))?,
            None => DetectionMode::Bulk,
        };

        let poll_secs = parse_number(&get, "DEATHWATCH_POLL_INTERVAL_SECS")?
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        let timeout_secs = parse_number(&get, "DEATHWATCH_HTTP_TIMEOUT_SECS")?
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        if poll_secs == 0 || timeout_secs == 0 {
            bail!("Polling interval and HTTP timeout must be at least one second");
        }

        Ok(Config {
            credentials,
            port: parse_number(&get, "PORT")?.unwrap_or(DEFAULT_PORT),
            mode,
            poll_interval: Duration::from_secs(poll_secs),
            http_timeout: Duration::from_secs(timeout_secs),
            announce_first_cycle: parse_flag(&get, "DEATHWATCH_ANNOUNCE_FIRST_CYCLE")?
                .unwrap_or(false),
            dry_run,
            template_seed: parse_number(&get, "DEATHWATCH_TEMPLATE_SEED")?,
            language: get("DEATHWATCH_LANGUAGE").unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
        })
    }
}

fn read_credentials<G>(get: &G) -> Result<Credentials>
where
    G: Fn(&str) -> Option<String>,
{
    let required = |key: &str| {
        get(key).ok_or_else(|| anyhow!("{} environment variable is required", key))
    };

    Ok(Credentials {
        consumer_key: required("CONSUMERKEY")?,
        consumer_secret: required("CONSUMERSECRET")?,
        access_token: required("ACCESSTOKEN")?,
        access_token_secret: required("ACCESSTOKENSECRET")?,
    })
}

fn parse_number<G, T>(get: &G, key: &str) -> Result<Option<T>>
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    get(key)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .with_context(|| format!("{} must be a number, got '{}'", key, value))
        })
        .transpose()
}

fn parse_flag<G>(get: &G, key: &str) -> Result<Option<bool>>
where
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|value| match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(anyhow!("{} must be true or false, got '{}'", key, value)),
        })
        .transpose()
}

// ============================================================================
// TESTS
// ============================================================================
