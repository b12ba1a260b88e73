use anyhow::{anyhow, Result};
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const CMC_BASE_URL: &str = "https://pro-api.coinmarketcap.com";
pub const YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Runtime settings, read from the environment (and `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    /// `CMC_API_KEY`; listings are unavailable without it.
    pub cmc_api_key: Option<String>,
    pub cmc_base_url: String,
    pub yahoo_base_url: String,
    pub user_agent: String,
    pub listings_limit: usize,
    pub listings_ttl: Duration,
    pub history_days: u32,
    pub logo_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cmc_api_key: None,
            cmc_base_url: CMC_BASE_URL.to_string(),
            yahoo_base_url: YAHOO_BASE_URL.to_string(),
            user_agent: format!("coinboard/{}", env!("CARGO_PKG_VERSION")),
            listings_limit: 100,
            listings_ttl: Duration::from_secs(600),
            history_days: 30,
            logo_path: PathBuf::from("logo.jpg"),
        }
    }
}

impl Config {
    /// Read the config from the process environment, falling back to `.env`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    /// Read the config through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Self {
            cmc_api_key: get("CMC_API_KEY"),
            cmc_base_url: get("CMC_BASE_URL").unwrap_or(defaults.cmc_base_url),
            yahoo_base_url: get("YAHOO_BASE_URL").unwrap_or(defaults.yahoo_base_url),
            user_agent: get("USER_AGENT").unwrap_or(defaults.user_agent),
            listings_limit: parse(get("LISTINGS_LIMIT"), "LISTINGS_LIMIT", defaults.listings_limit)?,
            listings_ttl: Duration::from_secs(parse(
                get("LISTINGS_TTL_SECS"),
                "LISTINGS_TTL_SECS",
                defaults.listings_ttl.as_secs(),
            )?),
            history_days: parse(get("HISTORY_DAYS"), "HISTORY_DAYS", defaults.history_days)?,
            logo_path: get("LOGO_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.logo_path),
        })
    }
}

fn parse<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key}={raw} is invalid: {e}")),
        None => Ok(default),
    }
}
