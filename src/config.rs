use anyhow::{anyhow, Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::region::{default_regions, Region, DEFAULT_HUB_URL};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetcherKind {
    #[default]
    Http,
    Chrome,
}

impl FromStr for FetcherKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(FetcherKind::Http),
            "chrome" | "headless" => Ok(FetcherKind::Chrome),
            other => Err(format!("unknown fetcher '{}' (expected http or chrome)", other)),
        }
    }
}

/// Run settings read from the environment (and `.env`), before command-line
/// flags are applied on top.
#[derive(Debug, Clone)]
pub struct Settings {
    pub hub_url: String,
    pub regions: Vec<Region>,
    pub fetcher: FetcherKind,
    pub timeout: Duration,
    pub user_agent: Option<String>,
    pub max_concurrent_cities: usize,
    pub strict_writes: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hub_url: DEFAULT_HUB_URL.to_string(),
            regions: default_regions(),
            fetcher: FetcherKind::Http,
            timeout: Duration::from_secs(30),
            user_agent: None,
            max_concurrent_cities: 1,
            strict_writes: false,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Settings::from_env`] over an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(hub) = lookup("CRAIGSLIST_HUB_URL") {
            settings.hub_url = hub;
        }
        if let Some(regions) = lookup("CRAIGSLIST_REGIONS") {
            settings.regions =
                Region::parse_list(&regions).context("CRAIGSLIST_REGIONS is malformed")?;
        }
        if let Some(kind) = lookup("CRAIGSLIST_FETCHER") {
            settings.fetcher = kind.parse().map_err(|e: String| anyhow!(e))?;
        }
        if let Some(secs) = lookup("CRAIGSLIST_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("CRAIGSLIST_TIMEOUT_SECS '{}' is not a number", secs))?;
            settings.timeout = Duration::from_secs(secs);
        }
        settings.user_agent = lookup("CRAIGSLIST_USER_AGENT").filter(|ua| !ua.trim().is_empty());
        if let Some(n) = lookup("CRAIGSLIST_MAX_CONCURRENT_CITIES") {
            let n: usize = n.trim().parse().with_context(|| {
                format!("CRAIGSLIST_MAX_CONCURRENT_CITIES '{}' is not a number", n)
            })?;
            settings.max_concurrent_cities = n.max(1);
        }
        if let Some(strict) = lookup("CRAIGSLIST_STRICT_WRITES") {
            settings.strict_writes = parse_flag(&strict)
                .ok_or_else(|| anyhow!("CRAIGSLIST_STRICT_WRITES '{}' is not a boolean", strict))?;
        }

        Ok(settings)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
