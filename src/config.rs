use crate::models::Plan;
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Where the dashboard client gets its datasets from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// HTTP calls against the dashboard API.
    Live,
    /// In-process sample catalog, shaped by the same entitlement rules.
    Static,
}

impl FromStr for DataSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(DataSource::Live),
            "static" => Ok(DataSource::Static),
            other => anyhow::bail!("DATA_SOURCE must be 'live' or 'static', got '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub api_base_url: String,
    pub plan_storage_path: PathBuf,
    /// Plan used when nothing valid has been persisted yet.
    pub default_plan: Plan,
    pub data_source: DataSource,
    pub fetch_timeout: Duration,
    pub fetch_max_attempts: u32,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            api_base_url: "http://127.0.0.1:3000".to_string(),
            plan_storage_path: PathBuf::from(".oregon-smb/storage.json"),
            default_plan: Plan::Growth,
            data_source: DataSource::Live,
            fetch_timeout: Duration::from_millis(5000),
            fetch_max_attempts: 3,
            rate_limit_per_second: 10,
            rate_limit_burst: 20,
        }
    }
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let config = Self {
            port: match var("PORT") {
                Some(port) => port
                    .parse()
                    .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
                None => defaults.port,
            },
            api_base_url: match var("API_BASE_URL") {
                Some(url) => validate_base_url(&url)?,
                None => defaults.api_base_url,
            },
            plan_storage_path: var("PLAN_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.plan_storage_path),
            default_plan: match var("DEFAULT_PLAN") {
                Some(plan) => plan
                    .parse::<Plan>()
                    .map_err(|e| anyhow::anyhow!("DEFAULT_PLAN: {}", e))
                    .and_then(|plan| {
                        if plan == Plan::Scale {
                            anyhow::bail!("DEFAULT_PLAN must be 'growth' or 'starter'");
                        }
                        Ok(plan)
                    })?,
                None => defaults.default_plan,
            },
            data_source: match var("DATA_SOURCE") {
                Some(source) => source.parse()?,
                None => defaults.data_source,
            },
            fetch_timeout: match var("FETCH_TIMEOUT_MS") {
                Some(ms) => ms
                    .parse::<u64>()
                    .map_err(|_| anyhow::anyhow!("FETCH_TIMEOUT_MS must be a number"))
                    .and_then(|ms| {
                        if ms == 0 {
                            anyhow::bail!("FETCH_TIMEOUT_MS must be greater than zero");
                        }
                        Ok(Duration::from_millis(ms))
                    })?,
                None => defaults.fetch_timeout,
            },
            fetch_max_attempts: match var("FETCH_MAX_ATTEMPTS") {
                Some(n) => n
                    .parse::<u32>()
                    .map_err(|_| anyhow::anyhow!("FETCH_MAX_ATTEMPTS must be a number"))
                    .and_then(|n| {
                        if !(1..=10).contains(&n) {
                            anyhow::bail!("FETCH_MAX_ATTEMPTS must be between 1 and 10");
                        }
                        Ok(n)
                    })?,
                None => defaults.fetch_max_attempts,
            },
            rate_limit_per_second: match var("RATE_LIMIT_PER_SECOND") {
                Some(n) => n
                    .parse()
                    .map_err(|_| anyhow::anyhow!("RATE_LIMIT_PER_SECOND must be a number"))?,
                None => defaults.rate_limit_per_second,
            },
            rate_limit_burst: match var("RATE_LIMIT_BURST") {
                Some(n) => n
                    .parse()
                    .map_err(|_| anyhow::anyhow!("RATE_LIMIT_BURST must be a number"))?,
                None => defaults.rate_limit_burst,
            },
        };

        tracing::debug!("API base URL: {}", config.api_base_url);
        tracing::debug!("Plan storage: {}", config.plan_storage_path.display());
        tracing::debug!(
            "Default plan: {}, data source: {:?}",
            config.default_plan,
            config.data_source
        );
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

/// Accepts only absolute http(s) URLs; strips any trailing slash.
pub fn validate_base_url(raw: &str) -> anyhow::Result<String> {
    let url = url::Url::parse(raw.trim())
        .map_err(|e| anyhow::anyhow!("API_BASE_URL is not a valid URL: {}", e))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        anyhow::bail!("API_BASE_URL must start with http:// or https://");
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}
