use crate::{
    constants::{
        DEFAULT_API_URL, DEFAULT_GRAPH_URL, HEALTH_PATH, HTTP_DEFAULT_TIMEOUT_SECS,
        KEEP_ALIVE_INITIAL_DELAY_SECS, KEEP_ALIVE_INTERVAL_SECS,
    },
    integrations::http::join_url,
    services::KeepAliveSettings,
    utils::parse_flag,
};
use serde::Deserialize;
use std::{env, time::Duration};
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Upstreams
    pub api_url: String,
    pub graph_url: String,
    pub http_timeout_secs: u64,

    // Keep-alive
    pub keep_alive_enabled: bool,
    pub keep_alive_interval_secs: u64,
    pub keep_alive_initial_delay_secs: u64,

    // CORS
    pub cors_allowed_origins: String,
}

// Internal helper that reads a variable, treating blank values as unset.
fn env_non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let environment =
            env_non_empty("ENVIRONMENT").unwrap_or_else(|| "development".to_string());
        let keep_alive_enabled = match env_non_empty("KEEP_ALIVE_ENABLED") {
            Some(raw) => parse_flag(&raw),
            None => environment == "production",
        };

        Ok(Config {
            host: env_non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: env_non_empty("PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()?,
            environment,

            api_url: env_non_empty("KAISIGN_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            graph_url: env_non_empty("KAISIGN_GRAPH_URL")
                .unwrap_or_else(|| DEFAULT_GRAPH_URL.to_string()),
            http_timeout_secs: env_non_empty("HTTP_TIMEOUT_SECS")
                .map(|raw| raw.parse::<u64>())
                .transpose()?
                .unwrap_or(HTTP_DEFAULT_TIMEOUT_SECS),

            keep_alive_enabled,
            keep_alive_interval_secs: env_non_empty("KEEP_ALIVE_INTERVAL_SECS")
                .map(|raw| raw.parse::<u64>())
                .transpose()?
                .unwrap_or(KEEP_ALIVE_INTERVAL_SECS),
            keep_alive_initial_delay_secs: env_non_empty("KEEP_ALIVE_INITIAL_DELAY_SECS")
                .map(|raw| raw.parse::<u64>())
                .transpose()?
                .unwrap_or(KEEP_ALIVE_INITIAL_DELAY_SECS),

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        Url::parse(&self.api_url)
            .map_err(|e| anyhow::anyhow!("KAISIGN_API_URL is not a valid URL: {}", e))?;
        Url::parse(&self.graph_url)
            .map_err(|e| anyhow::anyhow!("KAISIGN_GRAPH_URL is not a valid URL: {}", e))?;

        if self.http_timeout_secs == 0 {
            anyhow::bail!("HTTP_TIMEOUT_SECS must be > 0");
        }
        if self.keep_alive_enabled && self.keep_alive_interval_secs == 0 {
            anyhow::bail!("KEEP_ALIVE_INTERVAL_SECS must be > 0 when keep-alive is enabled");
        }
        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }
        if !self.api_url.starts_with("https://") {
            tracing::warn!("Metadata backend is not served over HTTPS: {}", self.api_url);
        }

        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn health_url(&self) -> String {
        join_url(&self.api_url, HEALTH_PATH)
    }

    pub fn keep_alive_settings(&self) -> KeepAliveSettings {
        KeepAliveSettings {
            enabled: self.keep_alive_enabled,
            interval: Duration::from_secs(self.keep_alive_interval_secs),
            initial_delay: Duration::from_secs(self.keep_alive_initial_delay_secs),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        api_url: "https://backend.test".to_string(),
        graph_url: "https://graph.test/query".to_string(),
        http_timeout_secs: 5,
        keep_alive_enabled: false,
        keep_alive_interval_secs: 600,
        keep_alive_initial_delay_secs: 30,
        cors_allowed_origins: "*".to_string(),
    }
}
