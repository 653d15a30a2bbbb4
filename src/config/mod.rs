//! Configuration module for the fleet dashboard.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::AppError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the fleet REST backend, without trailing slash
    pub api_base_url: String,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// How long a cached table response counts as fresh
    pub stale_time: Duration,
    /// How long an unused cached response is kept at all
    pub gc_time: Duration,
    /// Fetch retries for the robots table
    pub robot_retries: u32,
    /// Fetch retries for the users table
    pub user_retries: u32,
    /// Longest location URL a navigation may produce
    pub max_url_len: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let api_base_url = env::var("FLEET_API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:5005/api".to_string())
            .trim_end_matches('/')
            .to_string();

        let bind_addr = parse_var("FLEET_BIND_ADDR", "127.0.0.1:3000")?;
        let log_level = env::var("FLEET_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let stale_time = Duration::from_secs(parse_var("FLEET_STALE_TIME_SECS", "30")?);
        let gc_time = Duration::from_secs(parse_var("FLEET_GC_TIME_SECS", "300")?);
        let robot_retries = parse_var("FLEET_ROBOT_RETRIES", "3")?;
        let user_retries = parse_var("FLEET_USER_RETRIES", "2")?;
        let max_url_len = parse_var("FLEET_MAX_URL_LEN", "8192")?;

        Ok(Self {
            api_base_url,
            bind_addr,
            log_level,
            stale_time,
            gc_time,
            robot_retries,
            user_retries,
            max_url_len,
        })
    }
}

fn parse_var<T: FromStr>(name: &str, default: &str) -> Result<T, AppError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .map_err(|_| AppError::Config(format!("Invalid {} value: {:?}", name, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Both cases share one test so they never race on the process environment
        for name in [
            "FLEET_API_BASE_URL",
            "FLEET_BIND_ADDR",
            "FLEET_LOG_LEVEL",
            "FLEET_STALE_TIME_SECS",
            "FLEET_GC_TIME_SECS",
            "FLEET_ROBOT_RETRIES",
            "FLEET_USER_RETRIES",
            "FLEET_MAX_URL_LEN",
        ] {
            env::remove_var(name);
        }

        let config = Config::from_env().unwrap();

        assert_eq!(config.api_base_url, "http://localhost:5005/api");
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:3000");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.stale_time, Duration::from_secs(30));
        assert_eq!(config.gc_time, Duration::from_secs(300));
        assert_eq!(config.robot_retries, 3);
        assert_eq!(config.user_retries, 2);
        assert_eq!(config.max_url_len, 8192);

        env::set_var("FLEET_STALE_TIME_SECS", "soon");
        let err = Config::from_env().unwrap_err();
        env::remove_var("FLEET_STALE_TIME_SECS");

        assert_eq!(err.error_code(), "CONFIG_ERROR");
        assert!(err.message().contains("FLEET_STALE_TIME_SECS"));
    }
}
