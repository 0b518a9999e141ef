//! Process configuration read from the environment.
//!
//! `main` loads `.env` through `dotenvy` before calling [`Config::from_env`],
//! so every value can live either in the shell or in that file.

use std::env;
use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

use crate::services::espn::{Credentials, ESPN_BASE_URL};
use crate::services::stats::{FANGRAPHS_BASE_URL, SAVANT_BASE_URL};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://fantasy_baseball.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not in the correct format: {value}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub host: IpAddr,
    pub port: u16,
    /// Private-league cookies. `None` unless both `ESPN_S2` and `ESPN_SWID` are set.
    pub espn_credentials: Option<Credentials>,
    pub espn_base_url: String,
    pub fangraphs_base_url: String,
    pub savant_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let espn_credentials = match (env::var("ESPN_S2").ok(), env::var("ESPN_SWID").ok()) {
            (Some(espn_s2), Some(swid)) => Some(Credentials { espn_s2, swid }),
            _ => None,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5)?,
            host: parse_var("HOST", IpAddr::from([0, 0, 0, 0]))?,
            port: parse_var("PORT", 8000)?,
            espn_credentials,
            espn_base_url: env::var("ESPN_API_BASE_URL")
                .unwrap_or_else(|_| ESPN_BASE_URL.to_string()),
            fangraphs_base_url: env::var("FANGRAPHS_BASE_URL")
                .unwrap_or_else(|_| FANGRAPHS_BASE_URL.to_string()),
            savant_base_url: env::var("SAVANT_BASE_URL")
                .unwrap_or_else(|_| SAVANT_BASE_URL.to_string()),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_falls_back_to_default_when_unset() {
        let port: u16 = parse_var("FANTASY_BASEBALL_TEST_UNSET_PORT", 8000).unwrap();
        assert_eq!(port, 8000);
    }

    #[test]
    fn addr_combines_host_and_port() {
        let config = Config {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 1,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 9000,
            espn_credentials: None,
            espn_base_url: ESPN_BASE_URL.to_string(),
            fangraphs_base_url: FANGRAPHS_BASE_URL.to_string(),
            savant_base_url: SAVANT_BASE_URL.to_string(),
        };
        assert_eq!(config.addr().to_string(), "127.0.0.1:9000");
    }
}
