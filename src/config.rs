use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::services::booking::ReleaseWindow;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub rust_log: String,
    pub bind_addr: SocketAddr,
    pub release_window: ReleaseWindow,
    pub session_secure: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is fine; the environment may already be set.
        let _ = dotenvy::dotenv();

        let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
        let bind_addr = parse_var("BIND_ADDR", "0.0.0.0:3000")?;
        let release_window = parse_var("TABLE_RELEASE_WINDOW", "today")?;
        let session_secure = parse_var("SESSION_SECURE", "false")?;

        Ok(Self {
            database_url,
            rust_log,
            bind_addr,
            release_window,
            session_secure,
        })
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: &str) -> Result<T, ConfigError> {
    let value = env::var(name).unwrap_or_else(|_| default.to_string());
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}
