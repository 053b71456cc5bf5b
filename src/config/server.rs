//! Server settings read from the environment.
//!
//! Values come from the process environment, which `main` populates from an
//! optional `.env` file first. Every setting has a default.

use crate::config::database::get_database_url;
use crate::errors::{Error, Result};
use std::{env, str::FromStr};
use tracing::info;

/// Runtime settings for the HTTP server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Path of the reference data seed file
    pub seed_path: String,
}

impl AppConfig {
    /// Reads `DATABASE_URL`, `HOST`, `PORT` and `CATALOG_SEED`.
    ///
    /// # Errors
    /// Returns `Error::Config` if `PORT` is set but is not a valid port number.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: get_database_url(),
            host: var_or("HOST", "0.0.0.0"),
            port: parse_var("PORT", 5000)?,
            seed_path: var_or("CATALOG_SEED", "catalog.toml"),
        })
    }

    /// `host:port` string for binding the listener
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e| Error::Config {
            message: format!("Invalid {key} value '{raw}': {e}"),
        }),
        Err(_) => Ok(default),
    }
}
