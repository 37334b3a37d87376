//! # config — Config from Environment Variables
//!
//! | Var                  | Default        |
//! |----------------------|----------------|
//! | `BIND_ADDR`          | `0.0.0.0:3001` |
//! | `API_KEY`            | *(none)*       |
//! | `CORS_ORIGIN`        | *(any)*        |
//! | `TRADE_EXIT_POLICY`  | `require_exit` |
//! | `DATABASE_URL`       | *(none)*       |
//! | `DB_MAX_CONNECTIONS` | `10`           |

use std::net::SocketAddr;

use anyhow::{anyhow, Context};

use crate::validation::{ExitPolicy, ValidationPolicy};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr:          SocketAddr,
    /// `None` = dev mode, every request allowed.
    pub api_key:            Option<String>,
    /// `None` = any origin.
    pub cors_origin:        Option<String>,
    pub policy:             ValidationPolicy,
    pub database_url:       Option<String>,
    pub db_max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key → value source.  Blank values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3001".to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR must be a socket address, e.g. 0.0.0.0:3001")?;

        let exit = match get("TRADE_EXIT_POLICY") {
            Some(raw) => raw.parse::<ExitPolicy>().map_err(|e| anyhow!(e))?,
            None => ExitPolicy::default(),
        };

        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .context("DB_MAX_CONNECTIONS must be a number")?,
            None => 10,
        };

        Ok(Self {
            bind_addr,
            api_key: get("API_KEY"),
            cors_origin: get("CORS_ORIGIN"),
            policy: ValidationPolicy { exit },
            database_url: get("DATABASE_URL"),
            db_max_connections,
        })
    }
}
