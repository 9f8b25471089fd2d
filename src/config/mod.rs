//! Process configuration from environment variables (a `.env` file is loaded first by the binary).

use crate::error::ConfigError;
use std::str::FromStr;

/// Which store backs the resources.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

impl FromStr for StoreKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreKind::Postgres),
            "memory" => Ok(StoreKind::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    /// PostgreSQL schema holding the entity tables.
    pub schema: String,
    pub store: StoreKind,
    pub bind_addr: String,
    /// Pool size for PostgreSQL; session bound for the memory store.
    pub max_connections: u32,
    pub body_limit: usize,
    /// Create missing tables on boot.
    pub migrate: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_url: "postgres://localhost/northwind".into(),
            schema: "northwind".into(),
            store: StoreKind::Postgres,
            bind_addr: "0.0.0.0:3000".into(),
            max_connections: 5,
            body_limit: 1024 * 1024,
            migrate: true,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source; unset variables take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = AppConfig::default();
        Ok(AppConfig {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            schema: lookup("NORTHWIND_SCHEMA").unwrap_or(defaults.schema),
            store: parse_var(&lookup, "NORTHWIND_STORE", defaults.store)?,
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            max_connections: parse_var(&lookup, "DB_MAX_CONNECTIONS", defaults.max_connections)?,
            body_limit: parse_var(&lookup, "BODY_LIMIT_BYTES", defaults.body_limit)?,
            migrate: parse_var(&lookup, "NORTHWIND_MIGRATE", defaults.migrate)?,
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}
