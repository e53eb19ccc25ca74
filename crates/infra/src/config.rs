//! Configuration loading and representation.

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{info, warn};

use franchiseops_core::InvariantMode;
use franchiseops_observability::LogFormat;

use crate::store::{Database, InMemoryDatabase, PostgresDatabase, StoreResult};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_LOG_FILTER: &str = "info";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

/// Process configuration, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// PostgreSQL URL; `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub log_filter: String,
    pub log_format: LogFormat,
    pub invariant_mode: InvariantMode,
    pub db_max_connections: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_format: LogFormat::Json,
            invariant_mode: InvariantMode::Strict,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset or empty keys take their
    /// default; unparseable values take their default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let invariant_mode = match get("FRANCHISEOPS_STRICT_INVARIANTS") {
            None => defaults.invariant_mode,
            Some(raw) => match parse_flag(&raw) {
                Some(true) => InvariantMode::Strict,
                Some(false) => InvariantMode::Compatible,
                None => {
                    warn!(
                        key = "FRANCHISEOPS_STRICT_INVARIANTS",
                        value = %raw,
                        "invalid boolean, using default"
                    );
                    defaults.invariant_mode
                }
            },
        };

        Self {
            database_url: get("DATABASE_URL"),
            bind_addr: parse_or(
                get("FRANCHISEOPS_BIND_ADDR"),
                "FRANCHISEOPS_BIND_ADDR",
                defaults.bind_addr,
            ),
            log_filter: get("RUST_LOG").unwrap_or(defaults.log_filter),
            log_format: parse_or(
                get("FRANCHISEOPS_LOG_FORMAT"),
                "FRANCHISEOPS_LOG_FORMAT",
                defaults.log_format,
            ),
            invariant_mode,
            db_max_connections: parse_or(
                get("FRANCHISEOPS_DB_MAX_CONNECTIONS"),
                "FRANCHISEOPS_DB_MAX_CONNECTIONS",
                defaults.db_max_connections,
            ),
        }
    }

    /// Open the configured record store.
    ///
    /// PostgreSQL when `database_url` is set (schema created if missing),
    /// otherwise a fresh in-memory store.
    pub async fn open_database(&self) -> StoreResult<Arc<dyn Database>> {
        match &self.database_url {
            Some(url) => {
                let db = PostgresDatabase::connect(url, self.db_max_connections).await?;
                db.ensure_schema().await?;
                info!(max_connections = self.db_max_connections, "using postgres record store");
                Ok(Arc::new(db))
            }
            None => {
                info!("DATABASE_URL not set, using in-memory record store");
                Ok(Arc::new(InMemoryDatabase::new()))
            }
        }
    }
}

fn parse_or<T>(raw: Option<String>, key: &'static str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|err| {
            warn!(key, value = %raw, error = %err, "invalid value, using default");
            default
        }),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
