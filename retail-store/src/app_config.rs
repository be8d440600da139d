use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub orders: OrdersConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_backend")]
    pub backend: DatabaseBackend,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_backend() -> DatabaseBackend {
    DatabaseBackend::Postgres
}
fn default_max_connections() -> u32 { 10 }
fn default_acquire_timeout() -> u64 { 3 }
fn default_true() -> bool { true }

#[derive(Debug, Deserialize, Clone)]
pub struct OrdersConfig {
    #[serde(default = "default_cooldown_seconds")]
    pub cooldown_seconds: i64,
    #[serde(default = "default_page_limit")]
    pub default_page_limit: i64,
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i32,
}

fn default_cooldown_seconds() -> i64 { 300 }
fn default_page_limit() -> i64 { 50 }
fn default_low_stock_threshold() -> i32 { 5 }

impl Default for OrdersConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: default_cooldown_seconds(),
            default_page_limit: default_page_limit(),
            low_stock_threshold: default_low_stock_threshold(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `RETAIL__ORDERS__COOLDOWN_SECONDS=60`
            .add_source(config::Environment::with_prefix("RETAIL").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let cfg = config::Config::builder()
            .set_override("server.port", 8080)
            .unwrap()
            .set_override("database.backend", "memory")
            .unwrap()
            .build()
            .unwrap();
        let cfg: Config = cfg.try_deserialize().unwrap();

        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.database.backend, DatabaseBackend::Memory);
        assert_eq!(cfg.database.max_connections, 10);
        assert_eq!(cfg.orders.cooldown_seconds, 300);
        assert_eq!(cfg.orders.default_page_limit, 50);
        assert_eq!(cfg.orders.low_stock_threshold, 5);
    }
}
