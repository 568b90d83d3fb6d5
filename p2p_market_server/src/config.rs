//! Server configuration
//!
//! All settings are read from `P2P_*` environment variables (a `.env` file is honoured too). Missing or malformed
//! values fall back to the defaults below, and the fallback is logged so that a typo doesn't go unnoticed.
use std::{env, fmt::Display, str::FromStr, time::Duration};

use btcpay_tools::BtcPayConfig;
use log::*;

const DEFAULT_P2P_HOST: &str = "127.0.0.1";
const DEFAULT_P2P_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/btc_trades.db";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_DB_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_MARKETPLACE_LIMIT: i64 = 20;
const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout: Duration,
    pub btcpay: BtcPayConfig,
    /// How many recent pending offers the marketplace view scans
    pub marketplace_limit: i64,
    /// Period of the settlement sweep. `None` disables the sweep, leaving only the lazy checks on read.
    pub reconcile_interval: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_P2P_HOST.to_string(),
            port: DEFAULT_P2P_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            db_timeout: DEFAULT_DB_TIMEOUT,
            btcpay: BtcPayConfig::default(),
            marketplace_limit: DEFAULT_MARKETPLACE_LIMIT,
            reconcile_interval: Some(DEFAULT_RECONCILE_INTERVAL),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("P2P_HOST").ok().unwrap_or_else(|| DEFAULT_P2P_HOST.into());
        let port = parse_env_or("P2P_PORT", DEFAULT_P2P_PORT);
        let database_url = env::var("P2P_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ P2P_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.into()
        });
        let db_max_connections = parse_env_or("P2P_DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS);
        let db_timeout = Duration::from_secs(parse_env_or("P2P_DB_TIMEOUT_SECS", DEFAULT_DB_TIMEOUT.as_secs()));
        let btcpay = BtcPayConfig::new_from_env_or_default();
        let marketplace_limit = parse_env_or("P2P_MARKETPLACE_LIMIT", DEFAULT_MARKETPLACE_LIMIT);
        let marketplace_limit = if marketplace_limit > 0 {
            marketplace_limit
        } else {
            warn!("🪛️ P2P_MARKETPLACE_LIMIT must be positive. Using the default, {DEFAULT_MARKETPLACE_LIMIT}.");
            DEFAULT_MARKETPLACE_LIMIT
        };
        let reconcile_interval = reconcile_interval(parse_env_or(
            "P2P_RECONCILE_INTERVAL_SECS",
            DEFAULT_RECONCILE_INTERVAL.as_secs(),
        ));
        Self {
            host,
            port,
            database_url,
            db_max_connections,
            db_timeout,
            btcpay,
            marketplace_limit,
            reconcile_interval,
        }
    }
}

/// A zero interval switches the settlement sweep off.
pub fn reconcile_interval(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn parse_env_or<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => default,
    }
}

/// The marketplace scan size, shared with the route handlers as app data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarketplaceLimit(pub i64);

impl Default for MarketplaceLimit {
    fn default() -> Self {
        Self(DEFAULT_MARKETPLACE_LIMIT)
    }
}
