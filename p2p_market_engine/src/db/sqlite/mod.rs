//! SQLite backend for the marketplace.
//!
//! The schema is managed by the migrations in `./migrations`. Call [`SqliteDatabase::migrate`] once at start-up.
mod db;
mod errors;

pub mod offers;
pub mod users;

use std::{env, str::FromStr, time::Duration};

pub use db::SqliteDatabase;
pub use errors::SqliteDatabaseError;
use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

const SQLITE_DB_URL: &str = "sqlite://data/btc_trades.db";
pub const DEFAULT_DB_TIMEOUT: Duration = Duration::from_secs(5);

pub fn db_url() -> String {
    let result = env::var("P2P_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ P2P_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

/// Opens a connection pool. Waiting for a connection, or for a locked database, is bounded by `timeout`; beyond that
/// the operation fails instead of stalling.
pub async fn new_pool(url: &str, max_connections: u32, timeout: Duration) -> Result<SqlitePool, SqliteDatabaseError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true).foreign_keys(true).busy_timeout(timeout);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(timeout)
        .connect_with(options)
        .await?;
    Ok(pool)
}
