//! SQLite backend.
//!
//! [`SqliteDatabase`] implements every backend trait. The submodules hold the individual queries as free functions
//! over a `SqliteConnection`, so that they can be composed into a single transaction.
//!
//! Queries always run to completion (`fetch_all` or `execute`, never `fetch_one`/`fetch_optional`). A statement that
//! is only stepped partway keeps the pooled connection's read snapshot, or its uncommitted write, open.
mod admins;
mod db;
mod errors;
mod ledger;
mod logs;
mod memberships;
mod menu_items;
mod orders;
mod stores;
mod users;
mod verification;

use std::{env, str::FromStr};

pub use db::SqliteDatabase;
pub use errors::SqliteDatabaseError;
use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};

const SQLITE_DB_URL: &str = "sqlite://data/mini_order.db";

pub fn db_url() -> String {
    let result = env::var("MO_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ MO_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

/// Opens a connection pool. The database file is created if it does not exist yet.
///
/// WAL journaling lets readers proceed while an order transaction holds the write lock.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqliteDatabaseError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
