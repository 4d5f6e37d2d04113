pub mod queries;

use std::sync::Arc;

use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::config::Config;
use crate::error::Result;
use crate::remote::ProvisioningClient;
use crate::token::TokenKey;

pub type DbPool = r2d2::Pool<SqliteConnectionManager>;

/// Shared application state handed to every handler.
///
/// Everything in here is read-only after startup: the walled-garden IP is
/// resolved once before the listener binds, and the token key never
/// rotates at runtime.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub remote: Arc<ProvisioningClient>,
    pub token_key: Arc<TokenKey>,
    /// VPN server IP cached at boot; `None` means the remote lookup failed
    /// or returned nothing, and config generation degrades to its fallback.
    pub walled_garden_ip: Option<String>,
}

pub fn init_pool(database_path: &str) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(database_path).with_init(|conn| {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
    });
    r2d2::Pool::builder()
        .build(manager)
        .map_err(Into::into)
}

/// Create the schema if it does not exist. UNIQUE constraints on
/// `identity`, `auth_code`, tenant `slug`, and tenant `api_key` are the
/// actual race-safety mechanism for concurrent creates.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS equipments (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            tenant      TEXT NOT NULL,
            name        TEXT NOT NULL,
            identity    TEXT NOT NULL UNIQUE,
            auth_code   TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            ip_address  TEXT,
            status      TEXT NOT NULL DEFAULT 'active',
            created_at  INTEGER NOT NULL,
            updated_at  INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tenants (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            slug        TEXT NOT NULL UNIQUE,
            api_key     TEXT NOT NULL UNIQUE,
            created_at  INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_equipments_tenant ON equipments(tenant);",
    )?;
    Ok(())
}
