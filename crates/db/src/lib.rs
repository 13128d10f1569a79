//! PostgreSQL persistence for the ledger.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - `PgLedgerStore`, the database-backed `LedgerStore`
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod store;

pub use migration::Migrator;
pub use store::PgLedgerStore;

use comptable_shared::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Establishes a pooled connection sized from configuration.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .sqlx_logging(false);
    Database::connect(options).await
}
