/// Persistence layer
///
/// Tracked URLs and their latest check records live in a local libsql
/// database behind the [`ResultStore`](upcheck::ResultStore) contract.
pub mod migrations;
pub mod store;

pub use store::LibsqlStore;

use anyhow::Result;

/// Initialize database with schema
pub async fn initialize_database(conn: &libsql::Connection) -> Result<()> {
    migrations::run_migrations(conn).await
}
