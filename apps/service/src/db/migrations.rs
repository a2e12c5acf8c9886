use anyhow::Result;
use libsql::Connection;

/// Schema version - increment when making schema changes
const SCHEMA_VERSION: i32 = 1;

/// Run database migrations
///
/// This is the single source of truth for the database schema.
pub async fn run_migrations(conn: &Connection) -> Result<()> {
    // Create schema_migrations table first (tracks applied migrations)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL,
            description TEXT
        )",
        (),
    )
    .await?;

    // Check current schema version
    let current_version = get_current_version(conn).await?;

    if current_version >= SCHEMA_VERSION {
        tracing::info!("Database schema is up to date (version {})", current_version);
        return Ok(());
    }

    tracing::info!("Running migrations from version {} to {}", current_version, SCHEMA_VERSION);

    if current_version < 1 {
        run_migration_v1(conn).await?;
        record_migration(conn, 1, "Initial schema").await?;
    }

    tracing::info!("Database migrations completed successfully (now at version {})", SCHEMA_VERSION);
    Ok(())
}

/// Get current schema version from database
async fn get_current_version(conn: &Connection) -> Result<i32> {
    let mut rows = conn
        .query("SELECT MAX(version) FROM schema_migrations", ())
        .await?;

    if let Some(row) = rows.next().await? {
        let version: Option<i32> = row.get(0)?;
        Ok(version.unwrap_or(0))
    } else {
        Ok(0)
    }
}

/// Record that a migration was applied
async fn record_migration(conn: &Connection, version: i32, description: &str) -> Result<()> {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;

    conn.execute(
        "INSERT INTO schema_migrations (version, applied_at, description) VALUES (?, ?, ?)",
        libsql::params![version, now, description],
    )
    .await?;

    tracing::info!("Applied migration v{}: {}", version, description);
    Ok(())
}

/// Migration v1: Initial schema
/// Creates tracked_urls and check_records tables
async fn run_migration_v1(conn: &Connection) -> Result<()> {
    // Create tracked_urls table
    conn.execute(
        "CREATE TABLE IF NOT EXISTS tracked_urls (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT NOT NULL UNIQUE,
            url TEXT NOT NULL,
            headers TEXT DEFAULT '[]',
            timeout_ms INTEGER,
            created_at INTEGER NOT NULL
        )",
        (),
    )
    .await?;

    // Create check_records table; one row per tracked URL, replaced
    // wholesale on every recorded probe
    conn.execute(
        "CREATE TABLE IF NOT EXISTS check_records (
            tracked_url_uuid TEXT PRIMARY KEY,
            status TEXT NOT NULL,
            response_time_ms INTEGER NOT NULL,
            http_status INTEGER,
            error_message TEXT,
            checked_at_ms INTEGER NOT NULL,
            FOREIGN KEY (tracked_url_uuid) REFERENCES tracked_urls(uuid) ON DELETE CASCADE
        )",
        (),
    )
    .await?;

    // Create indexes
    conn.execute("CREATE INDEX IF NOT EXISTS idx_tracked_urls_uuid ON tracked_urls(uuid)", ())
        .await?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_check_records_checked_at ON check_records(checked_at_ms)",
        (),
    )
    .await?;

    Ok(())
}
