//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: analyses keyed by id, looked up by fingerprint
    r#"
    CREATE TABLE IF NOT EXISTS analyses (
        id               TEXT PRIMARY KEY,
        fingerprint      TEXT NOT NULL,
        created_at       INTEGER NOT NULL,

        -- Denormalized for history listings
        title            TEXT NOT NULL,
        platform         TEXT NOT NULL,
        participant_count INTEGER NOT NULL,
        total_messages   INTEGER NOT NULL,

        -- Full records
        conversation     JSON NOT NULL,
        quantitative     JSON NOT NULL,
        qualitative      JSON
    );

    CREATE INDEX IF NOT EXISTS idx_analyses_fingerprint
        ON analyses(fingerprint, created_at DESC);
    CREATE INDEX IF NOT EXISTS idx_analyses_created ON analyses(created_at DESC);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version = get_schema_version(&conn).unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_tables_created() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let exists: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
                ["analyses"],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(exists, 1, "Table analyses should exist");
    }
}
