//! Database schema definitions
//!
//! This module contains the SQL schema of the SQLite progress store.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- URLs already fetched or abandoned
CREATE TABLE IF NOT EXISTS visited (
    url TEXT PRIMARY KEY
);

-- Pending queue; position preserves dequeue order
CREATE TABLE IF NOT EXISTS pending (
    position INTEGER PRIMARY KEY,
    url TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.pragma_update(None, "user_version", get_schema_version())?;
    Ok(())
}

/// Gets the current schema version
///
/// Stored in `PRAGMA user_version` for future migrations.
pub fn get_schema_version() -> u32 {
    1
}
