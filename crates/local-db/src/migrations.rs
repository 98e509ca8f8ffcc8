//! Schema setup and upgrades, keyed on `PRAGMA user_version`.

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::info;

pub const SCHEMA_VERSION: i64 = 2;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS commands (
    command_dt timestamp,
    command text,
    pid int,
    return_val int,
    pwd text,
    session text,
    json_data json
);
CREATE INDEX IF NOT EXISTS command_dt_ind ON commands (command_dt);
CREATE TABLE IF NOT EXISTS sessions (
    session text primary key not null,
    created_dt timestamp,
    updated_dt timestamp,
    term text,
    hostname text,
    user text,
    sequence int
);
";

const MIGRATE_1_2: &str = "ALTER TABLE commands ADD COLUMN json_data json;";

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error(
        "your command history database (schema version {found}) does not match recent \
         (expects {expected}), please update recent"
    )]
    Unsupported { found: i64, expected: i64 },
}

pub fn user_version(conn: &Connection) -> Result<i64> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .context("read schema version")
}

/// Bring the store to [`SCHEMA_VERSION`]. Never drops data.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    let found = user_version(conn)?;
    if found == SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    match found {
        0 => {
            info!("building schema");
            tx.execute_batch(SCHEMA).context("create tables")?;
        }
        1 => {
            info!(to = SCHEMA_VERSION, "migrating schema");
            tx.execute_batch(MIGRATE_1_2).context("add json_data column")?;
        }
        found => {
            return Err(SchemaError::Unsupported {
                found,
                expected: SCHEMA_VERSION,
            }
            .into());
        }
    }
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;
    Ok(())
}
