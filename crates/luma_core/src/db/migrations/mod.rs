//! Schema migrations for the local storage database.
//!
//! # Invariants
//! - Versions are strictly increasing and never reused.
//! - The applied version lives in `PRAGMA user_version`.
//! - Pending steps run in one transaction: all of them land or none do.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

struct Step {
    version: u32,
    sql: &'static str,
}

const STEPS: &[Step] = &[Step {
    version: 1,
    sql: include_str!("0001_local_storage.sql"),
}];

/// Newest schema version this build understands.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |step| step.version)
}

/// Brings the schema up to [`latest_version`].
///
/// Returns the `(from, to)` versions; equal values mean nothing ran.
///
/// # Errors
/// - `DbError::SchemaTooNew` when the file was written by a newer build.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<(u32, u32)> {
    let from: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    let to = latest_version();

    if from > to {
        return Err(DbError::SchemaTooNew {
            found: from,
            supported: to,
        });
    }
    if from == to {
        return Ok((from, to));
    }

    let tx = conn.transaction()?;
    for step in STEPS.iter().skip_while(|step| step.version <= from) {
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from={from} to={to}");
    Ok((from, to))
}
