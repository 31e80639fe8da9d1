//! Database schema migrations.
//!
//! Applied versions are recorded in `_migrations`; each entry below runs
//! once, in order, the first time a database at an older version is opened.

use super::Error;
use tokio_rusqlite::{Connection, params};

/// Migration list: (version, SQL). Versions must be strictly increasing.
const MIGRATIONS: &[(i64, &str)] = &[
    (1, include_str!("../../migrations/001_key_value.sql")),
    (2, include_str!("../../migrations/002_dataset.sql")),
];

/// Run any pending migrations inside a single transaction.
///
/// # Errors
///
/// Returns an error if a migration SQL fails to execute; nothing from the
/// failed run is kept.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let current: i64 =
            conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

        let pending: Vec<_> = MIGRATIONS.iter().filter(|(version, _)| *version > current).collect();
        if pending.is_empty() {
            return Ok(());
        }

        let tx = conn.transaction()?;
        for (version, sql) in pending {
            tx.execute_batch(sql)
                .map_err(|e| Error::MigrationFailed(format!("version {version}: {e}")))?;
            tx.execute(
                "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                params![version, chrono::Utc::now().to_rfc3339()],
            )?;
            tracing::debug!(version, "applied migration");
        }
        tx.commit()?;

        Ok(())
    })
    .await
    .map_err(Error::from)
}
