//! Schema migrations for the cache database.
//!
//! Applied versions are recorded in `_schema_versions`; each pending
//! migration runs in its own transaction together with its version row.

use super::Error;
use tokio_rusqlite::{Connection, params, rusqlite};

/// One schema step.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// Ordered by version.
const MIGRATIONS: &[Migration] = &[Migration { version: 1, name: "kv", sql: include_str!("../../migrations/001_kv.sql") }];

/// Bring the schema up to the latest version.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS _schema_versions (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL
            )",
        )?;

        let applied = current_version(conn)?;
        for migration in MIGRATIONS.iter().filter(|m| m.version > applied) {
            let tx = conn.transaction()?;
            tx.execute_batch(migration.sql)
                .map_err(|e| Error::MigrationFailed(format!("{} ({}): {e}", migration.version, migration.name)))?;
            tx.execute(
                "INSERT INTO _schema_versions (version, name, applied_at) VALUES (?1, ?2, ?3)",
                params![migration.version, migration.name, chrono::Utc::now().to_rfc3339()],
            )?;
            tx.commit()?;
            tracing::debug!(version = migration.version, name = migration.name, "applied cache migration");
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}

fn current_version(conn: &rusqlite::Connection) -> Result<i64, Error> {
    Ok(conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _schema_versions", [], |row| row.get(0))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn tables(conn: &Connection) -> Vec<String> {
        conn.call(|conn| {
            let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
            let names = stmt.query_map([], |row| row.get(0))?.collect::<Result<Vec<String>, _>>()?;
            Ok::<_, rusqlite::Error>(names)
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_creates_kv_table() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();

        let tables = tables(&conn).await;
        assert!(tables.contains(&"kv".to_string()));
        assert!(tables.contains(&"_schema_versions".to_string()));
    }

    #[tokio::test]
    async fn test_rerun_applies_nothing_new() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();
        run(&conn).await.unwrap();

        let (rows, latest): (i64, i64) = conn
            .call(|conn| {
                conn.query_row("SELECT COUNT(*), MAX(version) FROM _schema_versions", [], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })
            })
            .await
            .unwrap();

        assert_eq!(rows, MIGRATIONS.len() as i64);
        assert_eq!(latest, MIGRATIONS.last().map(|m| m.version).unwrap());
    }
}
