use anyhow::{anyhow, Context};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DbResult;

#[derive(Debug, Clone)]
pub struct Migration {
    pub from: i64,
    pub to: i64,
    pub sql: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
    // Content checksums for duplicate detection and broken-media audits.
    Migration {
        from: 1,
        to: 2,
        sql: r#"
            ALTER TABLE media_objects ADD COLUMN checksum TEXT;
            CREATE INDEX IF NOT EXISTS idx_media_objects_checksum ON media_objects(checksum);
        "#,
    },
];

pub const LATEST_SCHEMA_VERSION: i64 = 2;

pub fn run_migrations_for_conn(conn: &Connection, migrations: &[Migration]) -> DbResult<()> {
    let mut version = current_schema_version_for_conn(conn)?;
    let target = migrations.last().map(|m| m.to).unwrap_or(version);

    if version > target {
        return Err(anyhow!(
            "tree schema version {version} is newer than supported {target}"
        ));
    }

    let mut progressed = true;
    while progressed && version < target {
        progressed = false;
        for migration in migrations {
            if migration.from != version {
                continue;
            }
            conn.execute_batch("BEGIN IMMEDIATE")?;
            if let Err(e) = conn.execute_batch(migration.sql) {
                conn.execute_batch("ROLLBACK")?;
                return Err(e).with_context(|| {
                    format!(
                        "failed to apply migration {} -> {}",
                        migration.from, migration.to
                    )
                });
            }
            conn.execute(
                "UPDATE tree_metadata
                 SET schema_version = ?1,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ','now')
                 WHERE id = 1",
                params![migration.to],
            )?;
            conn.pragma_update(None, "user_version", migration.to)?;
            conn.execute_batch("COMMIT")?;
            version = migration.to;
            progressed = true;
            break;
        }
    }

    if version != target {
        return Err(anyhow!(
            "missing migration path from {version} to {target}"
        ));
    }

    Ok(())
}

pub fn current_schema_version_for_conn(conn: &Connection) -> DbResult<i64> {
    Ok(conn
        .query_row(
            "SELECT schema_version FROM tree_metadata WHERE id = 1",
            [],
            |row| row.get(0),
        )
        .optional()?
        .unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{initialize_schema, BASE_SCHEMA_SQL};

    fn version_one_database() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(BASE_SCHEMA_SQL).unwrap();
        conn.execute(
            "INSERT INTO tree_metadata (id, schema_version) VALUES (1, 1)",
            [],
        )
        .unwrap();
        conn.pragma_update(None, "user_version", 1).unwrap();
        conn
    }

    #[test]
    fn upgrades_version_one_to_latest() {
        let conn = version_one_database();
        run_migrations_for_conn(&conn, MIGRATIONS).unwrap();

        assert_eq!(
            current_schema_version_for_conn(&conn).unwrap(),
            LATEST_SCHEMA_VERSION
        );
        // The checksum column exists after the upgrade.
        conn.prepare("SELECT checksum FROM media_objects").unwrap();
    }

    #[test]
    fn initialized_database_needs_no_further_migration() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        run_migrations_for_conn(&conn, MIGRATIONS).unwrap();
        assert_eq!(
            current_schema_version_for_conn(&conn).unwrap(),
            LATEST_SCHEMA_VERSION
        );
    }

    #[test]
    fn migration_failure_rolls_back() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        let bad_migration = Migration {
            from: LATEST_SCHEMA_VERSION,
            to: LATEST_SCHEMA_VERSION + 1,
            sql: "THIS IS NOT VALID SQL",
        };
        let migrations = [MIGRATIONS, &[bad_migration]].concat();
        assert!(run_migrations_for_conn(&conn, &migrations).is_err());
        assert_eq!(
            current_schema_version_for_conn(&conn).unwrap(),
            LATEST_SCHEMA_VERSION
        );
    }
}
