use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use tracing::warn;

pub const DB_FILE: &str = "erp.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)
        .with_context(|| format!("create workspace {}", workspace.display()))?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(&db_path)
        .with_context(|| format!("open {}", db_path.display()))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL
        )",
        [],
    )?;

    // Workspaces created before settings were timestamped lack updated_at.
    ensure_settings_updated_at(&conn)?;

    Ok(conn)
}

fn ensure_settings_updated_at(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "settings", "updated_at")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE settings ADD COLUMN updated_at TEXT", [])?;
    Ok(())
}

/// Stored JSON for `key`. Text that no longer parses is treated as absent.
pub fn settings_get_json(conn: &Connection, key: &str) -> anyhow::Result<Option<Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value_json FROM settings WHERE key = ?",
            [key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(raw.and_then(|s| match serde_json::from_str(&s) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(key, error = %e, "stored setting is not valid JSON, ignoring");
            None
        }
    }))
}

pub fn settings_set_json(conn: &Connection, key: &str, value: &Value) -> anyhow::Result<()> {
    let raw = serde_json::to_string(value)?;
    conn.execute(
        "INSERT INTO settings(key, value_json, updated_at)
         VALUES(?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET
           value_json = excluded.value_json,
           updated_at = excluded.updated_at",
        (key, &raw, chrono::Utc::now().to_rfc3339()),
    )?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2",
            (table, column),
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn settings_round_trip_and_overwrite() {
        let dir = tempfile::tempdir().expect("tempdir");
        let conn = open_db(dir.path()).expect("open");
        assert_eq!(settings_get_json(&conn, "settings.admin").expect("get"), None);
        settings_set_json(&conn, "settings.admin", &json!({"version": 2})).expect("set");
        settings_set_json(&conn, "settings.admin", &json!({"version": 3})).expect("set");
        assert_eq!(
            settings_get_json(&conn, "settings.admin").expect("get"),
            Some(json!({"version": 3}))
        );
    }

    #[test]
    fn corrupt_rows_read_as_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let conn = open_db(dir.path()).expect("open");
        conn.execute(
            "INSERT INTO settings(key, value_json) VALUES('settings.clerk', '{nope')",
            [],
        )
        .expect("insert");
        assert_eq!(settings_get_json(&conn, "settings.clerk").expect("get"), None);
    }

    #[test]
    fn legacy_table_gains_updated_at() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let conn = Connection::open(dir.path().join(DB_FILE)).expect("open raw");
            conn.execute(
                "CREATE TABLE settings(key TEXT PRIMARY KEY, value_json TEXT NOT NULL)",
                [],
            )
            .expect("create");
        }
        let conn = open_db(dir.path()).expect("open");
        assert!(table_has_column(&conn, "settings", "updated_at").expect("pragma"));
        assert!(!table_has_column(&conn, "settings", "owner").expect("pragma"));
        assert!(!table_has_column(&conn, "missing_table", "key").expect("pragma"));
    }
}
