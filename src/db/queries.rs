use rusqlite::{params, Connection, OptionalExtension};

// ── Scheduling state ──

pub fn get_state_document(conn: &Connection) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT document FROM scheduling_state WHERE id = 1",
        [],
        |row| row.get(0),
    )
    .optional()
}

pub fn put_state_document(conn: &Connection, document: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO scheduling_state (id, document, updated_at)
         VALUES (1, ?1, datetime('now'))
         ON CONFLICT(id) DO UPDATE SET
           document = excluded.document,
           updated_at = excluded.updated_at",
        params![document],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use std::time::Duration;

    fn setup_db() -> Connection {
        db::init_db(":memory:", Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_empty_until_first_put() {
        let conn = setup_db();
        assert_eq!(get_state_document(&conn).unwrap(), None);
    }

    #[test]
    fn test_put_overwrites_single_row() {
        let conn = setup_db();
        put_state_document(&conn, r#"{"v":1}"#).unwrap();
        put_state_document(&conn, r#"{"v":2}"#).unwrap();

        assert_eq!(
            get_state_document(&conn).unwrap().as_deref(),
            Some(r#"{"v":2}"#)
        );
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM scheduling_state", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }
}
