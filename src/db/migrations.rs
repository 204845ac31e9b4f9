use anyhow::Result;
use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch("
        CREATE TABLE IF NOT EXISTS prayers (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            date         TEXT NOT NULL,
            name         TEXT NOT NULL CHECK(name IN ('fajr','dhuhr','asr','maghrib','isha')),
            start_time   TEXT NOT NULL,
            end_time     TEXT NOT NULL,
            completed    INTEGER NOT NULL DEFAULT 0,
            reason       TEXT,
            fine_amount  INTEGER NOT NULL DEFAULT 10,
            updated_at   TEXT DEFAULT (datetime('now')),
            UNIQUE(date, name)
        );

        CREATE INDEX IF NOT EXISTS idx_prayers_date ON prayers(date);

        CREATE TABLE IF NOT EXISTS payments (
            id           TEXT PRIMARY KEY,
            amount       INTEGER NOT NULL CHECK(amount > 0),
            paid_at      TEXT NOT NULL,
            range_start  TEXT NOT NULL,
            range_end    TEXT NOT NULL,
            method       TEXT
        );

        CREATE TABLE IF NOT EXISTS app_meta (
            key   TEXT PRIMARY KEY,
            value TEXT
        );
    ")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_repeatable() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('prayers', 'payments', 'app_meta')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 3);
    }
}
