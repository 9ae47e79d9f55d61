use rusqlite::Connection;

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    // Parsed payment notifications, one row per accepted message
    conn.execute(
        "CREATE TABLE IF NOT EXISTS payment_transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,

            -- Where the message arrived
            group_id INTEGER NOT NULL,
            bot_name VARCHAR NOT NULL,

            -- Parsed fields
            format VARCHAR NOT NULL,
            currency VARCHAR NOT NULL CHECK (currency IN ('$', '៛')),
            amount_minor INTEGER NOT NULL CHECK (amount_minor >= 0),
            sender VARCHAR NOT NULL,
            receiver VARCHAR,
            transport VARCHAR NOT NULL,
            bank VARCHAR NOT NULL,
            trx_id VARCHAR,
            apv VARCHAR,
            occurred_on VARCHAR NOT NULL,
            raw_text VARCHAR NOT NULL,

            -- Ingestion instant, unix seconds UTC
            received_at BIGINT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_payment_transactions_group_received
            ON payment_transactions(group_id, received_at)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_payment_transactions_bank
            ON payment_transactions(group_id, bank)",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master
                 WHERE type = 'table' AND name = 'payment_transactions'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }
}
