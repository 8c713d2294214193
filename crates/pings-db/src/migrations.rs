use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);"
    )?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                user_id     TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                role        TEXT NOT NULL,
                avatar      TEXT,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE checkins (
                id              TEXT PRIMARY KEY,
                user_id         TEXT NOT NULL,
                kind            TEXT NOT NULL,
                value           TEXT NOT NULL,
                emoji           TEXT,
                timestamp       TEXT NOT NULL,
                sort_at         INTEGER NOT NULL,
                sent_to_family  INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX idx_checkins_user
                ON checkins(user_id, sort_at);

            CREATE TABLE medication_logs (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id         TEXT NOT NULL,
                medication_id   TEXT NOT NULL,
                action          TEXT NOT NULL,
                timestamp       TEXT NOT NULL,
                notes           TEXT
            );

            CREATE INDEX idx_medication_logs_user
                ON medication_logs(user_id, timestamp);

            CREATE TABLE photos (
                photo_id        TEXT PRIMARY KEY,
                user_id         TEXT NOT NULL,
                filename        TEXT NOT NULL,
                content_type    TEXT NOT NULL,
                storage_key     TEXT NOT NULL,
                created_at      TEXT NOT NULL,
                metadata        TEXT
            );

            CREATE TABLE family_members (
                family_id       TEXT NOT NULL,
                user_id         TEXT NOT NULL,
                name            TEXT NOT NULL,
                role            TEXT NOT NULL,
                avatar          TEXT,
                device_tokens   TEXT,
                created_at      TEXT NOT NULL,
                PRIMARY KEY (family_id, user_id)
            );

            CREATE TABLE device_tokens (
                user_id         TEXT NOT NULL,
                device_token    TEXT NOT NULL,
                platform        TEXT NOT NULL,
                created_at      TEXT NOT NULL,
                last_used       TEXT NOT NULL,
                PRIMARY KEY (user_id, device_token)
            );

            INSERT INTO schema_version (version) VALUES (1);
            "
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
