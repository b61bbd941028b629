//! Initial schema: read watermark and saved transcripts.

use rusqlite::Connection;

pub fn up(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS read_conversations (
            conversation TEXT PRIMARY KEY,
            read_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS transcripts (
            message_id   TEXT PRIMARY KEY,
            conversation TEXT NOT NULL,
            role         TEXT NOT NULL,
            sender_uid   TEXT,
            sender_name  TEXT NOT NULL,
            country      TEXT,
            body         TEXT NOT NULL,
            created_at   TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_transcripts_conversation
            ON transcripts (conversation, created_at);
        ",
    )
}
