//! Persistence for the operator's read watermark.
//!
//! The watermark is an unordered set of conversation ids the operator has
//! acknowledged.  It is owned by one device and never synced anywhere, the
//! SQLite equivalent of the browser-local storage it replaces.

use std::collections::HashSet;

use chrono::Utc;
use rusqlite::params;

use frontdesk_shared::ConversationId;

use crate::database::Database;
use crate::error::Result;

impl Database {
    /// Record that a conversation has been acknowledged.  Idempotent.
    pub fn mark_conversation_read(&self, conversation: &ConversationId) -> Result<()> {
        self.conn().execute(
            "INSERT OR IGNORE INTO read_conversations (conversation, read_at)
             VALUES (?1, ?2)",
            params![conversation.as_str(), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Load the full watermark set.
    pub fn read_conversations(&self) -> Result<HashSet<ConversationId>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT conversation FROM read_conversations")?;

        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut set = HashSet::new();
        for row in rows {
            set.insert(ConversationId(row?));
        }
        Ok(set)
    }

    /// Whether a single conversation has been acknowledged.
    pub fn is_conversation_read(&self, conversation: &ConversationId) -> Result<bool> {
        let count: u32 = self.conn().query_row(
            "SELECT COUNT(*) FROM read_conversations WHERE conversation = ?1",
            params![conversation.as_str()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
