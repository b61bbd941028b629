//! Locally saved conversation transcripts.
//!
//! A viewer can snapshot their conversation to disk ("save chat history").
//! Saves are idempotent: rows are keyed by message id, so re-saving a
//! conversation only adds the messages that arrived since the last save.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use frontdesk_shared::{ConversationId, Message, Sender, UserId};

use crate::database::Database;
use crate::error::Result;

const ROLE_VISITOR: &str = "visitor";
const ROLE_OPERATOR: &str = "operator";

impl Database {
    /// Persist every well-formed message of a conversation.  Returns the
    /// number of newly inserted rows.
    pub fn save_transcript(
        &self,
        conversation: &ConversationId,
        messages: &[Message],
    ) -> Result<u32> {
        let mut inserted = 0u32;
        for message in messages {
            if !message.belongs_to(conversation) {
                continue;
            }
            let (role, sender_uid) = match &message.sender {
                Sender::Visitor(uid) => (ROLE_VISITOR, Some(uid.as_str())),
                Sender::Operator => (ROLE_OPERATOR, None),
            };
            let affected = self.conn().execute(
                "INSERT OR IGNORE INTO transcripts
                 (message_id, conversation, role, sender_uid, sender_name, country, body, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    message.id.to_string(),
                    conversation.as_str(),
                    role,
                    sender_uid,
                    message.sender_name,
                    message.country,
                    message.text,
                    message.created_at.to_rfc3339(),
                ],
            )?;
            inserted += affected as u32;
        }

        tracing::debug!(
            conversation = %conversation,
            inserted,
            "saved transcript"
        );
        Ok(inserted)
    }

    /// Load a saved transcript, ascending by authoritative timestamp.
    pub fn transcript(&self, conversation: &ConversationId) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare(
            "SELECT message_id, conversation, role, sender_uid, sender_name, country, body, created_at
             FROM transcripts
             WHERE conversation = ?1
             ORDER BY created_at ASC",
        )?;

        let rows = stmt.query_map(params![conversation.as_str()], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    /// Number of messages saved for a conversation.
    pub fn transcript_len(&self, conversation: &ConversationId) -> Result<u32> {
        let count: u32 = self.conn().query_row(
            "SELECT COUNT(*) FROM transcripts WHERE conversation = ?1",
            params![conversation.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

/// Map a `rusqlite::Row` to a [`Message`].
fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let id_str: String = row.get(0)?;
    let conversation: String = row.get(1)?;
    let role: String = row.get(2)?;
    let sender_uid: Option<String> = row.get(3)?;
    let sender_name: String = row.get(4)?;
    let country: Option<String> = row.get(5)?;
    let body: String = row.get(6)?;
    let created_str: String = row.get(7)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let sender = match role.as_str() {
        ROLE_OPERATOR => Sender::Operator,
        _ => Sender::Visitor(UserId(sender_uid.unwrap_or_default())),
    };

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Message {
        id,
        text: body,
        sender,
        sender_name,
        country,
        conversation: Some(ConversationId(conversation)),
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontdesk_shared::{Draft, VisitorIdentity};

    fn committed(draft: Draft) -> Message {
        draft.into_message(Utc::now())
    }

    fn open_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    #[test]
    fn save_is_idempotent_per_message() {
        let (_dir, db) = open_db();
        let mina = VisitorIdentity::new("u1", "Mina").with_country("KR");
        let conversation = mina.conversation();

        let msgs = vec![
            committed(Draft::from_visitor(&mina, "hello")),
            committed(Draft::from_operator(
                "Admin",
                None,
                conversation.clone(),
                "hi Mina",
            )),
        ];

        assert_eq!(db.save_transcript(&conversation, &msgs).unwrap(), 2);
        // Re-saving the same snapshot adds nothing.
        assert_eq!(db.save_transcript(&conversation, &msgs).unwrap(), 0);
        assert_eq!(db.transcript_len(&conversation).unwrap(), 2);
    }

    #[test]
    fn transcript_round_trip_preserves_roles_and_order() {
        let (_dir, db) = open_db();
        let mina = VisitorIdentity::new("u1", "Mina");
        let conversation = mina.conversation();

        let first = committed(Draft::from_visitor(&mina, "hello"));
        let second = Message {
            created_at: first.created_at + chrono::Duration::seconds(1),
            ..committed(Draft::from_operator(
                "Admin",
                None,
                conversation.clone(),
                "hi",
            ))
        };

        db.save_transcript(&conversation, &[second.clone(), first.clone()])
            .unwrap();

        let loaded = db.transcript(&conversation).unwrap();
        assert_eq!(loaded, vec![first, second]);
    }

    #[test]
    fn corrupt_rows_surface_as_database_errors() {
        let (_dir, db) = open_db();
        db.conn()
            .execute(
                "INSERT INTO transcripts
                 (message_id, conversation, role, sender_uid, sender_name, country, body, created_at)
                 VALUES ('not-a-uuid', 'u1', 'visitor', 'u1', 'Mina', NULL, 'hello', 'not-a-timestamp')",
                [],
            )
            .unwrap();

        let err = db.transcript(&ConversationId("u1".into())).unwrap_err();
        assert!(matches!(err, crate::error::StoreError::Sqlite(_)));
    }

    #[test]
    fn messages_from_other_conversations_are_skipped() {
        let (_dir, db) = open_db();
        let mina = VisitorIdentity::new("u1", "Mina");
        let other = VisitorIdentity::new("u2", "Joon");

        let msgs = vec![
            committed(Draft::from_visitor(&mina, "mine")),
            committed(Draft::from_visitor(&other, "not mine")),
        ];

        assert_eq!(db.save_transcript(&mina.conversation(), &msgs).unwrap(), 1);
        assert_eq!(db.transcript_len(&mina.conversation()).unwrap(), 1);
    }
}
