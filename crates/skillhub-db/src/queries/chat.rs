use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::Row;
use skillhub_types::models::{Conversation, Message};

use super::{OptionalExt, to_json};
use crate::Database;

const CONVERSATION_COLUMNS: &str = "id, participant1_id, participant2_id, created_at, updated_at";
const MESSAGE_COLUMNS: &str = "id, conversation_id, sender_id, recipient_id, content, sent_at, \
     updated_at, read_at, edited, deleted";

fn conversation_from_row(row: &Row) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: row.get(0)?,
        participant1_id: row.get(1)?,
        participant2_id: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn message_from_row(row: &Row) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        sender_id: row.get(2)?,
        recipient_id: row.get(3)?,
        content: row.get(4)?,
        sent_at: row.get(5)?,
        updated_at: row.get(6)?,
        read_at: row.get(7)?,
        edited: row.get(8)?,
        deleted: row.get(9)?,
    })
}

impl Database {
    // -- Conversations --

    pub fn insert_conversation(&self, conversation: &Conversation) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO conversations (id, participant1_id, participant2_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    conversation.id,
                    conversation.participant1_id,
                    conversation.participant2_id,
                    conversation.created_at,
                    conversation.updated_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_conversation(&self, id: &str) -> Result<Option<Conversation>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = ?1"),
                [id],
                conversation_from_row,
            )
            .optional()
        })
    }

    /// The conversation between two users, whichever of them opened it.
    pub fn find_conversation_between(&self, a: &str, b: &str) -> Result<Option<Conversation>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {CONVERSATION_COLUMNS} FROM conversations
                     WHERE (participant1_id = ?1 AND participant2_id = ?2)
                        OR (participant1_id = ?2 AND participant2_id = ?1)
                     ORDER BY created_at
                     LIMIT 1"
                ),
                [a, b],
                conversation_from_row,
            )
            .optional()
        })
    }

    /// Most recently active first.
    pub fn list_conversations_for(&self, user_id: &str) -> Result<Vec<Conversation>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CONVERSATION_COLUMNS} FROM conversations
                 WHERE participant1_id = ?1 OR participant2_id = ?1
                 ORDER BY updated_at DESC, rowid DESC"
            ))?;
            let rows = stmt
                .query_map([user_id], conversation_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn touch_conversation(&self, id: &str, now: DateTime<Utc>) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE conversations SET updated_at = ?2 WHERE id = ?1",
                rusqlite::params![id, now],
            )?;
            Ok(())
        })
    }

    // -- Messages --

    pub fn insert_message(&self, message: &Message) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO messages (
                    id, conversation_id, sender_id, recipient_id, content, sent_at,
                    updated_at, read_at, edited, deleted
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                rusqlite::params![
                    message.id,
                    message.conversation_id,
                    message.sender_id,
                    message.recipient_id,
                    message.content,
                    message.sent_at,
                    message.updated_at,
                    message.read_at,
                    message.edited,
                    message.deleted,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_message(&self, id: &str) -> Result<Option<Message>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
                [id],
                message_from_row,
            )
            .optional()
        })
    }

    /// Writes the editable fields. `read_at` is only ever set by
    /// `mark_messages_read`, so a stale snapshot cannot unread a message.
    pub fn save_message(&self, message: &Message) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE messages
                 SET content = ?2, updated_at = ?3, edited = ?4, deleted = ?5
                 WHERE id = ?1",
                rusqlite::params![
                    message.id,
                    message.content,
                    message.updated_at,
                    message.edited,
                    message.deleted,
                ],
            )?;
            Ok(())
        })
    }

    /// Oldest first, soft-deleted messages included.
    pub fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE conversation_id = ?1
                 ORDER BY sent_at, rowid"
            ))?;
            let rows = stmt
                .query_map([conversation_id], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Stamps `read_at` on every listed message that has none yet.
    pub fn mark_messages_read(&self, ids: &[String], now: DateTime<Utc>) -> Result<u64> {
        let ids = to_json(ids)?;
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE messages SET read_at = ?2
                 WHERE read_at IS NULL AND id IN (SELECT value FROM json_each(?1))",
                rusqlite::params![ids, now],
            )?;
            Ok(changed as u64)
        })
    }

    pub fn list_unread_messages(&self, recipient_id: &str) -> Result<Vec<Message>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE recipient_id = ?1 AND read_at IS NULL AND deleted = 0
                 ORDER BY sent_at, rowid"
            ))?;
            let rows = stmt
                .query_map([recipient_id], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}
