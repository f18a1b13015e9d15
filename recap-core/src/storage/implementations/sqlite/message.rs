//! SQLite implementation of MessageStore and WindowStore

use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, Row};

use super::conversation::{load_conversation, touch_conversation};
use super::SqliteStore;
use crate::storage::ids::ConversationId;
use crate::storage::traits::{MessageStore, WindowStore};
use crate::storage::types::{ConversationRecord, NewMessage, StoredMessage};

pub(crate) fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Messages: append-only log of group chat texts
        CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            conversation_id INTEGER NOT NULL,
            conversation_name TEXT,
            author_id INTEGER NOT NULL,
            author_name TEXT NOT NULL,
            text TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_conversation_created
            ON messages(conversation_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_messages_author
            ON messages(author_id, conversation_id);
        "#,
    )
    .context("Failed to initialize message schema")?;
    Ok(())
}

const MESSAGE_COLUMNS: &str =
    "id, conversation_id, conversation_name, author_id, author_name, text, created_at";

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<StoredMessage> {
    Ok(StoredMessage {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        conversation_name: row.get(2)?,
        author_id: row.get(3)?,
        author_name: row.get(4)?,
        text: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[async_trait]
impl MessageStore for SqliteStore {
    async fn append(&self, message: NewMessage) -> Result<StoredMessage> {
        message.validate()?;

        let author_name = message.author_label();
        let conversation_name = message.conversation_label();

        let mut conn = self.lock_conn();
        let created_at = self.clock().now_millis();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO messages (conversation_id, conversation_name, author_id, author_name, text, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                message.conversation_id,
                conversation_name,
                message.author_id,
                author_name,
                message.text,
                created_at
            ],
        )?;
        let id = tx.last_insert_rowid();
        touch_conversation(&tx, message.conversation_id, conversation_name.as_deref(), created_at)?;
        tx.commit().context("Failed to commit message")?;

        Ok(StoredMessage {
            id,
            conversation_id: message.conversation_id,
            conversation_name,
            author_id: message.author_id,
            author_name,
            text: message.text,
            created_at,
        })
    }
}

#[async_trait]
impl WindowStore for SqliteStore {
    async fn latest_messages(
        &self,
        conversation_id: ConversationId,
        limit: usize,
        since: Option<i64>,
    ) -> Result<Vec<StoredMessage>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let since = since.unwrap_or(i64::MIN);

        let conn = self.lock_conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE conversation_id = ?1 AND created_at >= ?2
             ORDER BY created_at DESC, id DESC
             LIMIT ?3"
        ))?;
        let messages = stmt
            .query_map(params![conversation_id, since, limit], message_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(messages)
    }

    async fn messages_between(
        &self,
        conversation_id: ConversationId,
        start: i64,
        end: i64,
    ) -> Result<Vec<StoredMessage>> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE conversation_id = ?1 AND created_at >= ?2 AND created_at < ?3
             ORDER BY created_at ASC, id ASC"
        ))?;
        let messages = stmt
            .query_map(params![conversation_id, start, end], message_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(messages)
    }

    async fn conversation(&self, id: ConversationId) -> Result<Option<ConversationRecord>> {
        let conn = self.lock_conn();
        load_conversation(&conn, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::storage::ids::UserId;
    use crate::storage::types::MessageError;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Arc;

    const GROUP: ConversationId = ConversationId::new(-1001);
    const ALICE: UserId = UserId::new(1);

    fn store_with_clock() -> (SqliteStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::at(Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap()));
        let store = SqliteStore::in_memory().unwrap().with_clock(clock.clone());
        (store, clock)
    }

    #[tokio::test]
    async fn test_append_assigns_id_and_timestamp() {
        let (store, clock) = store_with_clock();
        let stored = store
            .append(NewMessage::new(GROUP, ALICE, "hello").with_conversation_name("Team"))
            .await
            .unwrap();

        assert!(stored.id > 0);
        assert_eq!(stored.created_at, clock.now_millis());
        assert_eq!(stored.author_name, "User1");
        assert_eq!(stored.conversation_name.as_deref(), Some("Team"));

        let record = store.conversation(GROUP).await.unwrap().unwrap();
        assert_eq!(record.last_activity, stored.created_at);
    }

    #[tokio::test]
    async fn test_append_refuses_commands_and_blank_text() {
        let (store, _) = store_with_clock();

        let err = store.append(NewMessage::new(GROUP, ALICE, "/summary")).await.unwrap_err();
        assert_eq!(err.downcast_ref::<MessageError>(), Some(&MessageError::Command));

        let err = store.append(NewMessage::new(GROUP, ALICE, "  \n ")).await.unwrap_err();
        assert_eq!(err.downcast_ref::<MessageError>(), Some(&MessageError::Empty));

        assert!(store.latest_messages(GROUP, 10, None).await.unwrap().is_empty());
        assert!(store.conversation(GROUP).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_latest_messages_newest_first_with_tiebreak() {
        let (store, clock) = store_with_clock();
        let first = store.append(NewMessage::new(GROUP, ALICE, "one")).await.unwrap();
        // Same timestamp: insertion order decides
        let second = store.append(NewMessage::new(GROUP, ALICE, "two")).await.unwrap();
        clock.advance(Duration::seconds(1));
        let third = store.append(NewMessage::new(GROUP, ALICE, "three")).await.unwrap();

        let latest = store.latest_messages(GROUP, 2, None).await.unwrap();
        let ids: Vec<_> = latest.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![third.id, second.id]);

        let since = store
            .latest_messages(GROUP, 10, Some(third.created_at))
            .await
            .unwrap();
        assert_eq!(since.len(), 1);

        let all = store.latest_messages(GROUP, usize::MAX, None).await.unwrap();
        assert_eq!(all.last().map(|m| m.id), Some(first.id));
    }

    #[tokio::test]
    async fn test_messages_between_is_half_open() {
        let (store, clock) = store_with_clock();
        let start = clock.now_millis();
        store.append(NewMessage::new(GROUP, ALICE, "at start")).await.unwrap();
        clock.advance(Duration::minutes(30));
        store.append(NewMessage::new(GROUP, ALICE, "middle")).await.unwrap();
        clock.advance(Duration::minutes(30));
        store.append(NewMessage::new(GROUP, ALICE, "at end")).await.unwrap();
        let end = clock.now_millis();

        let window = store.messages_between(GROUP, start, end).await.unwrap();
        let texts: Vec<_> = window.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["at start", "middle"]);
    }

    #[tokio::test]
    async fn test_messages_are_scoped_to_conversation() {
        let (store, _) = store_with_clock();
        store.append(NewMessage::new(GROUP, ALICE, "here")).await.unwrap();
        store
            .append(NewMessage::new(ConversationId::new(-2002), ALICE, "elsewhere"))
            .await
            .unwrap();

        let latest = store.latest_messages(GROUP, 10, None).await.unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].text, "here");
    }
}
