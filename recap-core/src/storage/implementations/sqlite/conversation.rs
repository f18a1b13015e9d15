//! SQLite implementation of DirectoryStore

use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use super::SqliteStore;
use crate::storage::ids::{ConversationId, UserId};
use crate::storage::traits::DirectoryStore;
use crate::storage::types::{ConversationRecord, ConversationSummary};

pub(crate) fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Conversations: one row per group the bot has seen a message in
        CREATE TABLE IF NOT EXISTS conversations (
            id INTEGER PRIMARY KEY,
            name TEXT,
            member_count INTEGER,
            last_activity INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_conversations_activity ON conversations(last_activity);
        "#,
    )
    .context("Failed to initialize conversation schema")?;
    Ok(())
}

/// Insert or refresh a conversation record
///
/// A missing name keeps the stored one. Writes older than the stored
/// activity change nothing, so `last_activity` never moves backwards.
pub(crate) fn touch_conversation(
    conn: &Connection,
    id: ConversationId,
    name: Option<&str>,
    activity: i64,
) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO conversations (id, name, last_activity) VALUES (?1, ?2, ?3)
        ON CONFLICT(id) DO UPDATE SET
            name = CASE
                WHEN excluded.last_activity >= conversations.last_activity
                THEN COALESCE(excluded.name, conversations.name)
                ELSE conversations.name
            END,
            last_activity = MAX(excluded.last_activity, conversations.last_activity)
        "#,
        params![id, name, activity],
    )?;
    Ok(())
}

pub(crate) fn load_conversation(
    conn: &Connection,
    id: ConversationId,
) -> Result<Option<ConversationRecord>> {
    let record = conn
        .query_row(
            "SELECT id, name, last_activity, member_count FROM conversations WHERE id = ?1",
            params![id],
            |row| {
                Ok(ConversationRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    last_activity: row.get(2)?,
                    member_count: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(record)
}

#[async_trait]
impl DirectoryStore for SqliteStore {
    async fn conversations_for_user(&self, user_id: UserId) -> Result<Vec<ConversationSummary>> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(
            r#"
            SELECT c.id, c.name, c.last_activity,
                   (SELECT COUNT(*) FROM messages m WHERE m.conversation_id = c.id)
            FROM conversations c
            WHERE c.id IN (SELECT DISTINCT conversation_id FROM messages WHERE author_id = ?1)
            ORDER BY c.last_activity DESC, c.id DESC
            "#,
        )?;
        let summaries = stmt
            .query_map(params![user_id], |row| {
                Ok(ConversationSummary {
                    conversation_id: row.get(0)?,
                    name: row.get(1)?,
                    last_activity: row.get(2)?,
                    message_count: row.get::<_, i64>(3)?.max(0) as u64,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::traits::{MessageStore, WindowStore};
    use crate::storage::types::NewMessage;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Arc;

    fn store_with_clock() -> (SqliteStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::at(Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap()));
        let store = SqliteStore::in_memory().unwrap().with_clock(clock.clone());
        (store, clock)
    }

    #[tokio::test]
    async fn test_directory_orders_by_activity() {
        let (store, clock) = store_with_clock();
        let alice = UserId::new(1);
        let bob = UserId::new(2);

        store
            .append(NewMessage::new(ConversationId::new(-10), alice, "first").with_conversation_name("Work"))
            .await
            .unwrap();
        clock.advance(Duration::minutes(5));
        store
            .append(NewMessage::new(ConversationId::new(-20), alice, "second").with_conversation_name("Family"))
            .await
            .unwrap();
        clock.advance(Duration::minutes(5));
        store
            .append(NewMessage::new(ConversationId::new(-10), bob, "reply"))
            .await
            .unwrap();

        let list = store.conversations_for_user(alice).await.unwrap();
        let ids: Vec<_> = list.iter().map(|c| c.conversation_id.get()).collect();
        assert_eq!(ids, vec![-10, -20]);
        assert_eq!(list[0].message_count, 2);
        assert_eq!(list[0].name.as_deref(), Some("Work"));
        assert_eq!(list[1].message_count, 1);

        let bob_list = store.conversations_for_user(bob).await.unwrap();
        assert_eq!(bob_list.len(), 1);
        assert!(store.conversations_for_user(UserId::new(3)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_keeps_name_and_latest_activity() {
        let (store, clock) = store_with_clock();
        let conversation = ConversationId::new(-10);

        store
            .append(NewMessage::new(conversation, UserId::new(1), "hi").with_conversation_name("Old"))
            .await
            .unwrap();
        clock.advance(Duration::minutes(1));
        let later = store
            .append(NewMessage::new(conversation, UserId::new(1), "no title here"))
            .await
            .unwrap();

        let record = store.conversation(conversation).await.unwrap().unwrap();
        assert_eq!(record.name.as_deref(), Some("Old"));
        assert_eq!(record.last_activity, later.created_at);
        assert_eq!(record.member_count, None);

        // A late write with an older timestamp must not move activity backwards
        {
            let conn = store.lock_conn();
            touch_conversation(&conn, conversation, Some("Renamed"), later.created_at - 60_000).unwrap();
        }
        let record = store.conversation(conversation).await.unwrap().unwrap();
        assert_eq!(record.name.as_deref(), Some("Old"));
        assert_eq!(record.last_activity, later.created_at);

        {
            let conn = store.lock_conn();
            touch_conversation(&conn, conversation, Some("Renamed"), later.created_at).unwrap();
        }
        let record = store.conversation(conversation).await.unwrap().unwrap();
        assert_eq!(record.name.as_deref(), Some("Renamed"));
    }
}
