//! SQLite conversation repository implementation.
//!
//! Implements `ConversationRepository` from `loki-core` using sqlx with split
//! read/write pools: raw queries, private Row structs, reads on the reader
//! pool and every mutation on the single writer connection.

use chrono::NaiveDateTime;
use loki_core::chat::repository::ConversationRepository;
use loki_types::chat::{
    ChatMessage, ChatRole, Conversation, ConversationId, format_timestamp, parse_timestamp,
};
use loki_types::error::RepositoryError;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ConversationRepository`.
#[derive(Clone)]
pub struct SqliteConversationRepository {
    pool: DatabasePool,
}

impl SqliteConversationRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

/// Internal row type for mapping SQLite rows to domain Conversation.
struct ConversationRow {
    id: String,
    title: String,
    created_at: String,
    updated_at: String,
}

impl ConversationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_conversation(self) -> Result<Conversation, RepositoryError> {
        let id: ConversationId = self
            .id
            .parse()
            .map_err(|e| RepositoryError::Query(format!("invalid conversation id: {e}")))?;

        Ok(Conversation {
            id,
            title: self.title,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

/// Internal row type for mapping SQLite rows to domain ChatMessage.
struct ChatMessageRow {
    id: String,
    conversation_id: String,
    role: String,
    content: String,
    created_at: String,
    token_count: Option<i64>,
    processing_time_ms: Option<i64>,
}

impl ChatMessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            conversation_id: row.try_get("conversation_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
            token_count: row.try_get("token_count")?,
            processing_time_ms: row.try_get("processing_time_ms")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?;
        let conversation_id: ConversationId = self
            .conversation_id
            .parse()
            .map_err(|e| RepositoryError::Query(format!("invalid conversation_id: {e}")))?;
        let role: ChatRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(ChatMessage {
            id,
            conversation_id,
            role,
            content: self.content,
            created_at: parse_datetime(&self.created_at)?,
            token_count: self
                .token_count
                .map(|v| u32::try_from(v).map_err(|_| out_of_range("token_count", v)))
                .transpose()?,
            processing_time_ms: self
                .processing_time_ms
                .map(|v| u64::try_from(v).map_err(|_| out_of_range("processing_time_ms", v)))
                .transpose()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<NaiveDateTime, RepositoryError> {
    parse_timestamp(s).map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn out_of_range(column: &str, value: i64) -> RepositoryError {
    RepositoryError::Query(format!("{column} out of range: {value}"))
}

/// Case-insensitive substring match using full Unicode lowercasing.
fn title_matches(title: &str, needle: &str) -> bool {
    title.to_lowercase().contains(needle)
}

fn map_conversations(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Conversation>, RepositoryError> {
    let mut conversations = Vec::with_capacity(rows.len());
    for row in rows {
        let conversation_row =
            ConversationRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
        conversations.push(conversation_row.into_conversation()?);
    }
    Ok(conversations)
}

fn map_messages(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<ChatMessage>, RepositoryError> {
    let mut messages = Vec::with_capacity(rows.len());
    for row in rows {
        let msg_row =
            ChatMessageRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
        messages.push(msg_row.into_message()?);
    }
    Ok(messages)
}

// ---------------------------------------------------------------------------
// ConversationRepository implementation
// ---------------------------------------------------------------------------

impl ConversationRepository for SqliteConversationRepository {
    async fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<Conversation, RepositoryError> {
        sqlx::query(
            r#"INSERT INTO chat_conversations (id, title, created_at, updated_at)
               VALUES (?, ?, ?, ?)"#,
        )
        .bind(conversation.id.to_string())
        .bind(&conversation.title)
        .bind(format_timestamp(&conversation.created_at))
        .bind(format_timestamp(&conversation.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(conversation.clone())
    }

    async fn get_conversation(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_conversations WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let conversation_row = ConversationRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(conversation_row.into_conversation()?))
            }
            None => Ok(None),
        }
    }

    async fn list_conversations(
        &self,
        limit: Option<i64>,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        // LIMIT -1 means "no limit" in SQLite.
        let rows = sqlx::query(
            "SELECT * FROM chat_conversations ORDER BY updated_at DESC, rowid DESC LIMIT ?",
        )
        .bind(limit.unwrap_or(-1))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        map_conversations(&rows)
    }

    async fn search_conversations(
        &self,
        query: &str,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        // SQLite's LIKE only folds ASCII case, so matching happens here.
        let rows = sqlx::query(
            "SELECT * FROM chat_conversations ORDER BY updated_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let needle = query.to_lowercase();
        let conversations = map_conversations(&rows)?;
        Ok(conversations
            .into_iter()
            .filter(|c| title_matches(&c.title, &needle))
            .collect())
    }

    async fn update_title(&self, id: &ConversationId, title: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE chat_conversations SET title = ? WHERE id = ?")
            .bind(title)
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete_conversation(&self, id: &ConversationId) -> Result<(), RepositoryError> {
        // Messages go with it via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM chat_conversations WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn append_exchange(
        &self,
        id: &ConversationId,
        user: &ChatMessage,
        assistant: &ChatMessage,
        updated_at: NaiveDateTime,
    ) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let touched = sqlx::query("UPDATE chat_conversations SET updated_at = ? WHERE id = ?")
            .bind(format_timestamp(&updated_at))
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if touched.rows_affected() == 0 {
            // Dropping the transaction rolls it back.
            return Err(RepositoryError::NotFound);
        }

        for message in [user, assistant] {
            sqlx::query(
                r#"INSERT INTO chat_messages (id, conversation_id, role, content, created_at, token_count, processing_time_ms)
                   VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(message.id.to_string())
            .bind(id.to_string())
            .bind(message.role.to_string())
            .bind(&message.content)
            .bind(format_timestamp(&message.created_at))
            .bind(message.token_count.map(|v| v as i64))
            .bind(message.processing_time_ms.map(|v| v as i64))
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get_messages(&self, id: &ConversationId) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM chat_messages WHERE conversation_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        map_messages(&rows)
    }

    async fn get_message_page(
        &self,
        id: &ConversationId,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT * FROM chat_messages WHERE conversation_id = ?
               ORDER BY created_at DESC, rowid DESC
               LIMIT ? OFFSET ?"#,
        )
        .bind(id.to_string())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        map_messages(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::default_database_url;
    use loki_types::chat::now_local;

    async fn test_repo() -> (SqliteConversationRepository, DatabasePool) {
        let dir = tempfile::tempdir().unwrap();
        let url = default_database_url(dir.path());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        let pool = DatabasePool::new(&url).await.unwrap();
        (SqliteConversationRepository::new(pool.clone()), pool)
    }

    fn exchange(id: ConversationId, n: usize) -> (ChatMessage, ChatMessage) {
        let user = ChatMessage::user(id, format!("question {n}"));
        let mut assistant = ChatMessage::assistant(id, format!("answer {n}"), user.created_at);
        assistant.token_count = Some(42);
        assistant.processing_time_ms = Some(850);
        (user, assistant)
    }

    async fn append(repo: &SqliteConversationRepository, id: ConversationId, n: usize) {
        let (user, assistant) = exchange(id, n);
        repo.append_exchange(&id, &user, &assistant, assistant.created_at)
            .await
            .unwrap();
    }

    #[test]
    fn test_title_matches_folds_unicode_case() {
        assert!(title_matches("Éclair Recipes", "éclair"));
        assert!(title_matches("STRASSE Ÿ", "ÿ"));
        assert!(!title_matches("Cooking", "trip"));
    }

    #[tokio::test]
    async fn test_create_and_get_conversation() {
        let (repo, _pool) = test_repo().await;
        let conversation = Conversation::new("Trip Planning");

        let created = repo.create_conversation(&conversation).await.unwrap();
        assert_eq!(created, conversation);

        let found = repo.get_conversation(&conversation.id).await.unwrap().unwrap();
        assert_eq!(found, conversation);

        let missing = repo.get_conversation(&ConversationId::new()).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_append_exchange_persists_pair_and_touches_conversation() {
        let (repo, _pool) = test_repo().await;
        let conversation = Conversation::new("Chat");
        repo.create_conversation(&conversation).await.unwrap();

        let (user, assistant) = exchange(conversation.id, 0);
        let updated_at = assistant.created_at + chrono::Duration::seconds(1);
        repo.append_exchange(&conversation.id, &user, &assistant, updated_at)
            .await
            .unwrap();

        let messages = repo.get_messages(&conversation.id).await.unwrap();
        assert_eq!(messages, vec![user, assistant]);
        assert_eq!(messages[1].token_count, Some(42));
        assert_eq!(messages[1].processing_time_ms, Some(850));
        assert!(messages[0].token_count.is_none());

        let stored = repo.get_conversation(&conversation.id).await.unwrap().unwrap();
        assert_eq!(stored.updated_at, updated_at);
        assert_eq!(stored.created_at, conversation.created_at);
    }

    #[tokio::test]
    async fn test_append_exchange_unknown_conversation_writes_nothing() {
        let (repo, pool) = test_repo().await;
        let ghost = ConversationId::new();
        let (user, assistant) = exchange(ghost, 0);

        let err = repo
            .append_exchange(&ghost, &user, &assistant, assistant.created_at)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chat_messages")
            .fetch_one(&pool.reader)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_append_exchange_rolls_back_on_failed_insert() {
        let (repo, _pool) = test_repo().await;
        let conversation = Conversation::new("Chat");
        repo.create_conversation(&conversation).await.unwrap();
        append(&repo, conversation.id, 0).await;
        let before = repo.get_conversation(&conversation.id).await.unwrap().unwrap();

        // Reusing the user message id violates the primary key on insert.
        let existing = repo.get_messages(&conversation.id).await.unwrap();
        let (mut user, assistant) = exchange(conversation.id, 1);
        user.id = existing[0].id;
        let later = assistant.created_at + chrono::Duration::seconds(10);

        let err = repo
            .append_exchange(&conversation.id, &user, &assistant, later)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Query(_)));

        assert_eq!(repo.get_messages(&conversation.id).await.unwrap().len(), 2);
        let after = repo.get_conversation(&conversation.id).await.unwrap().unwrap();
        assert_eq!(after.updated_at, before.updated_at);
    }

    #[tokio::test]
    async fn test_messages_keep_insertion_order_on_equal_timestamps() {
        let (repo, _pool) = test_repo().await;
        let conversation = Conversation::new("Chat");
        repo.create_conversation(&conversation).await.unwrap();

        let stamp = now_local();
        let mut user = ChatMessage::user(conversation.id, "first");
        user.created_at = stamp;
        let mut assistant = ChatMessage::assistant(conversation.id, "second", stamp);
        assistant.created_at = stamp;
        repo.append_exchange(&conversation.id, &user, &assistant, stamp)
            .await
            .unwrap();

        let messages = repo.get_messages(&conversation.id).await.unwrap();
        assert_eq!(messages[0].content, "first");
        assert_eq!(messages[1].content, "second");

        let page = repo.get_message_page(&conversation.id, 0, 10).await.unwrap();
        assert_eq!(page[0].content, "second");
        assert_eq!(page[1].content, "first");
    }

    #[tokio::test]
    async fn test_message_page_newest_first() {
        let (repo, _pool) = test_repo().await;
        let conversation = Conversation::new("Paged");
        repo.create_conversation(&conversation).await.unwrap();
        for n in 0..5 {
            append(&repo, conversation.id, n).await;
        }

        let first = repo.get_message_page(&conversation.id, 0, 4).await.unwrap();
        let contents: Vec<_> = first.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["answer 4", "question 4", "answer 3", "question 3"]);

        let last = repo.get_message_page(&conversation.id, 8, 4).await.unwrap();
        let contents: Vec<_> = last.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["answer 0", "question 0"]);

        let beyond = repo.get_message_page(&conversation.id, 12, 4).await.unwrap();
        assert!(beyond.is_empty());
    }

    #[tokio::test]
    async fn test_list_conversations_by_recency_with_limit() {
        let (repo, _pool) = test_repo().await;
        let base = now_local();
        for i in 0..4 {
            let mut conversation = Conversation::new(format!("Chat {i}"));
            conversation.updated_at = base + chrono::Duration::minutes(i);
            repo.create_conversation(&conversation).await.unwrap();
        }

        let all = repo.list_conversations(None).await.unwrap();
        let titles: Vec<_> = all.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["Chat 3", "Chat 2", "Chat 1", "Chat 0"]);

        let limited = repo.list_conversations(Some(2)).await.unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].title, "Chat 3");
    }

    #[tokio::test]
    async fn test_search_case_insensitive_and_literal() {
        let (repo, _pool) = test_repo().await;
        for title in ["Trip Planning", "Road TRIP", "Cooking", "100% Done", "1000 Done"] {
            repo.create_conversation(&Conversation::new(title))
                .await
                .unwrap();
        }

        let found = repo.search_conversations("trip").await.unwrap();
        let mut titles: Vec<_> = found.iter().map(|c| c.title.clone()).collect();
        titles.sort();
        assert_eq!(titles, ["Road TRIP", "Trip Planning"]);

        let literal = repo.search_conversations("100%").await.unwrap();
        assert_eq!(literal.len(), 1);
        assert_eq!(literal[0].title, "100% Done");

        assert!(repo.search_conversations("sailing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_ignores_non_ascii_case() {
        let (repo, _pool) = test_repo().await;
        for title in ["Éclair Recipes", "Ωmega Notes", "Cooking"] {
            repo.create_conversation(&Conversation::new(title))
                .await
                .unwrap();
        }

        let found = repo.search_conversations("éclair").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Éclair Recipes");

        let found = repo.search_conversations("ωMEGA").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Ωmega Notes");
    }

    #[tokio::test]
    async fn test_message_rejects_out_of_range_metadata() {
        let (repo, pool) = test_repo().await;
        let conversation = Conversation::new("Corrupt");
        repo.create_conversation(&conversation).await.unwrap();
        append(&repo, conversation.id, 0).await;

        sqlx::query("UPDATE chat_messages SET token_count = -1 WHERE role = 'assistant'")
            .execute(&pool.writer)
            .await
            .unwrap();

        let err = repo.get_messages(&conversation.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Query(msg) if msg.contains("token_count")));
    }

    #[tokio::test]
    async fn test_message_page_far_offset_is_empty() {
        let (repo, _pool) = test_repo().await;
        let conversation = Conversation::new("Paged");
        repo.create_conversation(&conversation).await.unwrap();
        append(&repo, conversation.id, 0).await;

        let page = repo
            .get_message_page(&conversation.id, i64::MAX - 100, 100)
            .await
            .unwrap();
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn test_update_title() {
        let (repo, _pool) = test_repo().await;
        let conversation = Conversation::new("Old");
        repo.create_conversation(&conversation).await.unwrap();

        repo.update_title(&conversation.id, "New").await.unwrap();
        let found = repo.get_conversation(&conversation.id).await.unwrap().unwrap();
        assert_eq!(found.title, "New");

        let err = repo
            .update_title(&ConversationId::new(), "New")
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_conversation_cascades_messages() {
        let (repo, pool) = test_repo().await;
        let doomed = Conversation::new("Doomed");
        let kept = Conversation::new("Kept");
        repo.create_conversation(&doomed).await.unwrap();
        repo.create_conversation(&kept).await.unwrap();
        append(&repo, doomed.id, 0).await;
        append(&repo, doomed.id, 1).await;
        append(&repo, kept.id, 0).await;

        repo.delete_conversation(&doomed.id).await.unwrap();

        assert!(repo.get_conversation(&doomed.id).await.unwrap().is_none());
        let (orphans,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM chat_messages WHERE conversation_id = ?")
                .bind(doomed.id.to_string())
                .fetch_one(&pool.reader)
                .await
                .unwrap();
        assert_eq!(orphans, 0);
        assert_eq!(repo.get_messages(&kept.id).await.unwrap().len(), 2);

        let err = repo.delete_conversation(&doomed.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_role_check_constraint() {
        let (repo, pool) = test_repo().await;
        let conversation = Conversation::new("Chat");
        repo.create_conversation(&conversation).await.unwrap();

        let result = sqlx::query(
            "INSERT INTO chat_messages (id, conversation_id, role, content, created_at) VALUES (?, ?, 'system', 'x', ?)",
        )
        .bind(Uuid::now_v7().to_string())
        .bind(conversation.id.to_string())
        .bind(format_timestamp(&now_local()))
        .execute(&pool.writer)
        .await;
        assert!(result.is_err(), "system messages must not be storable");
    }
}
