//! PostgreSQL implementation of MemoryStore.
//!
//! Memories live in `session_memories` with a generated `tsvector` column.
//! Recall ranks a session's memories against the query with `ts_rank` over an
//! OR-ed term query, so any shared word counts.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{AgentId, Timestamp};
use crate::ports::{MemoryQuery, MemoryRecord, MemoryStore, MemoryStoreError};

#[derive(Clone)]
pub struct PostgresMemoryStore {
    pool: PgPool,
}

impl PostgresMemoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Builds an OR query (`a | b | c`) from the alphanumeric words of `text`.
fn or_query(text: &str) -> Option<String> {
    let terms: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 2)
        .map(str::to_lowercase)
        .collect();
    (!terms.is_empty()).then(|| terms.join(" | "))
}

#[async_trait]
impl MemoryStore for PostgresMemoryStore {
    async fn recall(&self, query: &MemoryQuery) -> Result<Vec<MemoryRecord>, MemoryStoreError> {
        let Some(tsquery) = or_query(&query.text) else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query_as::<_, (String, String, chrono::DateTime<chrono::Utc>)>(
            r#"
            SELECT agent_id, content, created_at FROM (
                SELECT agent_id, content, created_at,
                       ts_rank(search, to_tsquery('english', $2)) AS rank
                FROM session_memories
                WHERE session_id = $1
            ) ranked
            WHERE rank > 0
            ORDER BY rank DESC, created_at DESC
            LIMIT $3
            "#,
        )
        .bind(query.session_id.as_uuid())
        .bind(&tsquery)
        .bind(query.limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MemoryStoreError::Unavailable(format!("Database error: {}", e)))?;

        Ok(rows
            .into_iter()
            .filter_map(|(agent_id, content, created_at)| {
                Some(MemoryRecord {
                    session_id: query.session_id,
                    agent_id: AgentId::new(agent_id).ok()?,
                    content,
                    created_at: Timestamp::from_datetime(created_at),
                })
            })
            .collect())
    }

    async fn remember(&self, record: MemoryRecord) -> Result<(), MemoryStoreError> {
        sqlx::query(
            r#"
            INSERT INTO session_memories (id, session_id, agent_id, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(uuid::Uuid::new_v4())
        .bind(record.session_id.as_uuid())
        .bind(record.agent_id.as_str())
        .bind(&record.content)
        .bind(record.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryStoreError::Unavailable(format!("Failed to insert memory: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn or_query_joins_meaningful_words() {
        assert_eq!(
            or_query("How do I raise my day-rate?").as_deref(),
            Some("how | raise | day | rate")
        );
    }

    #[test]
    fn or_query_of_noise_is_none() {
        assert_eq!(or_query("?? a an !!"), None);
    }
}
