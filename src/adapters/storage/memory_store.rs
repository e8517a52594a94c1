//! In-memory conversation memory.
//!
//! Similarity is the share of query words that also appear in a memory.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::SessionId;
use crate::ports::{MemoryQuery, MemoryRecord, MemoryStore, MemoryStoreError};

#[derive(Debug, Clone, Default)]
pub struct InMemoryMemoryStore {
    memories: Arc<RwLock<HashMap<SessionId, Vec<MemoryRecord>>>>,
}

impl InMemoryMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of memories held for `session_id`.
    pub async fn count(&self, session_id: &SessionId) -> usize {
        self.memories
            .read()
            .await
            .get(session_id)
            .map_or(0, Vec::len)
    }
}

fn tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 2)
        .map(str::to_lowercase)
        .collect()
}

fn overlap(query: &HashSet<String>, content: &str) -> f64 {
    if query.is_empty() {
        return 0.0;
    }
    let shared = tokens(content).intersection(query).count();
    shared as f64 / query.len() as f64
}

#[async_trait]
impl MemoryStore for InMemoryMemoryStore {
    async fn recall(&self, query: &MemoryQuery) -> Result<Vec<MemoryRecord>, MemoryStoreError> {
        let wanted = tokens(&query.text);
        let memories = self.memories.read().await;
        let Some(records) = memories.get(&query.session_id) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<(f64, &MemoryRecord)> = records
            .iter()
            .map(|record| (overlap(&wanted, &record.content), record))
            .filter(|(score, _)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then_with(|| b.1.created_at.cmp(&a.1.created_at))
        });

        Ok(scored
            .into_iter()
            .take(query.limit)
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn remember(&self, record: MemoryRecord) -> Result<(), MemoryStoreError> {
        self.memories
            .write()
            .await
            .entry(record.session_id)
            .or_default()
            .push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::AgentId;

    fn record(session: SessionId, content: &str) -> MemoryRecord {
        MemoryRecord::new(session, AgentId::new("chat").unwrap(), content)
    }

    #[tokio::test]
    async fn recalls_most_similar_first() {
        let store = InMemoryMemoryStore::new();
        let session = SessionId::new();
        store.remember(record(session, "Visitor asked about pricing tiers")).await.unwrap();
        store.remember(record(session, "Visitor worries about pricing and booking gaps")).await.unwrap();
        store.remember(record(session, "Talked about holidays")).await.unwrap();

        let recalled = store
            .recall(&MemoryQuery::new(session, "pricing for booking", 5))
            .await
            .unwrap();

        assert_eq!(recalled.len(), 2);
        assert!(recalled[0].content.contains("booking gaps"));
    }

    #[tokio::test]
    async fn recall_is_scoped_to_session_and_limited() {
        let store = InMemoryMemoryStore::new();
        let mine = SessionId::new();
        let other = SessionId::new();
        for i in 0..4 {
            store.remember(record(mine, &format!("pricing note {}", i))).await.unwrap();
        }
        store.remember(record(other, "pricing elsewhere")).await.unwrap();

        let recalled = store.recall(&MemoryQuery::new(mine, "pricing", 3)).await.unwrap();
        assert_eq!(recalled.len(), 3);
        assert!(recalled.iter().all(|r| r.session_id == mine));
        assert_eq!(store.count(&other).await, 1);
    }

    #[tokio::test]
    async fn unknown_session_recalls_nothing() {
        let store = InMemoryMemoryStore::new();
        let recalled = store
            .recall(&MemoryQuery::new(SessionId::new(), "anything at all", 3))
            .await
            .unwrap();
        assert!(recalled.is_empty());
    }
}
