//! In-memory session repository.
//!
//! Same versioning contract as the Postgres adapter, for development servers
//! started without a database and for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, SessionId};
use crate::domain::session::Session;
use crate::ports::SessionRepository;

#[derive(Debug, Clone, Default)]
pub struct InMemorySessionRepository {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn save(&self, session: &Session) -> Result<(), DomainError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(session.id()) {
            return Err(DomainError::database(format!(
                "Session {} already exists",
                session.id()
            )));
        }
        sessions.insert(*session.id(), session.clone());
        Ok(())
    }

    async fn update(&self, session: &Session) -> Result<(), DomainError> {
        let mut sessions = self.sessions.write().await;
        let stored = sessions.get_mut(session.id()).ok_or_else(|| {
            DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Session not found: {}", session.id()),
            )
        })?;

        if stored.version() != session.version() {
            return Err(DomainError::new(
                ErrorCode::ConcurrentModification,
                format!("Session {} was modified concurrently", session.id()),
            ));
        }

        let mut updated = session.clone();
        updated.mark_persisted();
        *stored = updated;
        Ok(())
    }

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, DomainError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{AccountId, FlowId};
    use std::collections::BTreeSet;

    fn session() -> Session {
        Session::new(
            SessionId::new(),
            AccountId::new("acct_1").unwrap(),
            FlowId::new("freelancer-clarity").unwrap(),
            None,
            None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn save_then_find() {
        let repo = InMemorySessionRepository::new();
        let session = session();
        repo.save(&session).await.unwrap();

        let found = repo.find_by_id(session.id()).await.unwrap().unwrap();
        assert_eq!(found, session);
        assert!(repo.find_by_id(&SessionId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_bumps_stored_version() {
        let repo = InMemorySessionRepository::new();
        let mut session = session();
        repo.save(&session).await.unwrap();

        session
            .record_step("phase-1-complete", None, &BTreeSet::new())
            .unwrap();
        repo.update(&session).await.unwrap();

        let stored = repo.find_by_id(session.id()).await.unwrap().unwrap();
        assert_eq!(stored.version(), 1);
        assert_eq!(stored.current_step_id(), "phase-1-complete");
    }

    #[tokio::test]
    async fn stale_update_is_a_conflict() {
        let repo = InMemorySessionRepository::new();
        let session = session();
        repo.save(&session).await.unwrap();

        let first = session.clone();
        let second = session.clone();
        repo.update(&first).await.unwrap();

        let err = repo.update(&second).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ConcurrentModification);
    }

    #[tokio::test]
    async fn update_of_unknown_session_is_not_found() {
        let repo = InMemorySessionRepository::new();
        let err = repo.update(&session()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionNotFound);
    }
}
