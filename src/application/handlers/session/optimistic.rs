//! Read-modify-write against a versioned session record.

use crate::domain::foundation::{ErrorCode, SessionId};
use crate::domain::session::{Session, SessionError};
use crate::ports::SessionRepository;

/// Attempts per write before giving up with `Conflict`.
pub const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Loads the session, applies `apply` and writes it back.
///
/// A concurrent writer makes the versioned update fail; the session is then
/// reloaded and `apply` runs again on the fresh copy. Errors from `apply` abort
/// without writing anything.
pub(super) async fn modify_session<T, F>(
    repository: &dyn SessionRepository,
    session_id: SessionId,
    mut apply: F,
) -> Result<(Session, T), SessionError>
where
    F: FnMut(&mut Session) -> Result<T, SessionError>,
{
    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        let mut session = repository
            .find_by_id(&session_id)
            .await?
            .ok_or(SessionError::NotFound(session_id))?;

        let outcome = apply(&mut session)?;

        match repository.update(&session).await {
            Ok(()) => {
                session.mark_persisted();
                return Ok((session, outcome));
            }
            Err(e) if e.code == ErrorCode::ConcurrentModification => {
                tracing::debug!(%session_id, attempt, "Session changed underneath us, retrying");
            }
            Err(e) if e.code == ErrorCode::SessionNotFound => {
                return Err(SessionError::NotFound(session_id));
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::warn!(%session_id, attempts = MAX_WRITE_ATTEMPTS, "Giving up on contended session");
    Err(SessionError::Conflict(session_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemorySessionRepository;
    use crate::domain::foundation::{AccountId, DomainError, FlowId};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn new_session() -> Session {
        Session::new(
            SessionId::new(),
            AccountId::new("acct_1").unwrap(),
            FlowId::new("freelancer-clarity").unwrap(),
            None,
            None,
        )
        .unwrap()
    }

    /// Fails the first `conflicts` updates with ConcurrentModification.
    struct ContendedRepository {
        inner: InMemorySessionRepository,
        conflicts: u32,
        updates: AtomicU32,
    }

    #[async_trait]
    impl SessionRepository for ContendedRepository {
        async fn save(&self, session: &Session) -> Result<(), DomainError> {
            self.inner.save(session).await
        }

        async fn update(&self, session: &Session) -> Result<(), DomainError> {
            let n = self.updates.fetch_add(1, Ordering::SeqCst);
            if n < self.conflicts {
                return Err(DomainError::new(ErrorCode::ConcurrentModification, "raced"));
            }
            self.inner.update(session).await
        }

        async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, DomainError> {
            self.inner.find_by_id(id).await
        }
    }

    async fn contended(conflicts: u32) -> (ContendedRepository, SessionId) {
        let repo = ContendedRepository {
            inner: InMemorySessionRepository::new(),
            conflicts,
            updates: AtomicU32::new(0),
        };
        let session = new_session();
        repo.save(&session).await.unwrap();
        (repo, *session.id())
    }

    #[tokio::test]
    async fn retries_until_the_write_lands() {
        let (repo, id) = contended(2).await;
        let mut applied = 0;

        let (session, ()) = modify_session(&repo, id, |_| {
            applied += 1;
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(applied, 3);
        assert_eq!(session.version(), 1);
    }

    #[tokio::test]
    async fn exhausted_retries_are_a_conflict() {
        let (repo, id) = contended(MAX_WRITE_ATTEMPTS).await;
        let err = modify_session(&repo, id, |_| Ok(())).await.unwrap_err();
        assert_eq!(err, SessionError::Conflict(id));
    }

    #[tokio::test]
    async fn apply_error_skips_the_write() {
        let (repo, id) = contended(0).await;
        let err = modify_session(&repo, id, |_| -> Result<(), SessionError> {
            Err(SessionError::validation("stepId", "bad"))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, SessionError::ValidationFailed { .. }));
        assert_eq!(repo.updates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_session_is_not_found() {
        let repo = InMemorySessionRepository::new();
        let id = SessionId::new();
        let err = modify_session(&repo, id, |_| Ok(())).await.unwrap_err();
        assert_eq!(err, SessionError::NotFound(id));
    }
}
