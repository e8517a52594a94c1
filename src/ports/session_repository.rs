//! Session persistence port.
//!
//! One record per visitor, never deleted. Writes are guarded by the version
//! the caller loaded: `update` only lands when the stored version still
//! matches, and bumps it by one.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, SessionId};
use crate::domain::session::Session;

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Inserts a freshly created session at version 0.
    async fn save(&self, session: &Session) -> Result<(), DomainError>;

    /// Compare-and-swap on `session.version()`.
    ///
    /// Fails with `SessionNotFound` when the row is missing and
    /// `ConcurrentModification` when another writer got there first.
    async fn update(&self, session: &Session) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, DomainError>;
}
