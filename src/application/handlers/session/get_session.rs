//! GetSessionHandler - Query handler for a single session.

use std::sync::Arc;

use crate::domain::foundation::SessionId;
use crate::domain::session::{Session, SessionError};
use crate::ports::SessionRepository;

pub struct GetSessionHandler {
    repository: Arc<dyn SessionRepository>,
}

impl GetSessionHandler {
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, session_id: SessionId) -> Result<Session, SessionError> {
        self.repository
            .find_by_id(&session_id)
            .await?
            .ok_or(SessionError::NotFound(session_id))
    }
}
