//! PostgreSQL implementation of SessionRepository.
//!
//! Persists Session aggregates to the `sessions` table. Answers are stored as
//! `jsonb`; contact fields are plain columns so they can be exported.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{
    AccountId, DomainError, ErrorCode, FlowId, SessionId, SessionStatus, Timestamp, UserId,
};
use crate::domain::session::{ContactInfo, Session};
use crate::ports::SessionRepository;

/// PostgreSQL implementation of SessionRepository.
#[derive(Clone)]
pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    async fn save(&self, session: &Session) -> Result<(), DomainError> {
        let contact = session.contact();
        sqlx::query(
            r#"
            INSERT INTO sessions (
                id, account_id, user_id, flow_id, current_step_id, answers,
                first_name, email, phone, status, version, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(session.id().as_uuid())
        .bind(session.account_id().as_str())
        .bind(session.user_id().map(UserId::as_str))
        .bind(session.flow_id().as_str())
        .bind(session.current_step_id())
        .bind(session.answers())
        .bind(contact.first_name.as_deref())
        .bind(contact.email.as_deref())
        .bind(contact.phone.as_deref())
        .bind(session.status().as_str())
        .bind(session.version())
        .bind(session.created_at().as_datetime())
        .bind(session.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert session: {}", e)))?;

        Ok(())
    }

    async fn update(&self, session: &Session) -> Result<(), DomainError> {
        let contact = session.contact();
        let result = sqlx::query(
            r#"
            UPDATE sessions SET
                current_step_id = $3,
                answers = $4,
                first_name = $5,
                email = $6,
                phone = $7,
                status = $8,
                updated_at = $9,
                version = version + 1
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(session.id().as_uuid())
        .bind(session.version())
        .bind(session.current_step_id())
        .bind(session.answers())
        .bind(contact.first_name.as_deref())
        .bind(contact.email.as_deref())
        .bind(contact.phone.as_deref())
        .bind(session.status().as_str())
        .bind(session.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update session: {}", e)))?;

        if result.rows_affected() == 0 {
            let exists: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions WHERE id = $1")
                .bind(session.id().as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to check session: {}", e)))?;

            return Err(if exists.0 == 0 {
                DomainError::new(
                    ErrorCode::SessionNotFound,
                    format!("Session not found: {}", session.id()),
                )
            } else {
                DomainError::new(
                    ErrorCode::ConcurrentModification,
                    format!("Session {} was modified concurrently", session.id()),
                )
            });
        }

        Ok(())
    }

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, account_id, user_id, flow_id, current_step_id, answers,
                   first_name, email, phone, status, version, created_at, updated_at
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to fetch session: {}", e)))?;

        row.map(row_to_session).transpose()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

fn column<'r, T>(row: &'r sqlx::postgres::PgRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| DomainError::database(format!("Failed to get {}: {}", name, e)))
}

fn str_to_session_status(s: &str) -> Result<SessionStatus, DomainError> {
    s.parse::<SessionStatus>()
        .map_err(|_| DomainError::database(format!("Invalid session status: {}", s)))
}

fn row_to_session(row: sqlx::postgres::PgRow) -> Result<Session, DomainError> {
    let id: uuid::Uuid = column(&row, "id")?;
    let account_id: String = column(&row, "account_id")?;
    let user_id: Option<String> = column(&row, "user_id")?;
    let flow_id: String = column(&row, "flow_id")?;
    let current_step_id: String = column(&row, "current_step_id")?;
    let answers: serde_json::Value = column(&row, "answers")?;
    let status: String = column(&row, "status")?;
    let version: i64 = column(&row, "version")?;
    let created_at: chrono::DateTime<chrono::Utc> = column(&row, "created_at")?;
    let updated_at: chrono::DateTime<chrono::Utc> = column(&row, "updated_at")?;

    let contact = ContactInfo {
        first_name: column(&row, "first_name")?,
        email: column(&row, "email")?,
        phone: column(&row, "phone")?,
    };

    let invalid = |field: &str, e: crate::domain::foundation::ValidationError| {
        DomainError::database(format!("Invalid {}: {}", field, e))
    };

    Ok(Session::reconstitute(
        SessionId::from_uuid(id),
        AccountId::new(account_id).map_err(|e| invalid("account_id", e))?,
        user_id
            .map(UserId::new)
            .transpose()
            .map_err(|e| invalid("user_id", e))?,
        FlowId::new(flow_id).map_err(|e| invalid("flow_id", e))?,
        current_step_id,
        answers,
        contact,
        str_to_session_status(&status)?,
        version,
        Timestamp::from_datetime(created_at),
        Timestamp::from_datetime(updated_at),
    ))
}
