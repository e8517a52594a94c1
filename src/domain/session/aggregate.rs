//! Session aggregate entity.
//!
//! A session is the durable, server-authoritative record of one visitor's
//! progress through a flow. Progress lives in a single pointer token; which
//! phases are complete is always derived from it.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use super::answers::merge_answers;
use super::contact::{ContactInfo, ContactUpdate};
use super::errors::SessionError;
use crate::domain::flow::{CompletedPhases, FlowStage, INITIAL_POINTER};
use crate::domain::foundation::{AccountId, FlowId, SessionId, SessionStatus, Timestamp, UserId};

/// Longest pointer token accepted from a client.
pub const MAX_POINTER_LENGTH: usize = 120;

/// Session aggregate.
///
/// # Invariants
///
/// - `current_step_id` is the only record of progress
/// - `answers` is always a JSON object
/// - `version` increases by one on every persisted change
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    id: SessionId,
    account_id: AccountId,
    user_id: Option<UserId>,
    flow_id: FlowId,
    current_step_id: String,
    answers: Value,
    contact: ContactInfo,
    status: SessionStatus,
    version: i64,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Session {
    /// Creates a session at the first phase.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if the initial context is not an object
    pub fn new(
        id: SessionId,
        account_id: AccountId,
        flow_id: FlowId,
        user_id: Option<UserId>,
        initial_context: Option<Value>,
    ) -> Result<Self, SessionError> {
        let answers = match initial_context {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(Value::Object(map)) => Value::Object(map),
            Some(_) => return Err(SessionError::validation("context", "must be an object")),
        };

        let now = Timestamp::now();
        Ok(Self {
            id,
            account_id,
            user_id,
            flow_id,
            current_step_id: INITIAL_POINTER.to_string(),
            answers,
            contact: ContactInfo::default(),
            status: SessionStatus::Active,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstitute a session from persistence (no validation).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: SessionId,
        account_id: AccountId,
        user_id: Option<UserId>,
        flow_id: FlowId,
        current_step_id: String,
        answers: Value,
        contact: ContactInfo,
        status: SessionStatus,
        version: i64,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            account_id,
            user_id,
            flow_id,
            current_step_id,
            answers,
            contact,
            status,
            version,
            created_at,
            updated_at,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    pub fn flow_id(&self) -> &FlowId {
        &self.flow_id
    }

    pub fn current_step_id(&self) -> &str {
        &self.current_step_id
    }

    pub fn answers(&self) -> &Value {
        &self.answers
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    pub fn first_name(&self) -> Option<&str> {
        self.contact.first_name.as_deref()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Derived progress
    // ─────────────────────────────────────────────────────────────────────────

    pub fn completed_phases(&self, phase_count: u32) -> CompletedPhases {
        CompletedPhases::from_pointer(&self.current_step_id, Some(phase_count))
    }

    pub fn stage(&self, phase_count: u32) -> FlowStage {
        FlowStage::from_pointer(&self.current_step_id, phase_count)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Records a claimed step completion.
    ///
    /// The pointer is overwritten with `step_id` as given. An abandoned session
    /// becomes active again; a completed one stays completed so that a client
    /// replaying its last step gets the same answer back.
    pub fn record_step(
        &mut self,
        step_id: &str,
        patch: Option<Map<String, Value>>,
        namespaces: &BTreeSet<String>,
    ) -> Result<(), SessionError> {
        let step_id = step_id.trim();
        if step_id.is_empty() {
            return Err(SessionError::validation("stepId", "cannot be empty"));
        }
        if step_id.len() > MAX_POINTER_LENGTH {
            return Err(SessionError::validation("stepId", "too long"));
        }
        if self.status == SessionStatus::Abandoned {
            self.status = SessionStatus::Active;
        }

        if let Some(patch) = patch {
            merge_answers(&mut self.answers, patch, namespaces);
        }
        self.current_step_id = step_id.to_string();
        self.touch();
        Ok(())
    }

    /// Shallow-merges free-form context into the answers tree.
    pub fn merge_context(&mut self, patch: Map<String, Value>, namespaces: &BTreeSet<String>) {
        merge_answers(&mut self.answers, patch, namespaces);
        self.touch();
    }

    /// Applies a contact update, returning whether the visitor should be
    /// announced: some contact field changed and they can be reached.
    pub fn update_contact(&mut self, update: ContactUpdate) -> Result<bool, SessionError> {
        let update = update.normalized()?;
        let changed = self.contact.apply(update);
        if changed {
            self.touch();
        }
        Ok(changed && self.contact.has_reachable_channel())
    }

    pub fn transition_to(&mut self, target: SessionStatus) -> Result<(), SessionError> {
        if self.status == target {
            return Ok(());
        }
        if !self.status.can_transition_to(&target) {
            return Err(SessionError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        self.touch();
        Ok(())
    }

    /// Marks the in-memory copy as matching the stored row after a save.
    pub fn mark_persisted(&mut self) {
        self.version += 1;
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_session() -> Session {
        Session::new(
            SessionId::new(),
            AccountId::new("acct_1").unwrap(),
            FlowId::new("freelancer-clarity").unwrap(),
            None,
            None,
        )
        .unwrap()
    }

    fn no_namespaces() -> BTreeSet<String> {
        BTreeSet::new()
    }

    #[test]
    fn new_session_starts_at_phase_one() {
        let session = test_session();
        assert_eq!(session.current_step_id(), "phase-1-start");
        assert_eq!(session.status(), SessionStatus::Active);
        assert!(session.completed_phases(4).is_empty());
        assert_eq!(session.stage(4), FlowStage::Welcome);
    }

    #[test]
    fn new_session_rejects_non_object_context() {
        let result = Session::new(
            SessionId::new(),
            AccountId::new("a").unwrap(),
            FlowId::new("f").unwrap(),
            None,
            Some(json!(["x"])),
        );
        assert!(matches!(result, Err(SessionError::ValidationFailed { .. })));
    }

    #[test]
    fn record_step_overwrites_pointer_and_merges() {
        let mut session = test_session();
        let patch = json!({"situation": {"bookingStatus": "open"}});
        session
            .record_step("phase-1-complete", patch.as_object().cloned(), &no_namespaces())
            .unwrap();

        assert_eq!(session.current_step_id(), "phase-1-complete");
        assert_eq!(session.answers()["situation"]["bookingStatus"], "open");
        assert_eq!(session.completed_phases(4), CompletedPhases::through(1));
    }

    #[test]
    fn record_step_accepts_unrecognized_pointer() {
        let mut session = test_session();
        session.record_step("whatever", None, &no_namespaces()).unwrap();
        assert!(session.completed_phases(4).is_empty());
        assert_eq!(session.stage(4), FlowStage::Welcome);
    }

    #[test]
    fn record_step_rejects_blank_step() {
        let mut session = test_session();
        assert!(session.record_step("  ", None, &no_namespaces()).is_err());
    }

    #[test]
    fn completed_session_accepts_replayed_step() {
        let mut session = test_session();
        session.record_step("phase-4-complete", None, &no_namespaces()).unwrap();
        session.transition_to(SessionStatus::Completed).unwrap();

        session.record_step("phase-4-complete", None, &no_namespaces()).unwrap();
        assert_eq!(session.current_step_id(), "phase-4-complete");
        assert_eq!(session.status(), SessionStatus::Completed);
    }

    #[test]
    fn abandoned_session_resumes_on_progress() {
        let mut session = test_session();
        session.transition_to(SessionStatus::Abandoned).unwrap();
        session.record_step("phase-1-booking", None, &no_namespaces()).unwrap();
        assert_eq!(session.status(), SessionStatus::Active);
    }

    #[test]
    fn contact_change_reports_reachability() {
        let mut session = test_session();
        let notify = session
            .update_contact(ContactUpdate {
                first_name: Some("Sam".into()),
                ..Default::default()
            })
            .unwrap();
        assert!(!notify, "a name alone is not a reachable channel");

        let notify = session
            .update_contact(ContactUpdate {
                email: Some("sam@example.com".into()),
                ..Default::default()
            })
            .unwrap();
        assert!(notify);

        let notify = session
            .update_contact(ContactUpdate {
                email: Some("sam@example.com".into()),
                ..Default::default()
            })
            .unwrap();
        assert!(!notify, "unchanged email does not re-notify");

        let notify = session
            .update_contact(ContactUpdate {
                first_name: Some("Samantha".into()),
                ..Default::default()
            })
            .unwrap();
        assert!(notify, "a renamed reachable visitor is announced again");
    }

    #[test]
    fn invalid_status_transition_is_rejected() {
        let mut session = test_session();
        session.transition_to(SessionStatus::Completed).unwrap();
        assert!(matches!(
            session.transition_to(SessionStatus::Active),
            Err(SessionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn mark_persisted_bumps_version() {
        let mut session = test_session();
        session.mark_persisted();
        assert_eq!(session.version(), 1);
    }
}
