//! SessionStatus enum for tracking the lifecycle of funnel sessions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Lifecycle status of a funnel session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Active,
    Completed,
    Abandoned,
}

impl SessionStatus {
    /// Returns true if the session still accepts step progression.
    pub fn is_mutable(&self) -> bool {
        matches!(self, SessionStatus::Active)
    }

    /// Validates a transition from this status to another.
    ///
    /// Valid transitions:
    /// - Active -> Completed
    /// - Active -> Abandoned
    /// - Abandoned -> Active (visitor came back)
    pub fn can_transition_to(&self, target: &SessionStatus) -> bool {
        use SessionStatus::*;
        matches!(
            (self, target),
            (Active, Completed) | (Active, Abandoned) | (Abandoned, Active)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SessionStatus::Active),
            "completed" => Ok(SessionStatus::Completed),
            "abandoned" => Ok(SessionStatus::Abandoned),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown session status '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_active() {
        assert_eq!(SessionStatus::default(), SessionStatus::Active);
    }

    #[test]
    fn only_active_is_mutable() {
        assert!(SessionStatus::Active.is_mutable());
        assert!(!SessionStatus::Completed.is_mutable());
        assert!(!SessionStatus::Abandoned.is_mutable());
    }

    #[test]
    fn active_can_complete_or_be_abandoned() {
        assert!(SessionStatus::Active.can_transition_to(&SessionStatus::Completed));
        assert!(SessionStatus::Active.can_transition_to(&SessionStatus::Abandoned));
    }

    #[test]
    fn abandoned_can_resume() {
        assert!(SessionStatus::Abandoned.can_transition_to(&SessionStatus::Active));
    }

    #[test]
    fn completed_is_terminal() {
        assert!(!SessionStatus::Completed.can_transition_to(&SessionStatus::Active));
        assert!(!SessionStatus::Completed.can_transition_to(&SessionStatus::Abandoned));
    }

    #[test]
    fn parses_from_storage_strings() {
        assert_eq!("completed".parse::<SessionStatus>().unwrap(), SessionStatus::Completed);
        assert!("archived".parse::<SessionStatus>().is_err());
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&SessionStatus::Abandoned).unwrap();
        assert_eq!(json, "\"abandoned\"");
    }
}
