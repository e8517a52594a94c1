//! Step pointer parsing and completed-phase derivation.
//!
//! A session stores exactly one progression token, `phase-<N>-<state>`.
//! Everything else about progress is computed from it here.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Pointer a new session starts at.
pub const INITIAL_POINTER: &str = "phase-1-start";

/// Parsed progression token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepPointer {
    /// `phase-N-start`: phase N has begun, nothing in it is done.
    Start(u32),
    /// `phase-N-<step>`: somewhere inside phase N.
    Within { phase: u32, step: String },
    /// `phase-N-complete`: phase N and everything before it is done.
    Complete(u32),
}

impl StepPointer {
    /// Parses a raw token. Returns `None` for anything not shaped like
    /// `phase-<N>-<state>` with `N >= 1`.
    pub fn parse(token: &str) -> Option<Self> {
        let rest = token.strip_prefix("phase-")?;
        let (number, state) = rest.split_once('-')?;
        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let phase: u32 = number.parse().ok()?;
        if phase == 0 || state.is_empty() {
            return None;
        }
        Some(match state {
            "start" => StepPointer::Start(phase),
            "complete" => StepPointer::Complete(phase),
            step => StepPointer::Within {
                phase,
                step: step.to_string(),
            },
        })
    }

    pub fn phase(&self) -> u32 {
        match self {
            StepPointer::Start(n) | StepPointer::Complete(n) => *n,
            StepPointer::Within { phase, .. } => *phase,
        }
    }

    /// Highest phase number this pointer implies is done.
    pub fn highest_completed(&self) -> u32 {
        match self {
            StepPointer::Complete(n) => *n,
            StepPointer::Start(n) => n - 1,
            StepPointer::Within { phase, .. } => phase - 1,
        }
    }
}

impl fmt::Display for StepPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepPointer::Start(n) => write!(f, "phase-{}-start", n),
            StepPointer::Within { phase, step } => write!(f, "phase-{}-{}", phase, step),
            StepPointer::Complete(n) => write!(f, "phase-{}-complete", n),
        }
    }
}

/// Set of completed phase numbers, always a dense `1..=k` prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CompletedPhases(BTreeSet<u32>);

impl CompletedPhases {
    pub fn none() -> Self {
        Self::default()
    }

    /// Phases `1..=count`.
    pub fn through(count: u32) -> Self {
        Self((1..=count).collect())
    }

    /// Derives completed phases from a raw pointer token.
    ///
    /// `phase_count`, when known, caps the result at the flow's last phase.
    pub fn from_pointer(token: &str, phase_count: Option<u32>) -> Self {
        let Some(pointer) = StepPointer::parse(token) else {
            return Self::none();
        };
        let highest = pointer.highest_completed();
        let capped = match phase_count {
            Some(max) => highest.min(max),
            None => highest,
        };
        Self::through(capped)
    }

    pub fn contains(&self, phase: u32) -> bool {
        self.0.contains(&phase)
    }

    pub fn count(&self) -> u32 {
        self.0.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn highest(&self) -> Option<u32> {
        self.0.iter().next_back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

/// Session-level lifecycle projection of the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", content = "phase", rename_all = "snake_case")]
pub enum FlowStage {
    Welcome,
    PhaseInProgress(u32),
    PhaseComplete(u32),
    AllPhasesComplete,
}

impl FlowStage {
    /// Unparseable pointers land on `Welcome` (phase 1).
    pub fn from_pointer(token: &str, phase_count: u32) -> Self {
        match StepPointer::parse(token) {
            None | Some(StepPointer::Start(1)) => FlowStage::Welcome,
            Some(StepPointer::Complete(n)) if n >= phase_count => FlowStage::AllPhasesComplete,
            Some(StepPointer::Complete(n)) => FlowStage::PhaseComplete(n),
            Some(pointer) => FlowStage::PhaseInProgress(pointer.phase().min(phase_count.max(1))),
        }
    }

    /// Phase the visitor is currently working through.
    pub fn current_phase(&self, phase_count: u32) -> u32 {
        match self {
            FlowStage::Welcome => 1,
            FlowStage::PhaseInProgress(n) => *n,
            FlowStage::PhaseComplete(n) => (n + 1).min(phase_count.max(1)),
            FlowStage::AllPhasesComplete => phase_count.max(1),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowStage::AllPhasesComplete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_start_complete_and_within() {
        assert_eq!(StepPointer::parse("phase-1-start"), Some(StepPointer::Start(1)));
        assert_eq!(StepPointer::parse("phase-3-complete"), Some(StepPointer::Complete(3)));
        assert_eq!(
            StepPointer::parse("phase-2-booking-status"),
            Some(StepPointer::Within {
                phase: 2,
                step: "booking-status".to_string()
            })
        );
    }

    #[test]
    fn rejects_malformed_tokens() {
        for token in ["", "phase", "phase-", "phase-x-start", "phase-0-start", "phase-2-", "step-2-start", "phase--1-start", "phase-+1-start"] {
            assert_eq!(StepPointer::parse(token), None, "token {:?}", token);
        }
    }

    #[test]
    fn display_roundtrips() {
        for token in ["phase-1-start", "phase-4-complete", "phase-2-goal"] {
            assert_eq!(StepPointer::parse(token).unwrap().to_string(), token);
        }
    }

    #[test]
    fn derives_completed_phases() {
        assert_eq!(CompletedPhases::from_pointer("phase-3-complete", None), CompletedPhases::through(3));
        assert_eq!(CompletedPhases::from_pointer("phase-3-start", None), CompletedPhases::through(2));
        assert_eq!(CompletedPhases::from_pointer("phase-3-goal", None), CompletedPhases::through(2));
        assert!(CompletedPhases::from_pointer("phase-1-start", None).is_empty());
        assert!(CompletedPhases::from_pointer("garbage", None).is_empty());
    }

    #[test]
    fn derivation_is_capped_by_flow_length() {
        let completed = CompletedPhases::from_pointer("phase-9-complete", Some(4));
        assert_eq!(completed.highest(), Some(4));
        assert_eq!(completed.count(), 4);
    }

    #[test]
    fn stage_projection() {
        assert_eq!(FlowStage::from_pointer("phase-1-start", 4), FlowStage::Welcome);
        assert_eq!(FlowStage::from_pointer("nonsense", 4), FlowStage::Welcome);
        assert_eq!(FlowStage::from_pointer("phase-2-start", 4), FlowStage::PhaseInProgress(2));
        assert_eq!(FlowStage::from_pointer("phase-2-complete", 4), FlowStage::PhaseComplete(2));
        assert_eq!(FlowStage::from_pointer("phase-4-complete", 4), FlowStage::AllPhasesComplete);
    }

    #[test]
    fn current_phase_advances_after_completion() {
        assert_eq!(FlowStage::PhaseComplete(2).current_phase(4), 3);
        assert_eq!(FlowStage::Welcome.current_phase(4), 1);
        assert_eq!(FlowStage::AllPhasesComplete.current_phase(4), 4);
    }

    proptest! {
        #[test]
        fn complete_pointer_derives_one_through_n(n in 1u32..200) {
            let completed = CompletedPhases::from_pointer(&format!("phase-{}-complete", n), None);
            prop_assert_eq!(completed, CompletedPhases::through(n));
        }

        #[test]
        fn start_pointer_derives_one_through_n_minus_one(n in 1u32..200) {
            let completed = CompletedPhases::from_pointer(&format!("phase-{}-start", n), None);
            prop_assert_eq!(completed, CompletedPhases::through(n - 1));
        }

        #[test]
        fn unparseable_tokens_derive_nothing(token in "[a-oq-z0-9 _]{0,20}") {
            prop_assert!(CompletedPhases::from_pointer(&token, None).is_empty());
        }
    }
}
