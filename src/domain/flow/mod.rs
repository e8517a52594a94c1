//! Flow module - declarative funnel definitions and progression derivation.

mod definition;
mod errors;
mod pointer;
mod registry;

pub use definition::{ChoiceOption, FlowDefinition, Phase, QualificationRule, Step, StepKind};
pub use errors::FlowError;
pub use pointer::{CompletedPhases, FlowStage, StepPointer, INITIAL_POINTER};
pub use registry::{FlowRegistry, RegisteredFlow};
