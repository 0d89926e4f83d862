pub mod engine;
pub mod states;

pub use engine::{FlowTransitionError, OnboardingFlow};
pub use states::{FieldWrite, OnboardingStep, StepOutcome};
