use serde::{Deserialize, Serialize};

use crate::domain::fields::FieldId;

/// Steps of the linear onboarding dialogue, in prompt order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    FullName,
    Rank,
    Qualification,
    LeavePeriod,
    Medical,
    Secondary,
    Kbp4MdM,
    Kbp7MdM,
    Kbp4Md90a,
    Kbp7Md90a,
    Parachute,
}

/// One field write produced by a dialogue step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldWrite {
    pub field: FieldId,
    pub value: String,
}

/// Result of feeding user input to a step: the writes to persist and the
/// next step to prompt for. `next == None` completes onboarding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub writes: Vec<FieldWrite>,
    pub next: Option<OnboardingStep>,
}
