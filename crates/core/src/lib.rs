pub mod config;
pub mod domain;
pub mod eligibility;
pub mod errors;
pub mod flows;

pub use chrono;

pub use domain::fields::{FieldId, FieldKind};
pub use domain::person::{PersonId, PersonRecord};
pub use eligibility::classify::{FieldStatus, Severity, ValidityWindow};
pub use eligibility::normalize::FieldValue;
pub use eligibility::report::{Evaluation, ReportRow};
pub use errors::{ApplicationError, DomainError};
pub use flows::{FieldWrite, FlowTransitionError, OnboardingFlow, OnboardingStep, StepOutcome};
