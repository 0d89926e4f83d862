//! Flight-duty eligibility engine.
//!
//! Pure and stateless: every entry point takes one record snapshot plus a
//! caller-captured `today` and returns derived values. No I/O, no shared
//! state, safe to run concurrently per record.

pub mod classify;
pub mod normalize;
pub mod report;

pub use classify::{
    classify_medical, classify_secondary, classify_window, FieldStatus, Severity, ValidityWindow,
    MEDICAL_WINDOW_DAYS, MONTH_DAYS, SECONDARY_TRIGGER_DAYS, WARNING_DAYS,
};
pub use normalize::{FieldValue, DATE_FORMAT, EXEMPT_MARKERS, MISSING_MARKERS};
pub use report::{Evaluation, ReportRow};
