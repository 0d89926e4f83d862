use thiserror::Error;

use crate::domain::fields::FieldId;
use crate::flows::states::{FieldWrite, OnboardingStep, StepOutcome};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("leave period must be two dates separated by `-`, got `{input}`")]
    MalformedLeavePeriod { input: String },
}

/// The onboarding dialogue as a deterministic state machine.
///
/// A rejected transition leaves the caller on the same step (the dialogue
/// layer re-prompts); dates and sentinels are not validated here because
/// normalization is total and bad input degrades to "no data".
#[derive(Clone, Copy, Debug, Default)]
pub struct OnboardingFlow;

impl OnboardingFlow {
    pub fn first_step(&self) -> OnboardingStep {
        OnboardingStep::FullName
    }

    pub fn prompt(&self, step: OnboardingStep) -> &'static str {
        use OnboardingStep::*;
        match step {
            FullName => "1️⃣ Введите вашу Фамилию Имя Отчество:",
            Rank => "2️⃣ Введите воинское звание:",
            Qualification => "3️⃣ Введите квалификационный разряд:",
            LeavePeriod => "4️⃣ Введите даты крайнего отпуска (формат: ДД.ММ.ГГГГ - ДД.ММ.ГГГГ):",
            Medical => "5️⃣ Введите дату прохождения ВЛК (ДД.ММ.ГГГГ):",
            Secondary => "6️⃣ Введите дату прохождения УМО (ДД.ММ.ГГГГ). Если не было — напишите «нет»:",
            Kbp4MdM => "7️⃣ КБП-4 Ил-76 МД-М (ДД.ММ.ГГГГ):",
            Kbp7MdM => "8️⃣ КБП-7 Ил-76 МД-М (ДД.ММ.ГГГГ):",
            Kbp4Md90a => "9️⃣ КБП-4 Ил-76 МД-90А (ДД.ММ.ГГГГ):",
            Kbp7Md90a => "🔟 КБП-7 Ил-76 МД-90А (ДД.ММ.ГГГГ):",
            Parachute => "1️⃣1️⃣ Дата выполнения прыжков с ПДС (ДД.ММ.ГГГГ или «освобожден»):",
        }
    }

    pub fn apply(
        &self,
        step: OnboardingStep,
        input: &str,
    ) -> Result<StepOutcome, FlowTransitionError> {
        use OnboardingStep::*;

        let input = input.trim();
        let (writes, next) = match step {
            FullName => (single_write(FieldId::FullName, input), Some(Rank)),
            Rank => (single_write(FieldId::Rank, input), Some(Qualification)),
            Qualification => (single_write(FieldId::Qualification, input), Some(LeavePeriod)),
            LeavePeriod => (leave_writes(input)?, Some(Medical)),
            Medical => (single_write(FieldId::Medical, input), Some(Secondary)),
            Secondary => (single_write(FieldId::Secondary, input), Some(Kbp4MdM)),
            Kbp4MdM => (single_write(FieldId::Kbp4MdM, input), Some(Kbp7MdM)),
            Kbp7MdM => (single_write(FieldId::Kbp7MdM, input), Some(Kbp4Md90a)),
            Kbp4Md90a => (single_write(FieldId::Kbp4Md90a, input), Some(Kbp7Md90a)),
            Kbp7Md90a => (single_write(FieldId::Kbp7Md90a, input), Some(Parachute)),
            Parachute => (single_write(FieldId::Parachute, input), None),
        };

        Ok(StepOutcome { writes, next })
    }
}

fn single_write(field: FieldId, value: &str) -> Vec<FieldWrite> {
    vec![FieldWrite { field, value: value.to_owned() }]
}

fn leave_writes(input: &str) -> Result<Vec<FieldWrite>, FlowTransitionError> {
    let parts: Vec<&str> = input.split('-').map(str::trim).collect();
    let [start, end] = parts.as_slice() else {
        return Err(FlowTransitionError::MalformedLeavePeriod { input: input.to_owned() });
    };
    if start.is_empty() || end.is_empty() {
        return Err(FlowTransitionError::MalformedLeavePeriod { input: input.to_owned() });
    }

    Ok(vec![
        FieldWrite { field: FieldId::LeaveStart, value: (*start).to_owned() },
        FieldWrite { field: FieldId::LeaveEnd, value: (*end).to_owned() },
    ])
}

#[cfg(test)]
mod tests {
    use crate::domain::fields::FieldId;
    use crate::flows::engine::{FlowTransitionError, OnboardingFlow};
    use crate::flows::states::OnboardingStep;

    #[test]
    fn full_walk_visits_every_step_once_and_completes() {
        let flow = OnboardingFlow;
        let mut step = Some(flow.first_step());
        let mut visited = Vec::new();

        while let Some(current) = step {
            visited.push(current);
            let input = match current {
                OnboardingStep::LeavePeriod => "01.06.2025 - 30.06.2025",
                _ => "01.01.2025",
            };
            step = flow.apply(current, input).expect("valid input advances").next;
        }

        assert_eq!(visited.len(), 11);
        assert_eq!(visited.first(), Some(&OnboardingStep::FullName));
        assert_eq!(visited.last(), Some(&OnboardingStep::Parachute));
    }

    #[test]
    fn leave_period_splits_into_start_and_end() {
        let outcome = OnboardingFlow
            .apply(OnboardingStep::LeavePeriod, " 01.06.2025 - 30.06.2025 ")
            .expect("well-formed interval");

        assert_eq!(outcome.writes.len(), 2);
        assert_eq!(outcome.writes[0].field, FieldId::LeaveStart);
        assert_eq!(outcome.writes[0].value, "01.06.2025");
        assert_eq!(outcome.writes[1].field, FieldId::LeaveEnd);
        assert_eq!(outcome.writes[1].value, "30.06.2025");
    }

    #[test]
    fn malformed_leave_period_is_rejected_without_advancing() {
        for input in ["01.06.2025", "a - b - c", " - 30.06.2025"] {
            let error = OnboardingFlow
                .apply(OnboardingStep::LeavePeriod, input)
                .expect_err("must reject");
            assert!(matches!(error, FlowTransitionError::MalformedLeavePeriod { .. }), "{input}");
        }
    }

    #[test]
    fn final_step_signals_completion() {
        let outcome =
            OnboardingFlow.apply(OnboardingStep::Parachute, "освобожден").expect("final step");
        assert_eq!(outcome.next, None);
        assert_eq!(outcome.writes[0].field, FieldId::Parachute);
    }

    #[test]
    fn replay_is_deterministic_for_the_same_inputs() {
        let flow = OnboardingFlow;
        let run = || {
            let mut outcomes = Vec::new();
            let mut step = Some(flow.first_step());
            while let Some(current) = step {
                let outcome =
                    flow.apply(current, "15.05.2025 - 20.05.2025").expect("valid input");
                step = outcome.next;
                outcomes.push(outcome);
            }
            outcomes
        };

        assert_eq!(run(), run());
    }
}
