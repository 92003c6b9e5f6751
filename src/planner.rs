//! Turns a session config into the ordered list of steps the worker walks through.

use serde::Serialize;

use crate::models::{SessionConfig, StepId};

/// Used when a config enables no steps at all, so a misconfigured session
/// still verifies location and photo.
pub const DEFAULT_PLAN: [StepId; 3] = [StepId::Gps, StepId::Capture, StepId::Submit];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StepPlan {
    steps: Vec<StepId>,
}

impl StepPlan {
    pub fn steps(&self) -> &[StepId] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<StepId> {
        self.steps.get(index).copied()
    }

    pub fn index_of(&self, step: StepId) -> Option<usize> {
        self.steps.iter().position(|s| *s == step)
    }

    pub fn contains(&self, step: StepId) -> bool {
        self.index_of(step).is_some()
    }

    pub fn last_index(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }
}

pub fn plan(config: &SessionConfig) -> StepPlan {
    if !config.has_any_step_flag() {
        return StepPlan {
            steps: DEFAULT_PLAN.to_vec(),
        };
    }

    let mut steps = Vec::with_capacity(6);
    if config.require_survey {
        steps.push(StepId::Survey);
    }
    if config.require_pre_shift_task {
        steps.push(StepId::PreShiftTask);
    }
    if config.require_gps_verification {
        steps.push(StepId::Gps);
    }
    if config.require_photo_verification {
        steps.push(StepId::Capture);
    }
    steps.push(StepId::Submit);
    if config.require_post_shift_task {
        steps.push(StepId::PostShiftTask);
    }

    StepPlan { steps }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from_bits(bits: u8) -> SessionConfig {
        SessionConfig {
            require_survey: bits & 0b00001 != 0,
            require_pre_shift_task: bits & 0b00010 != 0,
            require_gps_verification: bits & 0b00100 != 0,
            require_photo_verification: bits & 0b01000 != 0,
            require_post_shift_task: bits & 0b10000 != 0,
            ..SessionConfig::default()
        }
    }

    #[test]
    fn empty_config_falls_back_to_default_plan() {
        let plan = plan(&SessionConfig::default());
        assert_eq!(plan.steps(), &DEFAULT_PLAN);
    }

    #[test]
    fn gps_without_photo() {
        let config = SessionConfig {
            require_gps_verification: true,
            ..SessionConfig::default()
        };
        assert_eq!(plan(&config).steps(), &[StepId::Gps, StepId::Submit]);
    }

    #[test]
    fn every_flag_in_canonical_order() {
        let plan = plan(&config_from_bits(0b11111));
        assert_eq!(
            plan.steps(),
            &[
                StepId::Survey,
                StepId::PreShiftTask,
                StepId::Gps,
                StepId::Capture,
                StepId::Submit,
                StepId::PostShiftTask,
            ]
        );
    }

    #[test]
    fn submit_appears_once_and_post_shift_task_is_last() {
        for bits in 0..32u8 {
            let plan = plan(&config_from_bits(bits));
            let submits = plan.steps().iter().filter(|s| **s == StepId::Submit).count();
            assert_eq!(submits, 1, "bits {bits:05b}");

            if let Some(idx) = plan.index_of(StepId::PostShiftTask) {
                assert_eq!(idx, plan.last_index(), "bits {bits:05b}");
                assert_eq!(plan.get(idx - 1), Some(StepId::Submit));
            } else {
                assert_eq!(plan.get(plan.last_index()), Some(StepId::Submit));
            }
        }
    }

    #[test]
    fn planning_is_idempotent() {
        let config = config_from_bits(0b01101);
        assert_eq!(plan(&config), plan(&config));
    }
}
