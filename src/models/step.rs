use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Survey,
    PreShiftTask,
    Gps,
    Capture,
    Submit,
    PostShiftTask,
}

impl StepId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepId::Survey => "survey",
            StepId::PreShiftTask => "pre_shift_task",
            StepId::Gps => "gps",
            StepId::Capture => "capture",
            StepId::Submit => "submit",
            StepId::PostShiftTask => "post_shift_task",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the flow currently is: on a planned step, finished, or backed out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "position", content = "step")]
pub enum FlowPosition {
    Step(StepId),
    Done,
    Exited,
}

impl FlowPosition {
    pub fn step(&self) -> Option<StepId> {
        match self {
            FlowPosition::Step(step) => Some(*step),
            FlowPosition::Done | FlowPosition::Exited => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, FlowPosition::Step(_))
    }
}
