use crate::models::{FlowPosition, StepId};
use crate::planner::StepPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: StepId,
    pub to: StepId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retreat {
    Moved(Transition),
    /// Already on the first step; the caller leaves the flow.
    LeaveFlow(StepId),
}

/// Step cursor over a fixed plan. Steps only move through `advance`,
/// `retreat` and `jump_to`; terminal positions ignore all three.
#[derive(Debug, Clone)]
pub struct FlowState {
    plan: StepPlan,
    index: usize,
    position: FlowPosition,
    /// One-shot guard for the automatic submission on entering `submit`.
    auto_submitted: bool,
}

impl FlowState {
    pub fn new(plan: StepPlan) -> Self {
        let position = match plan.get(0) {
            Some(step) => FlowPosition::Step(step),
            None => FlowPosition::Done,
        };
        Self {
            plan,
            index: 0,
            position,
            auto_submitted: false,
        }
    }

    pub fn plan(&self) -> &StepPlan {
        &self.plan
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn position(&self) -> FlowPosition {
        self.position
    }

    pub fn current_step(&self) -> Option<StepId> {
        self.position.step()
    }

    pub fn advance(&mut self) -> Option<Transition> {
        let from = self.current_step()?;
        if self.index >= self.plan.last_index() {
            return None;
        }
        self.move_to(self.index + 1, from)
    }

    pub fn retreat(&mut self) -> Option<Retreat> {
        let from = self.current_step()?;
        if self.index == 0 {
            return Some(Retreat::LeaveFlow(from));
        }
        self.move_to(self.index - 1, from).map(Retreat::Moved)
    }

    /// Moves to the first occurrence of `step`. `None` when the step is not
    /// planned or already current.
    pub fn jump_to(&mut self, step: StepId) -> Option<Transition> {
        let from = self.current_step()?;
        let target = self.plan.index_of(step)?;
        if target == self.index {
            return None;
        }
        self.move_to(target, from)
    }

    pub fn finish(&mut self) {
        self.auto_submitted = false;
        self.position = FlowPosition::Done;
    }

    pub fn exit(&mut self) {
        self.auto_submitted = false;
        self.position = FlowPosition::Exited;
    }

    /// True exactly once per visit to `submit`.
    pub fn take_auto_submit(&mut self) -> bool {
        if self.current_step() != Some(StepId::Submit) || self.auto_submitted {
            return false;
        }
        self.auto_submitted = true;
        true
    }

    fn move_to(&mut self, index: usize, from: StepId) -> Option<Transition> {
        let to = self.plan.get(index)?;
        if from == StepId::Submit {
            self.auto_submitted = false;
        }
        self.index = index;
        self.position = FlowPosition::Step(to);
        Some(Transition { from, to })
    }
}
