//! Guided flow stepper.
//!
//! Walks an ordered list of named steps and gates the expensive
//! execution phase behind completing every one of them plus an explicit
//! confirmation. Dismissing the stepper never cancels a run already
//! handed off; the two lifecycles are decoupled.

use agentdeck_core::{FlowPhase, FlowStep};
use tracing::debug;
use uuid::Uuid;

use crate::error::{FleetError, Result};

/// Context handed to the caller when the executing phase begins. Carries
/// everything accumulated during stepping so an execution request can be
/// built from it.
#[derive(Debug, Clone)]
pub struct FlowHandoff {
    pub flow_id: Uuid,
    pub steps: Vec<FlowStep>,
    pub notes: Vec<String>,
}

impl FlowHandoff {
    /// Flatten the step context into a task description.
    pub fn task_description(&self) -> String {
        let mut lines: Vec<String> = self
            .steps
            .iter()
            .map(|step| format!("{}: {}", step.name, step.purpose))
            .collect();
        lines.extend(self.notes.iter().cloned());
        lines.join("\n")
    }
}

/// Finite-state stepper over one guided flow.
///
/// The step list is immutable after construction and the cursor only
/// moves forward while stepping. All mutation goes through the methods
/// here; callers read state through the accessors.
pub struct PhaseStepper {
    flow_id: Uuid,
    steps: Vec<FlowStep>,
    current_step: usize,
    phase: FlowPhase,
    notes: Vec<String>,
}

impl PhaseStepper {
    pub fn new(steps: Vec<FlowStep>) -> Result<Self> {
        if steps.is_empty() {
            return Err(FleetError::EmptyFlow);
        }
        Ok(Self {
            flow_id: Uuid::new_v4(),
            steps,
            current_step: 0,
            phase: FlowPhase::Idle,
            notes: Vec::new(),
        })
    }

    pub fn flow_id(&self) -> Uuid {
        self.flow_id
    }

    pub fn steps(&self) -> &[FlowStep] {
        &self.steps
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn phase(&self) -> FlowPhase {
        self.phase
    }

    /// Begin the flow: idle becomes stepping at the first step. Ignored
    /// in any other phase.
    pub fn start(&mut self) -> FlowPhase {
        if self.phase == FlowPhase::Idle {
            self.current_step = 0;
            self.phase = FlowPhase::Stepping;
        }
        self.phase
    }

    /// Complete the current step. Moves the cursor forward; reaching the
    /// last step fires the `ready_to_execute` transition exactly once.
    /// Ignored outside the stepping phase, so a repeat call at the last
    /// step cannot double-transition.
    pub fn advance(&mut self) -> FlowPhase {
        if self.phase != FlowPhase::Stepping {
            return self.phase;
        }

        if self.current_step + 1 < self.steps.len() {
            self.current_step += 1;
        }
        if self.current_step == self.steps.len() - 1 {
            self.phase = FlowPhase::ReadyToExecute;
        }

        debug!(
            flow_id = %self.flow_id,
            step = self.current_step,
            phase = self.phase.as_str(),
            "flow advanced"
        );
        self.phase
    }

    /// Attach free-form context to the flow while it is being stepped.
    pub fn record_note(&mut self, note: impl Into<String>) {
        if matches!(self.phase, FlowPhase::Stepping | FlowPhase::ReadyToExecute) {
            self.notes.push(note.into());
        }
    }

    /// Confirm the gated execution. Only meaningful in
    /// `ready_to_execute`; returns the handoff exactly once. Repeat
    /// calls while already executing are ignored, not re-triggered.
    pub fn confirm_execute(&mut self) -> Option<FlowHandoff> {
        if self.phase != FlowPhase::ReadyToExecute {
            return None;
        }
        self.phase = FlowPhase::Executing;
        Some(FlowHandoff {
            flow_id: self.flow_id,
            steps: self.steps.clone(),
            notes: self.notes.clone(),
        })
    }

    /// Reset to idle from any non-idle phase and discard accumulated
    /// context. Does not touch an execution already handed off.
    pub fn dismiss(&mut self) {
        if self.phase == FlowPhase::Idle {
            return;
        }
        self.phase = FlowPhase::Idle;
        self.current_step = 0;
        self.notes.clear();
    }
}
