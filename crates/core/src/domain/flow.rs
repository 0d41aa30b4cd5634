use serde::{Deserialize, Serialize};

/// Phase of a guided preparation flow. The stepper walks `Stepping`
/// until the last step completes, then gates the execution phase behind
/// an explicit confirmation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FlowPhase {
    #[default]
    Idle,
    Stepping,
    ReadyToExecute,
    Executing,
}

impl FlowPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Stepping => "stepping",
            Self::ReadyToExecute => "ready_to_execute",
            Self::Executing => "executing",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(Self::Idle),
            "stepping" => Some(Self::Stepping),
            "ready_to_execute" => Some(Self::ReadyToExecute),
            "executing" => Some(Self::Executing),
            _ => None,
        }
    }
}

/// One named step in a guided flow. The step list is fixed when the
/// flow is defined; only the cursor moves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlowStep {
    pub index: usize,
    pub name: String,
    pub purpose: String,
}

impl FlowStep {
    pub fn new(index: usize, name: impl Into<String>, purpose: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
            purpose: purpose.into(),
        }
    }
}
