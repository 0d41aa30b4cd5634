use serde::{Deserialize, Serialize};

/// Position of a node in the command hierarchy. Ordering is significant:
/// an orchestrator outranks a coordinator, which outranks a worker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AgentTier {
    Orchestrator,
    Coordinator,
    Worker,
}

impl AgentTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Orchestrator => "orchestrator",
            Self::Coordinator => "coordinator",
            Self::Worker => "worker",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "orchestrator" => Some(Self::Orchestrator),
            "coordinator" => Some(Self::Coordinator),
            "worker" => Some(Self::Worker),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Idle,
    Queued,
    Running,
    Completed,
    Failed,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(Self::Idle),
            "queued" => Some(Self::Queued),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// One addressable execution target in the fleet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentNode {
    pub id: String,
    pub name: String,
    pub tier: AgentTier,
    pub status: AgentStatus,
    pub current_task: Option<String>,
}

impl AgentNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>, tier: AgentTier) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tier,
            status: AgentStatus::default(),
            current_task: None,
        }
    }
}
