use serde::{Deserialize, Serialize};

/// Body of an execution request.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteRequest {
    pub task: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

impl ExecuteRequest {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            agent_id: None,
            context: None,
        }
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }
}

/// Single JSON body returned by endpoints that do not stream.
///
/// `output` and `reply` are alternate names for the primary text field;
/// some endpoints attach an `error` even on a success status, which is
/// surfaced in-band rather than swallowed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectResponse {
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub artifacts: Option<Vec<DirectArtifact>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl DirectResponse {
    /// The primary text field, preferring `output` over `reply`.
    pub fn text(&self) -> Option<&str> {
        self.output.as_deref().or(self.reply.as_deref())
    }
}

/// Artifact entry in a non-streaming body; copied through unchanged.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectArtifact {
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub content: String,
}
