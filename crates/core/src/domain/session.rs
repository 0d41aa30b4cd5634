use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    #[default]
    Idle,
    Connecting,
    Streaming,
    Completed,
    Failed,
    Cancelled,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Streaming => "streaming",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(Self::Idle),
            "connecting" => Some(Self::Connecting),
            "streaming" => Some(Self::Streaming),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// The session is connecting or streaming and the elapsed clock is running.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Connecting | Self::Streaming)
    }

    /// No further events are applied once a session reaches a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    File,
    Url,
    Code,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Url => "url",
            Self::Code => "code",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "file" => Some(Self::File),
            "url" => Some(Self::Url),
            "code" => Some(Self::Code),
            _ => None,
        }
    }
}

/// A named side-output produced during execution, distinct from the
/// primary text stream. Duplicates are allowed; de-duplication is a
/// caller concern.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub kind: ArtifactKind,
    pub content: String,
}

/// One in-flight or completed execution against a remote agent endpoint.
///
/// Output and artifacts are append-only in decode order. Writes are
/// ignored after a terminal status is reached, so late events from an
/// already-cancelled stream cannot leak into the buffers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSession {
    pub id: Uuid,
    pub status: ExecutionStatus,
    pub output: String,
    pub artifacts: Vec<Artifact>,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ExecutionSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            status: ExecutionStatus::default(),
            output: String::new(),
            artifacts: Vec::new(),
            error: None,
            started_at: None,
            finished_at: None,
            created_at: Utc::now(),
        }
    }

    /// Begin a run: clears output and artifacts and starts the clock.
    pub fn begin(&mut self) {
        self.output.clear();
        self.artifacts.clear();
        self.error = None;
        self.status = ExecutionStatus::Connecting;
        self.started_at = Some(Utc::now());
        self.finished_at = None;
    }

    pub fn mark_streaming(&mut self) {
        if self.status == ExecutionStatus::Connecting {
            self.status = ExecutionStatus::Streaming;
        }
    }

    pub fn push_output(&mut self, delta: &str) {
        if self.status.is_terminal() {
            return;
        }
        self.output.push_str(delta);
    }

    pub fn push_artifact(&mut self, artifact: Artifact) {
        if self.status.is_terminal() {
            return;
        }
        self.artifacts.push(artifact);
    }

    pub fn complete(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        self.status = ExecutionStatus::Completed;
        self.finished_at = Some(Utc::now());
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        let message = message.into();
        if !self.output.is_empty() {
            self.output.push('\n');
        }
        self.output.push_str(&message);
        self.error = Some(message);
        self.status = ExecutionStatus::Failed;
        self.finished_at = Some(Utc::now());
    }

    pub fn cancel(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        self.output.push_str("\n[cancelled]");
        self.status = ExecutionStatus::Cancelled;
        self.finished_at = Some(Utc::now());
    }

    /// Seconds since the run started. Ticks while the session is active
    /// and freezes at the terminal transition.
    pub fn elapsed_seconds(&self) -> u64 {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => (end - start).num_seconds().max(0) as u64,
            (Some(start), None) if self.status.is_active() => {
                (Utc::now() - start).num_seconds().max(0) as u64
            }
            _ => 0,
        }
    }
}

impl Default for ExecutionSession {
    fn default() -> Self {
        Self::new()
    }
}
