//! Event types published on the bus.

use agentdeck_core::{AgentStatus, Artifact, ExecutionStatus, LinkHealth};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping every published event with identity and time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event: Event,
}

impl EventEnvelope {
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Everything observable about the engine from the outside.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// An execution run entered the connecting state.
    #[serde(rename = "session.started")]
    SessionStarted { session_id: Uuid },

    /// A text delta was appended to a session's output buffer.
    #[serde(rename = "session.output")]
    SessionOutput { session_id: Uuid, delta: String },

    /// An artifact was appended to a session.
    #[serde(rename = "session.artifact")]
    SessionArtifact {
        session_id: Uuid,
        artifact: Artifact,
    },

    /// A session reached a terminal status. Carries the final accumulated
    /// output and artifact list; published exactly once per run.
    #[serde(rename = "session.finished")]
    SessionFinished {
        session_id: Uuid,
        status: ExecutionStatus,
        output: String,
        artifacts: Vec<Artifact>,
    },

    /// A fleet node's status changed through dispatch or cancel.
    #[serde(rename = "agent.status_changed")]
    AgentStatusChanged {
        agent_id: String,
        from_status: AgentStatus,
        to_status: AgentStatus,
    },

    /// The link monitor reclassified endpoint health.
    #[serde(rename = "link.health_changed")]
    LinkHealthChanged { from: LinkHealth, to: LinkHealth },
}

impl Event {
    /// Session this event belongs to, if any.
    pub fn session_id(&self) -> Option<Uuid> {
        match self {
            Event::SessionStarted { session_id }
            | Event::SessionOutput { session_id, .. }
            | Event::SessionArtifact { session_id, .. }
            | Event::SessionFinished { session_id, .. } => Some(*session_id),
            Event::AgentStatusChanged { .. } | Event::LinkHealthChanged { .. } => None,
        }
    }

    /// Whether this event ends a session's lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::SessionFinished { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_creation() {
        let envelope = EventEnvelope::new(Event::SessionStarted {
            session_id: Uuid::new_v4(),
        });
        assert!(!envelope.id.is_nil());
        assert!(envelope.timestamp <= Utc::now());
    }

    #[test]
    fn test_event_serialization() {
        let event = Event::SessionOutput {
            session_id: Uuid::new_v4(),
            delta: "hello".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("session.output"));
        assert!(json.contains("hello"));
    }

    #[test]
    fn test_session_id_accessor() {
        let id = Uuid::new_v4();
        let event = Event::SessionFinished {
            session_id: id,
            status: ExecutionStatus::Completed,
            output: String::new(),
            artifacts: Vec::new(),
        };
        assert_eq!(event.session_id(), Some(id));
        assert!(event.is_terminal());

        let health = Event::LinkHealthChanged {
            from: LinkHealth::Healthy,
            to: LinkHealth::Degraded,
        };
        assert_eq!(health.session_id(), None);
        assert!(!health.is_terminal());
    }
}
