pub mod domain;

pub use domain::agent::{AgentNode, AgentStatus, AgentTier};
pub use domain::flow::{FlowPhase, FlowStep};
pub use domain::health::LinkHealth;
pub use domain::session::{Artifact, ArtifactKind, ExecutionSession, ExecutionStatus};
