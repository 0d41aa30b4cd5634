use thiserror::Error;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Dispatch rejected with status {status}: {body}")]
    DispatchRejected { status: u16, body: String },

    #[error("A flow needs at least one step")]
    EmptyFlow,
}

pub type Result<T> = std::result::Result<T, FleetError>;
