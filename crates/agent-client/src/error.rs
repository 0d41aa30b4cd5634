use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Endpoint returned status {status}: {body}")]
    Endpoint { status: u16, body: String },

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("A run is already in progress for this controller")]
    RunInProgress,
}

pub type Result<T> = std::result::Result<T, AgentClientError>;
