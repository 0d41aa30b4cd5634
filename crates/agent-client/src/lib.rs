//! Client for remote agent execution endpoints.
//!
//! Opens a long-lived chunked channel, reassembles line-delimited frames,
//! classifies event envelopes, and accumulates output and artifacts into
//! a cancellable execution session. Endpoints that answer with a single
//! JSON body instead of a stream are handled as a first-class path.

pub mod cancel;
pub mod error;
pub mod frame;
pub mod health;
pub mod protocol;
pub mod session;
pub mod stream;
pub mod types;

pub use cancel::CancelToken;
pub use error::{AgentClientError, Result};
pub use frame::FrameDecoder;
pub use health::{LinkMonitor, LinkMonitorConfig};
pub use protocol::{classify_line, StreamEvent};
pub use session::ExecutionController;
pub use stream::{StreamConsumer, StreamOutcome};
pub use types::{DirectResponse, ExecuteRequest};
