//! Fleet-side state machines: the dispatch registry that routes tasks to
//! agent nodes, and the phase stepper that gates expensive runs behind a
//! guided preparation flow.

pub mod error;
pub mod registry;
pub mod stepper;

pub use error::{FleetError, Result};
pub use registry::{
    AgentDispatchRegistry, DispatchAck, DispatchTransport, HttpDispatchTransport,
};
pub use stepper::{FlowHandoff, PhaseStepper};
