//! Subscribe/notify layer for dashboard surfaces.
//!
//! The state machines in this workspace are plain containers with no
//! rendering dependency; anything that wants to react to them subscribes
//! here instead.

pub mod bus;
pub mod types;

pub use bus::EventBus;
pub use types::{Event, EventEnvelope};
