//! Agent roster and task dispatch.
//!
//! The registry is the only writer of node status. Dispatch is optimistic
//! (queued, then running) and settles to completed or failed on the
//! acknowledgement; a failure is scoped to the dispatched node alone.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use agentdeck_core::{AgentNode, AgentStatus};
use async_trait::async_trait;
use events::{Event, EventBus};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{FleetError, Result};

/// Acknowledgement from a dispatch endpoint. If the task produces
/// streaming output, the caller opens an execution against `task_ref`
/// separately; the registry itself never streams.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchAck {
    pub task_ref: Option<String>,
}

/// Transport seam so the registry can be exercised without a network.
#[async_trait]
pub trait DispatchTransport: Send + Sync {
    async fn dispatch(&self, agent_id: &str, task: &str) -> Result<DispatchAck>;
}

#[derive(Debug, Serialize)]
struct DispatchRequest<'a> {
    #[serde(rename = "agentId")]
    agent_id: &'a str,
    task: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct DispatchAckBody {
    #[serde(default, alias = "taskRef", alias = "taskId")]
    task_id: Option<String>,
}

/// Dispatch over HTTP: `POST <endpoint>` with `{ agentId, task }`.
pub struct HttpDispatchTransport {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpDispatchTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl DispatchTransport for HttpDispatchTransport {
    async fn dispatch(&self, agent_id: &str, task: &str) -> Result<DispatchAck> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&DispatchRequest { agent_id, task })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FleetError::DispatchRejected {
                status: status.as_u16(),
                body,
            });
        }

        // The acknowledgement body is optional and tolerated if malformed.
        let body = response
            .json::<DispatchAckBody>()
            .await
            .unwrap_or_default();
        Ok(DispatchAck {
            task_ref: body.task_id,
        })
    }
}

/// Holds the set of known agent nodes and routes dispatches to them.
pub struct AgentDispatchRegistry {
    nodes: Mutex<HashMap<String, AgentNode>>,
    transport: Arc<dyn DispatchTransport>,
    bus: EventBus,
}

impl AgentDispatchRegistry {
    pub fn new(transport: Arc<dyn DispatchTransport>, bus: EventBus) -> Self {
        Self {
            nodes: Mutex::new(HashMap::new()),
            transport,
            bus,
        }
    }

    /// Add a node to the roster, replacing any node with the same id.
    pub fn register(&self, node: AgentNode) {
        self.nodes.lock().unwrap().insert(node.id.clone(), node);
    }

    pub fn node(&self, agent_id: &str) -> Option<AgentNode> {
        self.nodes.lock().unwrap().get(agent_id).cloned()
    }

    /// Roster snapshot, ordered by command tier then name.
    pub fn nodes(&self) -> Vec<AgentNode> {
        let mut nodes: Vec<AgentNode> = self.nodes.lock().unwrap().values().cloned().collect();
        nodes.sort_by(|a, b| a.tier.cmp(&b.tier).then_with(|| a.name.cmp(&b.name)));
        nodes
    }

    /// Route a task to a node. The node goes queued, then running, then
    /// completed or failed depending on the acknowledgement. An unknown
    /// id fails without touching any other node.
    pub async fn dispatch(&self, agent_id: &str, task: &str) -> Result<DispatchAck> {
        self.set_status(agent_id, AgentStatus::Queued, Some(task))?;
        self.set_status(agent_id, AgentStatus::Running, None)?;

        info!(agent_id = %agent_id, "dispatching task");

        match self.transport.dispatch(agent_id, task).await {
            Ok(ack) => {
                self.set_status(agent_id, AgentStatus::Completed, None)?;
                Ok(ack)
            }
            Err(e) => {
                warn!(agent_id = %agent_id, error = %e, "dispatch failed");
                self.set_status(agent_id, AgentStatus::Failed, None)?;
                Err(e)
            }
        }
    }

    /// Return a running node to idle.
    ///
    /// Cancelling a known node with no running task is a no-op, not an
    /// error. An unknown id is an error, matching `dispatch`: addressing
    /// a node that is not in the roster is a caller mistake, while a
    /// node that simply has nothing to cancel is normal operation.
    pub fn cancel(&self, agent_id: &str) -> Result<()> {
        let mut nodes = self.nodes.lock().unwrap();
        let node = nodes
            .get_mut(agent_id)
            .ok_or_else(|| FleetError::AgentNotFound(agent_id.to_string()))?;

        if node.status != AgentStatus::Running {
            return Ok(());
        }

        let from = node.status;
        node.status = AgentStatus::Idle;
        node.current_task = None;
        drop(nodes);

        self.bus.publish(Event::AgentStatusChanged {
            agent_id: agent_id.to_string(),
            from_status: from,
            to_status: AgentStatus::Idle,
        });
        Ok(())
    }

    fn set_status(
        &self,
        agent_id: &str,
        to: AgentStatus,
        task: Option<&str>,
    ) -> Result<()> {
        let from = {
            let mut nodes = self.nodes.lock().unwrap();
            let node = nodes
                .get_mut(agent_id)
                .ok_or_else(|| FleetError::AgentNotFound(agent_id.to_string()))?;
            let from = node.status;
            node.status = to;
            if let Some(task) = task {
                node.current_task = Some(task.to_string());
            }
            from
        };

        self.bus.publish(Event::AgentStatusChanged {
            agent_id: agent_id.to_string(),
            from_status: from,
            to_status: to,
        });
        Ok(())
    }
}
