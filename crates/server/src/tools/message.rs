//! worker_message tool implementation.
//!
//! Posts a page command to the worker. After `SKIP_WAITING` the host
//! activates an installed worker right away.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::worker::WorkerState;
use shellcache_client::{ActivateReport, ClientMessage, OfflineWorker, ServiceWorker, WorkerMessage};

use super::json_result;

/// Input parameters for worker_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerMessageParams {
    /// Message type: "SKIP_WAITING" or "CLEAR_CACHES".
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkerMessageOutput {
    /// Worker state after the message was handled.
    pub state: WorkerState,
    /// Acknowledgment broadcast to pages, if the message produces one.
    pub ack: Option<ClientMessage>,
    /// Set when skip-waiting triggered activation.
    pub activated: Option<ActivateReport>,
}

/// Implementation of the worker_message tool.
pub async fn message_impl(worker: &OfflineWorker, params: WorkerMessageParams) -> Result<CallToolResult, McpError> {
    let message = WorkerMessage::from_json(serde_json::json!({ "type": params.kind }))?;
    let ack = worker.on_message(message).await?;

    let activated = worker.activate_if_waiting().await?;

    let output = WorkerMessageOutput { state: worker.state().await, ack, activated };
    json_result(&output)
}
