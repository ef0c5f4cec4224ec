//! Observer surface for execution lifecycle events
//!
//! The scheduler reports progress through a narrow five-callback interface.
//! Callbacks are invoked serially from the scheduler's bookkeeping task, so
//! observers never race against themselves; they must return promptly.
//! Outputs cross the boundary in wire form.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Wire-form outputs of a completed node, keyed by output port name
pub type WireOutputs = HashMap<String, serde_json::Value>;

/// Sink for execution lifecycle events
///
/// All callbacks default to no-ops; implement only what you consume.
/// A callback that panics is caught and logged, never retried.
pub trait ExecutionObserver: Send + Sync {
    /// A node has begun executing
    fn on_node_start(&self, _node_id: &str) {}

    /// A node has completed successfully
    fn on_node_complete(&self, _node_id: &str, _outputs: &WireOutputs) {}

    /// A node has failed
    fn on_node_error(&self, _node_id: &str, _message: &str) {}

    /// The run finished naturally; always the last event
    fn on_execution_complete(&self) {}

    /// The run was rejected or died on an internal fault; always the last event
    fn on_execution_error(&self, _message: &str) {}
}

/// Observer that discards all events
pub struct NullObserver;

impl ExecutionObserver for NullObserver {}

/// A recorded lifecycle event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ExecutionEvent {
    #[serde(rename_all = "camelCase")]
    NodeStarted { node_id: String },

    #[serde(rename_all = "camelCase")]
    NodeCompleted {
        node_id: String,
        outputs: WireOutputs,
    },

    #[serde(rename_all = "camelCase")]
    NodeFailed { node_id: String, error: String },

    ExecutionCompleted,

    #[serde(rename_all = "camelCase")]
    ExecutionFailed { error: String },
}

/// Observer that records every event in order
///
/// Useful in tests to assert emission order and payloads.
pub struct RecordingObserver {
    events: Mutex<Vec<ExecutionEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// All events recorded so far
    pub fn events(&self) -> Vec<ExecutionEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Clear the recording
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    fn push(&self, event: ExecutionEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl Default for RecordingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionObserver for RecordingObserver {
    fn on_node_start(&self, node_id: &str) {
        self.push(ExecutionEvent::NodeStarted {
            node_id: node_id.to_string(),
        });
    }

    fn on_node_complete(&self, node_id: &str, outputs: &WireOutputs) {
        self.push(ExecutionEvent::NodeCompleted {
            node_id: node_id.to_string(),
            outputs: outputs.clone(),
        });
    }

    fn on_node_error(&self, node_id: &str, message: &str) {
        self.push(ExecutionEvent::NodeFailed {
            node_id: node_id.to_string(),
            error: message.to_string(),
        });
    }

    fn on_execution_complete(&self) {
        self.push(ExecutionEvent::ExecutionCompleted);
    }

    fn on_execution_error(&self, message: &str) {
        self.push(ExecutionEvent::ExecutionFailed {
            error: message.to_string(),
        });
    }
}
