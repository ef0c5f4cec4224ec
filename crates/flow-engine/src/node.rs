//! Node trait and execution context
//!
//! Defines the contract every executable node implements, the context the
//! scheduler threads into each invocation, and typed accessors over resolved
//! inputs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::descriptor::NodeDescriptor;
use crate::extensions::Environment;
use crate::params::ParamValue;
use crate::types::NodeId;

/// Resolved inputs for a node invocation, keyed by input port name
pub type NodeInputs = HashMap<String, ParamValue>;

/// Outputs produced by a node, keyed by output port name
pub type NodeOutputs = HashMap<String, ParamValue>;

/// Errors a node body can produce
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("Missing required input: {0}")]
    MissingInput(String),

    #[error("Invalid input type for '{port}': expected {expected}")]
    InvalidInputType { port: String, expected: String },

    #[error("{0}")]
    ExecutionFailed(String),

    #[error("Execution cancelled")]
    Cancelled,
}

impl NodeError {
    /// Create an execution failure with a message
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }
}

/// Context passed to each node's `execute`
///
/// Inputs are already resolved into each kind's in-memory form. The
/// environment is an opaque bundle of embedder services the core never
/// inspects. Long-running nodes may poll the abort signal and short-circuit.
pub struct ExecutionContext {
    /// ID of the node being executed
    pub node_id: NodeId,

    /// ID of the enclosing workflow graph
    pub workflow_id: String,

    /// Unique identifier for this execution run
    pub execution_id: String,

    /// Resolved input values, keyed by input port name
    pub inputs: NodeInputs,

    /// Embedder-supplied services (model gateways, storage handles, ...)
    pub env: Arc<Environment>,

    /// Signal set when cancellation has been requested
    pub abort_signal: Arc<AtomicBool>,
}

impl ExecutionContext {
    /// Check if execution has been cancelled
    pub fn is_aborted(&self) -> bool {
        self.abort_signal.load(Ordering::Relaxed)
    }
}

/// The contract every executable node implements
///
/// A node is built by the registry, bound to one graph node, and invoked at
/// most once per run. Success is a map of declared output port names to
/// values; any error isolates to this node and skips its downstream.
#[async_trait]
pub trait Node: Send + Sync {
    /// The static descriptor of this node's kind
    fn descriptor(&self) -> &NodeDescriptor;

    /// The graph node instance this executable is bound to
    fn id(&self) -> &str;

    /// Execute with resolved inputs
    async fn execute(&self, ctx: ExecutionContext) -> Result<NodeOutputs, NodeError>;
}

/// Typed accessors over resolved node inputs
pub trait InputsExt {
    /// Get a required string input
    fn get_string(&self, key: &str) -> Result<&str, NodeError>;

    /// Get an optional string input
    fn get_string_opt(&self, key: &str) -> Option<&str>;

    /// Get a required number input
    fn get_number(&self, key: &str) -> Result<f64, NodeError>;

    /// Get an optional number input with default
    fn get_number_or(&self, key: &str, default: f64) -> f64;

    /// Get a required boolean input
    fn get_bool(&self, key: &str) -> Result<bool, NodeError>;

    /// Get an optional boolean input with default
    fn get_bool_or(&self, key: &str, default: bool) -> bool;

    /// Get a required JSON input
    fn get_json(&self, key: &str) -> Result<&serde_json::Value, NodeError>;

    /// Get a required input of any kind
    fn get_value(&self, key: &str) -> Result<&ParamValue, NodeError>;
}

impl InputsExt for NodeInputs {
    fn get_string(&self, key: &str) -> Result<&str, NodeError> {
        match self.get(key) {
            Some(ParamValue::String(s)) => Ok(s),
            Some(_) => Err(NodeError::InvalidInputType {
                port: key.to_string(),
                expected: "string".to_string(),
            }),
            None => Err(NodeError::MissingInput(key.to_string())),
        }
    }

    fn get_string_opt(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(ParamValue::String(s)) => Some(s),
            _ => None,
        }
    }

    fn get_number(&self, key: &str) -> Result<f64, NodeError> {
        match self.get(key) {
            Some(ParamValue::Number(n)) => Ok(*n),
            Some(_) => Err(NodeError::InvalidInputType {
                port: key.to_string(),
                expected: "number".to_string(),
            }),
            None => Err(NodeError::MissingInput(key.to_string())),
        }
    }

    fn get_number_or(&self, key: &str, default: f64) -> f64 {
        match self.get(key) {
            Some(ParamValue::Number(n)) => *n,
            _ => default,
        }
    }

    fn get_bool(&self, key: &str) -> Result<bool, NodeError> {
        match self.get(key) {
            Some(ParamValue::Boolean(b)) => Ok(*b),
            Some(_) => Err(NodeError::InvalidInputType {
                port: key.to_string(),
                expected: "boolean".to_string(),
            }),
            None => Err(NodeError::MissingInput(key.to_string())),
        }
    }

    fn get_bool_or(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(ParamValue::Boolean(b)) => *b,
            _ => default,
        }
    }

    fn get_json(&self, key: &str) -> Result<&serde_json::Value, NodeError> {
        match self.get(key) {
            Some(ParamValue::Json(v)) => Ok(v),
            Some(_) => Err(NodeError::InvalidInputType {
                port: key.to_string(),
                expected: "json".to_string(),
            }),
            None => Err(NodeError::MissingInput(key.to_string())),
        }
    }

    fn get_value(&self, key: &str) -> Result<&ParamValue, NodeError> {
        self.get(key)
            .ok_or_else(|| NodeError::MissingInput(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_string() {
        let mut inputs = NodeInputs::new();
        inputs.insert("text".into(), ParamValue::String("hello".into()));

        assert_eq!(inputs.get_string("text").unwrap(), "hello");
        assert!(matches!(
            inputs.get_string("missing"),
            Err(NodeError::MissingInput(_))
        ));
    }

    #[test]
    fn test_get_string_wrong_type() {
        let mut inputs = NodeInputs::new();
        inputs.insert("text".into(), ParamValue::Number(1.0));

        assert!(matches!(
            inputs.get_string("text"),
            Err(NodeError::InvalidInputType { .. })
        ));
        assert!(inputs.get_string_opt("text").is_none());
    }

    #[test]
    fn test_get_number() {
        let mut inputs = NodeInputs::new();
        inputs.insert("count".into(), ParamValue::Number(42.0));

        assert_eq!(inputs.get_number("count").unwrap(), 42.0);
        assert_eq!(inputs.get_number_or("missing", 10.0), 10.0);
    }

    #[test]
    fn test_get_bool() {
        let mut inputs = NodeInputs::new();
        inputs.insert("flag".into(), ParamValue::Boolean(true));

        assert!(inputs.get_bool("flag").unwrap());
        assert!(!inputs.get_bool_or("missing", false));
    }

    #[test]
    fn test_get_json() {
        let mut inputs = NodeInputs::new();
        inputs.insert("payload".into(), ParamValue::Json(json!({"a": 1})));

        assert_eq!(inputs.get_json("payload").unwrap()["a"], 1);
        assert!(inputs.get_json("missing").is_err());
    }

    #[test]
    fn test_get_value_any_kind() {
        let mut inputs = NodeInputs::new();
        inputs.insert("blob".into(), ParamValue::binary(vec![1, 2], "image/png"));

        assert!(matches!(
            inputs.get_value("blob"),
            Ok(ParamValue::Binary { .. })
        ));
        assert!(matches!(
            inputs.get_value("missing"),
            Err(NodeError::MissingInput(_))
        ));
    }

    #[test]
    fn test_context_abort_signal() {
        let abort = Arc::new(AtomicBool::new(false));
        let ctx = ExecutionContext {
            node_id: "n1".into(),
            workflow_id: "w1".into(),
            execution_id: "e1".into(),
            inputs: NodeInputs::new(),
            env: Arc::new(Environment::new()),
            abort_signal: abort.clone(),
        };

        assert!(!ctx.is_aborted());
        abort.store(true, Ordering::Relaxed);
        assert!(ctx.is_aborted());
    }
}
