//! Graph document types
//!
//! The structures an editor submits for validation and execution: a graph of
//! typed nodes connected by typed edges. Graphs are read-only to the
//! validator and scheduler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::params::ParamKind;

/// Unique identifier for a node within a graph
pub type NodeId = String;

/// Port name, unique within one side of a node
pub type PortName = String;

/// A named, typed input or output slot on a node instance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Port {
    /// Name unique within the node's inputs or outputs
    pub name: PortName,
    /// Parameter kind this port accepts or produces
    pub kind: ParamKind,
    /// Whether execution requires a value on this input
    #[serde(default)]
    pub required: bool,
    /// Whether the editor hides this port from the canvas
    #[serde(default)]
    pub hidden: bool,
    /// Fallback literal used when no edge or value supplies the input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    /// Literal supplied by the editor (widget value)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

/// Position on the editor canvas
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A node instance in a workflow graph
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    /// Unique instance ID
    pub id: NodeId,
    /// Display name
    pub name: String,
    /// Registered node kind (e.g. "addition")
    pub kind: String,
    /// Position on canvas
    #[serde(default)]
    pub position: Position,
    /// Ordered input ports
    #[serde(default)]
    pub inputs: Vec<Port>,
    /// Ordered output ports
    #[serde(default)]
    pub outputs: Vec<Port>,
}

impl GraphNode {
    /// Find an input port by name
    pub fn input_port(&self, name: &str) -> Option<&Port> {
        self.inputs.iter().find(|p| p.name == name)
    }

    /// Find an output port by name
    pub fn output_port(&self, name: &str) -> Option<&Port> {
        self.outputs.iter().find(|p| p.name == name)
    }
}

/// A typed directed connection between two node ports
///
/// Edges carry no identifier of their own; the validation surface addresses
/// them by index into the graph's edge sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    /// Source node ID
    pub source: NodeId,
    /// Source output port name
    pub source_port: PortName,
    /// Target node ID
    pub target: NodeId,
    /// Target input port name
    pub target_port: PortName,
}

/// A complete workflow graph document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowGraph {
    /// Stable graph ID
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// All nodes, keyed by unique ID
    pub nodes: Vec<GraphNode>,
    /// Ordered edge sequence
    pub edges: Vec<GraphEdge>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl WorkflowGraph {
    /// Create an empty graph stamped with the current time
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Find a node by ID
    pub fn find_node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Get all edges that feed into a node
    pub fn incoming_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a GraphEdge> {
        self.edges.iter().filter(move |e| e.target == node_id)
    }

    /// Get all edges that come out of a node
    pub fn outgoing_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a GraphEdge> {
        self.edges.iter().filter(move |e| e.source == node_id)
    }

    /// Check if an edge supplies a specific input port
    pub fn has_edge_to(&self, node_id: &str, port: &str) -> bool {
        self.edges
            .iter()
            .any(|e| e.target == node_id && e.target_port == port)
    }
}
