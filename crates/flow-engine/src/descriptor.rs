//! Static node descriptors
//!
//! A descriptor is the registry-side contract of a node kind: its identity,
//! palette metadata, and declared ports. Instances in a graph document carry
//! their own port copies; the descriptor is the canonical template.

use serde::{Deserialize, Serialize};

use crate::params::ParamKind;
use crate::types::{GraphNode, Port, Position};

/// Category for organizing node kinds in the palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    /// Input nodes (widgets, file input, etc.)
    Input,
    /// Output nodes (display, preview, etc.)
    Output,
    /// Processing nodes (math, templates, extraction, model calls)
    Processing,
    /// Control flow nodes
    Control,
    /// Tool nodes (integrations)
    Tool,
}

/// Declaration of a port on a node kind
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortSpec {
    /// Name unique within the node's inputs or outputs
    pub name: String,
    /// Parameter kind
    pub kind: ParamKind,
    /// Optional description for tooltips
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Default literal (wire form) used when nothing else supplies the input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    /// Whether the editor hides this port
    #[serde(default)]
    pub hidden: bool,
    /// Whether execution requires a value on this input
    #[serde(default)]
    pub required: bool,
}

impl PortSpec {
    /// Declare a required port
    pub fn required(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            default_value: None,
            hidden: false,
            required: true,
        }
    }

    /// Declare an optional port
    pub fn optional(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            default_value: None,
            hidden: false,
            required: false,
        }
    }

    /// Attach a description
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Attach a default literal (wire form)
    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Hide this port from the canvas
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Instantiate the document-side port for this declaration
    pub fn to_port(&self) -> Port {
        Port {
            name: self.name.clone(),
            kind: self.kind,
            required: self.required,
            hidden: self.hidden,
            default_value: self.default_value.clone(),
            value: None,
        }
    }
}

/// Static descriptor of a node kind
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescriptor {
    /// Registered kind identifier (e.g. "json-string-extract")
    pub kind: String,
    /// Human-readable label
    pub label: String,
    /// Palette category
    pub category: NodeCategory,
    /// Icon hint for the editor
    pub icon: String,
    /// Description for tooltips
    pub description: String,
    /// Input port declarations
    pub inputs: Vec<PortSpec>,
    /// Output port declarations
    pub outputs: Vec<PortSpec>,
}

impl NodeDescriptor {
    /// Build a graph node instance carrying this descriptor's ports
    ///
    /// Convenience for editors and tests; the document format remains the
    /// source of truth for instance ports.
    pub fn instantiate(
        &self,
        id: impl Into<String>,
        name: impl Into<String>,
        position: Position,
    ) -> GraphNode {
        GraphNode {
            id: id.into(),
            name: name.into(),
            kind: self.kind.clone(),
            position,
            inputs: self.inputs.iter().map(PortSpec::to_port).collect(),
            outputs: self.outputs.iter().map(PortSpec::to_port).collect(),
        }
    }
}
