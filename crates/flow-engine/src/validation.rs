//! Graph validation
//!
//! A total, deterministic pass over a graph document producing an ordered
//! list of structured errors. An empty list means the graph is fit for
//! execution. Errors carry enough detail (node ids, port names, edge
//! indices) for editor-side highlighting.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::params::ParamKind;
use crate::registry::NodeRegistry;
use crate::types::{NodeId, PortName, WorkflowGraph};

/// The six validation error tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationErrorKind {
    UnknownNodeKind,
    MissingEndpoint,
    TypeMismatch,
    DuplicateConnection,
    CycleDetected,
    MissingRequiredInput,
}

/// Structured location details attached to a validation error
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<PortName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_kind: Option<ParamKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_kind: Option<ParamKind>,
}

/// A single validation error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub message: String,
    #[serde(default)]
    pub details: ValidationDetails,
}

impl ValidationError {
    fn unknown_node_kind(node_id: &str, kind: &str) -> Self {
        Self {
            kind: ValidationErrorKind::UnknownNodeKind,
            message: format!("Node '{}' references unknown kind '{}'", node_id, kind),
            details: ValidationDetails {
                node_id: Some(node_id.to_string()),
                ..Default::default()
            },
        }
    }

    fn missing_node(edge_index: usize, node_id: &str) -> Self {
        Self {
            kind: ValidationErrorKind::MissingEndpoint,
            message: format!("Edge {} references unknown node '{}'", edge_index, node_id),
            details: ValidationDetails {
                node_id: Some(node_id.to_string()),
                edge_index: Some(edge_index),
                ..Default::default()
            },
        }
    }

    fn missing_port(edge_index: usize, node_id: &str, port: &str) -> Self {
        Self {
            kind: ValidationErrorKind::MissingEndpoint,
            message: format!(
                "Edge {} references unknown port '{}' on node '{}'",
                edge_index, port, node_id
            ),
            details: ValidationDetails {
                node_id: Some(node_id.to_string()),
                port: Some(port.to_string()),
                edge_index: Some(edge_index),
                ..Default::default()
            },
        }
    }

    fn type_mismatch(edge_index: usize, source_kind: ParamKind, target_kind: ParamKind) -> Self {
        Self {
            kind: ValidationErrorKind::TypeMismatch,
            message: format!(
                "Edge {} connects incompatible kinds: {} cannot flow into {}",
                edge_index, source_kind, target_kind
            ),
            details: ValidationDetails {
                edge_index: Some(edge_index),
                source_kind: Some(source_kind),
                target_kind: Some(target_kind),
                ..Default::default()
            },
        }
    }

    fn duplicate_connection(edge_index: usize) -> Self {
        Self {
            kind: ValidationErrorKind::DuplicateConnection,
            message: format!("Edge {} duplicates an earlier connection", edge_index),
            details: ValidationDetails {
                edge_index: Some(edge_index),
                ..Default::default()
            },
        }
    }

    fn cycle_detected(node_id: &str) -> Self {
        Self {
            kind: ValidationErrorKind::CycleDetected,
            message: format!("Workflow graph contains a cycle through node '{}'", node_id),
            details: ValidationDetails {
                node_id: Some(node_id.to_string()),
                ..Default::default()
            },
        }
    }

    fn missing_required_input(node_id: &str, port: &str) -> Self {
        Self {
            kind: ValidationErrorKind::MissingRequiredInput,
            message: format!(
                "Node '{}' has required input '{}' with no connection, value, or default",
                node_id, port
            ),
            details: ValidationDetails {
                node_id: Some(node_id.to_string()),
                port: Some(port.to_string()),
                ..Default::default()
            },
        }
    }
}

/// Three-color mark used by cycle detection
#[derive(Clone, Copy, PartialEq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Validates workflow graphs against a node registry
pub struct Validator<'a> {
    registry: &'a NodeRegistry,
}

impl<'a> Validator<'a> {
    /// Create a validator over the given registry
    pub fn new(registry: &'a NodeRegistry) -> Self {
        Self { registry }
    }

    /// Validate an entire graph
    ///
    /// Checks run in the taxonomy order, each phase iterating nodes and edges
    /// in declaration order, so identical graphs always yield identical error
    /// sequences:
    /// 1. All node kinds are registered
    /// 2. Edge endpoints reference existing nodes and ports
    /// 3. Connected port kinds are compatible
    /// 4. No duplicate connections
    /// 5. The edge set is acyclic
    /// 6. Required inputs are satisfiable
    pub fn validate(&self, graph: &WorkflowGraph) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        self.check_node_kinds(graph, &mut errors);
        self.check_edges(graph, &mut errors);
        self.check_cycles(graph, &mut errors);
        self.check_required_inputs(graph, &mut errors);

        errors
    }

    fn check_node_kinds(&self, graph: &WorkflowGraph, errors: &mut Vec<ValidationError>) {
        for node in &graph.nodes {
            if !self.registry.has_kind(&node.kind) {
                errors.push(ValidationError::unknown_node_kind(&node.id, &node.kind));
            }
        }
    }

    /// Endpoint existence, type compatibility, and duplicate detection in one
    /// edge pass, grouped into the taxonomy's error order.
    fn check_edges(&self, graph: &WorkflowGraph, errors: &mut Vec<ValidationError>) {
        let mut endpoint_errors = Vec::new();
        let mut type_errors = Vec::new();
        let mut duplicate_errors = Vec::new();
        let mut seen: Vec<&crate::types::GraphEdge> = Vec::new();

        for (index, edge) in graph.edges.iter().enumerate() {
            let source_port = match graph.find_node(&edge.source) {
                None => {
                    endpoint_errors.push(ValidationError::missing_node(index, &edge.source));
                    None
                }
                Some(node) => match node.output_port(&edge.source_port) {
                    None => {
                        endpoint_errors.push(ValidationError::missing_port(
                            index,
                            &edge.source,
                            &edge.source_port,
                        ));
                        None
                    }
                    Some(port) => Some(port),
                },
            };

            let target_port = match graph.find_node(&edge.target) {
                None => {
                    endpoint_errors.push(ValidationError::missing_node(index, &edge.target));
                    None
                }
                Some(node) => match node.input_port(&edge.target_port) {
                    None => {
                        endpoint_errors.push(ValidationError::missing_port(
                            index,
                            &edge.target,
                            &edge.target_port,
                        ));
                        None
                    }
                    Some(port) => Some(port),
                },
            };

            if let (Some(source), Some(target)) = (source_port, target_port) {
                if !source.kind.is_compatible_with(&target.kind) {
                    type_errors.push(ValidationError::type_mismatch(
                        index,
                        source.kind,
                        target.kind,
                    ));
                }
            }

            if seen.iter().any(|e| *e == edge) {
                duplicate_errors.push(ValidationError::duplicate_connection(index));
            } else {
                seen.push(edge);
            }
        }

        errors.extend(endpoint_errors);
        errors.extend(type_errors);
        errors.extend(duplicate_errors);
    }

    /// Depth-first cycle detection with three-color marking
    ///
    /// Descending into a gray node means the edge closes a cycle; the error
    /// is reported against that node's id. Only the first cycle found is
    /// reported.
    fn check_cycles(&self, graph: &WorkflowGraph, errors: &mut Vec<ValidationError>) {
        let index_of: HashMap<&str, usize> = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();

        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); graph.nodes.len()];
        for edge in &graph.edges {
            if let (Some(&from), Some(&to)) = (
                index_of.get(edge.source.as_str()),
                index_of.get(edge.target.as_str()),
            ) {
                adjacency[from].push(to);
            }
        }

        let mut colors = vec![Color::White; graph.nodes.len()];
        for start in 0..graph.nodes.len() {
            if colors[start] == Color::White {
                if let Some(on_cycle) = Self::visit(start, &adjacency, &mut colors) {
                    errors.push(ValidationError::cycle_detected(&graph.nodes[on_cycle].id));
                    return;
                }
            }
        }
    }

    fn visit(node: usize, adjacency: &[Vec<usize>], colors: &mut [Color]) -> Option<usize> {
        colors[node] = Color::Gray;
        for &next in &adjacency[node] {
            match colors[next] {
                Color::Gray => return Some(next),
                Color::White => {
                    if let Some(found) = Self::visit(next, adjacency, colors) {
                        return Some(found);
                    }
                }
                Color::Black => {}
            }
        }
        colors[node] = Color::Black;
        None
    }

    /// A required input must have an inbound edge, a widget value, or a
    /// default. Hidden and default-filled ports count exactly like explicit
    /// ones.
    fn check_required_inputs(&self, graph: &WorkflowGraph, errors: &mut Vec<ValidationError>) {
        for node in &graph.nodes {
            for input in &node.inputs {
                if !input.required {
                    continue;
                }
                let connected = graph.has_edge_to(&node.id, &input.name);
                let supplied = input.value.is_some() || input.default_value.is_some();
                if !connected && !supplied {
                    errors.push(ValidationError::missing_required_input(
                        &node.id,
                        &input.name,
                    ));
                }
            }
        }
    }
}
