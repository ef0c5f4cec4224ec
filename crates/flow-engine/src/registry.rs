//! Node type registry
//!
//! Maps node-kind identifiers to their static descriptors and to factories
//! that build executable instances bound to graph nodes. The registry is
//! populated during the startup registration phase and read-only afterwards.

use std::collections::HashMap;

use crate::descriptor::NodeDescriptor;
use crate::node::Node;
use crate::types::GraphNode;

/// Builds an executable instance bound to a specific graph node
pub type NodeFactory = Box<dyn Fn(&GraphNode) -> Box<dyn Node> + Send + Sync>;

/// Errors from registry operations
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Node kind '{0}' is already registered")]
    DuplicateKind(String),

    #[error("Unknown node kind: {0}")]
    UnknownKind(String),
}

struct RegistryEntry {
    descriptor: NodeDescriptor,
    factory: NodeFactory,
}

/// Registry of available node kinds
pub struct NodeRegistry {
    entries: HashMap<String, RegistryEntry>,
}

impl NodeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a node kind
    ///
    /// Rejects a second registration under the same kind identifier.
    pub fn register(
        &mut self,
        descriptor: NodeDescriptor,
        factory: NodeFactory,
    ) -> Result<(), RegistryError> {
        let kind = descriptor.kind.clone();
        if self.entries.contains_key(&kind) {
            return Err(RegistryError::DuplicateKind(kind));
        }
        self.entries.insert(
            kind,
            RegistryEntry {
                descriptor,
                factory,
            },
        );
        Ok(())
    }

    /// Get the descriptor for a kind
    pub fn descriptor(&self, kind: &str) -> Option<&NodeDescriptor> {
        self.entries.get(kind).map(|e| &e.descriptor)
    }

    /// Check if a kind is registered
    pub fn has_kind(&self, kind: &str) -> bool {
        self.entries.contains_key(kind)
    }

    /// Build an executable instance for a graph node
    ///
    /// Fails for unregistered kinds; the validator surfaces this before any
    /// scheduler run.
    pub fn instantiate(&self, node: &GraphNode) -> Result<Box<dyn Node>, RegistryError> {
        let entry = self
            .entries
            .get(&node.kind)
            .ok_or_else(|| RegistryError::UnknownKind(node.kind.clone()))?;
        Ok((entry.factory)(node))
    }

    /// All registered descriptors
    pub fn all_descriptors(&self) -> Vec<NodeDescriptor> {
        self.entries.values().map(|e| e.descriptor.clone()).collect()
    }

    /// Descriptors grouped by palette category
    pub fn descriptors_by_category(&self) -> HashMap<String, Vec<NodeDescriptor>> {
        let mut grouped: HashMap<String, Vec<NodeDescriptor>> = HashMap::new();
        for entry in self.entries.values() {
            let category = format!("{:?}", entry.descriptor.category).to_lowercase();
            grouped
                .entry(category)
                .or_default()
                .push(entry.descriptor.clone());
        }
        grouped
    }

    /// Number of registered kinds
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{NodeCategory, PortSpec};
    use crate::node::{ExecutionContext, NodeError, NodeOutputs};
    use crate::params::{ParamKind, ParamValue};
    use crate::types::Position;
    use async_trait::async_trait;

    struct EchoNode {
        id: String,
        descriptor: NodeDescriptor,
    }

    #[async_trait]
    impl Node for EchoNode {
        fn descriptor(&self) -> &NodeDescriptor {
            &self.descriptor
        }

        fn id(&self) -> &str {
            &self.id
        }

        async fn execute(&self, ctx: ExecutionContext) -> Result<NodeOutputs, NodeError> {
            let mut outputs = NodeOutputs::new();
            if let Some(value) = ctx.inputs.get("in") {
                outputs.insert("out".to_string(), value.clone());
            } else {
                outputs.insert("out".to_string(), ParamValue::String(String::new()));
            }
            Ok(outputs)
        }
    }

    fn echo_descriptor() -> NodeDescriptor {
        NodeDescriptor {
            kind: "echo".into(),
            label: "Echo".into(),
            category: NodeCategory::Processing,
            icon: "repeat".into(),
            description: "Passes its input through".into(),
            inputs: vec![PortSpec::optional("in", ParamKind::Any)],
            outputs: vec![PortSpec::optional("out", ParamKind::Any)],
        }
    }

    fn echo_factory() -> NodeFactory {
        Box::new(|node| {
            Box::new(EchoNode {
                id: node.id.clone(),
                descriptor: echo_descriptor(),
            })
        })
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = NodeRegistry::new();
        registry.register(echo_descriptor(), echo_factory()).unwrap();

        assert!(registry.has_kind("echo"));
        assert!(!registry.has_kind("missing"));
        assert_eq!(registry.descriptor("echo").unwrap().label, "Echo");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = NodeRegistry::new();
        registry.register(echo_descriptor(), echo_factory()).unwrap();

        let result = registry.register(echo_descriptor(), echo_factory());
        assert!(matches!(result, Err(RegistryError::DuplicateKind(k)) if k == "echo"));
    }

    #[test]
    fn test_instantiate_unknown_kind_rejected() {
        let registry = NodeRegistry::new();
        let node = echo_descriptor().instantiate("n1", "N1", Position::default());

        assert!(matches!(
            registry.instantiate(&node),
            Err(RegistryError::UnknownKind(k)) if k == "echo"
        ));
    }

    #[tokio::test]
    async fn test_instantiate_binds_node_id() {
        let mut registry = NodeRegistry::new();
        registry.register(echo_descriptor(), echo_factory()).unwrap();

        let node = echo_descriptor().instantiate("n7", "N7", Position::default());
        let instance = registry.instantiate(&node).unwrap();
        assert_eq!(instance.id(), "n7");
    }

    #[test]
    fn test_descriptors_by_category() {
        let mut registry = NodeRegistry::new();
        registry.register(echo_descriptor(), echo_factory()).unwrap();

        let grouped = registry.descriptors_by_category();
        assert_eq!(grouped["processing"].len(), 1);
    }
}
