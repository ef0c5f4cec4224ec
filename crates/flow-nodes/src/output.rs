//! Display output nodes

use async_trait::async_trait;
use flow_engine::{
    ExecutionContext, InputsExt, Node, NodeCategory, NodeDescriptor, NodeError, NodeOutputs,
    ParamKind, ParamValue, PortSpec,
};

/// Text display passthrough (`text-output`)
///
/// Republishes its input so editors can render the final value of a branch.
pub struct TextOutputNode {
    id: String,
    descriptor: NodeDescriptor,
}

impl TextOutputNode {
    pub const PORT_VALUE: &'static str = "value";

    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            descriptor: Self::descriptor_for(),
        }
    }

    pub fn descriptor_for() -> NodeDescriptor {
        NodeDescriptor {
            kind: "text-output".to_string(),
            label: "Text Output".to_string(),
            category: NodeCategory::Output,
            icon: "monitor".to_string(),
            description: "Displays a text value".to_string(),
            inputs: vec![PortSpec::required(Self::PORT_VALUE, ParamKind::String)],
            outputs: vec![PortSpec::optional(Self::PORT_VALUE, ParamKind::String)],
        }
    }
}

#[async_trait]
impl Node for TextOutputNode {
    fn descriptor(&self) -> &NodeDescriptor {
        &self.descriptor
    }

    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(&self, ctx: ExecutionContext) -> Result<NodeOutputs, NodeError> {
        let text = ctx.inputs.get_string(Self::PORT_VALUE)?.to_string();

        let mut outputs = NodeOutputs::new();
        outputs.insert(Self::PORT_VALUE.to_string(), ParamValue::String(text));
        Ok(outputs)
    }
}
