//! Widget input nodes
//!
//! Passthroughs for values the editor collects through canvas widgets. The
//! widget writes its literal onto the hidden `value` input port; execution
//! simply republishes it on the `value` output.

use async_trait::async_trait;
use flow_engine::{
    ExecutionContext, InputsExt, Node, NodeCategory, NodeDescriptor, NodeError, NodeOutputs,
    ParamKind, PortSpec,
};

/// A widget value passthrough bound to one parameter kind
pub struct WidgetInputNode {
    id: String,
    descriptor: NodeDescriptor,
}

impl WidgetInputNode {
    /// The single widget port, on both sides
    pub const PORT_VALUE: &'static str = "value";

    /// Text widget (`text-input`)
    pub fn text(id: impl Into<String>) -> Self {
        Self::new(id, "text-input", "Text Input", "text", ParamKind::String)
    }

    /// Number widget (`number-input`)
    pub fn number(id: impl Into<String>) -> Self {
        Self::new(id, "number-input", "Number Input", "hash", ParamKind::Number)
    }

    /// Boolean widget (`boolean-input`)
    pub fn boolean(id: impl Into<String>) -> Self {
        Self::new(
            id,
            "boolean-input",
            "Boolean Input",
            "toggle",
            ParamKind::Boolean,
        )
    }

    fn new(
        id: impl Into<String>,
        kind: &str,
        label: &str,
        icon: &str,
        value_kind: ParamKind,
    ) -> Self {
        Self {
            id: id.into(),
            descriptor: Self::descriptor_for(kind, label, icon, value_kind),
        }
    }

    /// The static descriptor of one widget kind
    pub fn descriptor_for(
        kind: &str,
        label: &str,
        icon: &str,
        value_kind: ParamKind,
    ) -> NodeDescriptor {
        NodeDescriptor {
            kind: kind.to_string(),
            label: label.to_string(),
            category: NodeCategory::Input,
            icon: icon.to_string(),
            description: format!("Provides a {} value from an editor widget", value_kind),
            inputs: vec![PortSpec::required(Self::PORT_VALUE, value_kind)
                .describe("Widget value")
                .hidden()],
            outputs: vec![PortSpec::optional(Self::PORT_VALUE, value_kind)],
        }
    }
}

#[async_trait]
impl Node for WidgetInputNode {
    fn descriptor(&self) -> &NodeDescriptor {
        &self.descriptor
    }

    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(&self, ctx: ExecutionContext) -> Result<NodeOutputs, NodeError> {
        let value = ctx.inputs.get_value(Self::PORT_VALUE)?.clone();

        let mut outputs = NodeOutputs::new();
        outputs.insert(Self::PORT_VALUE.to_string(), value);
        Ok(outputs)
    }
}
