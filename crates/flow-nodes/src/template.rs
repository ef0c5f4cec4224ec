//! Template expansion node
//!
//! Expands `{{name}}` placeholders in a template string from the node's other
//! inputs. Instances may declare extra string inputs beyond the canonical
//! descriptor; every connected input becomes a substitutable variable.

use async_trait::async_trait;
use flow_engine::{
    ExecutionContext, InputsExt, Node, NodeCategory, NodeDescriptor, NodeError, NodeOutputs,
    ParamKind, ParamValue, PortSpec,
};

/// String template expansion (`template`)
pub struct TemplateNode {
    id: String,
    descriptor: NodeDescriptor,
}

impl TemplateNode {
    /// Template text input
    pub const PORT_TEMPLATE: &'static str = "template";
    /// Expanded result output
    pub const PORT_OUTPUT: &'static str = "output";

    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            descriptor: Self::descriptor_for(),
        }
    }

    pub fn descriptor_for() -> NodeDescriptor {
        NodeDescriptor {
            kind: "template".to_string(),
            label: "Template".to_string(),
            category: NodeCategory::Processing,
            icon: "braces".to_string(),
            description: "Expands {{name}} placeholders from connected inputs".to_string(),
            inputs: vec![PortSpec::required(Self::PORT_TEMPLATE, ParamKind::String)
                .describe("Text with {{name}} placeholders")],
            outputs: vec![PortSpec::optional(Self::PORT_OUTPUT, ParamKind::String)],
        }
    }

    /// Render a parameter value for substitution into text.
    fn render(value: &ParamValue) -> String {
        match value {
            ParamValue::String(s) => s.clone(),
            ParamValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            ParamValue::Boolean(b) => b.to_string(),
            ParamValue::Array(items) => {
                serde_json::to_string(items).unwrap_or_default()
            }
            ParamValue::Json(v) => serde_json::to_string(v).unwrap_or_default(),
            ParamValue::Binary { mime_type, data } => {
                format!("[{} bytes of {}]", data.len(), mime_type)
            }
        }
    }
}

#[async_trait]
impl Node for TemplateNode {
    fn descriptor(&self) -> &NodeDescriptor {
        &self.descriptor
    }

    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(&self, ctx: ExecutionContext) -> Result<NodeOutputs, NodeError> {
        let mut expanded = ctx.inputs.get_string(Self::PORT_TEMPLATE)?.to_string();

        for (name, value) in &ctx.inputs {
            if name == Self::PORT_TEMPLATE {
                continue;
            }
            let rendered = Self::render(value);
            expanded = expanded.replace(&format!("{{{{{}}}}}", name), &rendered);
            expanded = expanded.replace(&format!("{{{{ {} }}}}", name), &rendered);
        }

        let mut outputs = NodeOutputs::new();
        outputs.insert(Self::PORT_OUTPUT.to_string(), ParamValue::String(expanded));
        Ok(outputs)
    }
}
