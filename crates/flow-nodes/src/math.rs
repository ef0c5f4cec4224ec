//! Arithmetic nodes
//!
//! Four binary math kinds over number ports: `addition`, `subtraction`,
//! `multiplication`, and `division`. Division by zero is a node failure, not
//! a NaN.

use async_trait::async_trait;
use flow_engine::{
    ExecutionContext, InputsExt, Node, NodeCategory, NodeDescriptor, NodeError, NodeOutputs,
    ParamKind, ParamValue, PortSpec,
};

/// The supported binary operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOp {
    Addition,
    Subtraction,
    Multiplication,
    Division,
}

impl MathOp {
    /// Registered kind identifier
    pub fn kind(&self) -> &'static str {
        match self {
            MathOp::Addition => "addition",
            MathOp::Subtraction => "subtraction",
            MathOp::Multiplication => "multiplication",
            MathOp::Division => "division",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            MathOp::Addition => "Addition",
            MathOp::Subtraction => "Subtraction",
            MathOp::Multiplication => "Multiplication",
            MathOp::Division => "Division",
        }
    }

    fn apply(&self, a: f64, b: f64) -> Result<f64, NodeError> {
        match self {
            MathOp::Addition => Ok(a + b),
            MathOp::Subtraction => Ok(a - b),
            MathOp::Multiplication => Ok(a * b),
            MathOp::Division => {
                if b == 0.0 {
                    Err(NodeError::failed("Division by zero is not allowed"))
                } else {
                    Ok(a / b)
                }
            }
        }
    }
}

/// A binary arithmetic node bound to one operation
pub struct MathNode {
    id: String,
    op: MathOp,
    descriptor: NodeDescriptor,
}

impl MathNode {
    /// Left operand port
    pub const PORT_A: &'static str = "a";
    /// Right operand port
    pub const PORT_B: &'static str = "b";
    /// Result port
    pub const PORT_RESULT: &'static str = "result";

    /// Create a node instance for the given operation
    pub fn new(id: impl Into<String>, op: MathOp) -> Self {
        Self {
            id: id.into(),
            op,
            descriptor: Self::descriptor_for(op),
        }
    }

    /// The static descriptor of one math kind
    pub fn descriptor_for(op: MathOp) -> NodeDescriptor {
        NodeDescriptor {
            kind: op.kind().to_string(),
            label: op.label().to_string(),
            category: NodeCategory::Processing,
            icon: "calculator".to_string(),
            description: format!("{} of two numbers", op.label()),
            inputs: vec![
                PortSpec::required(Self::PORT_A, ParamKind::Number),
                PortSpec::required(Self::PORT_B, ParamKind::Number),
            ],
            outputs: vec![PortSpec::optional(Self::PORT_RESULT, ParamKind::Number)],
        }
    }
}

#[async_trait]
impl Node for MathNode {
    fn descriptor(&self) -> &NodeDescriptor {
        &self.descriptor
    }

    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(&self, ctx: ExecutionContext) -> Result<NodeOutputs, NodeError> {
        let a = ctx.inputs.get_number(Self::PORT_A)?;
        let b = ctx.inputs.get_number(Self::PORT_B)?;

        let result = self.op.apply(a, b)?;
        if !result.is_finite() {
            return Err(NodeError::failed(format!(
                "Arithmetic result is not a finite number: {}",
                result
            )));
        }

        let mut outputs = NodeOutputs::new();
        outputs.insert(Self::PORT_RESULT.to_string(), ParamValue::Number(result));
        Ok(outputs)
    }
}
