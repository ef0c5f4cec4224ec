//! Built-in node kinds for the flow-engine workflow runtime
//!
//! Ships the stock palette: binary math, widget value passthroughs, text
//! display, template expansion, and JSON extraction. Everything registers
//! through [`register_builtins`] during the startup registration phase;
//! embedders add their own kinds (model invocations, storage, tools) to the
//! same registry before building a scheduler.

use flow_engine::{Node, NodeRegistry, RegistryError};

pub mod extract;
pub mod input;
pub mod math;
pub mod output;
pub mod template;

pub use extract::JsonStringExtractNode;
pub use input::WidgetInputNode;
pub use math::{MathNode, MathOp};
pub use output::TextOutputNode;
pub use template::TemplateNode;

/// Register every built-in node kind
pub fn register_builtins(registry: &mut NodeRegistry) -> Result<(), RegistryError> {
    // Math
    for op in [
        MathOp::Addition,
        MathOp::Subtraction,
        MathOp::Multiplication,
        MathOp::Division,
    ] {
        registry.register(
            MathNode::descriptor_for(op),
            Box::new(move |node| Box::new(MathNode::new(node.id.clone(), op))),
        )?;
    }

    // Widget inputs
    registry.register(
        WidgetInputNode::text("proto").descriptor().clone(),
        Box::new(|node| Box::new(WidgetInputNode::text(node.id.clone()))),
    )?;
    registry.register(
        WidgetInputNode::number("proto").descriptor().clone(),
        Box::new(|node| Box::new(WidgetInputNode::number(node.id.clone()))),
    )?;
    registry.register(
        WidgetInputNode::boolean("proto").descriptor().clone(),
        Box::new(|node| Box::new(WidgetInputNode::boolean(node.id.clone()))),
    )?;

    // Outputs
    registry.register(
        TextOutputNode::descriptor_for(),
        Box::new(|node| Box::new(TextOutputNode::new(node.id.clone()))),
    )?;

    // Processing
    registry.register(
        TemplateNode::descriptor_for(),
        Box::new(|node| Box::new(TemplateNode::new(node.id.clone()))),
    )?;
    registry.register(
        JsonStringExtractNode::descriptor_for(),
        Box::new(|node| Box::new(JsonStringExtractNode::new(node.id.clone()))),
    )?;

    Ok(())
}

/// A registry populated with every built-in kind
pub fn builtin_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    register_builtins(&mut registry).expect("builtin kinds are distinct");
    registry
}
