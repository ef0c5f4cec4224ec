//! JSON data extraction node
//!
//! Walks a dot/bracket path expression into a JSON input and republishes the
//! hit as a string. Supports object field access (`field.subfield`), array
//! indexing (`[0]`), and combinations (`items[1].name`).

use async_trait::async_trait;
use flow_engine::{
    ExecutionContext, InputsExt, Node, NodeCategory, NodeDescriptor, NodeError, NodeOutputs,
    ParamKind, ParamValue, PortSpec,
};
use serde_json::json;

/// Path-based string extraction from JSON (`json-string-extract`)
pub struct JsonStringExtractNode {
    id: String,
    descriptor: NodeDescriptor,
}

impl JsonStringExtractNode {
    /// JSON payload input
    pub const PORT_JSON: &'static str = "json";
    /// Path expression input (usually an editor literal)
    pub const PORT_PATH: &'static str = "path";
    /// Extracted value output
    pub const PORT_VALUE: &'static str = "value";
    /// Whether the path resolved
    pub const PORT_FOUND: &'static str = "found";

    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            descriptor: Self::descriptor_for(),
        }
    }

    pub fn descriptor_for() -> NodeDescriptor {
        NodeDescriptor {
            kind: "json-string-extract".to_string(),
            label: "JSON String Extract".to_string(),
            category: NodeCategory::Processing,
            icon: "filter".to_string(),
            description: "Extracts a string from JSON using a path expression".to_string(),
            inputs: vec![
                PortSpec::required(Self::PORT_JSON, ParamKind::Json),
                PortSpec::optional(Self::PORT_PATH, ParamKind::String)
                    .describe("Path expression, e.g. items[0].name")
                    .with_default(json!(""))
                    .hidden(),
            ],
            outputs: vec![
                PortSpec::optional(Self::PORT_VALUE, ParamKind::String),
                PortSpec::optional(Self::PORT_FOUND, ParamKind::Boolean),
            ],
        }
    }

    /// Walk a dot/bracket path expression into a JSON value.
    fn extract_path<'a>(json: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
        if path.is_empty() {
            return Some(json);
        }

        let mut current = json;
        let mut remaining = path;

        while !remaining.is_empty() {
            // Array indexing: [N]
            if remaining.starts_with('[') {
                let end = remaining.find(']')?;
                let index: usize = remaining[1..end].parse().ok()?;
                current = current.get(index)?;
                remaining = &remaining[end + 1..];
                if remaining.starts_with('.') {
                    remaining = &remaining[1..];
                }
                continue;
            }

            // Object field access
            let (field, rest) = if let Some(dot_pos) = remaining.find('.') {
                let bracket_pos = remaining.find('[').unwrap_or(remaining.len());
                if dot_pos < bracket_pos {
                    (&remaining[..dot_pos], &remaining[dot_pos + 1..])
                } else {
                    (&remaining[..bracket_pos], &remaining[bracket_pos..])
                }
            } else if let Some(bracket_pos) = remaining.find('[') {
                (&remaining[..bracket_pos], &remaining[bracket_pos..])
            } else {
                (remaining, "")
            };

            if !field.is_empty() {
                current = current.get(field)?;
            }
            remaining = rest;
        }

        Some(current)
    }

    /// Render a JSON hit as the string output value.
    fn render(value: &serde_json::Value) -> String {
        match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[async_trait]
impl Node for JsonStringExtractNode {
    fn descriptor(&self) -> &NodeDescriptor {
        &self.descriptor
    }

    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(&self, ctx: ExecutionContext) -> Result<NodeOutputs, NodeError> {
        let json = ctx.inputs.get_json(Self::PORT_JSON)?;
        let path = ctx.inputs.get_string_opt(Self::PORT_PATH).unwrap_or("");

        let (value, found) = match Self::extract_path(json, path) {
            Some(hit) => (Self::render(hit), true),
            None => (String::new(), false),
        };

        log::debug!(
            "json-string-extract '{}': path '{}' found={}",
            self.id,
            path,
            found
        );

        let mut outputs = NodeOutputs::new();
        outputs.insert(Self::PORT_VALUE.to_string(), ParamValue::String(value));
        outputs.insert(Self::PORT_FOUND.to_string(), ParamValue::Boolean(found));
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::run_with_inputs;
    use flow_engine::NodeInputs;

    fn extract_inputs(json: serde_json::Value, path: &str) -> NodeInputs {
        let mut inputs = NodeInputs::new();
        inputs.insert("json".into(), ParamValue::Json(json));
        inputs.insert("path".into(), ParamValue::String(path.into()));
        inputs
    }

    #[test]
    fn test_extract_simple_field() {
        let json = json!({"name": "test"});
        let hit = JsonStringExtractNode::extract_path(&json, "name").unwrap();
        assert_eq!(hit, &json!("test"));
    }

    #[test]
    fn test_extract_nested_and_indexed() {
        let json = json!({"items": [{"name": "first"}, {"name": "second"}]});
        let hit = JsonStringExtractNode::extract_path(&json, "items[1].name").unwrap();
        assert_eq!(hit, &json!("second"));
    }

    #[test]
    fn test_extract_leading_index() {
        let json = json!([{"k": 1}, {"k": 2}]);
        let hit = JsonStringExtractNode::extract_path(&json, "[0].k").unwrap();
        assert_eq!(hit, &json!(1));
    }

    #[test]
    fn test_extract_deep_path() {
        let json = json!({
            "response": {
                "choices": [{"message": {"content": "hello"}}]
            }
        });
        let hit =
            JsonStringExtractNode::extract_path(&json, "response.choices[0].message.content")
                .unwrap();
        assert_eq!(hit, &json!("hello"));
    }

    #[test]
    fn test_extract_misses() {
        let json = json!({"a": 1});
        assert!(JsonStringExtractNode::extract_path(&json, "missing").is_none());
        assert!(JsonStringExtractNode::extract_path(&json, "[4]").is_none());
    }

    #[tokio::test]
    async fn test_execute_string_hit() {
        let node = JsonStringExtractNode::new("n1");
        let inputs = extract_inputs(json!({"user": {"name": "Ada"}}), "user.name");

        let outputs = run_with_inputs(&node, inputs).await.unwrap();
        assert_eq!(outputs["value"], ParamValue::String("Ada".into()));
        assert_eq!(outputs["found"], ParamValue::Boolean(true));
    }

    #[tokio::test]
    async fn test_execute_renders_non_string_hit() {
        let node = JsonStringExtractNode::new("n1");
        let inputs = extract_inputs(json!({"count": 42}), "count");

        let outputs = run_with_inputs(&node, inputs).await.unwrap();
        assert_eq!(outputs["value"], ParamValue::String("42".into()));
    }

    #[tokio::test]
    async fn test_execute_miss_yields_empty() {
        let node = JsonStringExtractNode::new("n1");
        let inputs = extract_inputs(json!({"a": 1}), "b.c");

        let outputs = run_with_inputs(&node, inputs).await.unwrap();
        assert_eq!(outputs["value"], ParamValue::String(String::new()));
        assert_eq!(outputs["found"], ParamValue::Boolean(false));
    }

    #[tokio::test]
    async fn test_execute_empty_path_returns_whole_document() {
        let node = JsonStringExtractNode::new("n1");
        let mut inputs = NodeInputs::new();
        inputs.insert("json".into(), ParamValue::Json(json!({"a": 1})));

        let outputs = run_with_inputs(&node, inputs).await.unwrap();
        assert_eq!(outputs["value"], ParamValue::String("{\"a\":1}".into()));
        assert_eq!(outputs["found"], ParamValue::Boolean(true));
    }
}
