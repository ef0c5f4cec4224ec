//! Parameter kinds and values that flow through ports
//!
//! Every port declares a [`ParamKind`]; every value moving along an edge is a
//! [`ParamValue`]. Each kind carries the full capability bundle: validate,
//! serialize to wire form, deserialize back, and produce a default value.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Mime types accepted by the `image` kind.
const IMAGE_MIME_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp", "image/gif"];

/// Mime types accepted by the `audio` kind.
const AUDIO_MIME_TYPES: &[&str] = &["audio/mpeg", "audio/webm", "audio/wav", "audio/ogg"];

/// Fallback mime type when a wire value omits one.
const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// The registered parameter kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    /// Accepts any value; bypasses edge compatibility checks
    Any,
    /// Textual value
    String,
    /// Finite numeric scalar
    Number,
    /// True/false
    Boolean,
    /// Ordered sequence of arbitrary values
    Array,
    /// Non-null structured value (object or array)
    Json,
    /// Byte sequence with any mime type
    Binary,
    /// Byte sequence with an image mime type
    Image,
    /// Byte sequence with an audio mime type
    Audio,
    /// Byte sequence with any mime type (document payloads)
    Document,
}

/// An in-memory parameter value
///
/// The four byte-sequence kinds (`binary`, `image`, `audio`, `document`)
/// share the [`ParamValue::Binary`] variant; the port's declared kind narrows
/// the permitted mime set during validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Array(Vec<serde_json::Value>),
    Json(serde_json::Value),
    Binary { data: Vec<u8>, mime_type: String },
}

impl ParamValue {
    /// Short name of the value's own shape, used in rejection reasons.
    fn shape(&self) -> &'static str {
        match self {
            ParamValue::String(_) => "string",
            ParamValue::Number(_) => "number",
            ParamValue::Boolean(_) => "boolean",
            ParamValue::Array(_) => "array",
            ParamValue::Json(_) => "json",
            ParamValue::Binary { .. } => "binary",
        }
    }

    /// Convenience constructor for byte values.
    pub fn binary(data: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self::Binary {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }
}

impl ParamKind {
    /// The registry identifier for this kind
    pub fn name(&self) -> &'static str {
        match self {
            ParamKind::Any => "any",
            ParamKind::String => "string",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
            ParamKind::Array => "array",
            ParamKind::Json => "json",
            ParamKind::Binary => "binary",
            ParamKind::Image => "image",
            ParamKind::Audio => "audio",
            ParamKind::Document => "document",
        }
    }

    /// Check whether a value of this kind may travel to a port of `target` kind
    ///
    /// Kinds are compatible when equal, or when either side is `any`.
    /// There is no implicit coercion between kinds.
    pub fn is_compatible_with(&self, target: &ParamKind) -> bool {
        if matches!(self, ParamKind::Any) || matches!(target, ParamKind::Any) {
            return true;
        }
        self == target
    }

    /// Validate a value against this kind
    ///
    /// Returns a human-readable reason when rejecting.
    pub fn validate(&self, value: &ParamValue) -> Result<(), String> {
        match (self, value) {
            (ParamKind::Any, _) => Ok(()),
            (ParamKind::String, ParamValue::String(_)) => Ok(()),
            (ParamKind::Number, ParamValue::Number(n)) => {
                if n.is_finite() {
                    Ok(())
                } else {
                    Err(format!("number must be finite, got {}", n))
                }
            }
            (ParamKind::Boolean, ParamValue::Boolean(_)) => Ok(()),
            (ParamKind::Array, ParamValue::Array(_)) => Ok(()),
            (ParamKind::Json, ParamValue::Json(v)) => {
                if v.is_object() || v.is_array() {
                    Ok(())
                } else {
                    Err("json value must be an object or array".to_string())
                }
            }
            (ParamKind::Binary | ParamKind::Document, ParamValue::Binary { .. }) => Ok(()),
            (ParamKind::Image, ParamValue::Binary { mime_type, .. }) => {
                if IMAGE_MIME_TYPES.contains(&mime_type.as_str()) {
                    Ok(())
                } else {
                    Err(format!("'{}' is not a permitted image mime type", mime_type))
                }
            }
            (ParamKind::Audio, ParamValue::Binary { mime_type, .. }) => {
                if AUDIO_MIME_TYPES.contains(&mime_type.as_str()) {
                    Ok(())
                } else {
                    Err(format!("'{}' is not a permitted audio mime type", mime_type))
                }
            }
            (kind, value) => Err(format!(
                "expected a {} value, got {}",
                kind.name(),
                value.shape()
            )),
        }
    }

    /// Produce the transport-safe wire form of a value
    ///
    /// Byte sequences become `{ "data": <base64>, "mimeType": <string> }`
    /// objects; everything else maps onto its natural JSON shape.
    pub fn serialize(&self, value: &ParamValue) -> serde_json::Value {
        match value {
            ParamValue::String(s) => serde_json::Value::String(s.clone()),
            ParamValue::Number(n) => serde_json::json!(n),
            ParamValue::Boolean(b) => serde_json::Value::Bool(*b),
            ParamValue::Array(items) => serde_json::Value::Array(items.clone()),
            ParamValue::Json(v) => v.clone(),
            ParamValue::Binary { data, mime_type } => serde_json::json!({
                "data": BASE64.encode(data),
                "mimeType": mime_type,
            }),
        }
    }

    /// Parse a wire-form value back into this kind's in-memory form
    ///
    /// Tolerant where feasible: byte values may omit `mimeType`, and `any`
    /// infers the variant from the wire shape.
    pub fn deserialize(&self, wire: &serde_json::Value) -> Result<ParamValue, String> {
        match self {
            ParamKind::Any => Ok(Self::infer(wire)),
            ParamKind::String => wire
                .as_str()
                .map(|s| ParamValue::String(s.to_string()))
                .ok_or_else(|| "expected a JSON string".to_string()),
            ParamKind::Number => wire
                .as_f64()
                .filter(|n| n.is_finite())
                .map(ParamValue::Number)
                .ok_or_else(|| "expected a finite JSON number".to_string()),
            ParamKind::Boolean => wire
                .as_bool()
                .map(ParamValue::Boolean)
                .ok_or_else(|| "expected a JSON boolean".to_string()),
            ParamKind::Array => wire
                .as_array()
                .map(|items| ParamValue::Array(items.clone()))
                .ok_or_else(|| "expected a JSON array".to_string()),
            ParamKind::Json => {
                if wire.is_object() || wire.is_array() {
                    Ok(ParamValue::Json(wire.clone()))
                } else {
                    Err("expected a JSON object or array".to_string())
                }
            }
            ParamKind::Binary | ParamKind::Image | ParamKind::Audio | ParamKind::Document => {
                Self::decode_binary(wire)
            }
        }
    }

    /// The canonical empty value for this kind
    pub fn default_value(&self) -> ParamValue {
        match self {
            ParamKind::Any => ParamValue::Json(serde_json::Value::Null),
            ParamKind::String => ParamValue::String(String::new()),
            ParamKind::Number => ParamValue::Number(0.0),
            ParamKind::Boolean => ParamValue::Boolean(false),
            ParamKind::Array => ParamValue::Array(Vec::new()),
            ParamKind::Json => ParamValue::Json(serde_json::json!({})),
            ParamKind::Image => ParamValue::binary(Vec::new(), IMAGE_MIME_TYPES[0]),
            ParamKind::Audio => ParamValue::binary(Vec::new(), AUDIO_MIME_TYPES[0]),
            ParamKind::Binary | ParamKind::Document => {
                ParamValue::binary(Vec::new(), DEFAULT_MIME_TYPE)
            }
        }
    }

    /// Infer a value's variant from its wire shape (used by `any`).
    fn infer(wire: &serde_json::Value) -> ParamValue {
        match wire {
            serde_json::Value::String(s) => ParamValue::String(s.clone()),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) if f.is_finite() => ParamValue::Number(f),
                _ => ParamValue::Json(wire.clone()),
            },
            serde_json::Value::Bool(b) => ParamValue::Boolean(*b),
            serde_json::Value::Array(items) => ParamValue::Array(items.clone()),
            serde_json::Value::Object(map) => {
                if map.contains_key("data") && map.contains_key("mimeType") {
                    Self::decode_binary(wire).unwrap_or_else(|_| ParamValue::Json(wire.clone()))
                } else {
                    ParamValue::Json(wire.clone())
                }
            }
            serde_json::Value::Null => ParamValue::Json(serde_json::Value::Null),
        }
    }

    /// Decode the `{data, mimeType}` wire object for byte kinds.
    fn decode_binary(wire: &serde_json::Value) -> Result<ParamValue, String> {
        let obj = wire
            .as_object()
            .ok_or_else(|| "expected a {data, mimeType} object".to_string())?;

        let encoded = obj
            .get("data")
            .and_then(|d| d.as_str())
            .ok_or_else(|| "missing base64 'data' field".to_string())?;

        let data = BASE64
            .decode(encoded)
            .map_err(|e| format!("invalid base64 data: {}", e))?;

        let mime_type = obj
            .get("mimeType")
            .and_then(|m| m.as_str())
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string();

        Ok(ParamValue::Binary { data, mime_type })
    }
}

impl std::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Check if a single connection between two port kinds is valid
///
/// Used by editors to validate connections as they are drawn.
pub fn validate_connection(source: &ParamKind, target: &ParamKind) -> bool {
    source.is_compatible_with(target)
}
