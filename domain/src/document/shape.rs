//! Expected-shape validation for recovered documents
//!
//! A shape is a lightweight recursive schema checked once at the recovery
//! boundary, so downstream code can trust document structure instead of
//! re-validating ad hoc.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Recursive schema for validating a recovered document
///
/// # Example
///
/// ```
/// use conclave_domain::ExpectedShape;
/// use serde_json::json;
///
/// let shape = ExpectedShape::object([
///     ("title", ExpectedShape::Text),
///     ("scenes", ExpectedShape::list(ExpectedShape::Text)),
/// ]);
///
/// assert!(shape.validate(&json!({"title": "Demo", "scenes": ["a", "b"]})));
/// assert!(!shape.validate(&json!({"title": "Demo"})));            // missing key
/// assert!(!shape.validate(&json!({"title": 7, "scenes": []})));   // wrong primitive
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ExpectedShape {
    /// Object with required keys, each matching a nested shape
    Object(BTreeMap<String, ExpectedShape>),
    /// List whose first element (if any) matches the element shape
    List(Box<ExpectedShape>),
    /// JSON string
    Text,
    /// JSON number
    Number,
    /// JSON boolean
    Bool,
    /// Anything, including null
    Any,
}

impl ExpectedShape {
    /// Build an object shape from (key, shape) pairs
    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, ExpectedShape)>) -> Self {
        ExpectedShape::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v))
                .collect(),
        )
    }

    /// Build a list shape with the given element shape
    pub fn list(element: ExpectedShape) -> Self {
        ExpectedShape::List(Box::new(element))
    }

    /// Validate a JSON value against this shape
    ///
    /// Extra keys in objects are allowed; only the declared keys are
    /// required. An empty list has no first element to violate its element
    /// shape and is accepted.
    pub fn validate(&self, value: &Value) -> bool {
        match self {
            ExpectedShape::Object(required) => {
                let Some(object) = value.as_object() else {
                    return false;
                };
                required.iter().all(|(key, shape)| {
                    object.get(key).is_some_and(|v| shape.validate(v))
                })
            }
            ExpectedShape::List(element) => {
                let Some(items) = value.as_array() else {
                    return false;
                };
                items.first().is_none_or(|first| element.validate(first))
            }
            ExpectedShape::Text => value.is_string(),
            ExpectedShape::Number => value.is_number(),
            ExpectedShape::Bool => value.is_boolean(),
            ExpectedShape::Any => true,
        }
    }

    /// Render a compact outline of this shape for repair prompts
    ///
    /// E.g. `{"title": text, "scenes": [text]}`
    pub fn outline(&self) -> String {
        match self {
            ExpectedShape::Object(required) => {
                let inner = required
                    .iter()
                    .map(|(k, s)| format!("\"{}\": {}", k, s.outline()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{{}}}", inner)
            }
            ExpectedShape::List(element) => format!("[{}]", element.outline()),
            ExpectedShape::Text => "text".to_string(),
            ExpectedShape::Number => "number".to_string(),
            ExpectedShape::Bool => "bool".to_string(),
            ExpectedShape::Any => "any".to_string(),
        }
    }
}
