//! The structured-output schema handed to the inference engine.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How one attribute is answered by the inference engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    /// Pick one of the listed values
    Enum(Vec<String>),
    /// Short free-form text
    FreeText,
}

/// One attribute the engine is asked to produce per identity.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AttributeSpec {
    pub name: String,
    pub kind: AttributeKind,
}

impl AttributeSpec {
    pub fn enumerated(name: impl Into<String>, values: &[&str]) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Enum(values.iter().map(|v| v.to_string()).collect()),
        }
    }

    pub fn free_text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::FreeText,
        }
    }
}

/// The full set of attributes requested per analysis cycle.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AttributeSchema {
    pub attributes: Vec<AttributeSpec>,
}

impl AttributeSchema {
    /// Names of the enumerated attributes, in schema order.
    pub fn categorical(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().filter_map(|a| match a.kind {
            AttributeKind::Enum(_) => Some(a.name.as_str()),
            AttributeKind::FreeText => None,
        })
    }

    /// Names of the free-text attributes, in schema order.
    pub fn free_text(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().filter_map(|a| match a.kind {
            AttributeKind::FreeText => Some(a.name.as_str()),
            AttributeKind::Enum(_) => None,
        })
    }
}

impl Default for AttributeSchema {
    /// The stock person-attribute schema.
    fn default() -> Self {
        Self {
            attributes: vec![
                AttributeSpec::enumerated("age_group", &["child", "teen", "adult", "senior"]),
                AttributeSpec::enumerated("gender", &["male", "female", "unknown"]),
                AttributeSpec::enumerated("mood", &["happy", "neutral", "serious", "surprised"]),
                AttributeSpec::free_text("fashion"),
            ],
        }
    }
}
