use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single annotation occurrence with its explicitly declared attributes.
///
/// Attribute defaults are not materialized: accessors return `None` for attributes the
/// declaration did not spell out and callers apply the annotation's documented default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationValue {
    /// Fully qualified (dotted) name of the annotation type.
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, AttributeValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeValue {
    String(String),
    Bool(bool),
    Int(i64),
    /// Class literal, stored as a dotted binary name (`a.b.Outer$Inner`).
    Class(String),
    Enum {
        #[serde(rename = "type")]
        type_name: String,
        constant: String,
    },
    Annotation(Box<AnnotationValue>),
    Array(Vec<AttributeValue>),
}

impl AnnotationValue {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            attributes: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        match self.attribute(name)? {
            AttributeValue::String(value) => Some(value),
            AttributeValue::Array(values) if values.len() == 1 => match &values[0] {
                AttributeValue::String(value) => Some(value),
                _ => None,
            },
            _ => None,
        }
    }

    /// String array attribute. A scalar string is treated as a one-element array, matching
    /// how annotation sources allow `@X("a")` for `String[] value()`.
    pub fn strings(&self, name: &str) -> Vec<String> {
        self.attribute(name)
            .map(|value| value.flatten(|v| v.as_str().map(str::to_string)))
            .unwrap_or_default()
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.attribute(name)? {
            AttributeValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.attribute(name)? {
            AttributeValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn class(&self, name: &str) -> Option<&str> {
        match self.attribute(name)? {
            AttributeValue::Class(value) => Some(value),
            AttributeValue::Array(values) if values.len() == 1 => values[0].as_class(),
            _ => None,
        }
    }

    pub fn classes(&self, name: &str) -> Vec<String> {
        self.attribute(name)
            .map(|value| value.flatten(|v| v.as_class().map(str::to_string)))
            .unwrap_or_default()
    }

    pub fn annotations(&self, name: &str) -> Vec<AnnotationValue> {
        self.attribute(name)
            .map(|value| {
                value.flatten(|v| match v {
                    AttributeValue::Annotation(ann) => Some((**ann).clone()),
                    _ => None,
                })
            })
            .unwrap_or_default()
    }
}

impl AttributeValue {
    pub fn string(value: impl Into<String>) -> Self {
        AttributeValue::String(value.into())
    }

    pub fn class(name: impl Into<String>) -> Self {
        AttributeValue::Class(name.into())
    }

    pub fn classes<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AttributeValue::Array(names.into_iter().map(|n| AttributeValue::Class(n.into())).collect())
    }

    pub fn strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AttributeValue::Array(
            values
                .into_iter()
                .map(|v| AttributeValue::String(v.into()))
                .collect(),
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&str> {
        match self {
            AttributeValue::Class(value) => Some(value),
            _ => None,
        }
    }

    fn flatten<T>(&self, mut extract: impl FnMut(&AttributeValue) -> Option<T>) -> Vec<T> {
        match self {
            AttributeValue::Array(values) => values.iter().filter_map(&mut extract).collect(),
            other => extract(other).into_iter().collect(),
        }
    }
}
