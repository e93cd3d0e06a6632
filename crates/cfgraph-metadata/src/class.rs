use serde::{Deserialize, Serialize};

use crate::annotation::AnnotationValue;

/// Structural metadata for one class: what a static class reader or a loaded type exposes
/// about annotations, methods and the type hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetadata {
    /// Dotted binary name (`com.example.Outer$Inner`).
    pub name: String,
    #[serde(default)]
    pub flags: ClassFlags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub super_class: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodMetadata>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub member_classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enclosing_class: Option<String>,
    /// Human readable description of where this metadata came from (e.g. a class file path).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassFlags {
    pub interface: bool,
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    #[serde(rename = "final")]
    pub is_final: bool,
    pub annotation: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodMetadata {
    pub name: String,
    /// Erased parameter/return descriptor. Distinguishes overloads.
    #[serde(default)]
    pub descriptor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    /// Name of the class that declares the method.
    #[serde(default)]
    pub declaring_class: String,
    #[serde(default)]
    pub flags: MethodFlags,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationValue>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodFlags {
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    #[serde(rename = "static")]
    pub is_static: bool,
    #[serde(rename = "final")]
    pub is_final: bool,
    pub private: bool,
}

impl ClassMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: ClassFlags::default(),
            super_class: None,
            interfaces: Vec::new(),
            annotations: Vec::new(),
            methods: Vec::new(),
            member_classes: Vec::new(),
            enclosing_class: None,
            resource: None,
        }
    }

    pub fn is_interface(&self) -> bool {
        self.flags.interface
    }

    pub fn is_abstract(&self) -> bool {
        self.flags.is_abstract
    }

    pub fn is_final(&self) -> bool {
        self.flags.is_final
    }

    pub fn is_annotation(&self) -> bool {
        self.flags.annotation
    }

    /// Whether the class can be instantiated on its own: a concrete top-level class.
    pub fn is_concrete(&self) -> bool {
        !(self.flags.interface || self.flags.is_abstract)
    }

    pub fn has_super_class(&self) -> bool {
        self.super_class.is_some()
    }

    /// Checks annotations declared directly on the class. Meta-annotations are not
    /// consulted here since resolving them needs access to other classes' metadata.
    pub fn is_annotated_directly(&self, annotation: &str) -> bool {
        self.annotations.iter().any(|a| a.type_name == annotation)
    }

    pub fn annotation(&self, annotation: &str) -> Option<&AnnotationValue> {
        self.annotations.iter().find(|a| a.type_name == annotation)
    }

    /// All occurrences of a repeatable annotation: direct `single` occurrences followed by
    /// the `value` entries of any `container` annotation.
    pub fn repeatable_annotations(&self, single: &str, container: &str) -> Vec<AnnotationValue> {
        let mut out: Vec<AnnotationValue> = self
            .annotations
            .iter()
            .filter(|a| a.type_name == single)
            .cloned()
            .collect();
        for holder in self.annotations.iter().filter(|a| a.type_name == container) {
            out.extend(
                holder
                    .annotations("value")
                    .into_iter()
                    .filter(|a| a.type_name == single),
            );
        }
        out
    }

    pub fn annotated_methods<'a>(
        &'a self,
        annotation: &'a str,
    ) -> impl Iterator<Item = &'a MethodMetadata> + 'a {
        self.methods.iter().filter(move |m| m.is_annotated(annotation))
    }

    pub fn has_annotated_methods(&self, annotation: &str) -> bool {
        self.annotated_methods(annotation).next().is_some()
    }

    /// Short class name: package stripped, nested separators (`$`) rendered as `.`.
    pub fn simple_name(&self) -> String {
        short_name(&self.name)
    }

    pub fn package_name(&self) -> &str {
        package_name(&self.name)
    }

    pub fn resource_description(&self) -> String {
        match &self.resource {
            Some(resource) => resource.clone(),
            None => format!("class [{}]", self.name),
        }
    }
}

impl MethodMetadata {
    pub fn new(name: impl Into<String>, declaring_class: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descriptor: String::new(),
            return_type: None,
            declaring_class: declaring_class.into(),
            flags: MethodFlags::default(),
            annotations: Vec::new(),
        }
    }

    #[must_use]
    pub fn annotated(mut self, annotation: AnnotationValue) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn is_annotated(&self, annotation: &str) -> bool {
        self.annotations.iter().any(|a| a.type_name == annotation)
    }

    pub fn annotation(&self, annotation: &str) -> Option<&AnnotationValue> {
        self.annotations.iter().find(|a| a.type_name == annotation)
    }

    pub fn is_abstract(&self) -> bool {
        self.flags.is_abstract
    }

    pub fn is_static(&self) -> bool {
        self.flags.is_static
    }

    /// A method a subclass can override: not static, not final, not private.
    pub fn is_overridable(&self) -> bool {
        !self.flags.is_static && !self.flags.is_final && !self.flags.private
    }
}

pub fn short_name(class_name: &str) -> String {
    let start = class_name.rfind('.').map(|idx| idx + 1).unwrap_or(0);
    class_name[start..].replace('$', ".")
}

pub fn package_name(class_name: &str) -> &str {
    match class_name.rfind('.') {
        Some(idx) => &class_name[..idx],
        None => "",
    }
}
