//! Class metadata for configuration graph resolution.
//!
//! The types here describe what the parser needs to know about a class: its annotations
//! (with typed attribute values), declared methods, type hierarchy and member classes.
//! Metadata reaches the parser either from a [`MetadataReader`] (static descriptors, methods
//! in declaration order) or from loaded types registered in-process.

#![forbid(unsafe_code)]

mod annotation;
mod class;
mod error;
mod reader;

pub use crate::annotation::{AnnotationValue, AttributeValue};
pub use crate::class::{
    package_name, short_name, ClassFlags, ClassMetadata, MethodFlags, MethodMetadata,
};
pub use crate::error::{MetadataError, Result};
pub use crate::reader::{CachingMetadataReader, DescriptorFile, DescriptorIndex, MetadataReader};
