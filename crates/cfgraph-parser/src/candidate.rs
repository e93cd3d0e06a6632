//! Deciding whether a bean definition or class is a configuration class candidate.

use std::sync::Arc;

use cfgraph_metadata::ClassMetadata;

use crate::annotations::{BEAN, CANDIDATE_INDICATORS, CONFIGURATION};
use crate::definition::BeanDefinition;
use crate::source_class::{order_of, SourceClassResolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    /// `@Configuration` with bean method proxying.
    Full,
    /// Any other class contributing configuration: `@Component`, `@ComponentScan`,
    /// `@Import`, `@ImportResource`, `@Bean` methods, or `@Configuration(proxyBeanMethods = false)`.
    Lite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub kind: CandidateKind,
    pub order: i32,
}

/// Classifies `definition`. Definitions without a class name, factory-method definitions and
/// classes whose metadata cannot be read are not candidates.
pub fn check_configuration_class_candidate(
    definition: &BeanDefinition,
    resolver: &SourceClassResolver,
) -> Option<Candidate> {
    let class_name = definition.bean_class_name()?;
    if definition.factory_method_name().is_some() {
        return None;
    }

    let metadata: Arc<ClassMetadata> = if let Some(metadata) = definition.metadata() {
        Arc::clone(metadata)
    } else if let Some(loaded) = definition.loaded() {
        Arc::clone(loaded.metadata())
    } else {
        match resolver.read_static(class_name) {
            Ok(metadata) => metadata,
            Err(err) => {
                tracing::debug!(
                    target: "cfgraph.parser",
                    class = %class_name,
                    error = %err,
                    "could not find class file for introspecting configuration annotations"
                );
                return None;
            }
        }
    };

    let kind = match resolver.find_annotation(&metadata, CONFIGURATION) {
        Some(config) if config.bool("proxyBeanMethods") != Some(false) => CandidateKind::Full,
        Some(_) => CandidateKind::Lite,
        None if is_configuration_candidate(&metadata, resolver) => CandidateKind::Lite,
        None => return None,
    };
    Some(Candidate {
        kind,
        order: order_of(&metadata),
    })
}

/// Whether `metadata` describes a class that contributes configuration. Interfaces never do.
pub fn is_configuration_candidate(metadata: &ClassMetadata, resolver: &SourceClassResolver) -> bool {
    if metadata.is_interface() {
        return false;
    }
    if CANDIDATE_INDICATORS
        .iter()
        .any(|indicator| resolver.is_annotated(metadata, indicator))
    {
        return true;
    }
    metadata.has_annotated_methods(BEAN)
}
