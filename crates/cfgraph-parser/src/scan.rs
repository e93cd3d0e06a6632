//! `@ComponentScan` requests and the scanner seam that answers them.

use std::sync::Arc;

use cfgraph_metadata::{
    package_name, short_name, AnnotationValue, AttributeValue, ClassMetadata, MetadataReader,
};
use indexmap::IndexSet;

use crate::annotations::{COMPONENT, CONFIGURATION, CONTROLLER, REPOSITORY, SERVICE};
use crate::definition::{BeanDefinition, BeanDefinitionHolder, BeanDefinitionRegistry};
use crate::env::Environment;
use crate::error::{ParseError, Result};

const PACKAGE_DELIMITERS: &[char] = &[',', ';', ' ', '\t', '\n'];

const STEREOTYPES: [&str; 5] = [COMPONENT, CONFIGURATION, SERVICE, REPOSITORY, CONTROLLER];

/// One `@ComponentScan` occurrence, resolved against the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRequest {
    pub base_packages: Vec<String>,
    pub use_default_filters: bool,
    pub lazy_init: bool,
    pub include_filters: Vec<AnnotationValue>,
    pub exclude_filters: Vec<AnnotationValue>,
    /// The class declaring the scan. Never part of the result.
    pub declaring_class: String,
}

impl ScanRequest {
    pub fn from_annotation(
        scan: &AnnotationValue,
        declaring_class: &str,
        environment: &dyn Environment,
    ) -> Self {
        let mut base_packages = IndexSet::new();
        let declared = scan
            .strings("basePackages")
            .into_iter()
            .chain(scan.strings("value"));
        for package in declared {
            let resolved = environment.resolve_placeholders(&package);
            base_packages.extend(
                resolved
                    .split(PACKAGE_DELIMITERS)
                    .map(str::trim)
                    .filter(|token| !token.is_empty())
                    .map(str::to_string),
            );
        }
        for class_name in scan.classes("basePackageClasses") {
            base_packages.insert(package_name(&class_name).to_string());
        }
        if base_packages.is_empty() {
            base_packages.insert(package_name(declaring_class).to_string());
        }

        Self {
            base_packages: base_packages.into_iter().collect(),
            use_default_filters: scan.bool("useDefaultFilters").unwrap_or(true),
            lazy_init: scan.bool("lazyInit").unwrap_or(false),
            include_filters: scan.annotations("includeFilters"),
            exclude_filters: scan.annotations("excludeFilters"),
            declaring_class: declaring_class.to_string(),
        }
    }

    /// Whether `class_name` lives in one of the base packages or below.
    pub fn covers(&self, class_name: &str) -> bool {
        let package = package_name(class_name);
        self.base_packages.iter().any(|base| {
            base.is_empty()
                || package == base
                || (package.starts_with(base.as_str())
                    && package[base.len()..].starts_with('.'))
        })
    }
}

/// Finds component definitions for a scan request.
pub trait ComponentScanner: Send + Sync {
    fn scan(&self, request: &ScanRequest) -> Result<Vec<BeanDefinitionHolder>>;
}

/// Finds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopScanner;

impl ComponentScanner for NoopScanner {
    fn scan(&self, _request: &ScanRequest) -> Result<Vec<BeanDefinitionHolder>> {
        Ok(Vec::new())
    }
}

/// Scans a fixed list of class names through the metadata reader. Stereotype-annotated
/// concrete classes match the default filters; `ANNOTATION` and `ASSIGNABLE_TYPE` include and
/// exclude filters are honoured.
pub struct StaticComponentScanner {
    reader: Arc<dyn MetadataReader>,
    class_names: Vec<String>,
    registry: Option<Arc<dyn BeanDefinitionRegistry>>,
}

impl StaticComponentScanner {
    pub fn new<I, S>(reader: Arc<dyn MetadataReader>, class_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            reader,
            class_names: class_names.into_iter().map(Into::into).collect(),
            registry: None,
        }
    }

    /// Registers every scanned definition whose bean name is not taken yet.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<dyn BeanDefinitionRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    fn is_candidate(&self, request: &ScanRequest, metadata: &ClassMetadata) -> bool {
        if !metadata.is_concrete() || metadata.is_annotation() {
            return false;
        }
        if request
            .exclude_filters
            .iter()
            .any(|filter| filter_matches(filter, metadata))
        {
            return false;
        }
        let default_match = request.use_default_filters
            && STEREOTYPES
                .iter()
                .any(|stereotype| metadata.is_annotated_directly(stereotype));
        default_match
            || request
                .include_filters
                .iter()
                .any(|filter| filter_matches(filter, metadata))
    }
}

impl ComponentScanner for StaticComponentScanner {
    fn scan(&self, request: &ScanRequest) -> Result<Vec<BeanDefinitionHolder>> {
        let mut out = Vec::new();
        for class_name in &self.class_names {
            if *class_name == request.declaring_class || !request.covers(class_name) {
                continue;
            }
            let metadata = self
                .reader
                .read_class(class_name)
                .map_err(|err| ParseError::metadata(class_name.as_str(), err))?;
            if !self.is_candidate(request, &metadata) {
                continue;
            }
            let bean_name = bean_name(&metadata);
            let definition = BeanDefinition::annotated(metadata).with_lazy_init(request.lazy_init);
            if let Some(registry) = &self.registry {
                if registry.contains_bean_definition(&bean_name) {
                    tracing::debug!(
                        target: "cfgraph.parser",
                        bean = %bean_name,
                        class = %class_name,
                        "skipping scanned class; bean name already registered"
                    );
                    continue;
                }
                registry.register_bean_definition(&bean_name, definition.clone());
            }
            out.push(BeanDefinitionHolder::new(bean_name, definition));
        }
        Ok(out)
    }
}

fn filter_matches(filter: &AnnotationValue, metadata: &ClassMetadata) -> bool {
    let filter_type = match filter.attribute("type") {
        Some(AttributeValue::Enum { constant, .. }) => constant.as_str(),
        _ => "ANNOTATION",
    };
    let classes: Vec<String> = filter
        .classes("classes")
        .into_iter()
        .chain(filter.classes("value"))
        .collect();
    match filter_type {
        "ANNOTATION" => classes
            .iter()
            .any(|annotation| metadata.is_annotated_directly(annotation)),
        "ASSIGNABLE_TYPE" => classes.iter().any(|target| {
            metadata.name == *target
                || metadata.super_class.as_deref() == Some(target.as_str())
                || metadata.interfaces.iter().any(|i| i == target)
        }),
        other => {
            tracing::debug!(
                target: "cfgraph.parser",
                filter_type = %other,
                class = %metadata.name,
                "unsupported component scan filter type"
            );
            false
        }
    }
}

/// Explicit stereotype `value`, else the decapitalized short class name.
fn bean_name(metadata: &ClassMetadata) -> String {
    let explicit = STEREOTYPES.iter().find_map(|stereotype| {
        metadata
            .annotation(stereotype)
            .and_then(|value| value.string("value"))
            .filter(|name| !name.is_empty())
    });
    if let Some(name) = explicit {
        return name.to_string();
    }
    decapitalize(&short_name(&metadata.name))
}

/// Lower-cases the first character unless the first two are both upper case (`URLConfig`).
fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    if chars.next().is_some_and(char::is_uppercase) && first.is_uppercase() {
        return name.to_string();
    }
    let mut out: String = first.to_lowercase().collect();
    out.push_str(&name[first.len_utf8()..]);
    out
}
