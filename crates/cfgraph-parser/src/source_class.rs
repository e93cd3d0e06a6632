//! One view over a class regardless of how it was reached: as a loaded type or through the
//! static metadata reader.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use cfgraph_metadata::{
    AnnotationValue, ClassMetadata, DescriptorIndex, MetadataError, MetadataReader,
};
use indexmap::IndexMap;

use crate::annotations::{
    COMPONENT, CONFIGURATION, CONTROLLER, DEFERRED_IMPORT_SELECTOR, IMPORT_BEAN_DEFINITION_REGISTRAR,
    IMPORT_SELECTOR, LOWEST_PRECEDENCE, OBJECT, ORDER, REPOSITORY, SERVICE,
};
use crate::condition::clamp_order;
use crate::error::{ParseError, Result};
use crate::filter::ClassFilter;
use crate::loader::{ClassLoader, LoadedType};

#[derive(Clone)]
pub enum SourceClass {
    Loaded(Arc<LoadedType>),
    Read(Arc<ClassMetadata>),
}

impl SourceClass {
    pub fn name(&self) -> &str {
        &self.metadata().name
    }

    pub fn metadata(&self) -> &Arc<ClassMetadata> {
        match self {
            SourceClass::Loaded(loaded) => loaded.metadata(),
            SourceClass::Read(metadata) => metadata,
        }
    }

    pub fn loaded(&self) -> Option<&Arc<LoadedType>> {
        match self {
            SourceClass::Loaded(loaded) => Some(loaded),
            SourceClass::Read(_) => None,
        }
    }

    /// Only statically read metadata lists methods in declaration order.
    pub fn declares_stable_method_order(&self) -> bool {
        matches!(self, SourceClass::Read(_))
    }
}

impl PartialEq for SourceClass {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for SourceClass {}

impl fmt::Debug for SourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolves class names into [`SourceClass`] views and answers hierarchy questions about
/// them. Loaded types are preferred when the asking view is itself loaded; otherwise the
/// static reader is used, falling back to the class loader and finally to the built-in
/// descriptors of the framework's own annotations and capability interfaces.
pub struct SourceClassResolver {
    reader: Arc<dyn MetadataReader>,
    class_loader: Arc<dyn ClassLoader>,
    platform_prefix: String,
    default_filter: ClassFilter,
    builtins: DescriptorIndex,
    object: SourceClass,
}

impl SourceClassResolver {
    pub fn new(
        reader: Arc<dyn MetadataReader>,
        class_loader: Arc<dyn ClassLoader>,
        platform_prefix: impl Into<String>,
        default_filter: ClassFilter,
    ) -> Self {
        Self {
            reader,
            class_loader,
            platform_prefix: platform_prefix.into(),
            default_filter,
            builtins: builtin_descriptors(),
            object: SourceClass::Read(Arc::new(ClassMetadata::new(OBJECT))),
        }
    }

    pub fn default_filter(&self) -> &ClassFilter {
        &self.default_filter
    }

    pub fn class_loader(&self) -> &dyn ClassLoader {
        self.class_loader.as_ref()
    }

    pub fn is_platform(&self, class_name: &str) -> bool {
        class_name.starts_with(self.platform_prefix.as_str())
    }

    /// The empty `java.lang.Object` view excluded names resolve to.
    pub fn object(&self) -> SourceClass {
        self.object.clone()
    }

    pub fn is_object(&self, source: &SourceClass) -> bool {
        source.name() == OBJECT
    }

    /// Static metadata for `class_name`: the reader, then built-in descriptors.
    pub fn read_static(&self, class_name: &str) -> Result<Arc<ClassMetadata>> {
        match self.reader.read_class(class_name) {
            Ok(metadata) => Ok(metadata),
            Err(err) if err.is_not_found() && self.builtins.contains(class_name) => self
                .builtins
                .read_class(class_name)
                .map_err(|err| ParseError::metadata(class_name, err)),
            Err(err) => Err(ParseError::metadata(class_name, err)),
        }
    }

    pub fn from_name(&self, class_name: &str, filter: &ClassFilter) -> Result<SourceClass> {
        if filter.matches(class_name) {
            return Ok(self.object());
        }
        if self.is_platform(class_name) {
            return Ok(self.platform_view(class_name));
        }
        match self.reader.read_class(class_name) {
            Ok(metadata) => Ok(SourceClass::Read(metadata)),
            Err(err) if err.is_not_found() => self.fallback_view(class_name, err),
            Err(err) => Err(ParseError::metadata(class_name, err)),
        }
    }

    pub fn from_loaded(&self, loaded: Arc<LoadedType>, filter: &ClassFilter) -> SourceClass {
        if filter.matches(loaded.name()) {
            self.object()
        } else {
            SourceClass::Loaded(loaded)
        }
    }

    /// Re-filters a view already in hand, e.g. the source of an existing configuration class.
    pub fn refilter(&self, source: &SourceClass, filter: &ClassFilter) -> SourceClass {
        if filter.matches(source.name()) {
            self.object()
        } else {
            source.clone()
        }
    }

    /// Resolves a class referenced from `from`, preferring the loaded path when `from` is loaded.
    pub fn related(&self, from: &SourceClass, class_name: &str) -> Result<SourceClass> {
        if from.loaded().is_some() {
            if let Some(loaded) = self.class_loader.load(class_name) {
                return Ok(self.from_loaded(loaded, &self.default_filter));
            }
        }
        self.from_name(class_name, &self.default_filter)
    }

    /// Annotation types present on `source`, resolved as views. Platform annotations and
    /// annotation types that cannot be resolved are skipped.
    pub fn annotations(&self, source: &SourceClass) -> Vec<SourceClass> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for annotation in &source.metadata().annotations {
            let type_name = annotation.type_name.as_str();
            if self.is_platform(type_name) || !seen.insert(type_name) {
                continue;
            }
            match self.related(source, type_name) {
                Ok(view) => out.push(view),
                Err(err) => tracing::debug!(
                    target: "cfgraph.parser",
                    class = %source.name(),
                    annotation = %type_name,
                    error = %err,
                    "skipping unresolvable annotation type"
                ),
            }
        }
        out
    }

    /// Class-valued attribute `attribute` of the annotation `annotation` declared on `source`.
    pub fn annotation_attribute_classes(
        &self,
        source: &SourceClass,
        annotation: &str,
        attribute: &str,
    ) -> Result<Vec<SourceClass>> {
        let Some(value) = source.metadata().annotation(annotation) else {
            return Ok(Vec::new());
        };
        let mut out: IndexMap<String, SourceClass> = IndexMap::new();
        for class_name in value.classes(attribute) {
            let view = self.related(source, &class_name)?;
            out.entry(view.name().to_string()).or_insert(view);
        }
        Ok(out.into_values().collect())
    }

    /// Member (nested) classes of `source`. Members that cannot be resolved are skipped.
    pub fn member_classes(&self, source: &SourceClass) -> Vec<SourceClass> {
        let mut out = Vec::new();
        for member in &source.metadata().member_classes {
            match self.related(source, member) {
                Ok(view) => out.push(view),
                Err(err) => tracing::debug!(
                    target: "cfgraph.parser",
                    class = %source.name(),
                    member = %member,
                    error = %err,
                    "failed to resolve member class; not considering it as a configuration class candidate"
                ),
            }
        }
        out
    }

    pub fn super_class(&self, source: &SourceClass) -> Result<Option<SourceClass>> {
        match &source.metadata().super_class {
            Some(name) => self.related(source, name).map(Some),
            None => Ok(None),
        }
    }

    pub fn interfaces(&self, source: &SourceClass) -> Result<Vec<SourceClass>> {
        source
            .metadata()
            .interfaces
            .iter()
            .map(|name| self.related(source, name))
            .collect()
    }

    /// Whether `source` is `target` or has it anywhere in its supertype hierarchy.
    /// Supertypes that cannot be resolved do not match.
    pub fn is_assignable(&self, source: &SourceClass, target: &str) -> bool {
        let prefer_loaded = source.loaded().is_some();
        let mut visited: HashSet<String> = HashSet::new();
        let mut pending = vec![Arc::clone(source.metadata())];

        while let Some(metadata) = pending.pop() {
            if metadata.name == target {
                return true;
            }
            if !visited.insert(metadata.name.clone()) {
                continue;
            }
            for parent in metadata.super_class.iter().chain(metadata.interfaces.iter()) {
                if parent == target {
                    return true;
                }
                if visited.contains(parent) || self.is_platform(parent) {
                    continue;
                }
                match self.hierarchy_metadata(parent, prefer_loaded) {
                    Ok(parent) => pending.push(parent),
                    Err(err) => tracing::debug!(
                        target: "cfgraph.parser",
                        class = %source.name(),
                        supertype = %parent,
                        error = %err,
                        "supertype not resolvable while checking assignability"
                    ),
                }
            }
        }
        false
    }

    /// The loaded type behind `source`.
    pub fn load_class(&self, source: &SourceClass) -> Result<Arc<LoadedType>> {
        match source {
            SourceClass::Loaded(loaded) => Ok(Arc::clone(loaded)),
            SourceClass::Read(metadata) => {
                self.class_loader
                    .load(&metadata.name)
                    .ok_or_else(|| ParseError::ClassNotFound {
                        class_name: metadata.name.clone(),
                    })
            }
        }
    }

    /// Ordering key from `@Order`, lowest precedence when absent.
    pub fn order(&self, source: &SourceClass) -> i32 {
        order_of(source.metadata())
    }

    /// Whether `metadata` carries `annotation` directly or through meta-annotations.
    pub fn is_annotated(&self, metadata: &ClassMetadata, annotation: &str) -> bool {
        self.find_annotation(metadata, annotation).is_some()
    }

    /// The first occurrence of `annotation` on `metadata`, looking through meta-annotations.
    pub fn find_annotation(
        &self,
        metadata: &ClassMetadata,
        annotation: &str,
    ) -> Option<AnnotationValue> {
        let mut visited = HashSet::new();
        self.find_meta_annotation(metadata, annotation, &mut visited)
    }

    /// Occurrences of a repeatable annotation declared on `metadata`. When none are declared
    /// directly, a single occurrence or container found through meta-annotations is used.
    pub fn find_repeatable_annotations(
        &self,
        metadata: &ClassMetadata,
        single: &str,
        container: &str,
    ) -> Vec<AnnotationValue> {
        let direct = metadata.repeatable_annotations(single, container);
        if !direct.is_empty() {
            return direct;
        }
        let mut out: Vec<AnnotationValue> = self.find_annotation(metadata, single).into_iter().collect();
        if let Some(holder) = self.find_annotation(metadata, container) {
            out.extend(
                holder
                    .annotations("value")
                    .into_iter()
                    .filter(|a| a.type_name == single),
            );
        }
        out
    }

    fn find_meta_annotation(
        &self,
        metadata: &ClassMetadata,
        annotation: &str,
        visited: &mut HashSet<String>,
    ) -> Option<AnnotationValue> {
        if let Some(found) = metadata.annotation(annotation) {
            return Some(found.clone());
        }
        for present in &metadata.annotations {
            let type_name = &present.type_name;
            if self.is_platform(type_name) || !visited.insert(type_name.clone()) {
                continue;
            }
            let Ok(annotation_type) = self.hierarchy_metadata(type_name, true) else {
                continue;
            };
            if let Some(found) = self.find_meta_annotation(&annotation_type, annotation, visited) {
                return Some(found);
            }
        }
        None
    }

    fn hierarchy_metadata(&self, class_name: &str, prefer_loaded: bool) -> Result<Arc<ClassMetadata>> {
        if prefer_loaded {
            if let Some(loaded) = self.class_loader.load(class_name) {
                return Ok(Arc::clone(loaded.metadata()));
            }
        }
        match self.reader.read_class(class_name) {
            Ok(metadata) => Ok(metadata),
            Err(err) if err.is_not_found() => {
                if let Some(loaded) = self.class_loader.load(class_name) {
                    return Ok(Arc::clone(loaded.metadata()));
                }
                self.builtins
                    .read_class(class_name)
                    .map_err(|_| ParseError::metadata(class_name, err))
            }
            Err(err) => Err(ParseError::metadata(class_name, err)),
        }
    }

    fn fallback_view(&self, class_name: &str, err: MetadataError) -> Result<SourceClass> {
        if let Some(loaded) = self.class_loader.load(class_name) {
            return Ok(SourceClass::Loaded(loaded));
        }
        match self.builtins.read_class(class_name) {
            Ok(metadata) => Ok(SourceClass::Read(metadata)),
            Err(_) => Err(ParseError::metadata(class_name, err)),
        }
    }

    /// Platform types are taken from the class loader when registered there; otherwise they
    /// are represented by an empty view, since they never carry configuration metadata.
    fn platform_view(&self, class_name: &str) -> SourceClass {
        match self.class_loader.load(class_name) {
            Some(loaded) => SourceClass::Loaded(loaded),
            None if class_name == OBJECT => self.object(),
            None => SourceClass::Read(Arc::new(ClassMetadata::new(class_name))),
        }
    }
}

pub(crate) fn order_of(metadata: &ClassMetadata) -> i32 {
    metadata
        .annotation(ORDER)
        .and_then(|order| order.int("value"))
        .map(clamp_order)
        .unwrap_or(LOWEST_PRECEDENCE)
}

fn builtin_descriptors() -> DescriptorIndex {
    let stereotype = |name: &str| {
        let mut metadata = ClassMetadata::new(name);
        metadata.flags.annotation = true;
        metadata.flags.interface = true;
        metadata.annotations.push(AnnotationValue::new(COMPONENT));
        metadata
    };
    let capability = |name: &str, parents: &[&str]| {
        let mut metadata = ClassMetadata::new(name);
        metadata.flags.interface = true;
        metadata.flags.is_abstract = true;
        metadata.interfaces = parents.iter().map(|p| p.to_string()).collect();
        metadata
    };
    let mut component = ClassMetadata::new(COMPONENT);
    component.flags.annotation = true;
    component.flags.interface = true;

    DescriptorIndex::new()
        .with(component)
        .with(stereotype(CONFIGURATION))
        .with(stereotype(SERVICE))
        .with(stereotype(REPOSITORY))
        .with(stereotype(CONTROLLER))
        .with(capability(IMPORT_SELECTOR, &[]))
        .with(capability(DEFERRED_IMPORT_SELECTOR, &[IMPORT_SELECTOR]))
        .with(capability(IMPORT_BEAN_DEFINITION_REGISTRAR, &[]))
}
