use std::fmt;
use std::sync::Arc;

use cfgraph_metadata::ClassMetadata;
use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::loader::LoadedType;

/// What the parser is told about a bean: annotated metadata, a loaded type, or just a class
/// name, plus enough of the definition to decide whether it is a configuration candidate.
#[derive(Clone, Default)]
pub struct BeanDefinition {
    bean_class_name: Option<String>,
    metadata: Option<Arc<ClassMetadata>>,
    loaded: Option<Arc<LoadedType>>,
    factory_method_name: Option<String>,
    originating: Option<Box<BeanDefinition>>,
    lazy_init: bool,
}

impl BeanDefinition {
    pub fn for_class_name(class_name: impl Into<String>) -> Self {
        Self {
            bean_class_name: Some(class_name.into()),
            ..Self::default()
        }
    }

    pub fn annotated(metadata: Arc<ClassMetadata>) -> Self {
        Self {
            bean_class_name: Some(metadata.name.clone()),
            metadata: Some(metadata),
            ..Self::default()
        }
    }

    pub fn for_loaded(loaded: Arc<LoadedType>) -> Self {
        Self {
            bean_class_name: Some(loaded.name().to_string()),
            loaded: Some(loaded),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_factory_method(mut self, name: impl Into<String>) -> Self {
        self.factory_method_name = Some(name.into());
        self
    }

    /// Marks this definition as decorating `original` (for example a scoped proxy).
    #[must_use]
    pub fn with_originating(mut self, original: BeanDefinition) -> Self {
        self.originating = Some(Box::new(original));
        self
    }

    #[must_use]
    pub fn with_lazy_init(mut self, lazy_init: bool) -> Self {
        self.lazy_init = lazy_init;
        self
    }

    pub fn bean_class_name(&self) -> Option<&str> {
        self.bean_class_name.as_deref()
    }

    /// Metadata supplied with the definition, only when it describes the bean class itself.
    pub fn metadata(&self) -> Option<&Arc<ClassMetadata>> {
        self.metadata
            .as_ref()
            .filter(|metadata| Some(metadata.name.as_str()) == self.bean_class_name())
    }

    pub fn loaded(&self) -> Option<&Arc<LoadedType>> {
        self.loaded.as_ref()
    }

    pub fn factory_method_name(&self) -> Option<&str> {
        self.factory_method_name.as_deref()
    }

    pub fn originating(&self) -> Option<&BeanDefinition> {
        self.originating.as_deref()
    }

    pub fn is_lazy_init(&self) -> bool {
        self.lazy_init
    }
}

impl fmt::Debug for BeanDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDefinition")
            .field("bean_class_name", &self.bean_class_name)
            .field("has_metadata", &self.metadata.is_some())
            .field("loaded", &self.loaded.is_some())
            .field("factory_method_name", &self.factory_method_name)
            .field("originating", &self.originating)
            .field("lazy_init", &self.lazy_init)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct BeanDefinitionHolder {
    pub bean_name: String,
    pub definition: BeanDefinition,
}

impl BeanDefinitionHolder {
    pub fn new(bean_name: impl Into<String>, definition: BeanDefinition) -> Self {
        Self {
            bean_name: bean_name.into(),
            definition,
        }
    }
}

/// Registry handed to strategies and registrars. Methods take `&self` so a shared registry
/// can be injected into every collaborator of a run.
pub trait BeanDefinitionRegistry: Send + Sync {
    fn register_bean_definition(&self, bean_name: &str, definition: BeanDefinition);

    fn contains_bean_definition(&self, bean_name: &str) -> bool;

    fn bean_definition(&self, bean_name: &str) -> Option<BeanDefinition>;

    fn bean_definition_names(&self) -> Vec<String>;
}

#[derive(Default)]
pub struct SimpleBeanDefinitionRegistry {
    definitions: RwLock<IndexMap<String, BeanDefinition>>,
}

impl SimpleBeanDefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.definitions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.read().is_empty()
    }
}

impl BeanDefinitionRegistry for SimpleBeanDefinitionRegistry {
    fn register_bean_definition(&self, bean_name: &str, definition: BeanDefinition) {
        let previous = self
            .definitions
            .write()
            .insert(bean_name.to_string(), definition);
        if previous.is_some() {
            tracing::debug!(target: "cfgraph.parser", bean = bean_name, "overriding bean definition");
        }
    }

    fn contains_bean_definition(&self, bean_name: &str) -> bool {
        self.definitions.read().contains_key(bean_name)
    }

    fn bean_definition(&self, bean_name: &str) -> Option<BeanDefinition> {
        self.definitions.read().get(bean_name).cloned()
    }

    fn bean_definition_names(&self) -> Vec<String> {
        self.definitions.read().keys().cloned().collect()
    }
}
