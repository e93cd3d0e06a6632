//! Pluggable strategies the parser instantiates from loaded types: import selectors,
//! deferred selectors and their groups, registrars, property source factories and conditions.

use std::fmt;
use std::sync::Arc;

use cfgraph_metadata::ClassMetadata;

use crate::condition::ConfigurationPhase;
use crate::definition::BeanDefinitionRegistry;
use crate::env::Environment;
use crate::error::{ParseError, Result};
use crate::filter::ClassFilter;
use crate::loader::ClassLoader;
use crate::property_source::PropertySourceFactory;
use crate::resource::ResourceLoader;

/// Collaborators injected into every strategy a run instantiates.
#[derive(Clone, Copy)]
pub struct StrategyContext<'a> {
    pub environment: &'a dyn Environment,
    pub resource_loader: &'a dyn ResourceLoader,
    pub registry: &'a dyn BeanDefinitionRegistry,
    pub class_loader: &'a dyn ClassLoader,
}

pub type StrategyFactory =
    Arc<dyn Fn(&StrategyContext<'_>) -> anyhow::Result<Strategy> + Send + Sync>;

pub enum Strategy {
    Selector(Arc<dyn ImportSelector>),
    DeferredSelector(Arc<dyn DeferredImportSelector>),
    Registrar(Arc<dyn ImportBeanDefinitionRegistrar>),
    Group(Box<dyn DeferredImportGroup>),
    PropertySourceFactory(Arc<dyn PropertySourceFactory>),
    Condition(Arc<dyn Condition>),
}

impl Strategy {
    pub fn kind(&self) -> &'static str {
        match self {
            Strategy::Selector(_) => "an import selector",
            Strategy::DeferredSelector(_) => "a deferred import selector",
            Strategy::Registrar(_) => "an import bean definition registrar",
            Strategy::Group(_) => "a deferred import group",
            Strategy::PropertySourceFactory(_) => "a property source factory",
            Strategy::Condition(_) => "a condition",
        }
    }

    fn mismatch(self, class_name: &str, expected: &'static str) -> ParseError {
        ParseError::StrategyMismatch {
            class_name: class_name.to_string(),
            expected,
            actual: self.kind(),
        }
    }

    pub(crate) fn into_registrar(
        self,
        class_name: &str,
    ) -> Result<Arc<dyn ImportBeanDefinitionRegistrar>> {
        match self {
            Strategy::Registrar(registrar) => Ok(registrar),
            other => Err(other.mismatch(class_name, "an import bean definition registrar")),
        }
    }

    pub(crate) fn into_group(self, class_name: &str) -> Result<Box<dyn DeferredImportGroup>> {
        match self {
            Strategy::Group(group) => Ok(group),
            other => Err(other.mismatch(class_name, "a deferred import group")),
        }
    }

    pub(crate) fn into_property_source_factory(
        self,
        class_name: &str,
    ) -> Result<Arc<dyn PropertySourceFactory>> {
        match self {
            Strategy::PropertySourceFactory(factory) => Ok(factory),
            other => Err(other.mismatch(class_name, "a property source factory")),
        }
    }

    pub(crate) fn into_condition(self, class_name: &str) -> Result<Arc<dyn Condition>> {
        match self {
            Strategy::Condition(condition) => Ok(condition),
            other => Err(other.mismatch(class_name, "a condition")),
        }
    }

    pub(crate) fn into_selector(self, class_name: &str) -> Result<SelectorStrategy> {
        match self {
            Strategy::Selector(selector) => Ok(SelectorStrategy::Immediate(selector)),
            Strategy::DeferredSelector(selector) => Ok(SelectorStrategy::Deferred(selector)),
            other => Err(other.mismatch(class_name, "an import selector")),
        }
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

pub(crate) enum SelectorStrategy {
    Immediate(Arc<dyn ImportSelector>),
    Deferred(Arc<dyn DeferredImportSelector>),
}

/// Computes class names to import from the importing class's metadata.
pub trait ImportSelector: Send + Sync {
    fn select_imports(&self, importing: &ClassMetadata) -> Vec<String>;

    /// Class names this selector never wants resolved, merged into the active filter.
    fn exclusion_filter(&self) -> Option<ClassFilter> {
        None
    }
}

/// A selector that runs after every configuration class of the run has been parsed.
pub trait DeferredImportSelector: ImportSelector {
    /// Name of the group type that aggregates this selector's results. `None` means the
    /// selector gets a group of its own.
    fn import_group(&self) -> Option<String> {
        None
    }

    /// Ordering key among deferred selectors. `None` falls back to the selector class's
    /// `@Order`, then lowest precedence.
    fn order(&self) -> Option<i32> {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupEntry {
    /// Metadata of the configuration class that declared the import.
    pub metadata: Arc<ClassMetadata>,
    pub import_class_name: String,
}

impl GroupEntry {
    pub fn new(metadata: Arc<ClassMetadata>, import_class_name: impl Into<String>) -> Self {
        Self {
            metadata,
            import_class_name: import_class_name.into(),
        }
    }
}

/// Aggregates the results of every deferred selector sharing a group key.
pub trait DeferredImportGroup: Send {
    fn process(&mut self, metadata: &Arc<ClassMetadata>, selector: &dyn DeferredImportSelector);

    fn select_imports(&mut self) -> Vec<GroupEntry>;
}

/// One entry per selected class name, in the order selectors were processed.
#[derive(Debug, Default)]
pub struct DefaultDeferredImportGroup {
    imports: Vec<GroupEntry>,
}

impl DeferredImportGroup for DefaultDeferredImportGroup {
    fn process(&mut self, metadata: &Arc<ClassMetadata>, selector: &dyn DeferredImportSelector) {
        for import_class_name in selector.select_imports(metadata) {
            self.imports
                .push(GroupEntry::new(Arc::clone(metadata), import_class_name));
        }
    }

    fn select_imports(&mut self) -> Vec<GroupEntry> {
        std::mem::take(&mut self.imports)
    }
}

/// Registers additional bean definitions on behalf of the importing configuration class.
pub trait ImportBeanDefinitionRegistrar: Send + Sync {
    fn register_bean_definitions(
        &self,
        importing: &ClassMetadata,
        registry: &dyn BeanDefinitionRegistry,
    );
}

pub trait Condition: Send + Sync {
    fn matches(&self, context: &StrategyContext<'_>, metadata: &ClassMetadata) -> bool;

    /// Restricts evaluation to one phase. `None` evaluates in every phase.
    fn required_phase(&self) -> Option<ConfigurationPhase> {
        None
    }

    fn order(&self) -> Option<i32> {
        None
    }
}
