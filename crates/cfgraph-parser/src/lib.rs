//! Configuration class graph resolution.
//!
//! [`ConfigurationClassParser`] starts from seed bean definitions and discovers the complete,
//! deduplicated set of configuration classes they pull in: imports (plain, computed by
//! selectors, or contributed by registrars), component scans, member classes and
//! superclasses. Deferred import selectors run in a second phase, grouped by their declared
//! group type. Circular imports are reported as [`Problem`]s instead of recursing forever.
//!
//! Class metadata comes from two places behind one [`SourceClass`] view: the static
//! [`cfgraph_metadata::MetadataReader`] and loaded types registered with a [`ClassLoader`]
//! such as [`TypeRegistry`]. Loaded types may also produce [`Strategy`] instances through a
//! single factory seam that receives the run's collaborators.

#![forbid(unsafe_code)]

pub mod annotations;
mod candidate;
mod condition;
mod configuration_class;
mod deferred;
mod definition;
mod env;
mod error;
mod filter;
mod import_stack;
mod imports;
mod loader;
mod model;
mod parser;
mod problems;
mod property_source;
mod resource;
mod scan;
mod source_class;
mod strategy;

pub use crate::candidate::{
    check_configuration_class_candidate, is_configuration_candidate, Candidate, CandidateKind,
};
pub use crate::condition::{
    ConditionEvaluator, ConfigurationPhase, NoopConditionEvaluator, StandardConditionEvaluator,
};
pub use crate::configuration_class::{BeanMethod, ConfigurationClass};
pub use crate::definition::{
    BeanDefinition, BeanDefinitionHolder, BeanDefinitionRegistry, SimpleBeanDefinitionRegistry,
};
pub use crate::env::{
    Environment, PlaceholderError, ReadOnlyEnvironment, StandardEnvironment,
    ACTIVE_PROFILES_PROPERTY, DEFAULT_PROFILE,
};
pub use crate::error::{ParseError, Result, StoreError};
pub use crate::filter::ClassFilter;
pub use crate::import_stack::{ImportRegistry, ImportStack};
pub use crate::imports::collect_imports;
pub use crate::loader::{ClassLoader, LoadedType, TypeRegistry};
pub use crate::model::ConfigurationModel;
pub use crate::parser::{ConfigurationClassParser, ParserContext};
pub use crate::problems::{
    CollectingProblemReporter, FailFastProblemReporter, Location, Problem, ProblemError,
    ProblemKind, ProblemReporter, Severity,
};
pub use crate::property_source::{
    DefaultPropertySourceFactory, EncodedResource, MutablePropertySources, PropertySource,
    PropertySourceError, PropertySourceFactory, PropertySourceKind,
};
pub use crate::resource::{
    FileSystemResourceLoader, InMemoryResourceLoader, Resource, ResourceLoader,
    CLASSPATH_PREFIX, FILE_PREFIX,
};
pub use crate::scan::{ComponentScanner, NoopScanner, ScanRequest, StaticComponentScanner};
pub use crate::source_class::{SourceClass, SourceClassResolver};
pub use crate::strategy::{
    Condition, DefaultDeferredImportGroup, DeferredImportGroup, DeferredImportSelector,
    GroupEntry, ImportBeanDefinitionRegistrar, ImportSelector, Strategy, StrategyContext,
    StrategyFactory,
};
