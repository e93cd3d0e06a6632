use std::fmt;
use std::sync::Arc;

use cfgraph_metadata::{ClassMetadata, MethodMetadata};
use indexmap::IndexMap;

use crate::annotations::{BEAN_DEFINITION_READER, CONFIGURATION};
use crate::definition::BeanDefinitionRegistry;
use crate::problems::{Location, Problem, ProblemKind};
use crate::source_class::{SourceClass, SourceClassResolver};
use crate::strategy::ImportBeanDefinitionRegistrar;

/// A `@Bean` method together with the configuration class it was collected for.
#[derive(Debug, Clone, PartialEq)]
pub struct BeanMethod {
    pub metadata: MethodMetadata,
    pub configuration_class: String,
}

impl BeanMethod {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    fn key(&self) -> (String, String, String) {
        (
            self.metadata.declaring_class.clone(),
            self.metadata.name.clone(),
            self.metadata.descriptor.clone(),
        )
    }
}

/// Everything collected for one configuration class during a run.
pub struct ConfigurationClass {
    source: SourceClass,
    bean_name: Option<String>,
    imported_by: IndexMap<String, Arc<ClassMetadata>>,
    bean_methods: IndexMap<(String, String, String), BeanMethod>,
    imported_resources: IndexMap<String, Option<String>>,
    registrars: Vec<(Arc<dyn ImportBeanDefinitionRegistrar>, Arc<ClassMetadata>)>,
}

impl ConfigurationClass {
    /// A class registered directly, e.g. from a bean definition or a scan.
    pub fn explicit(source: SourceClass, bean_name: Option<String>) -> Self {
        Self {
            source,
            bean_name,
            imported_by: IndexMap::new(),
            bean_methods: IndexMap::new(),
            imported_resources: IndexMap::new(),
            registrars: Vec::new(),
        }
    }

    /// A class reached through `importer`: an import, a member class or a selector result.
    pub fn imported(source: SourceClass, importer: &ConfigurationClass) -> Self {
        let mut config = Self::explicit(source, None);
        config
            .imported_by
            .insert(importer.name().to_string(), Arc::clone(importer.metadata()));
        config
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    pub fn metadata(&self) -> &Arc<ClassMetadata> {
        self.source.metadata()
    }

    pub fn source(&self) -> &SourceClass {
        &self.source
    }

    pub fn bean_name(&self) -> Option<&str> {
        self.bean_name.as_deref()
    }

    pub fn set_bean_name(&mut self, bean_name: impl Into<String>) {
        self.bean_name = Some(bean_name.into());
    }

    pub fn simple_name(&self) -> String {
        self.metadata().simple_name()
    }

    pub fn resource_description(&self) -> String {
        self.metadata().resource_description()
    }

    /// Whether this class was reached only through imports.
    pub fn is_imported(&self) -> bool {
        !self.imported_by.is_empty()
    }

    pub fn imported_by(&self) -> impl Iterator<Item = &Arc<ClassMetadata>> {
        self.imported_by.values()
    }

    pub fn merge_imported_by(&mut self, other: &ConfigurationClass) {
        for (name, metadata) in &other.imported_by {
            self.imported_by
                .entry(name.clone())
                .or_insert_with(|| Arc::clone(metadata));
        }
    }

    pub fn add_bean_method(&mut self, metadata: MethodMetadata) {
        let method = BeanMethod {
            metadata,
            configuration_class: self.name().to_string(),
        };
        self.bean_methods.entry(method.key()).or_insert(method);
    }

    pub fn bean_methods(&self) -> impl Iterator<Item = &BeanMethod> {
        self.bean_methods.values()
    }

    /// Records an imported resource. The default reader is stored as `None`.
    pub fn add_imported_resource(&mut self, location: impl Into<String>, reader: Option<&str>) {
        let reader = reader
            .filter(|reader| *reader != BEAN_DEFINITION_READER)
            .map(str::to_string);
        self.imported_resources.insert(location.into(), reader);
    }

    pub fn imported_resources(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.imported_resources
            .iter()
            .map(|(location, reader)| (location.as_str(), reader.as_deref()))
    }

    pub fn add_registrar(
        &mut self,
        registrar: Arc<dyn ImportBeanDefinitionRegistrar>,
        importing: Arc<ClassMetadata>,
    ) {
        self.registrars.push((registrar, importing));
    }

    pub fn registrars(&self) -> &[(Arc<dyn ImportBeanDefinitionRegistrar>, Arc<ClassMetadata>)] {
        &self.registrars
    }

    /// Lets every attached registrar contribute definitions, in attachment order.
    pub fn invoke_registrars(&self, registry: &dyn BeanDefinitionRegistry) {
        for (registrar, importing) in &self.registrars {
            registrar.register_bean_definitions(importing, registry);
        }
    }

    /// A fresh record for the same class, used while importing on behalf of a class that has
    /// already been committed. See [`ConfigurationClass::absorb`].
    pub(crate) fn detached(&self) -> ConfigurationClass {
        let mut config = Self::explicit(self.source.clone(), self.bean_name.clone());
        config.imported_by = self.imported_by.clone();
        config
    }

    /// Takes over what was collected on a detached record.
    pub(crate) fn absorb(&mut self, scratch: ConfigurationClass) {
        for (key, method) in scratch.bean_methods {
            self.bean_methods.entry(key).or_insert(method);
        }
        self.imported_resources.extend(scratch.imported_resources);
        self.registrars.extend(scratch.registrars);
    }

    /// Structural rules a proxied `@Configuration` class must satisfy.
    pub fn validate(&self, resolver: &SourceClassResolver) -> Vec<Problem> {
        let metadata = self.metadata();
        let proxied = resolver
            .find_annotation(metadata, CONFIGURATION)
            .is_some_and(|config| config.bool("proxyBeanMethods") != Some(false));
        if !proxied {
            return Vec::new();
        }

        let location = || Location::of(self.resource_description(), metadata);
        let mut problems = Vec::new();
        if metadata.is_final() {
            problems.push(Problem::error(
                ProblemKind::FinalConfigurationClass,
                format!(
                    "@Configuration class '{}' may not be final. Remove the final modifier to continue.",
                    self.simple_name()
                ),
                location(),
            ));
        }
        for method in self.bean_methods() {
            if method.metadata.is_static() || method.metadata.is_overridable() {
                continue;
            }
            problems.push(Problem::error(
                ProblemKind::NonOverridableBeanMethod,
                format!(
                    "@Bean method '{}' must not be private or final; change the method's modifiers to continue",
                    method.name()
                ),
                location(),
            ));
        }
        problems
    }
}

impl PartialEq for ConfigurationClass {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl fmt::Debug for ConfigurationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationClass")
            .field("name", &self.name())
            .field("bean_name", &self.bean_name)
            .field("imported_by", &self.imported_by.keys().collect::<Vec<_>>())
            .field("bean_methods", &self.bean_methods.len())
            .field("imported_resources", &self.imported_resources)
            .field("registrars", &self.registrars.len())
            .finish()
    }
}
