//! The configuration class graph resolver.
//!
//! A run starts from seed bean definitions and expands each configuration class in place:
//! member classes, `@PropertySource`, `@ComponentScan`, `@Import` (plain classes, selectors and
//! registrars), `@ImportResource`, `@Bean` methods (including default interface methods) and
//! finally the superclass, which is processed as part of the same configuration class.
//! Deferred import selectors are queued and resolved once every seed has been processed.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use cfgraph_config::ParserConfig;
use cfgraph_metadata::{AnnotationValue, ClassMetadata, MetadataReader, MethodMetadata};
use indexmap::IndexMap;

use crate::annotations::{
    BEAN, COMPONENT, COMPONENT_SCAN, COMPONENT_SCANS, IMPORT_BEAN_DEFINITION_REGISTRAR,
    IMPORT_RESOURCE, IMPORT_SELECTOR, PROPERTY_SOURCE, PROPERTY_SOURCES, PROPERTY_SOURCE_FACTORY,
};
use crate::candidate::{check_configuration_class_candidate, is_configuration_candidate};
use crate::condition::{ConditionEvaluator, ConfigurationPhase, StandardConditionEvaluator};
use crate::configuration_class::ConfigurationClass;
use crate::deferred::{
    DeferredImportHolder, DeferredImportSelectorGroupingHandler, DeferredImportSelectorHandler,
    DeferredOrigins,
};
use crate::definition::{
    BeanDefinition, BeanDefinitionHolder, BeanDefinitionRegistry, SimpleBeanDefinitionRegistry,
};
use crate::env::{Environment, StandardEnvironment};
use crate::error::{ParseError, Result};
use crate::filter::ClassFilter;
use crate::import_stack::{ImportRegistry, ImportStack};
use crate::imports::collect_imports;
use crate::loader::{ClassLoader, LoadedType, TypeRegistry};
use crate::model::ConfigurationModel;
use crate::problems::{
    CollectingProblemReporter, FailFastProblemReporter, Location, Problem, ProblemKind,
    ProblemReporter,
};
use crate::property_source::{
    DefaultPropertySourceFactory, EncodedResource, PropertySource, PropertySourceFactory,
};
use crate::resource::{InMemoryResourceLoader, ResourceLoader};
use crate::scan::{ComponentScanner, NoopScanner, ScanRequest};
use crate::source_class::{order_of, SourceClass, SourceClassResolver};
use crate::strategy::{
    DefaultDeferredImportGroup, DeferredImportGroup, DeferredImportSelector, GroupEntry,
    SelectorStrategy, StrategyContext,
};

/// Collaborators of one run. Everything except the metadata reader has a default.
pub struct ParserContext {
    reader: Arc<dyn MetadataReader>,
    class_loader: Arc<dyn ClassLoader>,
    environment: Arc<dyn Environment>,
    resource_loader: Arc<dyn ResourceLoader>,
    registry: Arc<dyn BeanDefinitionRegistry>,
    condition_evaluator: Option<Arc<dyn ConditionEvaluator>>,
    scanner: Arc<dyn ComponentScanner>,
    problem_reporter: Option<Arc<dyn ProblemReporter>>,
    config: ParserConfig,
}

impl ParserContext {
    pub fn new(reader: Arc<dyn MetadataReader>) -> Self {
        Self {
            reader,
            class_loader: Arc::new(TypeRegistry::new()),
            environment: Arc::new(StandardEnvironment::new()),
            resource_loader: Arc::new(InMemoryResourceLoader::new()),
            registry: Arc::new(SimpleBeanDefinitionRegistry::new()),
            condition_evaluator: None,
            scanner: Arc::new(NoopScanner),
            problem_reporter: None,
            config: ParserConfig::default(),
        }
    }

    #[must_use]
    pub fn with_class_loader(mut self, class_loader: Arc<dyn ClassLoader>) -> Self {
        self.class_loader = class_loader;
        self
    }

    #[must_use]
    pub fn with_environment(mut self, environment: Arc<dyn Environment>) -> Self {
        self.environment = environment;
        self
    }

    #[must_use]
    pub fn with_resource_loader(mut self, resource_loader: Arc<dyn ResourceLoader>) -> Self {
        self.resource_loader = resource_loader;
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: Arc<dyn BeanDefinitionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Replaces the default `@Profile`/`@Conditional` evaluator.
    #[must_use]
    pub fn with_condition_evaluator(mut self, evaluator: Arc<dyn ConditionEvaluator>) -> Self {
        self.condition_evaluator = Some(evaluator);
        self
    }

    #[must_use]
    pub fn with_scanner(mut self, scanner: Arc<dyn ComponentScanner>) -> Self {
        self.scanner = scanner;
        self
    }

    /// Replaces the reporter chosen by [`ParserConfig::fail_fast`].
    #[must_use]
    pub fn with_problem_reporter(mut self, reporter: Arc<dyn ProblemReporter>) -> Self {
        self.problem_reporter = Some(reporter);
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }
}

pub struct ConfigurationClassParser {
    resolver: SourceClassResolver,
    class_loader: Arc<dyn ClassLoader>,
    environment: Arc<dyn Environment>,
    resource_loader: Arc<dyn ResourceLoader>,
    registry: Arc<dyn BeanDefinitionRegistry>,
    conditions: Arc<dyn ConditionEvaluator>,
    scanner: Arc<dyn ComponentScanner>,
    reporter: Arc<dyn ProblemReporter>,
    max_depth: usize,

    configuration_classes: IndexMap<String, ConfigurationClass>,
    /// Superclass name to the configuration class that claimed it.
    known_superclasses: HashMap<String, String>,
    property_source_names: Vec<String>,
    import_stack: ImportStack,
    deferred: DeferredImportSelectorHandler,
    problems: Vec<Problem>,
    depth: usize,
}

impl ConfigurationClassParser {
    pub fn new(context: ParserContext) -> Self {
        let ParserContext {
            reader,
            class_loader,
            environment,
            resource_loader,
            registry,
            condition_evaluator,
            scanner,
            problem_reporter,
            config,
        } = context;

        let conditions = condition_evaluator.unwrap_or_else(|| -> Arc<dyn ConditionEvaluator> {
            Arc::new(StandardConditionEvaluator::new(
                Arc::clone(&environment),
                Arc::clone(&resource_loader),
                Arc::clone(&registry),
                Arc::clone(&class_loader),
            ))
        });
        let reporter = problem_reporter.unwrap_or_else(|| -> Arc<dyn ProblemReporter> {
            if config.fail_fast {
                Arc::new(FailFastProblemReporter)
            } else {
                Arc::new(CollectingProblemReporter::new())
            }
        });
        let resolver = SourceClassResolver::new(
            reader,
            Arc::clone(&class_loader),
            config.platform_prefix.clone(),
            ClassFilter::prefixes(config.exclusion_prefixes.iter().cloned()),
        );

        Self {
            resolver,
            class_loader,
            environment,
            resource_loader,
            registry,
            conditions,
            scanner,
            reporter,
            max_depth: config.max_depth,
            configuration_classes: IndexMap::new(),
            known_superclasses: HashMap::new(),
            property_source_names: Vec::new(),
            import_stack: ImportStack::default(),
            deferred: DeferredImportSelectorHandler::new(),
            problems: Vec::new(),
            depth: 0,
        }
    }

    /// Parses every seed, then resolves the deferred imports they queued.
    pub fn parse(&mut self, holders: &[BeanDefinitionHolder]) -> Result<()> {
        for holder in holders {
            let definition = &holder.definition;
            let Some(class_name) = definition.bean_class_name() else {
                return Err(ParseError::MissingBeanClassName {
                    bean_name: holder.bean_name.clone(),
                });
            };
            tracing::debug!(
                target: "cfgraph.parser",
                class = %class_name,
                bean = %holder.bean_name,
                "parsing configuration class"
            );
            self.parse_definition(definition, &holder.bean_name)
                .map_err(|err| err.in_configuration_class(class_name))?;
        }
        self.process_deferred_imports()
    }

    /// Parses one class read through the metadata reader. Deferred imports stay queued.
    pub fn parse_class_name(&mut self, class_name: &str, bean_name: &str) -> Result<()> {
        let source = self.resolver.from_name(class_name, &ClassFilter::none())?;
        let filter = self.resolver.default_filter().clone();
        self.process_configuration_class(
            ConfigurationClass::explicit(source, Some(bean_name.to_string())),
            &filter,
        )
    }

    /// Parses one loaded type. Deferred imports stay queued.
    pub fn parse_loaded(&mut self, loaded: Arc<LoadedType>, bean_name: &str) -> Result<()> {
        let filter = self.resolver.default_filter().clone();
        self.process_configuration_class(
            ConfigurationClass::explicit(SourceClass::Loaded(loaded), Some(bean_name.to_string())),
            &filter,
        )
    }

    /// Parses one class from metadata already in hand. Deferred imports stay queued.
    pub fn parse_metadata(&mut self, metadata: Arc<ClassMetadata>, bean_name: &str) -> Result<()> {
        let filter = self.resolver.default_filter().clone();
        self.process_configuration_class(
            ConfigurationClass::explicit(SourceClass::Read(metadata), Some(bean_name.to_string())),
            &filter,
        )
    }

    /// Groups and resolves every deferred selector queued so far.
    pub fn process_deferred_imports(&mut self) -> Result<()> {
        let Some(holders) = self.deferred.take() else {
            return Ok(());
        };
        let result = self.run_deferred(holders);
        self.deferred.reset();
        result
    }

    /// Reports structural problems of every configuration class parsed so far.
    pub fn validate(&mut self) -> Result<()> {
        let problems: Vec<Problem> = self
            .configuration_classes
            .values()
            .flat_map(|config| config.validate(&self.resolver))
            .collect();
        for problem in problems {
            self.report(problem)?;
        }
        Ok(())
    }

    pub fn configuration_classes(&self) -> impl Iterator<Item = &ConfigurationClass> {
        self.configuration_classes.values()
    }

    pub fn configuration_class(&self, class_name: &str) -> Option<&ConfigurationClass> {
        self.configuration_classes.get(class_name)
    }

    pub fn import_registry(&self) -> &ImportRegistry {
        self.import_stack.registry()
    }

    /// Problems reported so far, including those a collecting reporter let pass.
    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn resolver(&self) -> &SourceClassResolver {
        &self.resolver
    }

    pub fn environment(&self) -> &Arc<dyn Environment> {
        &self.environment
    }

    pub fn finish(self) -> ConfigurationModel {
        ConfigurationModel::new(
            self.configuration_classes,
            self.import_stack.into_registry(),
            self.problems,
        )
    }

    fn parse_definition(&mut self, definition: &BeanDefinition, bean_name: &str) -> Result<()> {
        if let Some(metadata) = definition.metadata() {
            self.parse_metadata(Arc::clone(metadata), bean_name)
        } else if let Some(loaded) = definition.loaded() {
            self.parse_loaded(Arc::clone(loaded), bean_name)
        } else if let Some(class_name) = definition.bean_class_name() {
            self.parse_class_name(class_name, bean_name)
        } else {
            Err(ParseError::MissingBeanClassName {
                bean_name: bean_name.to_string(),
            })
        }
    }

    fn strategy_context(&self) -> StrategyContext<'_> {
        StrategyContext {
            environment: self.environment.as_ref(),
            resource_loader: self.resource_loader.as_ref(),
            registry: self.registry.as_ref(),
            class_loader: self.class_loader.as_ref(),
        }
    }

    fn report(&mut self, problem: Problem) -> Result<()> {
        self.problems.push(problem.clone());
        self.reporter.error(problem)?;
        Ok(())
    }

    fn report_circular_import(&mut self, attempted: &ClassMetadata) -> Result<()> {
        let (importer, resource) = match self.import_stack.peek() {
            Some(top) => (top.simple_name(), top.resource_description()),
            None => (attempted.simple_name(), attempted.resource_description()),
        };
        let attempted_name = attempted.simple_name();
        let message = format!(
            "A circular @Import has been detected: Illegal attempt by @Configuration class '{importer}' \
             to import class '{attempted_name}' as '{attempted_name}' is already present in the current \
             import stack {}",
            self.import_stack
        );
        self.report(Problem::error(
            ProblemKind::CircularImport,
            message,
            Location::of(resource, attempted),
        ))
    }

    fn process_configuration_class(
        &mut self,
        mut config: ConfigurationClass,
        filter: &ClassFilter,
    ) -> Result<()> {
        if self
            .conditions
            .should_skip(config.metadata(), ConfigurationPhase::ParseConfiguration)?
        {
            tracing::trace!(target: "cfgraph.parser", class = %config.name(), "skipped by condition");
            return Ok(());
        }

        if let Some(existing) = self.configuration_classes.get_mut(config.name()) {
            if config.is_imported() {
                if existing.is_imported() {
                    existing.merge_imported_by(&config);
                }
                return Ok(());
            }
            let name = config.name().to_string();
            self.configuration_classes.shift_remove(&name);
            self.known_superclasses.retain(|_, owner| *owner != name);
        }

        self.descend(config.name())?;
        let result = self.process_hierarchy(&mut config, filter);
        self.depth -= 1;
        result?;

        self.configuration_classes
            .insert(config.name().to_string(), config);
        Ok(())
    }

    /// Counts one more level of nested processing; the caller decrements `depth` when done.
    fn descend(&mut self, class_name: &str) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(ParseError::RecursionLimit {
                class_name: class_name.to_string(),
                limit: self.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn process_hierarchy(&mut self, config: &mut ConfigurationClass, filter: &ClassFilter) -> Result<()> {
        let mut next = Some(self.resolver.refilter(config.source(), filter));
        while let Some(source) = next {
            next = self.do_process_configuration_class(config, &source, filter)?;
        }
        Ok(())
    }

    /// One pass over `source`, which is the configuration class itself or one of its
    /// superclasses. Returns the superclass to continue with.
    fn do_process_configuration_class(
        &mut self,
        config: &mut ConfigurationClass,
        source: &SourceClass,
        filter: &ClassFilter,
    ) -> Result<Option<SourceClass>> {
        let metadata = Arc::clone(source.metadata());

        if self.resolver.is_annotated(config.metadata(), COMPONENT) {
            self.process_member_classes(config, source, filter)?;
        }

        let property_sources =
            self.resolver
                .find_repeatable_annotations(&metadata, PROPERTY_SOURCE, PROPERTY_SOURCES);
        for property_source in &property_sources {
            if self.environment.mutable_property_sources().is_some() {
                self.process_property_source(property_source, &metadata.name)?;
            } else {
                tracing::info!(
                    target: "cfgraph.parser",
                    class = %metadata.name,
                    "ignoring @PropertySource annotation; environment is not configurable"
                );
            }
        }

        let scans = self
            .resolver
            .find_repeatable_annotations(&metadata, COMPONENT_SCAN, COMPONENT_SCANS);
        if !scans.is_empty()
            && !self
                .conditions
                .should_skip(&metadata, ConfigurationPhase::RegisterBean)?
        {
            for scan in &scans {
                self.process_component_scan(scan, &metadata.name)?;
            }
        }

        let imports = collect_imports(&self.resolver, source)?;
        self.process_imports(config, source, imports, filter, true)?;

        if let Some(import_resource) = self.resolver.find_annotation(&metadata, IMPORT_RESOURCE) {
            let reader = import_resource.class("reader");
            let mut locations = import_resource.strings("locations");
            if locations.is_empty() {
                locations = import_resource.strings("value");
            }
            for location in locations {
                let resolved = self.environment.resolve_required_placeholders(&location)?;
                config.add_imported_resource(resolved, reader);
            }
        }

        for method in self.retrieve_bean_method_metadata(source) {
            config.add_bean_method(method);
        }
        let mut visited = HashSet::new();
        self.process_interfaces(config, source, &mut visited)?;

        if let Some(super_class) = metadata.super_class.as_deref() {
            if !self.resolver.is_platform(super_class)
                && !self.known_superclasses.contains_key(super_class)
            {
                self.known_superclasses
                    .insert(super_class.to_string(), config.name().to_string());
                return self.resolver.super_class(source);
            }
        }
        Ok(None)
    }

    fn process_member_classes(
        &mut self,
        config: &mut ConfigurationClass,
        source: &SourceClass,
        filter: &ClassFilter,
    ) -> Result<()> {
        let mut candidates: Vec<SourceClass> = self
            .resolver
            .member_classes(source)
            .into_iter()
            .filter(|member| {
                is_configuration_candidate(member.metadata(), &self.resolver)
                    && member.name() != config.name()
            })
            .collect();
        candidates.sort_by_key(|candidate| self.resolver.order(candidate));

        for candidate in candidates {
            if self.import_stack.contains(config.name()) {
                let attempted = Arc::clone(config.metadata());
                self.report_circular_import(&attempted)?;
                continue;
            }
            self.import_stack.push(Arc::clone(config.metadata()));
            let result = self
                .process_configuration_class(ConfigurationClass::imported(candidate, config), filter);
            self.import_stack.pop();
            result?;
        }
        Ok(())
    }

    fn process_component_scan(&mut self, scan: &AnnotationValue, declaring_class: &str) -> Result<()> {
        let request = ScanRequest::from_annotation(scan, declaring_class, self.environment.as_ref());
        let scanned = self.scanner.scan(&request)?;
        tracing::debug!(
            target: "cfgraph.parser",
            class = %declaring_class,
            packages = ?request.base_packages,
            found = scanned.len(),
            "component scan finished"
        );
        for holder in scanned {
            let candidate = holder
                .definition
                .originating()
                .unwrap_or(&holder.definition);
            if check_configuration_class_candidate(candidate, &self.resolver).is_some() {
                self.parse_definition(candidate, &holder.bean_name)?;
            }
        }
        Ok(())
    }

    fn process_property_source(&mut self, annotation: &AnnotationValue, class_name: &str) -> Result<()> {
        let name = annotation.string("name").filter(|name| !name.is_empty());
        let encoding = annotation
            .string("encoding")
            .filter(|encoding| !encoding.is_empty());
        let locations = annotation.strings("value");
        if locations.is_empty() {
            return Err(ParseError::MissingPropertySourceLocation {
                class_name: class_name.to_string(),
            });
        }
        let ignore_resource_not_found = annotation.bool("ignoreResourceNotFound").unwrap_or(false);
        let factory = self.property_source_factory(annotation.class("factory"))?;

        for location in &locations {
            match self.load_property_source(factory.as_ref(), name, encoding, location) {
                Ok(source) => self.add_property_source(source)?,
                Err(err) if ignore_resource_not_found && err.is_resource_not_found() => {
                    tracing::info!(
                        target: "cfgraph.parser",
                        location = %location,
                        error = %err,
                        "properties location not resolvable"
                    );
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    fn property_source_factory(&self, factory_class: Option<&str>) -> Result<Arc<dyn PropertySourceFactory>> {
        match factory_class {
            Some(class_name) if class_name != PROPERTY_SOURCE_FACTORY => {
                let loaded = self
                    .class_loader
                    .load(class_name)
                    .ok_or_else(|| ParseError::ClassNotFound {
                        class_name: class_name.to_string(),
                    })?;
                loaded
                    .instantiate(&self.strategy_context())?
                    .into_property_source_factory(class_name)
            }
            _ => Ok(Arc::new(DefaultPropertySourceFactory)),
        }
    }

    fn load_property_source(
        &self,
        factory: &dyn PropertySourceFactory,
        name: Option<&str>,
        encoding: Option<&str>,
        location: &str,
    ) -> Result<PropertySource> {
        let resolved = self.environment.resolve_required_placeholders(location)?;
        let resource = self.resource_loader.get_resource(&resolved);
        factory
            .create_property_source(
                name,
                EncodedResource {
                    resource: resource.as_ref(),
                    encoding,
                },
            )
            .map_err(|source| ParseError::Resource {
                description: resource.description(),
                source,
            })
    }

    /// Registers `source` with the environment. A name seen earlier in the run turns into a
    /// composite with the newest contribution first; new names go just before the previously
    /// added one, the very first one goes last.
    fn add_property_source(&mut self, source: PropertySource) -> Result<()> {
        let Some(property_sources) = self.environment.mutable_property_sources() else {
            return Ok(());
        };
        let mut property_sources = property_sources.write();
        let name = source.name().to_string();

        if self.property_source_names.contains(&name) {
            if let Some(existing) = property_sources.get_mut(&name) {
                let newest = source.with_resource_name();
                if existing.is_composite() {
                    existing.add_first_property_source(newest);
                } else {
                    let previous = existing.with_resource_name();
                    let mut composite = PropertySource::composite(name.clone());
                    composite.add_property_source(newest);
                    composite.add_property_source(previous);
                    property_sources.replace(&name, composite)?;
                }
                return Ok(());
            }
        }

        match self.property_source_names.last() {
            None => property_sources.add_last(source),
            Some(last) => property_sources.add_before(last, source)?,
        }
        self.property_source_names.push(name);
        Ok(())
    }

    /// `@Bean` methods of `source`. Loaded types carry no reliable method order, so when there
    /// is more than one the static metadata is consulted for declaration order.
    fn retrieve_bean_method_metadata(&self, source: &SourceClass) -> Vec<MethodMetadata> {
        let original = source.metadata();
        let bean_methods: Vec<MethodMetadata> = original.annotated_methods(BEAN).cloned().collect();
        if bean_methods.len() <= 1 || source.declares_stable_method_order() {
            return bean_methods;
        }

        let declared = match self.resolver.read_static(&original.name) {
            Ok(declared) => declared,
            Err(err) => {
                tracing::debug!(
                    target: "cfgraph.parser",
                    class = %original.name,
                    error = %err,
                    "failed to read class metadata for determining @Bean method order"
                );
                return bean_methods;
            }
        };
        let declared: Vec<&MethodMetadata> = declared.annotated_methods(BEAN).collect();
        if declared.len() < bean_methods.len() {
            return bean_methods;
        }

        let mut taken = HashSet::new();
        let mut ordered = Vec::with_capacity(bean_methods.len());
        for declared_method in declared {
            let matching = bean_methods
                .iter()
                .position(|method| method.name == declared_method.name);
            if let Some(idx) = matching {
                if taken.insert(idx) {
                    ordered.push(bean_methods[idx].clone());
                }
            }
        }
        if ordered.len() == bean_methods.len() {
            ordered
        } else {
            bean_methods
        }
    }

    /// Default (non-abstract) `@Bean` methods declared on interfaces, walked depth first.
    fn process_interfaces(
        &self,
        config: &mut ConfigurationClass,
        source: &SourceClass,
        visited: &mut HashSet<String>,
    ) -> Result<()> {
        for interface in self.resolver.interfaces(source)? {
            if !visited.insert(interface.name().to_string()) {
                continue;
            }
            for method in self.retrieve_bean_method_metadata(&interface) {
                if !method.is_abstract() {
                    config.add_bean_method(method);
                }
            }
            self.process_interfaces(config, &interface, visited)?;
        }
        Ok(())
    }

    fn process_imports(
        &mut self,
        config: &mut ConfigurationClass,
        current: &SourceClass,
        candidates: Vec<SourceClass>,
        filter: &ClassFilter,
        check_for_circular_imports: bool,
    ) -> Result<()> {
        if candidates.is_empty() {
            return Ok(());
        }
        if check_for_circular_imports && self.import_stack.is_chained_import_on_stack(config.name()) {
            let attempted = Arc::clone(config.metadata());
            return self.report_circular_import(&attempted);
        }

        self.import_stack.push(Arc::clone(config.metadata()));
        let result = self.process_import_candidates(config, current, candidates, filter.clone());
        self.import_stack.pop();
        result.map_err(|err| err.in_import_candidates_of(config.name()))
    }

    fn process_import_candidates(
        &mut self,
        config: &mut ConfigurationClass,
        current: &SourceClass,
        candidates: Vec<SourceClass>,
        mut filter: ClassFilter,
    ) -> Result<()> {
        for candidate in candidates {
            if self.resolver.is_assignable(&candidate, IMPORT_SELECTOR) {
                tracing::trace!(target: "cfgraph.parser", candidate = %candidate.name(), "import selector");
                let loaded = self.resolver.load_class(&candidate)?;
                let strategy = loaded.instantiate(&self.strategy_context())?;
                match strategy.into_selector(loaded.name())? {
                    SelectorStrategy::Deferred(selector) => {
                        if let Some(selector_filter) = selector.exclusion_filter() {
                            filter = filter.or(&selector_filter);
                        }
                        let order = selector
                            .order()
                            .unwrap_or_else(|| order_of(loaded.metadata()));
                        self.handle_deferred(config, selector, order)?;
                    }
                    SelectorStrategy::Immediate(selector) => {
                        if let Some(selector_filter) = selector.exclusion_filter() {
                            filter = filter.or(&selector_filter);
                        }
                        let selected = selector
                            .select_imports(current.metadata())
                            .iter()
                            .map(|class_name| self.resolver.from_name(class_name, &filter))
                            .collect::<Result<Vec<_>>>()?;
                        // Selected selectors recurse here without passing through a class.
                        self.descend(loaded.name())?;
                        let result = self.process_imports(config, current, selected, &filter, false);
                        self.depth -= 1;
                        result?;
                    }
                }
            } else if self
                .resolver
                .is_assignable(&candidate, IMPORT_BEAN_DEFINITION_REGISTRAR)
            {
                tracing::trace!(target: "cfgraph.parser", candidate = %candidate.name(), "import registrar");
                let loaded = self.resolver.load_class(&candidate)?;
                let registrar = loaded
                    .instantiate(&self.strategy_context())?
                    .into_registrar(loaded.name())?;
                config.add_registrar(registrar, Arc::clone(current.metadata()));
            } else if self.resolver.is_object(&candidate) {
                tracing::trace!(target: "cfgraph.parser", "skipping excluded import candidate");
            } else {
                tracing::trace!(target: "cfgraph.parser", candidate = %candidate.name(), "plain import");
                self.import_stack
                    .registry_mut()
                    .register_import(Arc::clone(current.metadata()), candidate.name());
                self.process_configuration_class(
                    ConfigurationClass::imported(candidate, config),
                    &filter,
                )?;
            }
        }
        Ok(())
    }

    fn handle_deferred(
        &mut self,
        config: &mut ConfigurationClass,
        selector: Arc<dyn DeferredImportSelector>,
        order: i32,
    ) -> Result<()> {
        let holder = DeferredImportHolder {
            owner: config.source().clone(),
            selector,
            order,
        };
        let Some(holder) = self.deferred.handle(holder) else {
            return Ok(());
        };

        // Deferred imports are already being resolved; handle this one on its own.
        let mut handler = DeferredImportSelectorGroupingHandler::default();
        handler.register(holder, |group_type| self.create_group(group_type))?;
        self.process_group_imports(handler, Some(config))
    }

    fn create_group(&self, group_type: Option<&str>) -> Result<Box<dyn DeferredImportGroup>> {
        let Some(class_name) = group_type else {
            return Ok(Box::new(DefaultDeferredImportGroup::default()));
        };
        let loaded = self
            .class_loader
            .load(class_name)
            .ok_or_else(|| ParseError::ClassNotFound {
                class_name: class_name.to_string(),
            })?;
        loaded
            .instantiate(&self.strategy_context())?
            .into_group(class_name)
    }

    fn run_deferred(&mut self, holders: Vec<DeferredImportHolder>) -> Result<()> {
        let mut handler = DeferredImportSelectorGroupingHandler::default();
        for holder in holders {
            handler.register(holder, |group_type| self.create_group(group_type))?;
        }
        self.process_group_imports(handler, None)
    }

    fn process_group_imports(
        &mut self,
        handler: DeferredImportSelectorGroupingHandler,
        mut in_progress: Option<&mut ConfigurationClass>,
    ) -> Result<()> {
        let (groupings, origins) = handler.into_parts();
        let default_filter = self.resolver.default_filter().clone();
        for mut grouping in groupings {
            let filter = grouping.candidate_filter(&default_filter);
            for entry in grouping.imports() {
                self.process_group_entry(&entry, &filter, &origins, in_progress.as_deref_mut())?;
            }
        }
        Ok(())
    }

    fn process_group_entry(
        &mut self,
        entry: &GroupEntry,
        filter: &ClassFilter,
        origins: &DeferredOrigins,
        in_progress: Option<&mut ConfigurationClass>,
    ) -> Result<()> {
        let class_name = entry.metadata.name.as_str();
        if let Some(owner) = in_progress.filter(|owner| owner.name() == class_name) {
            return self.import_group_entry(owner, entry, filter);
        }

        let mut scratch = if let Some(committed) = self.configuration_classes.get(class_name) {
            committed.detached()
        } else if let Some(origin) = origins.get(class_name) {
            ConfigurationClass::explicit(origin.clone(), None)
        } else {
            return Err(ParseError::UnknownDeferredOrigin {
                class_name: class_name.to_string(),
            });
        };
        let result = self.import_group_entry(&mut scratch, entry, filter);
        if let Some(committed) = self.configuration_classes.get_mut(class_name) {
            committed.absorb(scratch);
        }
        result
    }

    fn import_group_entry(
        &mut self,
        owner: &mut ConfigurationClass,
        entry: &GroupEntry,
        filter: &ClassFilter,
    ) -> Result<()> {
        let current = self.resolver.refilter(owner.source(), filter);
        let result = self
            .resolver
            .from_name(&entry.import_class_name, filter)
            .and_then(|candidate| self.process_imports(owner, &current, vec![candidate], filter, false));
        result.map_err(|err| err.in_import_candidates_of(owner.name()))
    }
}
