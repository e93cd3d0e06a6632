use indexmap::IndexMap;

use crate::configuration_class::ConfigurationClass;
use crate::definition::BeanDefinitionRegistry;
use crate::import_stack::ImportRegistry;
use crate::problems::Problem;

/// The result of a run: configuration classes in the order they were completed, the import
/// registry and every problem reported along the way.
#[derive(Debug)]
pub struct ConfigurationModel {
    classes: IndexMap<String, ConfigurationClass>,
    import_registry: ImportRegistry,
    problems: Vec<Problem>,
}

impl ConfigurationModel {
    pub(crate) fn new(
        classes: IndexMap<String, ConfigurationClass>,
        import_registry: ImportRegistry,
        problems: Vec<Problem>,
    ) -> Self {
        Self {
            classes,
            import_registry,
            problems,
        }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.classes.contains_key(class_name)
    }

    pub fn get(&self, class_name: &str) -> Option<&ConfigurationClass> {
        self.classes.get(class_name)
    }

    pub fn classes(&self) -> impl Iterator<Item = &ConfigurationClass> {
        self.classes.values()
    }

    pub fn class_names(&self) -> Vec<&str> {
        self.classes.keys().map(String::as_str).collect()
    }

    pub fn import_registry(&self) -> &ImportRegistry {
        &self.import_registry
    }

    pub fn import_registry_mut(&mut self) -> &mut ImportRegistry {
        &mut self.import_registry
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    /// Runs the registrars of every class, in class order.
    pub fn invoke_registrars(&self, registry: &dyn BeanDefinitionRegistry) {
        for config in self.classes.values() {
            config.invoke_registrars(registry);
        }
    }
}
