use std::sync::Arc;

use cfgraph_metadata::{ClassMetadata, DescriptorIndex};
use cfgraph_parser::annotations::IMPORT_BEAN_DEFINITION_REGISTRAR;
use cfgraph_parser::{
    BeanDefinition, BeanDefinitionRegistry, ImportBeanDefinitionRegistrar,
    LoadedType, SimpleBeanDefinitionRegistry, Strategy, TypeRegistry,
};
use pretty_assertions::assert_eq;

use super::fixtures::{configuration, context, importing, parse};

/// Registers one bean named after the importing class.
struct NamedAfterImporter {
    prefix: String,
}

impl ImportBeanDefinitionRegistrar for NamedAfterImporter {
    fn register_bean_definitions(
        &self,
        importing: &ClassMetadata,
        registry: &dyn BeanDefinitionRegistry,
    ) {
        registry.register_bean_definition(
            &format!("{}{}", self.prefix, importing.simple_name()),
            BeanDefinition::for_class_name("app.Generated"),
        );
    }
}

fn registrar_type() -> LoadedType {
    let mut metadata = ClassMetadata::new("app.Registrar");
    metadata
        .interfaces
        .push(IMPORT_BEAN_DEFINITION_REGISTRAR.to_string());
    LoadedType::strategy(metadata, |context| {
        let prefix = context
            .environment
            .resolve_placeholders("${registrar.prefix:generated}");
        Ok(Strategy::Registrar(Arc::new(NamedAfterImporter { prefix })))
    })
}

#[test]
fn registrars_are_recorded_against_the_importing_class() {
    let index = DescriptorIndex::new()
        .with(importing(configuration("app.Root"), &["app.Registrar", "app.Plain"]))
        .with(configuration("app.Plain"));
    let types = TypeRegistry::new().with(registrar_type());

    let model = parse(context(index).with_class_loader(Arc::new(types)), &["app.Root"]);

    assert_eq!(model.class_names(), vec!["app.Plain", "app.Root"]);
    let root = model.get("app.Root").unwrap();
    assert_eq!(root.registrars().len(), 1);
    assert_eq!(root.registrars()[0].1.name, "app.Root");
    assert!(model.get("app.Plain").unwrap().registrars().is_empty());

    let registry = SimpleBeanDefinitionRegistry::new();
    model.invoke_registrars(&registry);
    assert_eq!(registry.bean_definition_names(), vec!["generatedRoot"]);
}

#[test]
fn registrars_imported_by_a_superclass_keep_the_superclass_as_importer() {
    let mut base = importing(ClassMetadata::new("app.Base"), &["app.Registrar"]);
    base.super_class = Some("java.lang.Object".into());
    let mut child = configuration("app.Child");
    child.super_class = Some("app.Base".into());
    let index = DescriptorIndex::new().with(base).with(child);
    let types = TypeRegistry::new().with(registrar_type());

    let model = parse(context(index).with_class_loader(Arc::new(types)), &["app.Child"]);

    let child = model.get("app.Child").unwrap();
    assert_eq!(child.registrars().len(), 1);
    assert_eq!(child.registrars()[0].1.name, "app.Base");
}
