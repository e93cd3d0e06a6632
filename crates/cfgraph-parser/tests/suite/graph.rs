use std::sync::Arc;

use cfgraph_config::ParserConfig;
use cfgraph_metadata::{AnnotationValue, AttributeValue, ClassMetadata, DescriptorIndex};
use cfgraph_parser::annotations::{COMPONENT_SCAN, IMPORT_RESOURCE, ORDER};
use cfgraph_parser::{
    BeanDefinition, BeanDefinitionHolder, ConfigurationClassParser, LoadedType, ParseError,
    ParserContext, ProblemKind, StaticComponentScanner, TypeRegistry,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use super::fixtures::{
    bean_method, bean_method_names, configuration, context, deferred_selector, importer_names,
    importing, parse, recording_group, seed, with_bean_methods, FixedSelector,
};

#[test]
fn seeds_and_their_imports_are_collected_once() {
    let index = DescriptorIndex::new()
        .with(importing(configuration("app.Root"), &["app.A"]))
        .with(configuration("app.A"));

    let model = parse(context(index), &["app.Root", "app.Root"]);

    assert_eq!(model.class_names(), vec!["app.A", "app.Root"]);
    assert_eq!(importer_names(&model, "app.A"), vec!["app.Root"]);
    assert!(!model.get("app.Root").unwrap().is_imported());
    assert_eq!(model.get("app.Root").unwrap().bean_name(), Some("Root"));
}

#[test]
fn explicit_registration_replaces_an_imported_class() {
    let index = DescriptorIndex::new()
        .with(importing(configuration("app.Root"), &["app.A"]))
        .with(with_bean_methods(configuration("app.A"), &["a"]));

    let model = parse(context(index), &["app.Root", "app.A"]);

    assert_eq!(model.class_names(), vec!["app.Root", "app.A"]);
    let a = model.get("app.A").unwrap();
    assert!(!a.is_imported());
    assert_eq!(a.bean_name(), Some("A"));
    assert_eq!(bean_method_names(&model, "app.A"), vec!["a"]);
}

#[test]
fn importers_of_a_shared_class_are_merged() {
    let index = DescriptorIndex::new()
        .with(importing(configuration("app.X"), &["app.Shared"]))
        .with(importing(configuration("app.Y"), &["app.Shared"]))
        .with(configuration("app.Shared"));

    let model = parse(context(index), &["app.X", "app.Y"]);

    assert_eq!(model.class_names(), vec!["app.Shared", "app.X", "app.Y"]);
    assert_eq!(importer_names(&model, "app.Shared"), vec!["app.X", "app.Y"]);
    assert_eq!(
        model
            .import_registry()
            .importing_class_for("app.Shared")
            .map(|metadata| metadata.name.as_str()),
        Some("app.Y")
    );
}

#[test]
fn circular_imports_are_reported_without_recursing() {
    let index = DescriptorIndex::new()
        .with(importing(configuration("app.A"), &["app.B"]))
        .with(importing(configuration("app.B"), &["app.A"]));

    let model = parse(context(index), &["app.A"]);

    assert_eq!(model.class_names(), vec!["app.A", "app.B"]);
    assert!(!model.get("app.A").unwrap().is_imported());
    let problems = model.problems();
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].kind, ProblemKind::CircularImport);
    assert_eq!(
        problems[0].message,
        "A circular @Import has been detected: Illegal attempt by @Configuration class 'B' to \
         import class 'A' as 'A' is already present in the current import stack [B->A]"
    );
    assert_eq!(problems[0].location.class_name.as_deref(), Some("app.A"));
}

#[test]
fn member_classes_importing_their_enclosing_class_are_reported() {
    let mut outer = configuration("app.Outer");
    outer.member_classes = vec!["app.Outer$Inner".into()];
    let mut inner = importing(configuration("app.Outer$Inner"), &["app.Outer"]);
    inner.enclosing_class = Some("app.Outer".into());
    let index = DescriptorIndex::new().with(outer).with(inner);

    let model = parse(context(index), &["app.Outer"]);

    assert_eq!(model.class_names(), vec!["app.Outer", "app.Outer$Inner"]);
    assert!(!model.get("app.Outer").unwrap().is_imported());
    let problems = model.problems();
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].kind, ProblemKind::CircularImport);
    assert_eq!(
        problems[0].message,
        "A circular @Import has been detected: Illegal attempt by @Configuration class 'Outer.Inner' \
         to import class 'Outer' as 'Outer' is already present in the current import stack \
         [Outer.Inner->Outer]"
    );
}

#[test]
fn fail_fast_turns_a_circular_import_into_an_error() {
    let index = DescriptorIndex::new()
        .with(importing(configuration("app.A"), &["app.B"]))
        .with(importing(configuration("app.B"), &["app.A"]));
    let config = ParserConfig {
        fail_fast: true,
        ..ParserConfig::default()
    };

    let mut parser = ConfigurationClassParser::new(context(index).with_config(config));
    let err = parser.parse(&[seed("app.A")]).unwrap_err();

    match err {
        ParseError::Problem(err) => assert_eq!(err.problem.kind, ProblemKind::CircularImport),
        other => panic!("expected a problem, got {other:?}"),
    }
}

#[test]
fn scan_results_imports_and_deferred_groups_resolve_in_phases() {
    let mut root = importing(configuration("app.Root"), &["app.Imported"]);
    root.annotations.push(
        AnnotationValue::new(COMPONENT_SCAN)
            .with("basePackages", AttributeValue::strings(["app.leaf"])),
    );
    let index = Arc::new(
        DescriptorIndex::new()
            .with(root)
            .with(with_bean_methods(configuration("app.leaf.Leaf"), &["leafBean"]))
            .with(importing(configuration("app.Imported"), &["app.ImportedSelector"]))
            .with(configuration("app.Resolved")),
    );
    let processed = Arc::new(Mutex::new(Vec::new()));
    let types = TypeRegistry::new()
        .with(deferred_selector(
            "app.ImportedSelector",
            FixedSelector::new(&["app.Resolved"]).in_group("app.G"),
        ))
        .with(recording_group("app.G", Arc::clone(&processed)));
    let context = ParserContext::new(index.clone())
        .with_class_loader(Arc::new(types))
        .with_scanner(Arc::new(StaticComponentScanner::new(
            index.clone(),
            ["app.leaf.Leaf"],
        )));

    let model = parse(context, &["app.Root"]);

    assert_eq!(
        model.class_names(),
        vec!["app.leaf.Leaf", "app.Imported", "app.Root", "app.Resolved"]
    );
    let leaf = model.get("app.leaf.Leaf").unwrap();
    assert!(!leaf.is_imported());
    assert_eq!(leaf.bean_name(), Some("leaf"));
    assert_eq!(bean_method_names(&model, "app.leaf.Leaf"), vec!["leafBean"]);
    assert_eq!(importer_names(&model, "app.Imported"), vec!["app.Root"]);
    assert_eq!(importer_names(&model, "app.Resolved"), vec!["app.Imported"]);
    assert_eq!(*processed.lock(), vec!["app.Imported".to_string()]);
    assert!(model.problems().is_empty());
}

#[test]
fn member_classes_are_processed_before_their_enclosing_class() {
    let mut outer = configuration("app.Outer");
    outer.member_classes = vec!["app.Outer$Second".into(), "app.Outer$First".into()];
    let mut second = configuration("app.Outer$Second");
    second.enclosing_class = Some("app.Outer".into());
    second
        .annotations
        .push(AnnotationValue::new(ORDER).with("value", AttributeValue::Int(2)));
    let mut first = configuration("app.Outer$First");
    first.enclosing_class = Some("app.Outer".into());
    first
        .annotations
        .push(AnnotationValue::new(ORDER).with("value", AttributeValue::Int(1)));
    let mut plain = ClassMetadata::new("app.Outer$Plain");
    plain.enclosing_class = Some("app.Outer".into());
    outer.member_classes.push(plain.name.clone());

    let index = DescriptorIndex::new()
        .with(outer)
        .with(second)
        .with(first)
        .with(plain);

    let model = parse(context(index), &["app.Outer"]);

    assert_eq!(
        model.class_names(),
        vec!["app.Outer$First", "app.Outer$Second", "app.Outer"]
    );
    assert_eq!(importer_names(&model, "app.Outer$First"), vec!["app.Outer"]);
}

#[test]
fn explicit_registration_walks_the_superclass_again() {
    let mut base = ClassMetadata::new("app.Base");
    base.super_class = Some("java.lang.Object".into());
    base.methods.push(bean_method("app.Base", "baseBean"));
    let mut child = configuration("app.Child");
    child.super_class = Some("app.Base".into());
    let index = DescriptorIndex::new()
        .with(importing(configuration("app.Root"), &["app.Child"]))
        .with(base)
        .with(child);

    let model = parse(context(index), &["app.Root", "app.Child"]);

    assert_eq!(model.class_names(), vec!["app.Root", "app.Child"]);
    assert!(!model.get("app.Child").unwrap().is_imported());
    assert_eq!(bean_method_names(&model, "app.Child"), vec!["baseBean"]);
}

#[test]
fn superclasses_contribute_to_the_first_subclass_only() {
    let mut base = importing(ClassMetadata::new("app.Base"), &["app.FromBase"]);
    base.super_class = Some("java.lang.Object".into());
    base.methods.push(bean_method("app.Base", "baseBean"));
    let mut child = with_bean_methods(configuration("app.Child"), &["childBean"]);
    child.super_class = Some("app.Base".into());
    let mut other = with_bean_methods(configuration("app.OtherChild"), &["otherBean"]);
    other.super_class = Some("app.Base".into());

    let index = DescriptorIndex::new()
        .with(base)
        .with(child)
        .with(other)
        .with(configuration("app.FromBase"));

    let model = parse(context(index), &["app.Child", "app.OtherChild"]);

    assert_eq!(
        model.class_names(),
        vec!["app.FromBase", "app.Child", "app.OtherChild"]
    );
    assert!(!model.contains("app.Base"));
    assert_eq!(bean_method_names(&model, "app.Child"), vec!["childBean", "baseBean"]);
    assert_eq!(bean_method_names(&model, "app.OtherChild"), vec!["otherBean"]);
    assert_eq!(importer_names(&model, "app.FromBase"), vec!["app.Child"]);
}

#[test]
fn default_interface_bean_methods_are_collected() {
    let mut defaults = ClassMetadata::new("app.Defaults");
    defaults.flags.interface = true;
    defaults.flags.is_abstract = true;
    defaults.methods.push(bean_method("app.Defaults", "defaultBean"));
    let mut declared_only = bean_method("app.Defaults", "abstractBean");
    declared_only.flags.is_abstract = true;
    defaults.methods.push(declared_only);
    let mut root = with_bean_methods(configuration("app.Root"), &["rootBean"]);
    root.interfaces.push("app.Defaults".into());

    let index = DescriptorIndex::new().with(defaults).with(root);
    let model = parse(context(index), &["app.Root"]);

    assert_eq!(bean_method_names(&model, "app.Root"), vec!["rootBean", "defaultBean"]);
}

#[test]
fn loaded_classes_take_bean_method_order_from_static_metadata() {
    let scrambled = with_bean_methods(configuration("app.Loaded"), &["second", "first"]);
    let declared = with_bean_methods(configuration("app.Loaded"), &["first", "second"]);
    let mut types = TypeRegistry::new();
    let loaded = types.register(LoadedType::new(scrambled));
    let holder = BeanDefinitionHolder::new("loaded", BeanDefinition::for_loaded(loaded));

    let context = context(DescriptorIndex::new().with(declared)).with_class_loader(Arc::new(types));
    let mut parser = ConfigurationClassParser::new(context);
    parser.parse(&[holder]).unwrap();
    let model = parser.finish();

    assert_eq!(bean_method_names(&model, "app.Loaded"), vec!["first", "second"]);
}

#[test]
fn bean_method_order_is_kept_when_static_metadata_disagrees() {
    let scrambled = with_bean_methods(configuration("app.Loaded"), &["second", "first"]);
    let partial = with_bean_methods(configuration("app.Loaded"), &["first"]);
    let mut types = TypeRegistry::new();
    let loaded = types.register(LoadedType::new(scrambled));
    let holder = BeanDefinitionHolder::new("loaded", BeanDefinition::for_loaded(loaded));

    let context = context(DescriptorIndex::new().with(partial)).with_class_loader(Arc::new(types));
    let mut parser = ConfigurationClassParser::new(context);
    parser.parse(&[holder]).unwrap();
    let model = parser.finish();

    assert_eq!(bean_method_names(&model, "app.Loaded"), vec!["second", "first"]);
}

#[test]
fn excluded_imports_are_skipped() {
    let index = DescriptorIndex::new()
        .with(importing(configuration("app.Root"), &["app.A", "com.vendor.Internal"]))
        .with(configuration("app.A"));
    let config = ParserConfig {
        exclusion_prefixes: vec!["com.vendor.".into()],
        ..ParserConfig::default()
    };

    let model = parse(context(index).with_config(config), &["app.Root"]);

    assert_eq!(model.class_names(), vec!["app.A", "app.Root"]);
}

#[test]
fn imported_resources_resolve_placeholders() {
    let mut root = configuration("app.Root");
    root.annotations.push(
        AnnotationValue::new(IMPORT_RESOURCE)
            .with("locations", AttributeValue::strings(["classpath:${ctx:beans}.xml"]))
            .with("reader", AttributeValue::class("app.GroovyReader")),
    );
    let index = DescriptorIndex::new().with(root);

    let model = parse(context(index), &["app.Root"]);

    let resources: Vec<_> = model
        .get("app.Root")
        .unwrap()
        .imported_resources()
        .map(|(location, reader)| (location.to_string(), reader.map(str::to_string)))
        .collect();
    assert_eq!(
        resources,
        vec![(
            "classpath:beans.xml".to_string(),
            Some("app.GroovyReader".to_string())
        )]
    );
}

#[test]
fn imported_resource_value_is_read_only_without_locations() {
    let mut both = configuration("app.Both");
    both.annotations.push(
        AnnotationValue::new(IMPORT_RESOURCE)
            .with("locations", AttributeValue::strings(["classpath:beans.xml"]))
            .with("value", AttributeValue::strings(["classpath:${no.such.property}.xml"])),
    );
    let mut value_only = configuration("app.ValueOnly");
    value_only.annotations.push(
        AnnotationValue::new(IMPORT_RESOURCE)
            .with("value", AttributeValue::strings(["classpath:other.xml"])),
    );
    let index = DescriptorIndex::new().with(both).with(value_only);

    let model = parse(context(index), &["app.Both", "app.ValueOnly"]);

    let locations = |class_name: &str| -> Vec<String> {
        model
            .get(class_name)
            .unwrap()
            .imported_resources()
            .map(|(location, _)| location.to_string())
            .collect()
    };
    assert_eq!(locations("app.Both"), vec!["classpath:beans.xml"]);
    assert_eq!(locations("app.ValueOnly"), vec!["classpath:other.xml"]);
}
