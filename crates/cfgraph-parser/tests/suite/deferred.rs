use std::sync::Arc;

use cfgraph_metadata::DescriptorIndex;
use cfgraph_parser::{ClassFilter, ConfigurationClassParser, TypeRegistry};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use super::fixtures::{
    configuration, context, deferred_selector, immediate_selector, importer_names, importing,
    parse, recording_group, seed, FixedSelector,
};

#[test]
fn immediate_selectors_import_on_the_spot() {
    let selector = FixedSelector::new(&["app.Picked"]);
    let seen = Arc::clone(&selector.seen);
    let index = DescriptorIndex::new()
        .with(importing(configuration("app.Root"), &["app.Selector"]))
        .with(configuration("app.Picked"));
    let types = TypeRegistry::new().with(immediate_selector("app.Selector", selector));

    let model = parse(context(index).with_class_loader(Arc::new(types)), &["app.Root"]);

    assert_eq!(model.class_names(), vec!["app.Picked", "app.Root"]);
    assert_eq!(importer_names(&model, "app.Picked"), vec!["app.Root"]);
    assert_eq!(*seen.lock(), vec!["app.Root".to_string()]);
}

#[test]
fn deferred_selectors_run_after_every_seed_in_order() {
    let index = DescriptorIndex::new()
        .with(importing(configuration("app.A"), &["app.LateSelector"]))
        .with(importing(configuration("app.B"), &["app.EarlySelector"]))
        .with(configuration("app.X"))
        .with(configuration("app.Y"));
    let types = TypeRegistry::new()
        .with(deferred_selector("app.LateSelector", FixedSelector::new(&["app.X"]).ordered(10)))
        .with(deferred_selector("app.EarlySelector", FixedSelector::new(&["app.Y"]).ordered(1)));

    let model = parse(context(index).with_class_loader(Arc::new(types)), &["app.A", "app.B"]);

    assert_eq!(model.class_names(), vec!["app.A", "app.B", "app.Y", "app.X"]);
    assert_eq!(importer_names(&model, "app.X"), vec!["app.A"]);
    assert_eq!(importer_names(&model, "app.Y"), vec!["app.B"]);
}

#[test]
fn selectors_sharing_a_group_are_processed_together() {
    let processed = Arc::new(Mutex::new(Vec::new()));
    let index = DescriptorIndex::new()
        .with(importing(configuration("app.A"), &["app.FirstSelector"]))
        .with(importing(configuration("app.B"), &["app.SecondSelector"]))
        .with(configuration("app.X"))
        .with(configuration("app.Y"));
    let types = TypeRegistry::new()
        .with(deferred_selector(
            "app.FirstSelector",
            FixedSelector::new(&["app.X"]).in_group("app.Shared"),
        ))
        .with(deferred_selector(
            "app.SecondSelector",
            FixedSelector::new(&["app.Y"]).in_group("app.Shared"),
        ))
        .with(recording_group("app.Shared", Arc::clone(&processed)));

    let model = parse(context(index).with_class_loader(Arc::new(types)), &["app.A", "app.B"]);

    assert_eq!(*processed.lock(), vec!["app.A".to_string(), "app.B".to_string()]);
    assert_eq!(model.class_names(), vec!["app.A", "app.B", "app.X", "app.Y"]);
    assert_eq!(importer_names(&model, "app.Y"), vec!["app.B"]);
}

#[test]
fn group_exclusion_filters_drop_selected_classes() {
    let index = DescriptorIndex::new()
        .with(importing(configuration("app.Root"), &["app.Selector"]))
        .with(configuration("app.Kept"));
    let selector = FixedSelector::new(&["app.Excluded", "app.Kept"])
        .excluding(ClassFilter::new(|name| name == "app.Excluded"));
    let types = TypeRegistry::new().with(deferred_selector("app.Selector", selector));

    let model = parse(context(index).with_class_loader(Arc::new(types)), &["app.Root"]);

    assert_eq!(model.class_names(), vec!["app.Root", "app.Kept"]);
}

#[test]
fn deferred_selectors_found_while_resolving_groups_are_handled_immediately() {
    let index = DescriptorIndex::new()
        .with(importing(configuration("app.Root"), &["app.OuterSelector"]))
        .with(importing(configuration("app.Mid"), &["app.InnerSelector"]))
        .with(configuration("app.Tail"));
    let types = TypeRegistry::new()
        .with(deferred_selector("app.OuterSelector", FixedSelector::new(&["app.Mid"])))
        .with(deferred_selector("app.InnerSelector", FixedSelector::new(&["app.Tail"])));

    let model = parse(context(index).with_class_loader(Arc::new(types)), &["app.Root"]);

    assert_eq!(model.class_names(), vec!["app.Root", "app.Tail", "app.Mid"]);
    assert_eq!(importer_names(&model, "app.Mid"), vec!["app.Root"]);
    assert_eq!(importer_names(&model, "app.Tail"), vec!["app.Mid"]);
}

#[test]
fn single_class_parsing_leaves_deferred_imports_queued() {
    let index = DescriptorIndex::new()
        .with(importing(configuration("app.Root"), &["app.Selector"]))
        .with(configuration("app.Late"));
    let types = TypeRegistry::new()
        .with(deferred_selector("app.Selector", FixedSelector::new(&["app.Late"])));
    let mut parser =
        ConfigurationClassParser::new(context(index).with_class_loader(Arc::new(types)));

    parser.parse_class_name("app.Root", "root").unwrap();
    assert!(parser.configuration_class("app.Late").is_none());

    parser.process_deferred_imports().unwrap();
    assert!(parser.configuration_class("app.Late").is_some());

    // The queue is open again; re-registering the seed moves it behind its imports.
    parser.parse(&[seed("app.Root")]).unwrap();
    let names: Vec<_> = parser
        .configuration_classes()
        .map(|config| config.name().to_string())
        .collect();
    assert_eq!(names, vec!["app.Late", "app.Root"]);
}
