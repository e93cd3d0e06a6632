use std::sync::Arc;

use cfgraph_metadata::{AnnotationValue, AttributeValue, DescriptorIndex};
use cfgraph_parser::{
    ConfigurationClassParser, Environment, InMemoryResourceLoader, ParseError, PropertySource,
    ReadOnlyEnvironment, StandardEnvironment,
};
use indexmap::IndexMap;
use pretty_assertions::assert_eq;

use super::fixtures::{configuration, context, parse, property_source, seed};

fn named_source(name: &str, location: &str) -> AnnotationValue {
    property_source(location).with("name", AttributeValue::string(name))
}

fn resources() -> InMemoryResourceLoader {
    InMemoryResourceLoader::new()
        .with("a.properties", "shared=a\nonly.a=1\n")
        .with("b.properties", "shared=b\nonly.b=2\n")
        .with("c.properties", "shared=c\n")
        .with("conf/app.properties", "greeting=hello\n")
}

fn baseline() -> StandardEnvironment {
    let properties: IndexMap<String, String> =
        [("shared".to_string(), "baseline".to_string())].into_iter().collect();
    StandardEnvironment::new().with_property_source(PropertySource::map("baseline", properties))
}

#[test]
fn repeated_names_become_composites_with_the_newest_first() {
    let mut a = configuration("app.A");
    a.annotations.push(named_source("p1", "classpath:a.properties"));
    let mut b = configuration("app.B");
    b.annotations.push(named_source("p2", "classpath:b.properties"));
    let mut c = configuration("app.C");
    c.annotations.push(named_source("p1", "classpath:c.properties"));
    let index = DescriptorIndex::new().with(a).with(b).with(c);
    let env = Arc::new(baseline());

    parse(
        context(index)
            .with_environment(env.clone())
            .with_resource_loader(Arc::new(resources())),
        &["app.A", "app.B", "app.C"],
    );

    assert_eq!(env.property_source_names(), vec!["baseline", "p2", "p1"]);
    let sources = env.property_sources().read();
    let p1 = sources.get("p1").unwrap();
    assert!(p1.is_composite());
    let members: Vec<_> = p1.members().iter().map(PropertySource::name).collect();
    assert_eq!(
        members,
        vec!["class path resource [c.properties]", "class path resource [a.properties]"]
    );
    drop(sources);

    assert_eq!(env.get_property("shared").as_deref(), Some("baseline"));
    assert_eq!(env.get_property("only.a").as_deref(), Some("1"));
    assert_eq!(env.get_property("only.b").as_deref(), Some("2"));
}

#[test]
fn later_sources_take_precedence_over_earlier_ones() {
    let mut a = configuration("app.A");
    a.annotations.push(property_source("classpath:a.properties"));
    let mut b = configuration("app.B");
    b.annotations.push(property_source("classpath:b.properties"));
    let index = DescriptorIndex::new().with(a).with(b);
    let env = Arc::new(StandardEnvironment::new());

    parse(
        context(index)
            .with_environment(env.clone())
            .with_resource_loader(Arc::new(resources())),
        &["app.A", "app.B"],
    );

    assert_eq!(
        env.property_source_names(),
        vec!["class path resource [b.properties]", "class path resource [a.properties]"]
    );
    assert_eq!(env.get_property("shared").as_deref(), Some("b"));
}

#[test]
fn locations_resolve_placeholders_against_the_environment() {
    let mut app = configuration("app.App");
    app.annotations
        .push(named_source("app", "classpath:${config.dir}/app.properties"));
    let index = DescriptorIndex::new().with(app);
    let properties: IndexMap<String, String> =
        [("config.dir".to_string(), "conf".to_string())].into_iter().collect();
    let env = Arc::new(
        StandardEnvironment::new().with_property_source(PropertySource::map("system", properties)),
    );

    parse(
        context(index)
            .with_environment(env.clone())
            .with_resource_loader(Arc::new(resources())),
        &["app.App"],
    );

    assert_eq!(env.get_property("greeting").as_deref(), Some("hello"));
}

#[test]
fn missing_resources_can_be_ignored() {
    let mut app = configuration("app.App");
    app.annotations.push(
        property_source("classpath:missing.properties")
            .with("ignoreResourceNotFound", AttributeValue::Bool(true)),
    );
    app.annotations.push(
        property_source("classpath:${undefined.dir}/x.properties")
            .with("ignoreResourceNotFound", AttributeValue::Bool(true)),
    );
    let index = DescriptorIndex::new().with(app);
    let env = Arc::new(StandardEnvironment::new());

    let model = parse(context(index).with_environment(env.clone()), &["app.App"]);

    assert!(model.contains("app.App"));
    assert!(env.property_source_names().is_empty());
}

#[test]
fn missing_resources_fail_the_run_by_default() {
    let mut app = configuration("app.App");
    app.annotations.push(property_source("classpath:missing.properties"));
    let index = DescriptorIndex::new().with(app);

    let mut parser = ConfigurationClassParser::new(context(index));
    let err = parser.parse(&[seed("app.App")]).unwrap_err();

    assert_eq!(err.to_string(), "Failed to parse configuration class [app.App]");
    let ParseError::Store(store) = &err else {
        panic!("expected a store error, got {err:?}");
    };
    match store.cause() {
        ParseError::Resource { description, .. } => {
            assert_eq!(description, "class path resource [missing.properties]")
        }
        other => panic!("unexpected cause {other:?}"),
    }
}

#[test]
fn read_only_environments_ignore_property_sources() {
    let mut app = configuration("app.App");
    app.annotations.push(property_source("classpath:missing.properties"));
    let index = DescriptorIndex::new().with(app);
    let env = Arc::new(ReadOnlyEnvironment::new(StandardEnvironment::new()));

    let model = parse(context(index).with_environment(env), &["app.App"]);

    assert!(model.contains("app.App"));
}
