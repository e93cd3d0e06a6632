use std::sync::Arc;

use cfgraph_metadata::{AnnotationValue, AttributeValue, ClassMetadata, DescriptorIndex};
use cfgraph_parser::annotations::{COMPONENT_SCAN, CONDITIONAL, PROFILE};
use cfgraph_parser::{
    Condition, ConfigurationPhase, LoadedType, ParserContext, PropertySource,
    StandardEnvironment, StaticComponentScanner, Strategy, StrategyContext, TypeRegistry,
};
use pretty_assertions::assert_eq;

use super::fixtures::{configuration, context, importing, parse};

fn profiled(name: &str, profile: &str) -> ClassMetadata {
    let mut metadata = configuration(name);
    metadata
        .annotations
        .push(AnnotationValue::new(PROFILE).with("value", AttributeValue::strings([profile])));
    metadata
}

fn conditional(mut metadata: ClassMetadata, condition: &str) -> ClassMetadata {
    metadata
        .annotations
        .push(AnnotationValue::new(CONDITIONAL).with("value", AttributeValue::classes([condition])));
    metadata
}

struct PropertyEnabled(&'static str);

impl Condition for PropertyEnabled {
    fn matches(&self, context: &StrategyContext<'_>, _metadata: &ClassMetadata) -> bool {
        context.environment.get_property(self.0).as_deref() == Some("true")
    }
}

struct NeverWhenRegistering;

impl Condition for NeverWhenRegistering {
    fn matches(&self, _context: &StrategyContext<'_>, _metadata: &ClassMetadata) -> bool {
        false
    }

    fn required_phase(&self) -> Option<ConfigurationPhase> {
        Some(ConfigurationPhase::RegisterBean)
    }
}

fn condition_type(class_name: &str, condition: impl Condition + 'static) -> LoadedType {
    let condition: Arc<dyn Condition> = Arc::new(condition);
    LoadedType::strategy(ClassMetadata::new(class_name), move |_| {
        Ok(Strategy::Condition(Arc::clone(&condition)))
    })
}

fn profiles_index() -> DescriptorIndex {
    DescriptorIndex::new()
        .with(importing(configuration("app.Root"), &["app.Prod", "app.NotProd"]))
        .with(profiled("app.Prod", "prod"))
        .with(profiled("app.NotProd", "!prod"))
}

#[test]
fn inactive_profiles_skip_classes() {
    let model = parse(context(profiles_index()), &["app.Root"]);
    assert_eq!(model.class_names(), vec!["app.NotProd", "app.Root"]);
}

#[test]
fn active_profiles_include_classes() {
    let env = StandardEnvironment::new().with_active_profiles(["prod"]);
    let model = parse(
        context(profiles_index()).with_environment(Arc::new(env)),
        &["app.Root"],
    );
    assert_eq!(model.class_names(), vec!["app.Prod", "app.Root"]);
}

#[test]
fn conditions_see_the_environment() {
    let index = DescriptorIndex::new()
        .with(importing(configuration("app.Root"), &["app.Feature"]))
        .with(conditional(configuration("app.Feature"), "app.FeatureEnabled"));
    let types = || {
        Arc::new(TypeRegistry::new().with(condition_type(
            "app.FeatureEnabled",
            PropertyEnabled("feature.enabled"),
        )))
    };

    let disabled = parse(context(index.clone()).with_class_loader(types()), &["app.Root"]);
    assert_eq!(disabled.class_names(), vec!["app.Root"]);

    let env = StandardEnvironment::new().with_property_source(PropertySource::map(
        "test",
        [("feature.enabled".to_string(), "true".to_string())]
            .into_iter()
            .collect(),
    ));
    let enabled = parse(
        context(index)
            .with_class_loader(types())
            .with_environment(Arc::new(env)),
        &["app.Root"],
    );
    assert_eq!(enabled.class_names(), vec!["app.Feature", "app.Root"]);
}

#[test]
fn register_bean_conditions_only_suppress_component_scans() {
    let mut root = conditional(configuration("app.Root"), "app.NeverWhenRegistering");
    root.annotations.push(
        AnnotationValue::new(COMPONENT_SCAN).with("basePackages", AttributeValue::strings(["app"])),
    );
    let index = Arc::new(
        DescriptorIndex::new()
            .with(root)
            .with(configuration("app.Scanned")),
    );
    let types = TypeRegistry::new().with(condition_type(
        "app.NeverWhenRegistering",
        NeverWhenRegistering,
    ));
    let context = ParserContext::new(index.clone())
        .with_class_loader(Arc::new(types))
        .with_scanner(Arc::new(StaticComponentScanner::new(
            index.clone(),
            ["app.Root", "app.Scanned"],
        )));

    let model = parse(context, &["app.Root"]);

    assert_eq!(model.class_names(), vec!["app.Root"]);
}
