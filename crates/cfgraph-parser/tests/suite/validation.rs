use cfgraph_config::ParserConfig;
use cfgraph_metadata::{AnnotationValue, AttributeValue, DescriptorIndex};
use cfgraph_parser::annotations::CONFIGURATION;
use cfgraph_parser::{ConfigurationClassParser, ParseError, ProblemKind};
use pretty_assertions::assert_eq;

use super::fixtures::{bean_method, configuration, context, seed};

fn broken_index() -> DescriptorIndex {
    let mut broken = configuration("app.Broken");
    broken.flags.is_final = true;
    let mut hidden = bean_method("app.Broken", "hidden");
    hidden.flags.private = true;
    let mut factory = bean_method("app.Broken", "factory");
    factory.flags.is_static = true;
    factory.flags.private = true;
    broken.methods.extend([hidden, factory, bean_method("app.Broken", "fine")]);

    let mut lite = configuration("app.Lite");
    lite.annotations = vec![AnnotationValue::new(CONFIGURATION)
        .with("proxyBeanMethods", AttributeValue::Bool(false))];
    lite.flags.is_final = true;

    DescriptorIndex::new().with(broken).with(lite)
}

#[test]
fn validation_collects_problems_of_proxied_classes() {
    let mut parser = ConfigurationClassParser::new(context(broken_index()));
    parser.parse(&[seed("app.Broken"), seed("app.Lite")]).unwrap();
    parser.validate().unwrap();

    let problems: Vec<_> = parser
        .problems()
        .iter()
        .map(|problem| (problem.kind, problem.message.as_str()))
        .collect();
    assert_eq!(
        problems,
        vec![
            (
                ProblemKind::FinalConfigurationClass,
                "@Configuration class 'Broken' may not be final. Remove the final modifier to continue.",
            ),
            (
                ProblemKind::NonOverridableBeanMethod,
                "@Bean method 'hidden' must not be private or final; change the method's modifiers to continue",
            ),
        ]
    );
    assert_eq!(
        parser.problems()[0].location.class_name.as_deref(),
        Some("app.Broken")
    );
}

#[test]
fn fail_fast_validation_stops_at_the_first_problem() {
    let config = ParserConfig {
        fail_fast: true,
        ..ParserConfig::default()
    };
    let mut parser = ConfigurationClassParser::new(context(broken_index()).with_config(config));
    parser.parse(&[seed("app.Broken")]).unwrap();

    match parser.validate() {
        Err(ParseError::Problem(err)) => {
            assert_eq!(err.problem.kind, ProblemKind::FinalConfigurationClass);
            assert!(err.to_string().starts_with("Configuration problem: @Configuration class 'Broken'"));
        }
        other => panic!("expected a problem, got {other:?}"),
    }
    assert_eq!(parser.problems().len(), 1);
}
