use std::sync::Arc;

use cfgraph_metadata::ClassMetadata;

use crate::annotations::{CONDITIONAL, LOWEST_PRECEDENCE, ORDER, PROFILE};
use crate::definition::BeanDefinitionRegistry;
use crate::env::Environment;
use crate::error::{ParseError, Result};
use crate::loader::ClassLoader;
use crate::resource::ResourceLoader;
use crate::strategy::StrategyContext;

/// When a condition is evaluated: while parsing configuration classes, or while registering
/// the beans they declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigurationPhase {
    ParseConfiguration,
    RegisterBean,
}

pub trait ConditionEvaluator: Send + Sync {
    fn should_skip(&self, metadata: &ClassMetadata, phase: ConfigurationPhase) -> Result<bool>;
}

/// Never skips anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopConditionEvaluator;

impl ConditionEvaluator for NoopConditionEvaluator {
    fn should_skip(&self, _metadata: &ClassMetadata, _phase: ConfigurationPhase) -> Result<bool> {
        Ok(false)
    }
}

/// Evaluates `@Profile` against the environment and `@Conditional` condition classes loaded
/// through the class loader.
pub struct StandardConditionEvaluator {
    environment: Arc<dyn Environment>,
    resource_loader: Arc<dyn ResourceLoader>,
    registry: Arc<dyn BeanDefinitionRegistry>,
    class_loader: Arc<dyn ClassLoader>,
}

impl StandardConditionEvaluator {
    pub fn new(
        environment: Arc<dyn Environment>,
        resource_loader: Arc<dyn ResourceLoader>,
        registry: Arc<dyn BeanDefinitionRegistry>,
        class_loader: Arc<dyn ClassLoader>,
    ) -> Self {
        Self {
            environment,
            resource_loader,
            registry,
            class_loader,
        }
    }

    fn context(&self) -> StrategyContext<'_> {
        StrategyContext {
            environment: self.environment.as_ref(),
            resource_loader: self.resource_loader.as_ref(),
            registry: self.registry.as_ref(),
            class_loader: self.class_loader.as_ref(),
        }
    }
}

impl ConditionEvaluator for StandardConditionEvaluator {
    fn should_skip(&self, metadata: &ClassMetadata, phase: ConfigurationPhase) -> Result<bool> {
        if let Some(profile) = metadata.annotation(PROFILE) {
            let profiles = profile.strings("value");
            if !profiles.is_empty() && !self.environment.accepts_profiles(&profiles) {
                tracing::trace!(
                    target: "cfgraph.parser",
                    class = %metadata.name,
                    ?profiles,
                    "profiles not active"
                );
                return Ok(true);
            }
        }

        let condition_classes: Vec<String> = metadata
            .annotations
            .iter()
            .filter(|annotation| annotation.type_name == CONDITIONAL)
            .flat_map(|annotation| annotation.classes("value"))
            .collect();
        if condition_classes.is_empty() {
            return Ok(false);
        }

        let context = self.context();
        let mut conditions = Vec::with_capacity(condition_classes.len());
        for class_name in &condition_classes {
            let loaded = self
                .class_loader
                .load(class_name)
                .ok_or_else(|| ParseError::ClassNotFound {
                    class_name: class_name.clone(),
                })?;
            let condition = loaded.instantiate(&context)?.into_condition(class_name)?;
            let order = condition.order().unwrap_or_else(|| {
                loaded
                    .metadata()
                    .annotation(ORDER)
                    .and_then(|order| order.int("value"))
                    .map(clamp_order)
                    .unwrap_or(LOWEST_PRECEDENCE)
            });
            conditions.push((order, class_name, condition));
        }
        conditions.sort_by_key(|(order, _, _)| *order);

        for (_, class_name, condition) in conditions {
            let applies = condition.required_phase().map_or(true, |required| required == phase);
            if applies && !condition.matches(&context, metadata) {
                tracing::trace!(
                    target: "cfgraph.parser",
                    class = %metadata.name,
                    condition = %class_name,
                    ?phase,
                    "condition did not match"
                );
                return Ok(true);
            }
        }
        Ok(false)
    }
}

pub(crate) fn clamp_order(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
