//! Live type path: types registered in-process, optionally able to produce a strategy.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use cfgraph_metadata::ClassMetadata;

use crate::error::{ParseError, Result};
use crate::strategy::{Strategy, StrategyContext, StrategyFactory};

/// A type available to the class loader. Its metadata carries no stable method order.
pub struct LoadedType {
    metadata: Arc<ClassMetadata>,
    factory: Option<StrategyFactory>,
}

impl LoadedType {
    pub fn new(metadata: ClassMetadata) -> Self {
        Self {
            metadata: Arc::new(metadata),
            factory: None,
        }
    }

    /// A type that can be instantiated as a strategy (selector, registrar, group, ...).
    pub fn strategy(
        metadata: ClassMetadata,
        factory: impl Fn(&StrategyContext<'_>) -> anyhow::Result<Strategy> + Send + Sync + 'static,
    ) -> Self {
        Self {
            metadata: Arc::new(metadata),
            factory: Some(Arc::new(factory)),
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn metadata(&self) -> &Arc<ClassMetadata> {
        &self.metadata
    }

    pub fn is_instantiable(&self) -> bool {
        self.factory.is_some()
    }

    pub fn instantiate(&self, context: &StrategyContext<'_>) -> Result<Strategy> {
        let factory = self.factory.as_ref().ok_or_else(|| ParseError::Instantiation {
            class_name: self.name().to_string(),
            source: anyhow::anyhow!("no strategy factory registered"),
        })?;
        factory(context).map_err(|source| ParseError::Instantiation {
            class_name: self.name().to_string(),
            source,
        })
    }
}

impl fmt::Debug for LoadedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedType")
            .field("name", &self.metadata.name)
            .field("instantiable", &self.factory.is_some())
            .finish()
    }
}

pub trait ClassLoader: Send + Sync {
    fn load(&self, class_name: &str) -> Option<Arc<LoadedType>>;
}

/// In-memory class loader.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: HashMap<String, Arc<LoadedType>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, loaded: LoadedType) -> Arc<LoadedType> {
        let loaded = Arc::new(loaded);
        self.types
            .insert(loaded.name().to_string(), Arc::clone(&loaded));
        loaded
    }

    #[must_use]
    pub fn with(mut self, loaded: LoadedType) -> Self {
        self.register(loaded);
        self
    }

    pub fn get(&self, class_name: &str) -> Option<&Arc<LoadedType>> {
        self.types.get(class_name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl ClassLoader for TypeRegistry {
    fn load(&self, class_name: &str) -> Option<Arc<LoadedType>> {
        self.types.get(class_name).cloned()
    }
}

impl<L: ClassLoader + ?Sized> ClassLoader for Arc<L> {
    fn load(&self, class_name: &str) -> Option<Arc<LoadedType>> {
        (**self).load(class_name)
    }
}
