use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use cfgraph_metadata::ClassMetadata;
use indexmap::IndexMap;

/// Which classes imported which. Survives the run and is handed to later stages.
#[derive(Debug, Clone, Default)]
pub struct ImportRegistry {
    imports: IndexMap<String, Vec<Arc<ClassMetadata>>>,
}

impl ImportRegistry {
    pub fn register_import(&mut self, importing: Arc<ClassMetadata>, imported: &str) {
        self.imports
            .entry(imported.to_string())
            .or_default()
            .push(importing);
    }

    /// The most recent importer of `imported`.
    pub fn importing_class_for(&self, imported: &str) -> Option<&Arc<ClassMetadata>> {
        self.imports.get(imported).and_then(|importers| importers.last())
    }

    /// Forgets one import edge from `importing` for every class it imported.
    pub fn remove_importing_class(&mut self, importing: &str) {
        for importers in self.imports.values_mut() {
            if let Some(idx) = importers.iter().position(|m| m.name == importing) {
                importers.remove(idx);
            }
        }
    }

    /// Follows importer-of-importer links from `class_name` and reports whether they lead
    /// back to it.
    pub fn is_chained_import(&self, class_name: &str) -> bool {
        let mut visited = HashSet::new();
        let mut current = self.importing_class_for(class_name);
        while let Some(importing) = current {
            if importing.name == class_name {
                return true;
            }
            if !visited.insert(importing.name.as_str()) {
                return false;
            }
            current = self.importing_class_for(&importing.name);
        }
        false
    }
}

/// The chain of configuration classes currently being processed, innermost last.
#[derive(Debug, Default)]
pub struct ImportStack {
    frames: Vec<Arc<ClassMetadata>>,
    registry: ImportRegistry,
}

impl ImportStack {
    pub fn push(&mut self, metadata: Arc<ClassMetadata>) {
        self.frames.push(metadata);
    }

    pub fn pop(&mut self) -> Option<Arc<ClassMetadata>> {
        self.frames.pop()
    }

    /// The innermost class on the stack.
    pub fn peek(&self) -> Option<&Arc<ClassMetadata>> {
        self.frames.last()
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.frames.iter().any(|m| m.name == class_name)
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// `class_name` is on the stack and its importer chain leads back to it.
    pub fn is_chained_import_on_stack(&self, class_name: &str) -> bool {
        self.contains(class_name) && self.registry.is_chained_import(class_name)
    }

    pub fn registry(&self) -> &ImportRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ImportRegistry {
        &mut self.registry
    }

    pub fn into_registry(self) -> ImportRegistry {
        self.registry
    }
}

/// Renders innermost first, e.g. `[Child->Parent->Root]`.
impl fmt::Display for ImportStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (idx, frame) in self.frames.iter().rev().enumerate() {
            if idx > 0 {
                f.write_str("->")?;
            }
            f.write_str(&frame.simple_name())?;
        }
        f.write_str("]")
    }
}
