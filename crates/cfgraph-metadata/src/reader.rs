use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::class::ClassMetadata;
use crate::error::{MetadataError, Result};

/// Static metadata source: reads a class description without loading the type.
///
/// Implementations must report methods in declaration order; the configuration parser
/// relies on this to order factory methods deterministically.
pub trait MetadataReader: Send + Sync {
    fn read_class(&self, class_name: &str) -> Result<Arc<ClassMetadata>>;
}

impl<R: MetadataReader + ?Sized> MetadataReader for Arc<R> {
    fn read_class(&self, class_name: &str) -> Result<Arc<ClassMetadata>> {
        (**self).read_class(class_name)
    }
}

/// On-disk descriptor format: a flat list of class descriptions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DescriptorFile {
    #[serde(default)]
    pub classes: Vec<ClassMetadata>,
}

/// In-memory set of class descriptors keyed by binary name.
#[derive(Debug, Clone, Default)]
pub struct DescriptorIndex {
    classes: HashMap<String, Arc<ClassMetadata>>,
}

impl DescriptorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mut class: ClassMetadata) -> Arc<ClassMetadata> {
        for method in &mut class.methods {
            if method.declaring_class.is_empty() {
                method.declaring_class = class.name.clone();
            }
        }
        let class = Arc::new(class);
        self.classes.insert(class.name.clone(), Arc::clone(&class));
        class
    }

    #[must_use]
    pub fn with(mut self, class: ClassMetadata) -> Self {
        self.insert(class);
        self
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

    pub fn from_json_str(text: &str) -> Result<Self> {
        let file: DescriptorFile = serde_json::from_str(text)?;
        Self::from_descriptor_file(file)
    }

    pub fn from_descriptor_file(file: DescriptorFile) -> Result<Self> {
        let mut index = Self::new();
        for class in file.classes {
            if class.name.trim().is_empty() {
                return Err(MetadataError::Malformed {
                    class_name: class.name,
                    message: "empty class name".to_string(),
                });
            }
            if index.contains(&class.name) {
                return Err(MetadataError::Malformed {
                    message: "duplicate descriptor".to_string(),
                    class_name: class.name,
                });
            }
            index.insert(class);
        }
        Ok(index)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| MetadataError::File {
            path: path.to_path_buf(),
            source,
        })?;
        let index = Self::from_json_str(&text)?;
        tracing::debug!(
            target: "cfgraph.metadata",
            path = %path.display(),
            classes = index.len(),
            "loaded class descriptor index"
        );
        Ok(index)
    }
}

impl MetadataReader for DescriptorIndex {
    fn read_class(&self, class_name: &str) -> Result<Arc<ClassMetadata>> {
        self.classes
            .get(class_name)
            .cloned()
            .ok_or_else(|| MetadataError::not_found(class_name))
    }
}

/// Memoizes successful reads of an underlying reader. Failures are not cached so a
/// transient error can succeed on a later attempt.
pub struct CachingMetadataReader<R> {
    inner: R,
    cache: Mutex<HashMap<String, Arc<ClassMetadata>>>,
}

impl<R: MetadataReader> CachingMetadataReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }
}

impl<R: MetadataReader> MetadataReader for CachingMetadataReader<R> {
    fn read_class(&self, class_name: &str) -> Result<Arc<ClassMetadata>> {
        if let Some(hit) = self.cache.lock().get(class_name) {
            return Ok(Arc::clone(hit));
        }
        let class = self.inner.read_class(class_name)?;
        self.cache
            .lock()
            .insert(class_name.to_string(), Arc::clone(&class));
        Ok(class)
    }
}
