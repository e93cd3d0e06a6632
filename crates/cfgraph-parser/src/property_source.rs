//! Named property sources and the ordered, mutable collection an environment searches.

use std::io;

use indexmap::IndexMap;

use crate::resource::Resource;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropertySourceError {
    #[error("PropertySource named '{name}' does not exist")]
    NotFound { name: String },
    #[error("PropertySource named '{name}' cannot be added relative to itself")]
    SelfRelative { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySource {
    name: String,
    kind: PropertySourceKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertySourceKind {
    Map(IndexMap<String, String>),
    /// Loaded from a resource; remembers the resource description so it can be renamed when
    /// it ends up inside a composite.
    Resource {
        resource_name: String,
        properties: IndexMap<String, String>,
    },
    /// Members in precedence order, first wins.
    Composite(Vec<PropertySource>),
}

impl PropertySource {
    pub fn map(name: impl Into<String>, properties: IndexMap<String, String>) -> Self {
        Self {
            name: name.into(),
            kind: PropertySourceKind::Map(properties),
        }
    }

    pub fn resource(
        name: impl Into<String>,
        resource_name: impl Into<String>,
        properties: IndexMap<String, String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: PropertySourceKind::Resource {
                resource_name: resource_name.into(),
                properties,
            },
        }
    }

    pub fn composite(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PropertySourceKind::Composite(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &PropertySourceKind {
        &self.kind
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.kind, PropertySourceKind::Composite(_))
    }

    pub fn resource_name(&self) -> Option<&str> {
        match &self.kind {
            PropertySourceKind::Resource { resource_name, .. } => Some(resource_name),
            _ => None,
        }
    }

    /// Members of a composite source; empty for any other kind.
    pub fn members(&self) -> &[PropertySource] {
        match &self.kind {
            PropertySourceKind::Composite(members) => members,
            _ => &[],
        }
    }

    pub fn get_property(&self, key: &str) -> Option<&str> {
        match &self.kind {
            PropertySourceKind::Map(properties)
            | PropertySourceKind::Resource { properties, .. } => {
                properties.get(key).map(String::as_str)
            }
            PropertySourceKind::Composite(members) => {
                members.iter().find_map(|member| member.get_property(key))
            }
        }
    }

    pub fn contains_property(&self, key: &str) -> bool {
        self.get_property(key).is_some()
    }

    /// A resource-backed source renamed after its resource. Any other source is returned as is.
    #[must_use]
    pub fn with_resource_name(&self) -> PropertySource {
        match &self.kind {
            PropertySourceKind::Resource { resource_name, .. } if *resource_name != self.name => {
                PropertySource {
                    name: resource_name.clone(),
                    kind: self.kind.clone(),
                }
            }
            _ => self.clone(),
        }
    }

    /// Appends a member to a composite; a member with the same name already present is kept.
    /// Returns `false` (and drops `source`) for any other kind.
    pub fn add_property_source(&mut self, source: PropertySource) -> bool {
        match &mut self.kind {
            PropertySourceKind::Composite(members) => {
                if !members.iter().any(|member| member.name == source.name) {
                    members.push(source);
                }
                true
            }
            _ => false,
        }
    }

    /// Prepends a member to a composite. Returns `false` (and drops `source`) otherwise.
    pub fn add_first_property_source(&mut self, source: PropertySource) -> bool {
        match &mut self.kind {
            PropertySourceKind::Composite(members) => {
                members.retain(|member| member.name != source.name);
                members.insert(0, source);
                true
            }
            _ => false,
        }
    }
}

/// Property sources in precedence order: earlier sources shadow later ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutablePropertySources {
    sources: Vec<PropertySource>,
}

impl MutablePropertySources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&PropertySource> {
        self.sources.iter().find(|source| source.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut PropertySource> {
        self.sources.iter_mut().find(|source| source.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertySource> {
        self.sources.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(PropertySource::name).collect()
    }

    /// Highest-precedence value for `key`.
    pub fn get_property(&self, key: &str) -> Option<String> {
        self.sources
            .iter()
            .find_map(|source| source.get_property(key))
            .map(str::to_string)
    }

    pub fn add_first(&mut self, source: PropertySource) {
        self.remove(&source.name);
        self.sources.insert(0, source);
    }

    pub fn add_last(&mut self, source: PropertySource) {
        self.remove(&source.name);
        self.sources.push(source);
    }

    pub fn add_before(
        &mut self,
        relative: &str,
        source: PropertySource,
    ) -> Result<(), PropertySourceError> {
        if relative == source.name {
            return Err(PropertySourceError::SelfRelative { name: source.name });
        }
        self.remove(&source.name);
        let index = self.require_position(relative)?;
        self.sources.insert(index, source);
        Ok(())
    }

    pub fn add_after(
        &mut self,
        relative: &str,
        source: PropertySource,
    ) -> Result<(), PropertySourceError> {
        if relative == source.name {
            return Err(PropertySourceError::SelfRelative { name: source.name });
        }
        self.remove(&source.name);
        let index = self.require_position(relative)?;
        self.sources.insert(index + 1, source);
        Ok(())
    }

    /// Replaces the source named `name` in place.
    pub fn replace(&mut self, name: &str, source: PropertySource) -> Result<(), PropertySourceError> {
        let index = self.require_position(name)?;
        self.sources[index] = source;
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<PropertySource> {
        let index = self.position(name)?;
        Some(self.sources.remove(index))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.sources.iter().position(|source| source.name == name)
    }

    fn require_position(&self, name: &str) -> Result<usize, PropertySourceError> {
        self.position(name).ok_or_else(|| PropertySourceError::NotFound {
            name: name.to_string(),
        })
    }
}

/// A resource paired with the character encoding to decode it with.
pub struct EncodedResource<'a> {
    pub resource: &'a dyn Resource,
    pub encoding: Option<&'a str>,
}

/// Builds a property source from a resource. Implementations registered as loaded types are
/// referenced through `@PropertySource(factory = ...)`.
pub trait PropertySourceFactory: Send + Sync {
    fn create_property_source(
        &self,
        name: Option<&str>,
        resource: EncodedResource<'_>,
    ) -> io::Result<PropertySource>;
}

/// Reads `.properties` text. Without an explicit encoding the bytes are decoded as
/// ISO-8859-1, like `java.util.Properties::load`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPropertySourceFactory;

impl PropertySourceFactory for DefaultPropertySourceFactory {
    fn create_property_source(
        &self,
        name: Option<&str>,
        resource: EncodedResource<'_>,
    ) -> io::Result<PropertySource> {
        let bytes = resource.resource.read_bytes()?;
        let text = decode(&bytes, resource.encoding)?;
        let properties: IndexMap<String, String> =
            cfgraph_properties::parse(&text).into_pairs().into_iter().collect();
        let description = resource.resource.description();
        let name = name.map_or_else(|| description.clone(), str::to_string);
        Ok(PropertySource::resource(name, description, properties))
    }
}

fn decode(bytes: &[u8], encoding: Option<&str>) -> io::Result<String> {
    let encoding = encoding.unwrap_or("ISO-8859-1");
    match encoding.to_ascii_uppercase().replace('_', "-").as_str() {
        "UTF-8" | "UTF8" => String::from_utf8(bytes.to_vec())
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err)),
        "ISO-8859-1" | "LATIN1" | "US-ASCII" => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unsupported encoding '{encoding}'"),
        )),
    }
}
