//! Resource lookup for `@PropertySource` locations.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

pub const CLASSPATH_PREFIX: &str = "classpath:";
pub const FILE_PREFIX: &str = "file:";

pub trait Resource: Send + Sync {
    /// Human readable description used in messages and as a default property source name.
    fn description(&self) -> String;

    fn exists(&self) -> bool;

    /// Full contents. A missing resource fails with [`io::ErrorKind::NotFound`].
    fn read_bytes(&self) -> io::Result<Vec<u8>>;
}

/// Maps a location string to a resource handle. Never fails: missing resources surface when
/// they are read.
pub trait ResourceLoader: Send + Sync {
    fn get_resource(&self, location: &str) -> Box<dyn Resource>;
}

/// Resolves `classpath:` locations (and bare relative paths) against a list of root
/// directories and `file:` locations against the file system.
#[derive(Debug, Clone, Default)]
pub struct FileSystemResourceLoader {
    roots: Vec<PathBuf>,
}

impl FileSystemResourceLoader {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    fn classpath_resource(&self, relative: &str) -> FileResource {
        let relative = relative.trim_start_matches('/');
        let path = self
            .roots
            .iter()
            .map(|root| root.join(relative))
            .find(|candidate| candidate.is_file())
            .or_else(|| self.roots.first().map(|root| root.join(relative)))
            .unwrap_or_else(|| PathBuf::from(relative));
        FileResource {
            path,
            description: format!("class path resource [{relative}]"),
        }
    }
}

impl ResourceLoader for FileSystemResourceLoader {
    fn get_resource(&self, location: &str) -> Box<dyn Resource> {
        if let Some(path) = location.strip_prefix(FILE_PREFIX) {
            let path = Path::new(path).to_path_buf();
            return Box::new(FileResource {
                description: format!("file [{}]", path.display()),
                path,
            });
        }
        let relative = location.strip_prefix(CLASSPATH_PREFIX).unwrap_or(location);
        Box::new(self.classpath_resource(relative))
    }
}

#[derive(Debug, Clone)]
struct FileResource {
    path: PathBuf,
    description: String,
}

impl Resource for FileResource {
    fn description(&self) -> String {
        self.description.clone()
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn read_bytes(&self) -> io::Result<Vec<u8>> {
        std::fs::read(&self.path).map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                not_found(&self.description)
            } else {
                err
            }
        })
    }
}

/// Resources held in memory, keyed by location with any `classpath:` prefix stripped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryResourceLoader {
    resources: HashMap<String, Vec<u8>>,
}

impl InMemoryResourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, location: &str, contents: impl Into<Vec<u8>>) {
        self.resources
            .insert(normalize_location(location).to_string(), contents.into());
    }

    #[must_use]
    pub fn with(mut self, location: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(location, contents);
        self
    }
}

impl ResourceLoader for InMemoryResourceLoader {
    fn get_resource(&self, location: &str) -> Box<dyn Resource> {
        let key = normalize_location(location);
        Box::new(InMemoryResource {
            description: format!("class path resource [{key}]"),
            contents: self.resources.get(key).cloned(),
        })
    }
}

fn normalize_location(location: &str) -> &str {
    location
        .strip_prefix(CLASSPATH_PREFIX)
        .unwrap_or(location)
        .trim_start_matches('/')
}

struct InMemoryResource {
    description: String,
    contents: Option<Vec<u8>>,
}

impl Resource for InMemoryResource {
    fn description(&self) -> String {
        self.description.clone()
    }

    fn exists(&self) -> bool {
        self.contents.is_some()
    }

    fn read_bytes(&self) -> io::Result<Vec<u8>> {
        self.contents
            .clone()
            .ok_or_else(|| not_found(&self.description))
    }
}

fn not_found(description: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{description} cannot be opened because it does not exist"),
    )
}
