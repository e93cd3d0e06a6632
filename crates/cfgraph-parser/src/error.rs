use cfgraph_metadata::MetadataError;

use crate::env::PlaceholderError;
use crate::problems::ProblemError;
use crate::property_source::PropertySourceError;

pub type Result<T, E = ParseError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("failed to read metadata for class [{class_name}]")]
    Metadata {
        class_name: String,
        #[source]
        source: MetadataError,
    },

    #[error("class [{class_name}] cannot be loaded")]
    ClassNotFound { class_name: String },

    #[error("no bean class name for configuration class bean definition [{bean_name}]")]
    MissingBeanClassName { bean_name: String },

    #[error(transparent)]
    Placeholder(#[from] PlaceholderError),

    #[error("failed to load {description}")]
    Resource {
        description: String,
        #[source]
        source: std::io::Error,
    },

    #[error("at least one @PropertySource(value) location is required on [{class_name}]")]
    MissingPropertySourceLocation { class_name: String },

    #[error(transparent)]
    PropertySource(#[from] PropertySourceError),

    #[error("failed to instantiate [{class_name}]")]
    Instantiation {
        class_name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("[{class_name}] was expected to produce {expected} but produced {actual}")]
    StrategyMismatch {
        class_name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("configuration classes nested deeper than {limit} levels at [{class_name}]")]
    RecursionLimit { class_name: String, limit: usize },

    #[error("deferred import originates from unknown configuration class [{class_name}]")]
    UnknownDeferredOrigin { class_name: String },

    #[error(transparent)]
    Problem(#[from] ProblemError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ParseError {
    pub(crate) fn metadata(class_name: impl Into<String>, source: MetadataError) -> Self {
        ParseError::Metadata {
            class_name: class_name.into(),
            source,
        }
    }

    /// Failures an `ignoreResourceNotFound` property source may swallow: an unresolvable
    /// placeholder in the location, or a resource that does not exist.
    pub fn is_resource_not_found(&self) -> bool {
        match self {
            ParseError::Placeholder(_) => true,
            ParseError::Resource { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// Wraps this failure with the class whose import candidates were being processed.
    /// Store failures and fail-fast problems pass through unchanged.
    pub(crate) fn in_import_candidates_of(self, class_name: &str) -> Self {
        match self {
            ParseError::Store(_) | ParseError::Problem(_) => self,
            other => ParseError::Store(StoreError::new(
                format!("Failed to process import candidates for configuration class [{class_name}]"),
                other,
            )),
        }
    }

    /// Wraps this failure with the configuration class being parsed from a bean definition.
    /// Store failures and fail-fast problems pass through unchanged.
    pub(crate) fn in_configuration_class(self, class_name: &str) -> Self {
        match self {
            ParseError::Store(_) | ParseError::Problem(_) => self,
            other => ParseError::Store(StoreError::new(
                format!("Failed to parse configuration class [{class_name}]"),
                other,
            )),
        }
    }
}

/// A failure already attributed to the configuration class it originated from.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct StoreError {
    message: String,
    #[source]
    source: Box<ParseError>,
}

impl StoreError {
    fn new(message: String, source: ParseError) -> Self {
        Self {
            message,
            source: Box::new(source),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The failure this error wraps.
    pub fn cause(&self) -> &ParseError {
        &self.source
    }
}
