//! Configuration and logging setup for configuration graph resolution.
//!
//! A `GraphConfig` is read from TOML:
//!
//! ```toml
//! [parser]
//! platform_prefix = "java"
//! exclusion_prefixes = ["java.lang.annotation.", "org.springframework.stereotype."]
//! max_depth = 256
//! fail_fast = false
//!
//! [logging]
//! level = "info"
//! json = false
//! ```

use std::path::Path;
use std::sync::Once;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::prelude::*;

mod diagnostics;

pub use diagnostics::{ConfigDiagnostics, ConfigValidationError, ConfigWarning};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Name prefix of the platform/runtime namespace. Superclasses and annotations under it
    /// carry no user-meaningful configuration metadata and are never followed.
    #[serde(default = "ParserConfig::default_platform_prefix")]
    pub platform_prefix: String,

    /// Classes whose names start with any of these prefixes resolve to the empty `Object`
    /// view instead of being read.
    #[serde(default = "ParserConfig::default_exclusion_prefixes")]
    pub exclusion_prefixes: Vec<String>,

    /// Maximum nesting of configuration classes processed inside each other (imports,
    /// member classes, scan results). Exceeding it aborts the run instead of overflowing
    /// the stack on pathological metadata.
    #[serde(default = "ParserConfig::default_max_depth")]
    pub max_depth: usize,

    /// Abort the run on the first reported problem instead of collecting problems.
    #[serde(default)]
    pub fail_fast: bool,
}

impl ParserConfig {
    fn default_platform_prefix() -> String {
        "java".to_owned()
    }

    fn default_exclusion_prefixes() -> Vec<String> {
        vec![
            "java.lang.annotation.".to_owned(),
            "org.springframework.stereotype.".to_owned(),
        ]
    }

    fn default_max_depth() -> usize {
        // Each nested level costs a handful of parser frames; 256 stays well inside the
        // default 8 MiB main-thread stack and far beyond hand-written import chains.
        256
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            platform_prefix: Self::default_platform_prefix(),
            exclusion_prefixes: Self::default_exclusion_prefixes(),
            max_depth: Self::default_max_depth(),
            fail_fast: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Either a simple level (`info`, `debug`, ...) or a full `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "trace" => "trace".to_owned(),
            "debug" => "debug".to_owned(),
            "info" => "info".to_owned(),
            "warn" | "warning" => "warn".to_owned(),
            "error" => "error".to_owned(),
            _ => trimmed.to_owned(),
        }
    }

    fn config_env_filter(&self) -> tracing_subscriber::EnvFilter {
        let directives = Self::normalize_level_directives(&self.level);
        tracing_subscriber::EnvFilter::try_new(directives).unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::default()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        })
    }

    /// Effective filter: the configured directives with `RUST_LOG` merged on top.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let env_directives = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        match env_directives {
            Some(env_directives) => {
                let config_directives = Self::normalize_level_directives(&self.level);
                tracing_subscriber::EnvFilter::try_new(format!("{config_directives},{env_directives}"))
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(env_directives))
                    .unwrap_or_else(|_| self.config_env_filter())
            }
            None => self.config_env_filter(),
        }
    }

    fn level_is_valid(&self) -> bool {
        tracing_subscriber::EnvFilter::try_new(Self::normalize_level_directives(&self.level))
            .is_ok()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
    #[error("invalid config: {0}")]
    Invalid(#[from] ConfigValidationError),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // The default `Display` embeds a source snippet; keep just the message.
        ConfigError::Toml(err.message().to_owned())
    }
}

impl GraphConfig {
    /// Load and validate a config file. Unknown keys are ignored; use
    /// [`GraphConfig::load_from_str_with_diagnostics`] to surface them.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_from_str(&text)
    }

    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        let config: GraphConfig = toml::from_str(text)?;
        if let Some(err) = config.validation_errors().into_iter().next() {
            return Err(err.into());
        }
        Ok(config)
    }

    /// Load a config and report unknown keys, warnings and validation errors without
    /// failing on them.
    pub fn load_from_str_with_diagnostics(
        text: &str,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let (config, unknown_keys) =
            diagnostics::deserialize_toml_with_unknown_keys::<GraphConfig>(text)?;

        let diagnostics = ConfigDiagnostics {
            unknown_keys,
            warnings: config.validation_warnings(),
            errors: config.validation_errors(),
        };
        Ok((config, diagnostics))
    }

    fn validation_errors(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();
        if self.parser.platform_prefix.trim().is_empty() {
            errors.push(ConfigValidationError::EmptyPlatformPrefix);
        }
        if self.parser.max_depth == 0 {
            errors.push(ConfigValidationError::ZeroMaxDepth);
        }
        errors
    }

    fn validation_warnings(&self) -> Vec<ConfigWarning> {
        let mut warnings: Vec<ConfigWarning> = self
            .parser
            .exclusion_prefixes
            .iter()
            .enumerate()
            .filter(|(_, prefix)| prefix.trim().is_empty())
            .map(|(index, _)| ConfigWarning::BlankExclusionPrefix { index })
            .collect();
        if !self.logging.level_is_valid() {
            warnings.push(ConfigWarning::LoggingLevelInvalid {
                value: self.logging.level.clone(),
            });
        }
        warnings
    }
}

static TRACING_INIT: Once = Once::new();

/// Install the global `tracing` subscriber described by `config`.
///
/// Safe to call multiple times; only the first call installs a subscriber, and a subscriber
/// installed by someone else is left in place.
pub fn init_tracing(config: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let filter = config.env_filter();
        let layer: Box<dyn tracing_subscriber::Layer<_> + Send + Sync> = if config.json {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .boxed()
        };

        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init()
            .is_ok();
        if installed {
            tracing::debug!(target: "cfgraph.config", level = %config.level, "tracing initialized");
        }
    });
}
