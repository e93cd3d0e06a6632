use serde::de::DeserializeOwned;

/// Diagnostics produced while loading a config: callers always get a `GraphConfig` when
/// deserialization succeeds, plus whatever issues were noticed on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDiagnostics {
    /// Keys present in the TOML input that the schema does not know, as dotted paths.
    pub unknown_keys: Vec<String>,
    pub warnings: Vec<ConfigWarning>,
    pub errors: Vec<ConfigValidationError>,
}

impl ConfigDiagnostics {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unknown_keys.is_empty() && self.warnings.is_empty() && self.errors.is_empty()
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// An entry of `parser.exclusion_prefixes` is blank and would exclude every class.
    BlankExclusionPrefix { index: usize },
    LoggingLevelInvalid { value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("parser.platform_prefix must not be empty")]
    EmptyPlatformPrefix,
    #[error("parser.max_depth must be at least 1")]
    ZeroMaxDepth,
}

pub(crate) fn deserialize_toml_with_unknown_keys<T: DeserializeOwned>(
    text: &str,
) -> Result<(T, Vec<String>), toml::de::Error> {
    let mut unknown = Vec::<String>::new();
    let deserializer = toml::de::Deserializer::new(text);
    let value = serde_ignored::deserialize(deserializer, |path| {
        unknown.push(path.to_string().trim_start_matches('.').to_string());
    })?;
    unknown.sort();
    unknown.dedup();
    Ok((value, unknown))
}
