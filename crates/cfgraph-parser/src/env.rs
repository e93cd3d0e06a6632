//! Environment abstraction: property lookup, `${...}` placeholder resolution and profiles.

use std::collections::HashSet;

use parking_lot::RwLock;

use crate::property_source::{MutablePropertySources, PropertySource};

const PREFIX: &str = "${";
const SUFFIX: char = '}';
const VALUE_SEPARATOR: char = ':';

pub const ACTIVE_PROFILES_PROPERTY: &str = "spring.profiles.active";
pub const DEFAULT_PROFILE: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaceholderError {
    #[error("Could not resolve placeholder '{placeholder}' in value \"{value}\"")]
    Unresolvable { placeholder: String, value: String },
    #[error("Circular placeholder reference '{placeholder}' in property definitions")]
    Circular { placeholder: String },
}

pub trait Environment: Send + Sync {
    fn get_property(&self, key: &str) -> Option<String>;

    fn active_profiles(&self) -> Vec<String>;

    fn default_profiles(&self) -> Vec<String> {
        vec![DEFAULT_PROFILE.to_string()]
    }

    /// Resolves `${...}` placeholders, leaving unresolvable ones untouched.
    fn resolve_placeholders(&self, text: &str) -> String {
        let lookup = |key: &str| self.get_property(key);
        resolve(text, &lookup, true).unwrap_or_else(|_| text.to_string())
    }

    fn resolve_required_placeholders(&self, text: &str) -> Result<String, PlaceholderError> {
        let lookup = |key: &str| self.get_property(key);
        resolve(text, &lookup, false)
    }

    /// The mutable property sources backing this environment, if it exposes them.
    fn mutable_property_sources(&self) -> Option<&RwLock<MutablePropertySources>> {
        None
    }

    /// Whether any of `profiles` is active. A `!name` entry matches when `name` is not active.
    fn accepts_profiles(&self, profiles: &[String]) -> bool {
        let active = self.active_profiles();
        let defaults = self.default_profiles();
        let is_active = |profile: &str| {
            if active.is_empty() {
                defaults.iter().any(|p| p == profile)
            } else {
                active.iter().any(|p| p == profile)
            }
        };
        profiles.iter().any(|profile| match profile.trim().strip_prefix('!') {
            Some(negated) => !is_active(negated.trim()),
            None => is_active(profile.trim()),
        })
    }
}

/// Configurable environment backed by ordered property sources.
#[derive(Debug, Default)]
pub struct StandardEnvironment {
    property_sources: RwLock<MutablePropertySources>,
    active_profiles: RwLock<Vec<String>>,
}

impl StandardEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_property_source(self, source: PropertySource) -> Self {
        self.property_sources.write().add_last(source);
        self
    }

    #[must_use]
    pub fn with_active_profiles<I, S>(self, profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_active_profiles(profiles);
        self
    }

    pub fn set_active_profiles<I, S>(&self, profiles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.active_profiles.write() = profiles.into_iter().map(Into::into).collect();
    }

    pub fn property_sources(&self) -> &RwLock<MutablePropertySources> {
        &self.property_sources
    }

    /// Names of the property sources in precedence order.
    pub fn property_source_names(&self) -> Vec<String> {
        self.property_sources
            .read()
            .iter()
            .map(|source| source.name().to_string())
            .collect()
    }
}

impl Environment for StandardEnvironment {
    fn get_property(&self, key: &str) -> Option<String> {
        self.property_sources.read().get_property(key)
    }

    fn active_profiles(&self) -> Vec<String> {
        let explicit = self.active_profiles.read();
        if !explicit.is_empty() {
            return explicit.clone();
        }
        self.get_property(ACTIVE_PROFILES_PROPERTY)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn mutable_property_sources(&self) -> Option<&RwLock<MutablePropertySources>> {
        Some(&self.property_sources)
    }
}

/// Read-only view of an environment: lookups and profiles work, but property sources cannot
/// be added through it.
#[derive(Debug, Default)]
pub struct ReadOnlyEnvironment {
    inner: StandardEnvironment,
}

impl ReadOnlyEnvironment {
    pub fn new(inner: StandardEnvironment) -> Self {
        Self { inner }
    }
}

impl Environment for ReadOnlyEnvironment {
    fn get_property(&self, key: &str) -> Option<String> {
        self.inner.get_property(key)
    }

    fn active_profiles(&self) -> Vec<String> {
        self.inner.active_profiles()
    }
}

fn resolve(
    text: &str,
    lookup: &dyn Fn(&str) -> Option<String>,
    ignore_unresolvable: bool,
) -> Result<String, PlaceholderError> {
    let mut visiting = HashSet::new();
    parse_value(text, lookup, ignore_unresolvable, &mut visiting)
}

fn parse_value(
    value: &str,
    lookup: &dyn Fn(&str) -> Option<String>,
    ignore_unresolvable: bool,
    visiting: &mut HashSet<String>,
) -> Result<String, PlaceholderError> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find(PREFIX) {
        out.push_str(&rest[..start]);
        let body_start = start + PREFIX.len();
        let Some(body_len) = placeholder_end(&rest[body_start..]) else {
            out.push_str(&rest[start..]);
            return Ok(out);
        };
        let raw = &rest[body_start..body_start + body_len];
        let after = &rest[body_start + body_len + SUFFIX.len_utf8()..];

        if !visiting.insert(raw.to_string()) {
            return Err(PlaceholderError::Circular {
                placeholder: raw.to_string(),
            });
        }
        let placeholder = parse_value(raw, lookup, ignore_unresolvable, visiting)?;

        let mut resolved = lookup(&placeholder);
        if resolved.is_none() {
            if let Some((key, default)) = placeholder.split_once(VALUE_SEPARATOR) {
                resolved = Some(lookup(key).unwrap_or_else(|| default.to_string()));
            }
        }

        match resolved {
            Some(resolved) => {
                let resolved = parse_value(&resolved, lookup, ignore_unresolvable, visiting)?;
                out.push_str(&resolved);
            }
            None if ignore_unresolvable => {
                out.push_str(PREFIX);
                out.push_str(raw);
                out.push(SUFFIX);
            }
            None => {
                return Err(PlaceholderError::Unresolvable {
                    placeholder,
                    value: value.to_string(),
                })
            }
        }
        visiting.remove(raw);
        rest = after;
    }

    out.push_str(rest);
    Ok(out)
}

/// Byte length of the placeholder body, honouring nested `${...}`.
fn placeholder_end(body: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut idx = 0usize;
    while idx < body.len() {
        let rest = &body[idx..];
        if rest.starts_with(PREFIX) {
            depth += 1;
            idx += PREFIX.len();
            continue;
        }
        let ch = rest.chars().next()?;
        if ch == SUFFIX {
            if depth == 0 {
                return Some(idx);
            }
            depth -= 1;
        }
        idx += ch.len_utf8();
    }
    None
}
