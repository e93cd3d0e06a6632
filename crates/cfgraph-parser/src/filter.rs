use std::fmt;
use std::sync::Arc;

/// Predicate over class names. A name the filter matches is excluded from resolution and
/// resolves to the empty `java.lang.Object` view instead.
#[derive(Clone)]
pub struct ClassFilter(Arc<dyn Fn(&str) -> bool + Send + Sync>);

impl ClassFilter {
    pub fn new(predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(predicate))
    }

    /// Matches nothing.
    pub fn none() -> Self {
        Self::new(|_| false)
    }

    /// Matches names starting with any of `prefixes`. Blank prefixes are ignored.
    pub fn prefixes<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prefixes: Vec<String> = prefixes
            .into_iter()
            .map(Into::into)
            .filter(|prefix: &String| !prefix.trim().is_empty())
            .collect();
        Self::new(move |name| prefixes.iter().any(|prefix| name.starts_with(prefix.as_str())))
    }

    pub fn matches(&self, class_name: &str) -> bool {
        (self.0)(class_name)
    }

    /// Union of both filters.
    #[must_use]
    pub fn or(&self, other: &ClassFilter) -> ClassFilter {
        let left = self.clone();
        let right = other.clone();
        Self::new(move |name| left.matches(name) || right.matches(name))
    }
}

impl fmt::Debug for ClassFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClassFilter(..)")
    }
}
