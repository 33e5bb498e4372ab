//! Usage: Paths that never receive an injected bearer credential (login, register, public routes).

use crate::infra::config::DEFAULT_EXCLUDED_PATHS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionPolicy {
    fragments: Vec<String>,
}

impl Default for ExclusionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_PATHS)
    }
}

impl ExclusionPolicy {
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments
                .into_iter()
                .map(Into::into)
                .filter(|v: &String| !v.is_empty())
                .collect(),
        }
    }

    /// A path is excluded when it contains any configured fragment.
    pub fn is_excluded(&self, path: Option<&str>) -> bool {
        let path = path.unwrap_or_default();
        self.fragments
            .iter()
            .any(|fragment| path.contains(fragment.as_str()))
    }
}
