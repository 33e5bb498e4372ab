//! Usage: Request identity used to deduplicate concurrent identical requests.

use reqwest::Method;
use std::fmt;

/// `<lowercase method>-<path>`, e.g. `get-/data`.
///
/// Query string and body are not part of the identity: two requests that
/// differ only in payload collide and dedup against each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestIdentity(String);

impl RequestIdentity {
    pub fn new(method: &Method, path: Option<&str>) -> Self {
        let method = method.as_str().to_ascii_lowercase();
        Self(format!("{method}-{}", path.unwrap_or_default()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
