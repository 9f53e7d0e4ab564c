use serde::{Deserialize, Serialize};

use pmgate_core::{DomainError, DomainResult};

/// One authorization rule: a path pattern relative to the target service and
/// the HTTP method it grants.
///
/// Pattern segments are `/`-separated. A segment that is exactly `*` or is
/// wrapped in braces (`{id}`) matches any single segment. A whole pattern of
/// `*` or `/` matches every path. The action is a method name compared
/// case-insensitively, or `any`/`*` for every method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    pub path: String,
    pub action: String,
}

impl Permission {
    pub fn new(path: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            action: action.into(),
        }
    }

    /// Like [`Permission::new`] but rejects blank paths and actions.
    pub fn try_new(path: impl Into<String>, action: impl Into<String>) -> DomainResult<Self> {
        let permission = Self::new(path, action);
        permission.validate()?;
        Ok(permission)
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.path.trim().is_empty() {
            return Err(DomainError::validation("permission path must not be empty"));
        }
        if self.action.trim().is_empty() {
            return Err(DomainError::validation(format!(
                "permission action for '{}' must not be empty",
                self.path
            )));
        }
        Ok(())
    }

    /// `*` or `/`: the rule covers every path of the service.
    pub fn is_whole_path_wildcard(&self) -> bool {
        self.path == "*" || self.path == "/"
    }

    /// Whether this rule's action admits `method`.
    ///
    /// `OPTIONS` and `HEAD` are always admitted.
    pub fn allows_method(&self, method: &str) -> bool {
        let action = self.action.trim();
        if action.eq_ignore_ascii_case("any") || action == "*" {
            return true;
        }
        if method.eq_ignore_ascii_case("options") || method.eq_ignore_ascii_case("head") {
            return true;
        }
        method.eq_ignore_ascii_case(action)
    }

    /// Segment-wise match against an already split request path.
    ///
    /// Differing segment counts never match. Non-wildcard segments compare
    /// case-sensitively.
    pub fn matches_segments(&self, request: &[&str]) -> bool {
        let pattern = segments(&self.path);
        pattern.len() == request.len()
            && pattern
                .iter()
                .zip(request)
                .all(|(p, r)| is_wildcard_segment(p) || p == r)
    }

    pub fn matches_path(&self, relative_path: &str) -> bool {
        self.matches_segments(&segments(relative_path))
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {}", self.action, self.path)
    }
}

/// Split a path on `/`, dropping trailing empty segments (`/cart/` == `/cart`).
///
/// A leading `/` yields an empty first segment, so `/cart` and `cart` differ.
pub fn segments(path: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = path.split('/').collect();
    while parts.last() == Some(&"") {
        parts.pop();
    }
    parts
}

fn is_wildcard_segment(segment: &str) -> bool {
    segment == "*" || (segment.len() >= 2 && segment.starts_with('{') && segment.ends_with('}'))
}
