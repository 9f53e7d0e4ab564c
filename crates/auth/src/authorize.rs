//! Path + method matching over an ordered permission sequence.

use crate::Permission;
use crate::permissions::segments;

/// Which permission, if any, decided a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Permission at this index granted the request.
    Granted(usize),
    /// A whole-path wildcard at this index was reached and its action did not
    /// admit the method. Evaluation stops there.
    WildcardDenied(usize),
    /// No permission granted the request.
    NoMatch,
}

impl MatchOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted(_))
    }
}

/// Evaluate `permissions` in order against a service-relative path.
///
/// - a whole-path wildcard (`*` or `/`) decides the request on the spot
/// - a permission with a different segment count is skipped
/// - a path match with the wrong method does not stop the scan
pub fn find_grant<'a, I>(permissions: I, relative_path: &str, method: &str) -> MatchOutcome
where
    I: IntoIterator<Item = &'a Permission>,
{
    let request = segments(relative_path);

    for (index, permission) in permissions.into_iter().enumerate() {
        if permission.is_whole_path_wildcard() {
            return if permission.allows_method(method) {
                MatchOutcome::Granted(index)
            } else {
                MatchOutcome::WildcardDenied(index)
            };
        }

        if permission.matches_segments(&request) && permission.allows_method(method) {
            return MatchOutcome::Granted(index);
        }
    }

    MatchOutcome::NoMatch
}

pub fn is_authorized<'a, I>(permissions: I, relative_path: &str, method: &str) -> bool
where
    I: IntoIterator<Item = &'a Permission>,
{
    find_grant(permissions, relative_path, method).is_granted()
}
