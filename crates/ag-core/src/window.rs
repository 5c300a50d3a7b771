//! Search window predicate.

use crate::types::{ResolvedInterval, SearchWindow};

/// Decides whether a resolved interval falls inside an optional window.
///
/// - No window: everything passes, including unresolved dates.
/// - Window but no interval: rejected, the date cannot be placed.
/// - Otherwise: kept iff `from <= start <= to`. Only the start is tested.
pub fn keep(resolved: Option<&ResolvedInterval>, window: Option<&SearchWindow>) -> bool {
    match (window, resolved) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(window), Some(interval)) => window.contains(interval.start()),
    }
}
