//! Bubble grouping resolution.
//!
//! Two adjacent messages group into one visual bubble stack when they
//! come from the same sender (weak address match) and their timestamps
//! are within [`crate::TimelineConfig::group_window_secs`] of each
//! other. Room events never group and break grouping on both sides.
//!
//! The window is newest-first, so the neighbor at `index - 1` is
//! chronologically *later* and the neighbor at `index + 1` is
//! chronologically *earlier*. A neighbor index outside the materialized
//! window counts as no neighbor, even if more history exists on disk;
//! rendering an existing row must never wait on a page fetch.

use crate::entry::TimelineEntry;

/// Visual position of a message within its bubble stack.
///
/// Display order is newest-first, so the most recent message of a run
/// sits at the *bottom* of the rendered stack and the oldest at the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupPosition {
    /// Not grouped with either neighbor.
    Isolated,
    /// Oldest message of a run (no earlier same-sender neighbor).
    Top,
    /// Surrounded by same-sender neighbors on both sides.
    Middle,
    /// Most recent message of a run (no later same-sender neighbor).
    Bottom,
}

impl GroupPosition {
    fn from_flags(has_prior: bool, has_next: bool) -> Self {
        match (has_prior, has_next) {
            (false, false) => Self::Isolated,
            (false, true) => Self::Bottom,
            (true, true) => Self::Middle,
            (true, false) => Self::Top,
        }
    }
}

/// Resolve the grouping position of the entry at `index`.
///
/// Pure function of the (prev, self, next) display-order triple. Room
/// events are always [`GroupPosition::Isolated`].
pub fn position(entries: &[TimelineEntry], index: usize, group_window_secs: u64) -> GroupPosition {
    let Some(entry) = entries.get(index) else {
        return GroupPosition::Isolated;
    };
    if entry.as_message().is_none() {
        return GroupPosition::Isolated;
    }

    let has_prior = index
        .checked_sub(1)
        .and_then(|i| entries.get(i))
        .is_some_and(|prev| groups_with(entry, prev, group_window_secs));
    let has_next =
        entries.get(index + 1).is_some_and(|next| groups_with(entry, next, group_window_secs));

    GroupPosition::from_flags(has_prior, has_next)
}

/// True if two adjacent entries belong to the same bubble stack.
fn groups_with(a: &TimelineEntry, b: &TimelineEntry, group_window_secs: u64) -> bool {
    match (a.as_message(), b.as_message()) {
        (Some(a), Some(b)) => {
            a.from.weak_eq(&b.from) && a.timestamp.abs_diff(b.timestamp) < group_window_secs
        },
        _ => false,
    }
}
