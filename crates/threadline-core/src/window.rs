//! Ordered store of materialized timeline entries.
//!
//! The window is the in-memory slice of the conversation history that is
//! currently loaded: index 0 is the most recent entry and timestamps are
//! non-increasing from there. It is prefix-complete; older pages are
//! appended at the tail as the user scrolls back.
//!
//! Mutating operations report which rows the renderer must re-read so
//! the common case stays O(1) instead of a full-window refresh. The
//! window is exclusively owned by one conversation view at a time, so no
//! locking is involved.

use tracing::warn;

use crate::entry::{EntryId, Message, TimelineEntry};
use crate::grouping::{self, GroupPosition};

/// Outcome of inserting a live entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Insertion {
    /// Index the entry landed at (0 unless the arrival was out of order).
    pub index: usize,
    /// Pre-existing neighbor rows whose grouping may have changed.
    pub refresh: Vec<usize>,
}

/// Outcome of appending an older page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Appended {
    /// Index of the first appended row.
    pub start: usize,
    /// Number of entries actually added (0 at end of history).
    pub added: usize,
    /// Old tail row whose grouping may have changed across the boundary.
    pub refresh: Option<usize>,
}

/// Outcome of removing an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Removal {
    /// Index the entry was removed from.
    pub index: usize,
    /// The removed entry.
    pub entry: TimelineEntry,
    /// Rows now adjacent across the gap whose grouping may have changed.
    pub refresh: Vec<usize>,
}

/// Ordered container of materialized [`TimelineEntry`] values,
/// newest-first.
#[derive(Debug, Clone)]
pub struct TimelineWindow {
    entries: Vec<TimelineEntry>,
    group_window_secs: u64,
}

impl TimelineWindow {
    /// Create an empty window with the given grouping threshold.
    pub fn new(group_window_secs: u64) -> Self {
        Self { entries: Vec::new(), group_window_secs }
    }

    /// Number of materialized entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is materialized.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at the given display index.
    pub fn get(&self, index: usize) -> Option<&TimelineEntry> {
        self.entries.get(index)
    }

    /// All materialized entries, newest-first.
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// Display index of the entry with the given id.
    ///
    /// Linear scan; windows hold tens of entries in practice. Callers
    /// fall back to a full refresh when the id is not found.
    pub fn index_of(&self, id: &EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id() == id)
    }

    /// Mutable access to the message with the given id, with its index.
    pub(crate) fn message_mut(&mut self, id: &EntryId) -> Option<(usize, &mut Message)> {
        self.entries.iter_mut().enumerate().find_map(|(i, e)| match e {
            TimelineEntry::Message(m) if &m.id == id => Some((i, m)),
            _ => None,
        })
    }

    /// Grouping position of the row at `index`.
    pub fn position(&self, index: usize) -> GroupPosition {
        grouping::position(&self.entries, index, self.group_window_secs)
    }

    /// Display-ready projection: every entry paired with its grouping
    /// position, newest-first.
    pub fn snapshot(&self) -> Vec<(&TimelineEntry, GroupPosition)> {
        self.entries.iter().enumerate().map(|(i, e)| (e, self.position(i))).collect()
    }

    /// Insert a live-arriving entry, keeping timestamps non-increasing.
    ///
    /// The entry lands at index 0 unless it arrived out of order, in
    /// which case it is slotted at the first position that preserves the
    /// order invariant (ties go above equal-timestamp entries already
    /// present, so arrival order breaks ties). Returns `None` if an
    /// entry with the same id is already materialized.
    pub(crate) fn prepend(&mut self, entry: TimelineEntry) -> Option<Insertion> {
        if self.index_of(entry.id()).is_some() {
            warn!(id = %entry.id(), "duplicate live entry ignored");
            return None;
        }

        let timestamp = entry.timestamp();
        let index = self
            .entries
            .iter()
            .position(|e| e.timestamp() <= timestamp)
            .unwrap_or(self.entries.len());
        self.entries.insert(index, entry);

        let mut refresh = Vec::new();
        if let Some(prev) = index.checked_sub(1) {
            refresh.push(prev);
        }
        if index + 1 < self.entries.len() {
            refresh.push(index + 1);
        }
        Some(Insertion { index, refresh })
    }

    /// Append a fetched older page (newest-first within the page).
    ///
    /// Entries already materialized (by id) and entries that would break
    /// the order invariant are skipped. Grouping only needs re-reading
    /// at the old tail boundary; established rows keep their positions.
    pub(crate) fn append_page(&mut self, page: Vec<TimelineEntry>) -> Appended {
        let start = self.entries.len();
        let mut last_timestamp = self.entries.last().map(TimelineEntry::timestamp);

        for entry in page {
            if self.index_of(entry.id()).is_some() {
                continue;
            }
            if last_timestamp.is_some_and(|last| entry.timestamp() > last) {
                warn!(id = %entry.id(), "out-of-order page entry skipped");
                continue;
            }
            last_timestamp = Some(entry.timestamp());
            self.entries.push(entry);
        }

        let added = self.entries.len() - start;
        let refresh = if added > 0 { start.checked_sub(1) } else { None };
        Appended { start, added, refresh }
    }

    /// Remove the entry with the given id.
    pub(crate) fn remove(&mut self, id: &EntryId) -> Option<Removal> {
        let index = self.index_of(id)?;
        let entry = self.entries.remove(index);

        let mut refresh = Vec::new();
        if let Some(prev) = index.checked_sub(1) {
            refresh.push(prev);
        }
        if index < self.entries.len() {
            refresh.push(index);
        }
        Some(Removal { index, entry, refresh })
    }

    /// Atomically replace the whole window, discarding current entries.
    ///
    /// Duplicate ids within the replacement keep their first (most
    /// recent) occurrence.
    pub(crate) fn replace(&mut self, entries: Vec<TimelineEntry>) {
        self.entries.clear();
        for entry in entries {
            if self.index_of(entry.id()).is_none() {
                self.entries.push(entry);
            }
        }
    }

    /// Drop every entry.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
