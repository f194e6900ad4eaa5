//! Timeline outputs.
//!
//! [`TimelineAction`] instructions are produced by
//! [`crate::Timeline::handle`] for the caller to execute: engine calls
//! (history fetches, downloads, cancellations) and renderer updates
//! (row-level change notifications).

use std::path::PathBuf;

use crate::entry::{ContentId, EntryId};

/// One in-flight history fetch.
///
/// The generation stamp ties the request to the window state it was
/// issued against; completions carrying an older generation are
/// discarded instead of being applied to a stale store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    /// Window generation at issue time.
    pub generation: u64,
    /// First history index to fetch (inclusive).
    pub start: usize,
    /// One past the last history index to fetch.
    pub end: usize,
}

/// Actions produced by the timeline for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineAction {
    /// Ask the engine for the history range carried by the request.
    FetchHistory(FetchRequest),

    /// A row was inserted at the given index; rows below shifted down.
    RowInserted(usize),

    /// `count` rows were appended starting at index `start`.
    RowsAppended {
        /// Index of the first appended row.
        start: usize,
        /// Number of appended rows.
        count: usize,
    },

    /// The row at the given index was removed.
    RowRemoved(usize),

    /// The row at the given index changed and must be re-read.
    RefreshRow(usize),

    /// The whole window changed and must be re-read.
    RefreshAll,

    /// The window was atomically replaced; discard all rendered state.
    Reset,

    /// Ask the engine to download a content part to the bound path.
    StartDownload {
        /// Message owning the content.
        id: EntryId,
        /// Content part to download.
        content: ContentId,
        /// Collision-free local destination.
        path: PathBuf,
    },

    /// Ask the engine to cancel the message's active transfer.
    CancelTransfer(EntryId),
}
