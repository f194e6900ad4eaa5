//! Error types for caller-initiated timeline operations.
//!
//! Engine notifications never fail - stale or malformed ones degrade to
//! "this row did not update" (see the delivery and paging modules).
//! Errors exist only for direct API calls that reference entries or
//! contents by id.

use thiserror::Error;

use crate::entry::{ContentId, EntryId};

/// Errors returned by caller-initiated timeline operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimelineError {
    /// No entry with this id is currently materialized.
    #[error("no entry {0} in the current window")]
    UnknownEntry(EntryId),

    /// The message exists but has no such content part.
    #[error("message {id} has no content part {content}")]
    UnknownContent {
        /// Message that was addressed.
        id: EntryId,
        /// Content part that was not found.
        content: ContentId,
    },

    /// The content part is not a pending file transfer.
    #[error("content {content} of message {id} is not a pending download")]
    NotDownloadable {
        /// Message that was addressed.
        id: EntryId,
        /// Content part that cannot be downloaded.
        content: ContentId,
    },

    /// The message has no transfer to cancel.
    #[error("message {0} has no file transfer in progress")]
    TransferNotActive(EntryId),
}
