//! Delivery state machine and transient message registry.
//!
//! The engine notifies delivery and transfer progress asynchronously,
//! long after a row may have scrolled out of view. The
//! [`DeliveryTracker`] owns the *transient set*: the ids of messages
//! still expecting callbacks. Membership is the explicit answer to "who
//! keeps this registration alive and why" - it is independent of row
//! visibility, unlike anything the renderer holds.
//!
//! Transitions are validated against the allowed edges but the engine is
//! authoritative: an unexpected edge is logged and applied anyway rather
//! than rejected, so debugging stays possible without ever desyncing
//! from the engine's view.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::entry::{ContentId, ContentKind, DeliveryState, EntryId, Message, TransferProgress};

/// True if no further subscription callbacks are expected for a message
/// in this state.
pub fn is_terminal(state: DeliveryState) -> bool {
    matches!(
        state,
        DeliveryState::Displayed | DeliveryState::NotDelivered | DeliveryState::FileTransferError
    )
}

/// True if `from -> to` is one of the allowed delivery edges.
///
/// Any state except the terminal ones may move to
/// [`DeliveryState::FileTransferError`].
pub fn allowed_transition(from: DeliveryState, to: DeliveryState) -> bool {
    use DeliveryState::{
        Delivered, DeliveredToUser, Displayed, FileTransferDone, FileTransferError,
        FileTransferInProgress, Idle, InProgress, NotDelivered,
    };

    if to == FileTransferError {
        return !is_terminal(from);
    }

    matches!(
        (from, to),
        (Idle, InProgress)
            | (InProgress, Delivered | FileTransferInProgress | NotDelivered)
            | (FileTransferInProgress, FileTransferDone | NotDelivered)
            | (FileTransferDone, Delivered)
            | (Delivered, DeliveredToUser)
            | (DeliveredToUser, Displayed)
    )
}

/// Registry of messages still expecting asynchronous notifications.
#[derive(Debug, Default)]
pub struct DeliveryTracker {
    transient: HashSet<EntryId>,
}

impl DeliveryTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked messages.
    pub fn len(&self) -> usize {
        self.transient.len()
    }

    /// True if no message is tracked.
    pub fn is_empty(&self) -> bool {
        self.transient.is_empty()
    }

    /// True if the message is still expecting callbacks.
    pub fn is_tracked(&self, id: &EntryId) -> bool {
        self.transient.contains(id)
    }

    /// Register a message on first window binding, if it still expects
    /// callbacks: non-terminal state, outgoing and not yet displayed, or
    /// an incoming message with a pending file transfer.
    ///
    /// Returns true if the message is now tracked.
    pub fn track_on_bind(&mut self, message: &Message) -> bool {
        let expects_callbacks = !is_terminal(message.delivery)
            || (message.outgoing && message.delivery != DeliveryState::Displayed)
            || (!message.outgoing && message.has_transfer_content());
        if expects_callbacks {
            self.transient.insert(message.id.clone());
        }
        expects_callbacks
    }

    /// Drop a message's registration (entry removed from the window).
    pub fn untrack(&mut self, id: &EntryId) {
        self.transient.remove(id);
    }

    /// Drop every registration (window cleared or replaced).
    pub fn clear(&mut self) {
        self.transient.clear();
    }

    /// Apply a state-changed notification to a message.
    ///
    /// The new state is applied unconditionally; a disallowed edge is
    /// only logged. Terminal states drop the message from the transient
    /// set so later spurious notifications cannot resurrect it.
    pub fn apply_state(&mut self, message: &mut Message, state: DeliveryState) {
        if !allowed_transition(message.delivery, state) {
            warn!(
                id = %message.id,
                from = ?message.delivery,
                to = ?state,
                "unexpected delivery transition, applying anyway"
            );
        }
        message.delivery = state;

        if state == DeliveryState::FileTransferDone {
            self.finish_transfer(message);
        }
        if is_terminal(state) {
            self.transient.remove(&message.id);
        }
    }

    /// Apply a transfer-progress notification to one content part.
    ///
    /// On completion (`offset == total`) the part resolves from
    /// [`ContentKind::FileTransfer`] to [`ContentKind::File`] and, for
    /// incoming messages, the staged download path moves into the
    /// persisted attachment slot. Never re-adds the message to the
    /// transient set.
    ///
    /// Returns false if the message has no such content part.
    pub fn apply_progress(
        &mut self,
        message: &mut Message,
        content_id: &ContentId,
        offset: usize,
        total: usize,
    ) -> bool {
        let done = total > 0 && offset >= total;
        let staged = message.transfer_path.clone();

        let Some(content) = message.content_mut(content_id) else {
            debug!(id = %message.id, content = %content_id, "progress for unknown content ignored");
            return false;
        };

        if done {
            content.progress = None;
            content.kind = ContentKind::File;
            if content.file_path.is_none() {
                content.file_path = staged;
            }
            info!(id = %message.id, content = %content_id, "file transfer done");
            if !message.outgoing {
                if let Some(path) = message.transfer_path.take() {
                    message.attachment_path = Some(path);
                }
            }
        } else {
            content.progress = Some(TransferProgress { offset, total });
        }
        true
    }

    /// Resolve any still-pending transfer parts after the engine reports
    /// the transfer finished at message level.
    fn finish_transfer(&mut self, message: &mut Message) {
        let staged = message.transfer_path.clone();
        for content in &mut message.contents {
            if content.kind == ContentKind::FileTransfer {
                content.kind = ContentKind::File;
                content.progress = None;
                if content.file_path.is_none() {
                    content.file_path = staged.clone();
                }
            }
        }
        if !message.outgoing {
            if let Some(path) = message.transfer_path.take() {
                message.attachment_path = Some(path);
            }
        }
    }
}
