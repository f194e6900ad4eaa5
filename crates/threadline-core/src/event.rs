//! Timeline inputs.
//!
//! [`TimelineEvent`] is the complete set of inputs the caller feeds into
//! [`crate::Timeline::handle`]. Inputs come from two sources:
//!
//! - The messaging engine: live events, history pages, delivery and
//!   transfer notifications. These arrive as callbacks on the engine's
//!   single-threaded scheduler; the caller forwards them here.
//! - The renderer: scroll position updates and user deletions.
//!
//! [`RawEvent`] is the engine's wire shape for one history record before
//! normalization into a [`crate::TimelineEntry`].

use std::path::PathBuf;

use crate::action::FetchRequest;
use crate::address::PeerAddress;
use crate::entry::{ContentId, ContentKind, DeliveryState, EntryId, ParticipantImdn};

/// Engine event codes for room records.
///
/// The engine reports room events as numeric codes; codes outside this
/// set normalize to [`crate::RoomEventKind::Unknown`].
pub mod codes {
    /// Room created.
    pub const CREATED: u32 = 1;
    /// Room terminated.
    pub const TERMINATED: u32 = 2;
    /// Participant added.
    pub const PARTICIPANT_ADDED: u32 = 3;
    /// Participant removed.
    pub const PARTICIPANT_REMOVED: u32 = 4;
    /// Subject changed.
    pub const SUBJECT_CHANGED: u32 = 5;
    /// Participant granted admin.
    pub const ADMIN_SET: u32 = 6;
    /// Participant admin revoked.
    pub const ADMIN_UNSET: u32 = 7;
    /// Participant device added.
    pub const DEVICE_ADDED: u32 = 8;
    /// Participant device removed.
    pub const DEVICE_REMOVED: u32 = 9;
    /// Security incident; see [`security`] sub-codes.
    pub const SECURITY_EVENT: u32 = 10;
    /// Ephemeral messages enabled.
    pub const EPHEMERAL_ENABLED: u32 = 11;
    /// Ephemeral messages disabled.
    pub const EPHEMERAL_DISABLED: u32 = 12;
    /// Ephemeral message lifetime changed.
    pub const EPHEMERAL_LIFETIME_CHANGED: u32 = 13;

    /// Sub-codes carried by [`SECURITY_EVENT`] records.
    pub mod security {
        /// A device identity key changed.
        pub const IDENTITY_KEY_CHANGED: u32 = 1;
        /// Man-in-the-middle detected.
        pub const MAN_IN_THE_MIDDLE: u32 = 2;
        /// Security level downgraded.
        pub const LEVEL_DOWNGRADED: u32 = 3;
        /// Device count exceeded.
        pub const MAX_DEVICE_COUNT: u32 = 4;
    }
}

/// One content part of a raw message record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawContent {
    /// Content id within the message.
    pub id: ContentId,
    /// Display name (file name for file parts).
    pub name: String,
    /// What the part holds.
    pub kind: ContentKind,
    /// Local path, if the engine already knows one.
    pub file_path: Option<PathBuf>,
}

/// A raw message record from the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// Stable message id.
    pub id: EntryId,
    /// Sender address.
    pub from: PeerAddress,
    /// Send/receive time (Unix seconds).
    pub timestamp: u64,
    /// True if sent by the local user.
    pub outgoing: bool,
    /// Delivery state at read time. Read fresh from the engine whenever
    /// a page is fetched, never cached across fetches.
    pub state: DeliveryState,
    /// Content parts.
    pub contents: Vec<RawContent>,
}

/// A raw room event record from the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRoomEvent {
    /// Stable event id.
    pub id: EntryId,
    /// Numeric event code (see [`codes`]).
    pub code: u32,
    /// Security sub-code for [`codes::SECURITY_EVENT`] records.
    pub security_code: Option<u32>,
    /// Ephemeral lifetime in seconds for ephemeral records.
    pub lifetime: Option<u64>,
    /// The participant the event is about.
    pub actor: Option<PeerAddress>,
    /// New subject for subject-change records.
    pub subject: Option<String>,
    /// When it happened (Unix seconds).
    pub timestamp: u64,
}

/// A raw history record: either a message or a room event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEvent {
    /// A user-to-user message.
    Message(RawMessage),
    /// A room lifecycle event.
    Room(RawRoomEvent),
}

/// Events processed by the [`crate::Timeline`] state machine.
#[derive(Debug, Clone)]
pub enum TimelineEvent {
    /// A new event arrived live in the room.
    EventReceived(RawEvent),

    /// The engine reported a delivery state change for a message.
    MessageStateChanged {
        /// Message id the notification is about.
        id: EntryId,
        /// New delivery state. The engine is authoritative; unexpected
        /// transitions are applied anyway (and logged).
        state: DeliveryState,
    },

    /// The engine reported transfer progress for one content part.
    TransferProgress {
        /// Message id the notification is about.
        id: EntryId,
        /// Content part the bytes belong to.
        content: ContentId,
        /// Bytes transferred so far.
        offset: usize,
        /// Total bytes expected.
        total: usize,
    },

    /// A participant's delivery acknowledgement changed for a message.
    ParticipantImdnChanged {
        /// Message id the acknowledgement is about.
        id: EntryId,
        /// The participant's new acknowledgement.
        imdn: ParticipantImdn,
    },

    /// A history fetch issued earlier completed.
    HistoryFetched {
        /// The request this page answers. Stale requests (issued before
        /// a refresh or teardown) are discarded on arrival.
        request: FetchRequest,
        /// The fetched page, newest-first.
        events: Vec<RawEvent>,
    },

    /// A history fetch issued earlier failed.
    FetchFailed {
        /// The request that failed.
        request: FetchRequest,
    },

    /// The renderer's scroll position changed.
    ScrollChanged {
        /// Index of the last visible row (0 = most recent).
        last_visible: usize,
        /// Number of rows currently materialized.
        total_loaded: usize,
    },

    /// The user deleted an entry.
    EntryDeleted(EntryId),

    /// The room's capability set changed and history must be re-read
    /// from scratch from the new source.
    SourceChanged,

    /// The conversation view was torn down.
    Closed,
}
