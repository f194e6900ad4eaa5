//! Timeline entry model.
//!
//! A conversation window is a sequence of [`TimelineEntry`] values: either
//! a user-to-user [`Message`] (text and/or file contents with delivery
//! state) or a [`RoomEvent`] (participant joined, subject changed, and so
//! on). Every entry carries a stable id usable as a lookup key and a
//! monotonically comparable timestamp.
//!
//! Normalization from the engine's raw records lives here as well; it is
//! a pure mapping with no failure mode beyond classifying unrecognized
//! event codes as [`RoomEventKind::Unknown`].

use std::fmt;
use std::path::PathBuf;

use crate::address::PeerAddress;
use crate::event::{RawContent, RawEvent, RawMessage, RawRoomEvent, codes};

/// Stable identity of a timeline entry, assigned by the engine.
///
/// Valid as a lookup key independently of the entry's window position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryId(String);

impl EntryId {
    /// Create an id from its string form.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Identity of one content part inside a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentId(String);

impl ContentId {
    /// Create a content id from its string form.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Message-level delivery state, driven by engine notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    /// No delivery attempt recorded yet.
    Idle,
    /// Send (or receive) in progress.
    InProgress,
    /// Accepted by the remote server.
    Delivered,
    /// Delivered to the recipient's device (IMDN delivered).
    DeliveredToUser,
    /// Displayed on the recipient's screen (IMDN displayed).
    Displayed,
    /// Delivery failed.
    NotDelivered,
    /// An attached file transfer is uploading or downloading.
    FileTransferInProgress,
    /// The attached file transfer completed.
    FileTransferDone,
    /// The attached file transfer failed.
    FileTransferError,
}

/// Bytes-on-the-wire progress of one content transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    /// Bytes transferred so far.
    pub offset: usize,
    /// Total bytes expected.
    pub total: usize,
}

/// What a content part holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Plain text body.
    Text,
    /// A file available locally.
    File,
    /// A file still being transferred (or not yet downloaded).
    FileTransfer,
}

/// One content part of a message. Contents are owned by their message
/// and never outlive it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    /// Identity of this part within its message.
    pub id: ContentId,
    /// Display name (file name for file parts, empty for text).
    pub name: String,
    /// What this part holds.
    pub kind: ContentKind,
    /// Local path, once one is known (bound download destination or
    /// completed file).
    pub file_path: Option<PathBuf>,
    /// Transfer progress while `kind` is [`ContentKind::FileTransfer`].
    pub progress: Option<TransferProgress>,
}

/// Per-participant delivery acknowledgement (IMDN) for a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantImdn {
    /// The participant this acknowledgement came from.
    pub participant: PeerAddress,
    /// That participant's view of the message.
    pub state: DeliveryState,
    /// When the acknowledgement was produced (Unix seconds).
    pub timestamp: u64,
}

/// A user-to-user message in the timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Stable message id.
    pub id: EntryId,
    /// Sender address.
    pub from: PeerAddress,
    /// Send/receive time (Unix seconds).
    pub timestamp: u64,
    /// True if this message was sent by the local user.
    pub outgoing: bool,
    /// Current delivery state.
    pub delivery: DeliveryState,
    /// Content parts, in wire order.
    pub contents: Vec<Content>,
    /// Per-participant acknowledgements, most recent per participant.
    pub participant_states: Vec<ParticipantImdn>,
    /// Staging path while an incoming download is running.
    pub transfer_path: Option<PathBuf>,
    /// Persisted attachment path once an incoming download completed.
    pub attachment_path: Option<PathBuf>,
}

impl Message {
    /// True if any content part is still a pending or running transfer.
    pub fn has_transfer_content(&self) -> bool {
        self.contents.iter().any(|c| c.kind == ContentKind::FileTransfer)
    }

    /// Mutable content part by id. `None` if the message has no such part.
    pub fn content_mut(&mut self, id: &ContentId) -> Option<&mut Content> {
        self.contents.iter_mut().find(|c| &c.id == id)
    }

    /// Content part by id.
    pub fn content(&self, id: &ContentId) -> Option<&Content> {
        self.contents.iter().find(|c| &c.id == id)
    }

    /// Record a participant acknowledgement, replacing any previous one
    /// from the same participant (weak address match).
    pub fn record_participant_state(&mut self, imdn: ParticipantImdn) {
        if let Some(existing) =
            self.participant_states.iter_mut().find(|p| p.participant.weak_eq(&imdn.participant))
        {
            *existing = imdn;
        } else {
            self.participant_states.push(imdn);
        }
    }
}

/// Security incident reported inside a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEventKind {
    /// A participant device's identity key changed.
    IdentityKeyChanged,
    /// A man-in-the-middle was detected during key exchange.
    ManInTheMiddleDetected,
    /// The room's security level was downgraded.
    SecurityLevelDowngraded,
    /// A participant exceeded the allowed device count.
    MaxDeviceCountExceeded,
}

/// Room lifecycle event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomEventKind {
    /// The room was created.
    Created,
    /// The room was terminated.
    Terminated,
    /// A participant joined.
    ParticipantAdded,
    /// A participant left or was removed.
    ParticipantRemoved,
    /// The room subject changed.
    SubjectChanged,
    /// A participant was granted admin rights.
    AdminSet,
    /// A participant lost admin rights.
    AdminUnset,
    /// A participant registered a new device.
    DeviceAdded,
    /// A participant removed a device.
    DeviceRemoved,
    /// Ephemeral messages were enabled with the given lifetime (seconds).
    EphemeralEnabled(u64),
    /// Ephemeral messages were disabled.
    EphemeralDisabled,
    /// The ephemeral message lifetime changed (seconds).
    EphemeralLifetimeChanged(u64),
    /// A security incident was reported.
    SecurityEvent(SecurityEventKind),
    /// An event code this version does not classify. Kept rather than
    /// dropped so the timeline never silently loses history.
    Unknown(u32),
}

/// A non-message occurrence in the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomEvent {
    /// Stable event id.
    pub id: EntryId,
    /// What happened.
    pub kind: RoomEventKind,
    /// The participant the event is about, when applicable.
    pub actor: Option<PeerAddress>,
    /// New subject for [`RoomEventKind::SubjectChanged`].
    pub subject: Option<String>,
    /// When it happened (Unix seconds).
    pub timestamp: u64,
}

/// One row of the conversation window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineEntry {
    /// A user-to-user message.
    Message(Message),
    /// A room lifecycle event.
    Room(RoomEvent),
}

impl TimelineEntry {
    /// Stable id of this entry.
    pub fn id(&self) -> &EntryId {
        match self {
            Self::Message(m) => &m.id,
            Self::Room(e) => &e.id,
        }
    }

    /// Timestamp of this entry (Unix seconds).
    pub fn timestamp(&self) -> u64 {
        match self {
            Self::Message(m) => m.timestamp,
            Self::Room(e) => e.timestamp,
        }
    }

    /// The message, if this entry is one.
    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Self::Message(m) => Some(m),
            Self::Room(_) => None,
        }
    }

    /// Normalize a raw engine record into a timeline entry.
    ///
    /// Pure and total: unrecognized room event codes become
    /// [`RoomEventKind::Unknown`] instead of failing.
    pub fn from_raw(raw: RawEvent) -> Self {
        match raw {
            RawEvent::Message(m) => Self::Message(normalize_message(m)),
            RawEvent::Room(e) => Self::Room(normalize_room_event(e)),
        }
    }
}

fn normalize_message(raw: RawMessage) -> Message {
    Message {
        id: raw.id,
        from: raw.from,
        timestamp: raw.timestamp,
        outgoing: raw.outgoing,
        delivery: raw.state,
        contents: raw.contents.into_iter().map(normalize_content).collect(),
        participant_states: Vec::new(),
        transfer_path: None,
        attachment_path: None,
    }
}

fn normalize_content(raw: RawContent) -> Content {
    Content {
        id: raw.id,
        name: raw.name,
        kind: raw.kind,
        file_path: raw.file_path,
        progress: None,
    }
}

fn normalize_room_event(raw: RawRoomEvent) -> RoomEvent {
    let kind = match raw.code {
        codes::CREATED => RoomEventKind::Created,
        codes::TERMINATED => RoomEventKind::Terminated,
        codes::PARTICIPANT_ADDED => RoomEventKind::ParticipantAdded,
        codes::PARTICIPANT_REMOVED => RoomEventKind::ParticipantRemoved,
        codes::SUBJECT_CHANGED => RoomEventKind::SubjectChanged,
        codes::ADMIN_SET => RoomEventKind::AdminSet,
        codes::ADMIN_UNSET => RoomEventKind::AdminUnset,
        codes::DEVICE_ADDED => RoomEventKind::DeviceAdded,
        codes::DEVICE_REMOVED => RoomEventKind::DeviceRemoved,
        codes::EPHEMERAL_ENABLED => RoomEventKind::EphemeralEnabled(raw.lifetime.unwrap_or(0)),
        codes::EPHEMERAL_DISABLED => RoomEventKind::EphemeralDisabled,
        codes::EPHEMERAL_LIFETIME_CHANGED => {
            RoomEventKind::EphemeralLifetimeChanged(raw.lifetime.unwrap_or(0))
        },
        codes::SECURITY_EVENT => match raw.security_code {
            Some(codes::security::IDENTITY_KEY_CHANGED) => {
                RoomEventKind::SecurityEvent(SecurityEventKind::IdentityKeyChanged)
            },
            Some(codes::security::MAN_IN_THE_MIDDLE) => {
                RoomEventKind::SecurityEvent(SecurityEventKind::ManInTheMiddleDetected)
            },
            Some(codes::security::LEVEL_DOWNGRADED) => {
                RoomEventKind::SecurityEvent(SecurityEventKind::SecurityLevelDowngraded)
            },
            Some(codes::security::MAX_DEVICE_COUNT) => {
                RoomEventKind::SecurityEvent(SecurityEventKind::MaxDeviceCountExceeded)
            },
            Some(other) => RoomEventKind::Unknown(other),
            None => RoomEventKind::Unknown(raw.code),
        },
        other => RoomEventKind::Unknown(other),
    };

    RoomEvent { id: raw.id, kind, actor: raw.actor, subject: raw.subject, timestamp: raw.timestamp }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_room(code: u32) -> RawRoomEvent {
        RawRoomEvent {
            id: EntryId::from("ev-1"),
            code,
            security_code: None,
            lifetime: None,
            actor: None,
            subject: None,
            timestamp: 100,
        }
    }

    #[test]
    fn known_codes_classify() {
        let entry = TimelineEntry::from_raw(RawEvent::Room(raw_room(codes::SUBJECT_CHANGED)));
        let TimelineEntry::Room(event) = entry else {
            unreachable!("room record must normalize to a room entry")
        };
        assert_eq!(event.kind, RoomEventKind::SubjectChanged);
    }

    #[test]
    fn unknown_codes_are_kept() {
        let entry = TimelineEntry::from_raw(RawEvent::Room(raw_room(9999)));
        let TimelineEntry::Room(event) = entry else {
            unreachable!("room record must normalize to a room entry")
        };
        assert_eq!(event.kind, RoomEventKind::Unknown(9999));
        assert_eq!(event.timestamp, 100);
    }

    #[test]
    fn security_subkind_classifies() {
        let mut raw = raw_room(codes::SECURITY_EVENT);
        raw.security_code = Some(codes::security::MAN_IN_THE_MIDDLE);
        let entry = TimelineEntry::from_raw(RawEvent::Room(raw));
        let TimelineEntry::Room(event) = entry else {
            unreachable!("room record must normalize to a room entry")
        };
        assert_eq!(
            event.kind,
            RoomEventKind::SecurityEvent(SecurityEventKind::ManInTheMiddleDetected)
        );
    }

    #[test]
    fn participant_state_replaces_by_weak_address() {
        let mut msg = Message {
            id: EntryId::from("m1"),
            from: PeerAddress::from("sip:alice@example.org"),
            timestamp: 0,
            outgoing: true,
            delivery: DeliveryState::Delivered,
            contents: Vec::new(),
            participant_states: Vec::new(),
            transfer_path: None,
            attachment_path: None,
        };

        msg.record_participant_state(ParticipantImdn {
            participant: PeerAddress::from("sip:bob@example.org"),
            state: DeliveryState::DeliveredToUser,
            timestamp: 10,
        });
        msg.record_participant_state(ParticipantImdn {
            participant: PeerAddress::from("sip:bob@example.org;transport=tls"),
            state: DeliveryState::Displayed,
            timestamp: 20,
        });

        assert_eq!(msg.participant_states.len(), 1);
        assert_eq!(msg.participant_states[0].state, DeliveryState::Displayed);
    }
}
