//! Builders for raw engine records.

use threadline_core::{
    ContentId, ContentKind, DeliveryState, EntryId, PeerAddress, RawContent, RawEvent, RawMessage,
    RawRoomEvent,
};

/// A plain text message record.
pub fn text_message(id: &str, from: &str, timestamp: u64, outgoing: bool) -> RawEvent {
    RawEvent::Message(RawMessage {
        id: EntryId::from(id),
        from: PeerAddress::from(from),
        timestamp,
        outgoing,
        state: if outgoing { DeliveryState::InProgress } else { DeliveryState::Delivered },
        contents: vec![RawContent {
            id: ContentId::from("body"),
            name: String::new(),
            kind: ContentKind::Text,
            file_path: None,
        }],
    })
}

/// An incoming message carrying one not-yet-downloaded file.
pub fn file_transfer_message(id: &str, from: &str, timestamp: u64, file_name: &str) -> RawEvent {
    RawEvent::Message(RawMessage {
        id: EntryId::from(id),
        from: PeerAddress::from(from),
        timestamp,
        outgoing: false,
        state: DeliveryState::Delivered,
        contents: vec![RawContent {
            id: ContentId::from("file"),
            name: file_name.to_owned(),
            kind: ContentKind::FileTransfer,
            file_path: None,
        }],
    })
}

/// A room event record with the given engine code.
pub fn room_event(id: &str, code: u32, timestamp: u64) -> RawEvent {
    RawEvent::Room(RawRoomEvent {
        id: EntryId::from(id),
        code,
        security_code: None,
        lifetime: None,
        actor: None,
        subject: None,
        timestamp,
    })
}
