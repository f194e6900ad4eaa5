//! Conversation timeline core for Threadline.
//!
//! Aggregates a conversation's heterogeneous history (user messages and
//! room lifecycle events) into a single time-ordered, incrementally loaded
//! window, and keeps per-message delivery and transfer state in sync with
//! asynchronous notifications from an external messaging engine.
//!
//! This is a pure state machine in the sans-IO style: it consumes
//! [`TimelineEvent`] inputs and produces [`TimelineAction`] instructions
//! for the caller to execute. It performs no network or disk I/O of its
//! own; history pages, delivery notifications, and transfer progress are
//! all fed in by the caller, and engine calls come back out as actions.
//!
//! # Components
//!
//! - [`Timeline`]: orchestrator tying the pieces below together
//! - [`TimelineWindow`]: ordered store of materialized entries
//! - [`DeliveryTracker`]: per-message delivery state and callback registry
//! - [`Paginator`]: scroll-driven history pagination with single-flight
//! - [`GroupPosition`]: bubble grouping resolution for adjacent messages
//! - [`FileProbe`]: filename collision resolution for incoming downloads
//!
//! # Integration
//!
//! Embedders construct the machine with the disk-backed probe and route
//! engine callbacks and renderer signals into [`Timeline::handle`]:
//! `Timeline::new(config, DiskProbe)`. Tests substitute an in-memory
//! probe and a scripted history source instead.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod address;
mod delivery;
mod entry;
mod error;
mod event;
mod grouping;
mod paging;
mod timeline;
mod transfer;
mod window;

pub use action::{FetchRequest, TimelineAction};
pub use address::PeerAddress;
pub use delivery::{DeliveryTracker, allowed_transition, is_terminal};
pub use entry::{
    Content, ContentId, ContentKind, DeliveryState, EntryId, Message, ParticipantImdn, RoomEvent,
    RoomEventKind, SecurityEventKind, TimelineEntry, TransferProgress,
};
pub use error::TimelineError;
pub use event::{RawContent, RawEvent, RawMessage, RawRoomEvent, TimelineEvent, codes};
pub use grouping::GroupPosition;
pub use paging::Paginator;
pub use timeline::{Timeline, TimelineConfig};
pub use transfer::{DiskProbe, FileProbe, resolve_unique_path};
pub use window::TimelineWindow;
