//! Deterministic test harness for the Threadline timeline core.
//!
//! Scripted stand-ins for the external collaborators: a history source
//! that answers fetch requests from a fixed event list, an in-memory
//! filesystem probe for collision resolution, and builders for raw
//! engine records. Everything is synchronous and reproducible; tests
//! drive the timeline by feeding completions back in by hand (or via
//! [`drive`], which auto-answers fetch actions).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod events;
pub mod memfs;
pub mod script;

pub use events::{file_transfer_message, room_event, text_message};
pub use memfs::MemoryFs;
pub use script::{ScriptedHistory, drive, open};
