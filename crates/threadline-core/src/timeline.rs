//! Conversation timeline state machine.
//!
//! [`Timeline`] ties the window, delivery tracker, and paginator into
//! one state machine per conversation view. It consumes
//! [`TimelineEvent`] inputs and produces [`TimelineAction`] instructions
//! for the caller to execute - engine calls out, row updates to the
//! renderer. No I/O happens here and nothing blocks; the engine delivers
//! every notification on a single cooperative scheduler, so no internal
//! locking is needed and the timeline is exclusively owned by one view
//! at a time.
//!
//! # Row refresh policy
//!
//! A notification for a message with a known window slot refreshes only
//! that row; a tracked message without a slot falls back to a full
//! refresh; an unknown id is ignored - it refers to history outside the
//! materialized window, and its state is read fresh from the engine
//! whenever that page is eventually loaded.

use std::path::PathBuf;

use tracing::debug;

use crate::action::{FetchRequest, TimelineAction};
use crate::delivery::{DeliveryTracker, is_terminal};
use crate::entry::{ContentId, ContentKind, DeliveryState, EntryId, ParticipantImdn, TimelineEntry};
use crate::error::TimelineError;
use crate::event::{RawEvent, TimelineEvent};
use crate::grouping::GroupPosition;
use crate::paging::Paginator;
use crate::transfer::{FileProbe, resolve_unique_path};
use crate::window::TimelineWindow;

/// Tuning knobs for one conversation timeline.
#[derive(Debug, Clone)]
pub struct TimelineConfig {
    /// History entries fetched per page.
    pub page_size: usize,
    /// Remaining-rows threshold that triggers the next page fetch.
    pub fetch_threshold: usize,
    /// Maximum seconds between same-sender messages that still group.
    pub group_window_secs: u64,
    /// Directory incoming downloads are resolved into.
    pub download_dir: PathBuf,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            fetch_threshold: 5,
            group_window_secs: 300,
            download_dir: PathBuf::new(),
        }
    }
}

/// State machine aggregating one conversation's history into a
/// display-ready, incrementally loaded window.
#[derive(Debug)]
pub struct Timeline<P: FileProbe> {
    config: TimelineConfig,
    probe: P,
    window: TimelineWindow,
    delivery: DeliveryTracker,
    paginator: Paginator,
    /// True while a full window swap is pending (open or source change).
    reloading: bool,
    /// True once the view is torn down; late completions are discarded.
    closed: bool,
}

impl<P: FileProbe> Timeline<P> {
    /// Create a timeline with the given config and filesystem probe.
    pub fn new(config: TimelineConfig, probe: P) -> Self {
        let window = TimelineWindow::new(config.group_window_secs);
        let paginator = Paginator::new(config.page_size, config.fetch_threshold);
        Self {
            config,
            probe,
            window,
            delivery: DeliveryTracker::new(),
            paginator,
            reloading: false,
            closed: false,
        }
    }

    /// Start loading the conversation: fetch the first history page.
    pub fn open(&mut self) -> Vec<TimelineAction> {
        self.reloading = true;
        vec![TimelineAction::FetchHistory(self.paginator.request_first_page())]
    }

    /// Process an event and return actions for the caller to execute.
    pub fn handle(&mut self, event: TimelineEvent) -> Vec<TimelineAction> {
        if self.closed {
            debug!("event after teardown ignored");
            return Vec::new();
        }
        match event {
            TimelineEvent::EventReceived(raw) => self.handle_event_received(raw),
            TimelineEvent::MessageStateChanged { id, state } => {
                self.handle_state_changed(&id, state)
            },
            TimelineEvent::TransferProgress { id, content, offset, total } => {
                self.handle_transfer_progress(&id, &content, offset, total)
            },
            TimelineEvent::ParticipantImdnChanged { id, imdn } => {
                self.handle_participant_imdn(&id, imdn)
            },
            TimelineEvent::HistoryFetched { request, events } => {
                self.handle_history_fetched(&request, events)
            },
            TimelineEvent::FetchFailed { request } => {
                self.paginator.fail(&request);
                Vec::new()
            },
            TimelineEvent::ScrollChanged { last_visible, total_loaded } => self
                .paginator
                .on_scroll(last_visible, total_loaded)
                .map(TimelineAction::FetchHistory)
                .into_iter()
                .collect(),
            TimelineEvent::EntryDeleted(id) => self.handle_entry_deleted(&id),
            TimelineEvent::SourceChanged => self.handle_source_changed(),
            TimelineEvent::Closed => self.handle_closed(),
        }
    }

    /// Resolve a destination and ask the engine to download a content
    /// part of an incoming message.
    ///
    /// The collision-free path is bound to the content before the
    /// download action is emitted, so progress notifications always find
    /// a destination in place.
    pub fn request_download(
        &mut self,
        id: &EntryId,
        content_id: &ContentId,
    ) -> Result<Vec<TimelineAction>, TimelineError> {
        let Some((index, message)) = self.window.message_mut(id) else {
            return Err(TimelineError::UnknownEntry(id.clone()));
        };
        if message.outgoing {
            return Err(TimelineError::NotDownloadable {
                id: id.clone(),
                content: content_id.clone(),
            });
        }
        let name = {
            let Some(content) = message.content(content_id) else {
                return Err(TimelineError::UnknownContent {
                    id: id.clone(),
                    content: content_id.clone(),
                });
            };
            if content.kind != ContentKind::FileTransfer {
                return Err(TimelineError::NotDownloadable {
                    id: id.clone(),
                    content: content_id.clone(),
                });
            }
            content.name.clone()
        };

        let path = resolve_unique_path(&self.probe, &self.config.download_dir, &name);
        if let Some(content) = message.content_mut(content_id) {
            content.file_path = Some(path.clone());
        }
        message.transfer_path = Some(path.clone());
        self.delivery.track_on_bind(message);

        Ok(vec![
            TimelineAction::StartDownload { id: id.clone(), content: content_id.clone(), path },
            TimelineAction::RefreshRow(index),
        ])
    }

    /// Ask the engine to cancel a message's active transfer.
    pub fn cancel_transfer(&mut self, id: &EntryId) -> Result<Vec<TimelineAction>, TimelineError> {
        let Some((index, message)) = self.window.message_mut(id) else {
            return Err(TimelineError::UnknownEntry(id.clone()));
        };
        let active = message.delivery == DeliveryState::FileTransferInProgress
            || message.contents.iter().any(|c| c.progress.is_some());
        if !active {
            return Err(TimelineError::TransferNotActive(id.clone()));
        }
        Ok(vec![TimelineAction::CancelTransfer(id.clone()), TimelineAction::RefreshRow(index)])
    }

    /// Display-ready projection of the window: entries with their
    /// grouping positions, newest-first.
    pub fn snapshot(&self) -> Vec<(&TimelineEntry, GroupPosition)> {
        self.window.snapshot()
    }

    /// The materialized window.
    pub fn window(&self) -> &TimelineWindow {
        &self.window
    }

    /// The transient message registry.
    pub fn delivery(&self) -> &DeliveryTracker {
        &self.delivery
    }

    /// True once the view has been torn down.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn handle_event_received(&mut self, raw: RawEvent) -> Vec<TimelineAction> {
        let entry = TimelineEntry::from_raw(raw);
        let Some(insertion) = self.window.prepend(entry) else {
            return Vec::new();
        };
        if let Some(TimelineEntry::Message(message)) = self.window.get(insertion.index) {
            self.delivery.track_on_bind(message);
        }

        let mut actions = vec![TimelineAction::RowInserted(insertion.index)];
        actions.extend(insertion.refresh.into_iter().map(TimelineAction::RefreshRow));
        actions
    }

    fn handle_state_changed(&mut self, id: &EntryId, state: DeliveryState) -> Vec<TimelineAction> {
        if let Some((index, message)) = self.window.message_mut(id) {
            self.delivery.apply_state(message, state);
            return vec![TimelineAction::RefreshRow(index)];
        }
        if self.delivery.is_tracked(id) {
            // Known message without a known slot: cheaper to re-read the
            // whole window than to miss an update.
            if is_terminal(state) {
                self.delivery.untrack(id);
            }
            return vec![TimelineAction::RefreshAll];
        }
        debug!(%id, "state change for unmaterialized message ignored");
        Vec::new()
    }

    fn handle_transfer_progress(
        &mut self,
        id: &EntryId,
        content_id: &ContentId,
        offset: usize,
        total: usize,
    ) -> Vec<TimelineAction> {
        let Some((index, message)) = self.window.message_mut(id) else {
            debug!(%id, "transfer progress for unmaterialized message ignored");
            return Vec::new();
        };
        if self.delivery.apply_progress(message, content_id, offset, total) {
            vec![TimelineAction::RefreshRow(index)]
        } else {
            Vec::new()
        }
    }

    fn handle_participant_imdn(
        &mut self,
        id: &EntryId,
        imdn: ParticipantImdn,
    ) -> Vec<TimelineAction> {
        let Some((index, message)) = self.window.message_mut(id) else {
            debug!(%id, "participant imdn for unmaterialized message ignored");
            return Vec::new();
        };
        message.record_participant_state(imdn);
        vec![TimelineAction::RefreshRow(index)]
    }

    fn handle_history_fetched(
        &mut self,
        request: &FetchRequest,
        events: Vec<RawEvent>,
    ) -> Vec<TimelineAction> {
        if request.generation != self.paginator.generation() {
            debug!(
                stale = request.generation,
                current = self.paginator.generation(),
                "stale history page discarded"
            );
            return Vec::new();
        }

        let entries: Vec<TimelineEntry> = events.into_iter().map(TimelineEntry::from_raw).collect();

        if self.reloading && request.start == 0 {
            self.reloading = false;
            self.paginator.complete(request, entries.len());
            self.delivery.clear();
            self.window.replace(entries);
            self.bind_range(0);
            return vec![TimelineAction::Reset];
        }

        let outcome = self.window.append_page(entries);
        self.paginator.complete(request, outcome.added);
        if outcome.added == 0 {
            return Vec::new();
        }
        self.bind_range(outcome.start);

        let mut actions =
            vec![TimelineAction::RowsAppended { start: outcome.start, count: outcome.added }];
        actions.extend(outcome.refresh.map(TimelineAction::RefreshRow));
        actions
    }

    /// Register every message from `start` to the tail in the transient
    /// set, per the binding rule.
    fn bind_range(&mut self, start: usize) {
        for entry in &self.window.entries()[start..] {
            if let TimelineEntry::Message(message) = entry {
                self.delivery.track_on_bind(message);
            }
        }
    }

    fn handle_entry_deleted(&mut self, id: &EntryId) -> Vec<TimelineAction> {
        let Some(removal) = self.window.remove(id) else {
            return Vec::new();
        };
        if removal.entry.as_message().is_some() {
            self.delivery.untrack(id);
        }

        let mut actions = vec![TimelineAction::RowRemoved(removal.index)];
        actions.extend(removal.refresh.into_iter().map(TimelineAction::RefreshRow));
        actions
    }

    /// The room's capability set changed: detach everything and re-read
    /// history from the new source. The current window stays on screen
    /// until the replacement page arrives and is swapped in atomically.
    fn handle_source_changed(&mut self) -> Vec<TimelineAction> {
        self.delivery.clear();
        self.paginator.refresh();
        self.reloading = true;
        vec![TimelineAction::FetchHistory(self.paginator.request_first_page())]
    }

    fn handle_closed(&mut self) -> Vec<TimelineAction> {
        self.closed = true;
        self.delivery.clear();
        self.paginator.refresh();
        self.window.clear();
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::PeerAddress;
    use crate::event::{RawContent, RawMessage};

    fn timeline() -> Timeline<NoFiles> {
        Timeline::new(TimelineConfig::default(), NoFiles)
    }

    struct NoFiles;

    impl FileProbe for NoFiles {
        fn exists(&self, _path: &std::path::Path) -> bool {
            false
        }
    }

    fn raw_text(id: &str, from: &str, timestamp: u64, outgoing: bool) -> RawEvent {
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

    #[test]
    fn open_requests_first_page() {
        let mut tl = timeline();
        let actions = tl.open();
        assert_eq!(
            actions,
            vec![TimelineAction::FetchHistory(FetchRequest { generation: 0, start: 0, end: 20 })]
        );
    }

    #[test]
    fn live_arrival_inserts_at_top_and_refreshes_neighbor() {
        let mut tl = timeline();
        let _ = tl.handle(TimelineEvent::EventReceived(raw_text("a", "sip:p@x", 10, false)));
        let actions = tl.handle(TimelineEvent::EventReceived(raw_text("b", "sip:p@x", 20, false)));

        assert_eq!(actions, vec![TimelineAction::RowInserted(0), TimelineAction::RefreshRow(1)]);
        assert_eq!(tl.window().len(), 2);
    }

    #[test]
    fn state_change_refreshes_only_that_row() {
        let mut tl = timeline();
        let _ = tl.handle(TimelineEvent::EventReceived(raw_text("a", "sip:me@x", 10, true)));
        let _ = tl.handle(TimelineEvent::EventReceived(raw_text("b", "sip:p@x", 20, false)));

        let actions = tl.handle(TimelineEvent::MessageStateChanged {
            id: EntryId::from("a"),
            state: DeliveryState::Delivered,
        });
        assert_eq!(actions, vec![TimelineAction::RefreshRow(1)]);
    }

    #[test]
    fn stale_state_change_is_ignored() {
        let mut tl = timeline();
        let actions = tl.handle(TimelineEvent::MessageStateChanged {
            id: EntryId::from("ghost"),
            state: DeliveryState::Displayed,
        });
        assert!(actions.is_empty());
    }

    #[test]
    fn closed_timeline_discards_everything() {
        let mut tl = timeline();
        let open_actions = tl.open();
        let TimelineAction::FetchHistory(request) = open_actions[0].clone() else {
            unreachable!("open must fetch")
        };

        let _ = tl.handle(TimelineEvent::Closed);
        assert!(tl.is_closed());

        let actions = tl.handle(TimelineEvent::HistoryFetched {
            request,
            events: vec![raw_text("a", "sip:p@x", 10, false)],
        });
        assert!(actions.is_empty());
        assert!(tl.window().is_empty());
    }

    #[test]
    fn download_requires_a_pending_transfer() {
        let mut tl = timeline();
        let _ = tl.handle(TimelineEvent::EventReceived(raw_text("a", "sip:p@x", 10, false)));

        let err = tl.request_download(&EntryId::from("a"), &ContentId::from("body"));
        assert_eq!(
            err,
            Err(TimelineError::NotDownloadable {
                id: EntryId::from("a"),
                content: ContentId::from("body"),
            })
        );

        let err = tl.request_download(&EntryId::from("ghost"), &ContentId::from("body"));
        assert_eq!(err, Err(TimelineError::UnknownEntry(EntryId::from("ghost"))));
    }
}
