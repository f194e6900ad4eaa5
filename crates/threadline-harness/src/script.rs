//! Scripted history source.
//!
//! Holds a conversation's full history (newest-first) and answers
//! [`TimelineAction::FetchHistory`] requests with the matching slice,
//! exactly as the engine's range reads would. Requests past the end get
//! an empty page, which is how end of history is reported.

use threadline_core::{
    FetchRequest, FileProbe, RawEvent, Timeline, TimelineAction, TimelineEvent,
};

/// Fixed full history serving fetch requests.
#[derive(Debug, Clone, Default)]
pub struct ScriptedHistory {
    events: Vec<RawEvent>,
}

impl ScriptedHistory {
    /// Create a history from its full event list, newest-first.
    pub fn new(events: Vec<RawEvent>) -> Self {
        Self { events }
    }

    /// Total number of history records.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if the history is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The page covering `[start, end)`, clamped to the history size.
    pub fn page(&self, start: usize, end: usize) -> Vec<RawEvent> {
        let start = start.min(self.events.len());
        let end = end.min(self.events.len());
        self.events[start..end].to_vec()
    }

    /// The completion event answering a fetch request.
    pub fn respond(&self, request: FetchRequest) -> TimelineEvent {
        TimelineEvent::HistoryFetched {
            request,
            events: self.page(request.start, request.end),
        }
    }
}

/// Open the timeline and answer its initial page fetch.
pub fn open<P: FileProbe>(
    timeline: &mut Timeline<P>,
    history: &ScriptedHistory,
) -> Vec<TimelineAction> {
    let initial = timeline.open();
    settle(timeline, history, initial)
}

/// Feed an event into the timeline, answering every fetch action from
/// the scripted history until none remain. Returns all actions produced,
/// fetch actions included, in emission order.
pub fn drive<P: FileProbe>(
    timeline: &mut Timeline<P>,
    history: &ScriptedHistory,
    event: TimelineEvent,
) -> Vec<TimelineAction> {
    let actions = timeline.handle(event);
    settle(timeline, history, actions)
}

fn settle<P: FileProbe>(
    timeline: &mut Timeline<P>,
    history: &ScriptedHistory,
    actions: Vec<TimelineAction>,
) -> Vec<TimelineAction> {
    let mut produced = Vec::new();
    let mut pending: Vec<TimelineEvent> = Vec::new();

    for action in actions {
        if let TimelineAction::FetchHistory(request) = &action {
            pending.push(history.respond(*request));
        }
        produced.push(action);
    }

    while let Some(next) = pending.pop() {
        for action in timeline.handle(next) {
            if let TimelineAction::FetchHistory(request) = &action {
                pending.push(history.respond(*request));
            }
            produced.push(action);
        }
    }
    produced
}
