//! Integration tests driving the timeline against a scripted engine.
//!
//! Each test ends with oracle checks on the produced actions and the
//! resulting window snapshot, the two surfaces the renderer consumes.

use threadline_core::{
    ContentId, DeliveryState, EntryId, GroupPosition, ParticipantImdn, PeerAddress, Timeline,
    TimelineAction, TimelineConfig, TimelineEvent, codes,
};
use threadline_harness::{
    MemoryFs, ScriptedHistory, drive, file_transfer_message, open, room_event, text_message,
};

fn timeline() -> Timeline<MemoryFs> {
    Timeline::new(TimelineConfig::default(), MemoryFs::new())
}

fn timeline_with_fs(fs: MemoryFs) -> Timeline<MemoryFs> {
    let config = TimelineConfig { download_dir: "/downloads".into(), ..TimelineConfig::default() };
    Timeline::new(config, fs)
}

fn positions(timeline: &Timeline<MemoryFs>) -> Vec<GroupPosition> {
    timeline.snapshot().into_iter().map(|(_, position)| position).collect()
}

fn fetch_count(actions: &[TimelineAction]) -> usize {
    actions.iter().filter(|a| matches!(a, TimelineAction::FetchHistory(_))).count()
}

#[test]
fn same_sender_run_groups_bottom_to_top() {
    let mut tl = timeline();
    let history = ScriptedHistory::default();
    let _ = open(&mut tl, &history);

    for (id, t) in [("a", 0), ("b", 10), ("c", 20)] {
        let _ = drive(&mut tl, &history, TimelineEvent::EventReceived(text_message(
            id,
            "sip:alice@example.org",
            t,
            false,
        )));
    }

    // Newest-first: t=20 renders at the bottom of the bubble stack.
    assert_eq!(
        positions(&tl),
        vec![GroupPosition::Bottom, GroupPosition::Middle, GroupPosition::Top]
    );
}

#[test]
fn appended_page_only_touches_the_boundary() {
    let mut tl = timeline();

    // Live window of 5 entries, mixed senders so grouping is non-trivial.
    let lives: Vec<_> = ["a", "a", "b", "a", "b"]
        .iter()
        .enumerate()
        .map(|(i, sender)| {
            text_message(
                &format!("live-{i}"),
                &format!("sip:{sender}@example.org"),
                1000 + i as u64 * 10,
                false,
            )
        })
        .collect();
    for live in &lives {
        let _ = tl.handle(TimelineEvent::EventReceived(live.clone()));
    }

    // The engine's full history: the live entries, then 20 older ones.
    let mut full: Vec<_> = lives.into_iter().rev().collect();
    full.extend(
        (0..20).map(|i| {
            text_message(&format!("old-{i}"), "sip:old@example.org", 500 - i as u64, false)
        }),
    );
    let history = ScriptedHistory::new(full);
    assert_eq!(tl.window().len(), 5);
    let before = positions(&tl);

    // Approaching the tail triggers exactly one page fetch.
    let actions = drive(&mut tl, &history, TimelineEvent::ScrollChanged {
        last_visible: 2,
        total_loaded: 5,
    });

    assert_eq!(tl.window().len(), 25);
    assert!(actions.contains(&TimelineAction::RowsAppended { start: 5, count: 20 }));
    let refreshes: Vec<_> = actions
        .iter()
        .filter(|a| matches!(a, TimelineAction::RefreshRow(_)))
        .collect();
    assert_eq!(refreshes, vec![&TimelineAction::RefreshRow(4)]);

    // Established rows keep their grouping.
    assert_eq!(&positions(&tl)[..4], &before[..4]);
}

#[test]
fn displayed_refreshes_one_row_and_drops_tracking() {
    let mut tl = timeline();
    let history = ScriptedHistory::new(
        (0..10)
            .map(|i| text_message(&format!("m-{i}"), "sip:me@example.org", 1000 - i as u64, true))
            .collect(),
    );
    let _ = open(&mut tl, &history);
    assert_eq!(tl.window().len(), 10);

    let id = EntryId::from("m-7");
    assert!(tl.delivery().is_tracked(&id));

    let actions = tl.handle(TimelineEvent::MessageStateChanged {
        id: id.clone(),
        state: DeliveryState::Displayed,
    });
    assert_eq!(actions, vec![TimelineAction::RefreshRow(7)]);
    assert!(!tl.delivery().is_tracked(&id));

    // A spurious progress notification must not resurrect tracking.
    let _ = tl.handle(TimelineEvent::TransferProgress {
        id: id.clone(),
        content: ContentId::from("body"),
        offset: 1,
        total: 2,
    });
    assert!(!tl.delivery().is_tracked(&id));
}

#[test]
fn download_path_skips_taken_names() {
    let fs = MemoryFs::with_paths(["/downloads/photo.jpg", "/downloads/1_photo.jpg"]);
    let mut tl = timeline_with_fs(fs);
    let history = ScriptedHistory::new(vec![file_transfer_message(
        "m-0",
        "sip:peer@example.org",
        100,
        "photo.jpg",
    )]);
    let _ = open(&mut tl, &history);

    let actions = tl
        .request_download(&EntryId::from("m-0"), &ContentId::from("file"))
        .unwrap_or_default();
    assert_eq!(
        actions,
        vec![
            TimelineAction::StartDownload {
                id: EntryId::from("m-0"),
                content: ContentId::from("file"),
                path: "/downloads/2_photo.jpg".into(),
            },
            TimelineAction::RefreshRow(0),
        ]
    );

    // Completion moves the staged path into the persisted slot.
    let _ = tl.handle(TimelineEvent::TransferProgress {
        id: EntryId::from("m-0"),
        content: ContentId::from("file"),
        offset: 2048,
        total: 2048,
    });
    let entry = tl.window().get(0).and_then(|e| e.as_message().cloned());
    let Some(message) = entry else { unreachable!("message expected at index 0") };
    assert_eq!(message.attachment_path, Some("/downloads/2_photo.jpg".into()));
}

#[test]
fn empty_page_exhausts_history_until_source_change() {
    let mut tl = timeline();
    let history = ScriptedHistory::new(
        (0..6)
            .map(|i| text_message(&format!("m-{i}"), "sip:a@example.org", 100 - i as u64, false))
            .collect(),
    );
    let _ = open(&mut tl, &history);
    assert_eq!(tl.window().len(), 6);

    // The next page past the tail comes back empty: end of history.
    let actions =
        drive(&mut tl, &history, TimelineEvent::ScrollChanged { last_visible: 3, total_loaded: 6 });
    assert_eq!(fetch_count(&actions), 1);

    // Same threshold again: no re-trigger.
    let actions =
        drive(&mut tl, &history, TimelineEvent::ScrollChanged { last_visible: 3, total_loaded: 6 });
    assert_eq!(fetch_count(&actions), 0);

    // An explicit re-read clears the latch.
    let actions = drive(&mut tl, &history, TimelineEvent::SourceChanged);
    assert_eq!(fetch_count(&actions), 1);
    assert!(actions.contains(&TimelineAction::Reset));
}

#[test]
fn source_change_swaps_the_window_atomically() {
    let mut tl = timeline();
    let basic = ScriptedHistory::new(vec![text_message("m-0", "sip:a@example.org", 50, false)]);
    let _ = open(&mut tl, &basic);
    assert_eq!(tl.window().len(), 1);

    // The room gained capabilities; history now includes room events.
    let advanced = ScriptedHistory::new(vec![
        text_message("m-1", "sip:a@example.org", 60, false),
        room_event("ev-0", codes::PARTICIPANT_ADDED, 55),
        text_message("m-0", "sip:a@example.org", 50, false),
    ]);
    let actions = drive(&mut tl, &advanced, TimelineEvent::SourceChanged);

    assert!(actions.contains(&TimelineAction::Reset));
    assert_eq!(tl.window().len(), 3);
    assert_eq!(tl.window().index_of(&EntryId::from("ev-0")), Some(1));
}

#[test]
fn room_events_interleave_and_break_grouping() {
    let mut tl = timeline();
    let history = ScriptedHistory::new(vec![
        text_message("m-2", "sip:a@example.org", 30, false),
        room_event("ev-0", codes::SUBJECT_CHANGED, 25),
        text_message("m-1", "sip:a@example.org", 20, false),
        text_message("m-0", "sip:a@example.org", 10, false),
    ]);
    let _ = open(&mut tl, &history);

    assert_eq!(
        positions(&tl),
        vec![
            GroupPosition::Isolated,
            GroupPosition::Isolated,
            GroupPosition::Bottom,
            GroupPosition::Top,
        ]
    );
}

#[test]
fn deleting_an_entry_rechecks_the_gap() {
    let mut tl = timeline();
    let history = ScriptedHistory::new(vec![
        text_message("m-2", "sip:a@example.org", 20, false),
        text_message("m-1", "sip:b@example.org", 15, false),
        text_message("m-0", "sip:a@example.org", 10, false),
    ]);
    let _ = open(&mut tl, &history);
    assert_eq!(positions(&tl), vec![
        GroupPosition::Isolated,
        GroupPosition::Isolated,
        GroupPosition::Isolated,
    ]);

    let actions = tl.handle(TimelineEvent::EntryDeleted(EntryId::from("m-1")));
    assert_eq!(
        actions,
        vec![
            TimelineAction::RowRemoved(1),
            TimelineAction::RefreshRow(0),
            TimelineAction::RefreshRow(1),
        ]
    );

    // The survivors now group across the closed gap.
    assert_eq!(positions(&tl), vec![GroupPosition::Bottom, GroupPosition::Top]);
}

#[test]
fn participant_imdn_updates_refresh_the_row() {
    let mut tl = timeline();
    let history =
        ScriptedHistory::new(vec![text_message("m-0", "sip:me@example.org", 10, true)]);
    let _ = open(&mut tl, &history);

    let actions = tl.handle(TimelineEvent::ParticipantImdnChanged {
        id: EntryId::from("m-0"),
        imdn: ParticipantImdn {
            participant: PeerAddress::from("sip:bob@example.org"),
            state: DeliveryState::Displayed,
            timestamp: 12,
        },
    });
    assert_eq!(actions, vec![TimelineAction::RefreshRow(0)]);

    let states = tl
        .window()
        .get(0)
        .and_then(|e| e.as_message())
        .map(|m| m.participant_states.clone())
        .unwrap_or_default();
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].state, DeliveryState::Displayed);
}

#[test]
fn unknown_event_codes_still_render() {
    let mut tl = timeline();
    let history = ScriptedHistory::new(vec![room_event("ev-0", 4242, 10)]);
    let _ = open(&mut tl, &history);

    assert_eq!(tl.window().len(), 1);
    assert_eq!(positions(&tl), vec![GroupPosition::Isolated]);
}
