use super::*;
use crate::{
    config::RippleScope,
    foundation::timecode::TimecodeView,
    edit::command::ClipPlacement,
    foundation::core::{FrameRange, Fps, MediaId, MediaKind, TrackId},
};

fn editor() -> (Editor, TrackId, TrackId) {
    let mut s = Sequence::new("e", 8, 8, Fps::new(25, 1).unwrap(), 48_000);
    let v = s.add_track(MediaKind::Video);
    let a = s.add_track(MediaKind::Audio);
    (Editor::new(s, EngineConfig::default()).unwrap(), v, a)
}

fn place(track: TrackId, start: u64, end: u64) -> ClipPlacement {
    ClipPlacement {
        track,
        media: MediaId::new("m"),
        range: FrameRange::frames(start, end).unwrap(),
        clip_in: 0,
    }
}

fn insert_av(ed: &Editor, v: TrackId, a: TrackId, start: u64, end: u64) -> (ClipId, ClipId) {
    let first = ed.read(|s| s.next_id).unwrap();
    ed.execute(Command::InsertClip {
        clips: vec![place(v, start, end), place(a, start, end)],
    })
    .unwrap();
    (ClipId(first), ClipId(first + 1))
}

#[test]
fn execute_emits_structure_then_dirty_once() {
    let (ed, v, a) = editor();
    let (l, rx) = ChannelListener::new();
    ed.subscribe(Arc::new(l)).unwrap();

    let (cv, ca) = insert_av(&ed, v, a, 0, 10);
    assert_eq!(
        rx.try_recv().unwrap(),
        ChangeEvent::StructureChanged {
            clips: vec![cv, ca]
        }
    );
    assert_eq!(rx.try_recv().unwrap(), ChangeEvent::DirtyChanged(true));

    insert_av(&ed, v, a, 10, 20);
    assert!(matches!(
        rx.try_recv().unwrap(),
        ChangeEvent::StructureChanged { .. }
    ));
    assert!(rx.try_recv().is_err());

    ed.mark_saved().unwrap();
    assert_eq!(rx.try_recv().unwrap(), ChangeEvent::DirtyChanged(false));
    assert!(!ed.is_dirty().unwrap());
}

#[test]
fn rejected_command_emits_nothing() {
    let (ed, v, a) = editor();
    insert_av(&ed, v, a, 0, 10);
    let (l, rx) = ChannelListener::new();
    ed.subscribe(Arc::new(l)).unwrap();
    let before = ed.snapshot().unwrap();

    assert!(
        ed.execute(Command::InsertClip {
            clips: vec![place(v, 5, 15)],
        })
        .is_err()
    );
    assert!(rx.try_recv().is_err());
    assert_eq!(ed.snapshot().unwrap(), before);
}

#[test]
fn undo_and_redo_round_trip() {
    let (ed, v, a) = editor();
    assert!(ed.undo().unwrap().is_none());
    insert_av(&ed, v, a, 0, 10);
    let after = ed.snapshot().unwrap();

    assert!(ed.can_undo().unwrap());
    ed.undo().unwrap().unwrap();
    assert_eq!(ed.read(|s| s.duration()).unwrap(), FrameIndex(0));
    assert!(ed.can_redo().unwrap());
    ed.redo().unwrap().unwrap();
    assert_eq!(ed.snapshot().unwrap(), after);
}

#[test]
fn split_at_playhead_splits_linked_pair_once() {
    let (ed, v, a) = editor();
    let (cv, ca) = insert_av(&ed, v, a, 0, 10);
    ed.seek(FrameIndex(4)).unwrap();
    let out = ed.split_at_playhead().unwrap();
    assert_eq!(out.label, "split");

    let s = ed.snapshot().unwrap();
    assert_eq!(s.track(v).unwrap().clips.len(), 2);
    assert_eq!(s.track(a).unwrap().clips.len(), 2);
    assert_eq!(s.clip(cv).unwrap().range, FrameRange::frames(0, 4).unwrap());
    assert_eq!(s.clip(ca).unwrap().range, FrameRange::frames(0, 4).unwrap());

    ed.undo().unwrap();
    let s = ed.snapshot().unwrap();
    assert_eq!(s.clip(cv).unwrap().range, FrameRange::frames(0, 10).unwrap());
    assert_eq!(s.track(a).unwrap().clips.len(), 1);
}

#[test]
fn split_at_playhead_outside_clips_is_rejected() {
    let (ed, v, a) = editor();
    insert_av(&ed, v, a, 0, 10);
    ed.seek(FrameIndex(0)).unwrap();
    assert!(matches!(
        ed.split_at_playhead(),
        Err(MontageError::Validation(_))
    ));
    ed.seek(FrameIndex(30)).unwrap();
    assert!(ed.split_at_playhead().is_err());
}

#[test]
fn ripple_end_to_playhead_closes_gap() {
    let (ed, v, a) = editor();
    let (cv, _) = insert_av(&ed, v, a, 0, 10);
    let (nv, _) = insert_av(&ed, v, a, 10, 20);
    ed.seek(FrameIndex(8)).unwrap();
    ed.ripple_to_point(TrimEdge::End).unwrap();

    let s = ed.snapshot().unwrap();
    assert_eq!(s.clip(cv).unwrap().range, FrameRange::frames(0, 8).unwrap());
    assert_eq!(s.clip(nv).unwrap().range, FrameRange::frames(8, 18).unwrap());
}

#[test]
fn ripple_to_point_under_all_tracks_shifts_once() {
    let mut s = Sequence::new("e", 8, 8, Fps::new(25, 1).unwrap(), 48_000);
    let v = s.add_track(MediaKind::Video);
    let a = s.add_track(MediaKind::Audio);
    let config = EngineConfig {
        ripple_scope: RippleScope::AllTracks,
        ..EngineConfig::default()
    };
    let ed = Editor::new(s, config).unwrap();
    for (track, start, end) in [(v, 0, 10), (a, 0, 10), (v, 20, 30)] {
        ed.execute(Command::InsertClip {
            clips: vec![place(track, start, end)],
        })
        .unwrap();
    }
    let later = ClipId(ed.read(|s| s.next_id).unwrap() - 1);
    ed.seek(FrameIndex(6)).unwrap();

    let out = ed.ripple_to_point(TrimEdge::End).unwrap();
    assert_eq!(out.label, "ripple end to playhead");
    let s = ed.snapshot().unwrap();
    assert_eq!(s.clip(later).unwrap().range, FrameRange::frames(16, 26).unwrap());

    ed.undo().unwrap().unwrap();
    let s = ed.snapshot().unwrap();
    assert_eq!(s.clip(later).unwrap().range, FrameRange::frames(20, 30).unwrap());
}

#[test]
fn playhead_timecode_uses_configured_view() {
    let s = Sequence::new("e", 8, 8, Fps::new(25, 1).unwrap(), 48_000);
    let frames = EngineConfig {
        timecode_view: TimecodeView::Frames,
        ..EngineConfig::default()
    };
    let ed = Editor::new(s.clone(), frames).unwrap();
    ed.seek(FrameIndex(1510)).unwrap();
    assert_eq!(ed.playhead_timecode().unwrap(), "1510");

    let ed = Editor::new(s, EngineConfig::default()).unwrap();
    ed.seek(FrameIndex(1510)).unwrap();
    assert_eq!(ed.playhead_timecode().unwrap(), "00:01:00:10");
}

#[test]
fn toggle_links_alternates() {
    let (ed, v, a) = editor();
    let (cv, ca) = insert_av(&ed, v, a, 0, 10);
    ed.toggle_links(&[cv, ca]).unwrap();
    assert!(ed.read(|s| s.clip(cv).unwrap().links.is_empty()).unwrap());
    ed.toggle_links(&[cv, ca]).unwrap();
    assert!(ed.read(|s| s.clip(cv).unwrap().links.contains(&ca)).unwrap());
}

#[test]
fn default_transition_is_clamped_to_clip_length() {
    let (ed, v, a) = editor();
    let (cv, _) = insert_av(&ed, v, a, 0, 12);
    ed.add_default_transition(cv, TransitionSide::Opening)
        .unwrap();
    let t = ed
        .read(|s| s.clip(cv).unwrap().transition_in)
        .unwrap()
        .unwrap();
    assert_eq!(t.kind, TransitionKind::CrossDissolve);
    assert_eq!(t.length, 12);
}

#[test]
fn failed_replace_keeps_previous_sequence_and_history() {
    let (ed, v, a) = editor();
    insert_av(&ed, v, a, 0, 10);
    let before = ed.snapshot().unwrap();
    assert!(matches!(
        ed.replace_sequence_from_json("{\"format_version\":1}"),
        Err(MontageError::Persistence(_))
    ));
    assert_eq!(ed.snapshot().unwrap(), before);
    assert!(ed.can_undo().unwrap());
}

#[test]
fn replace_installs_document_and_clears_history() {
    let (ed, v, a) = editor();
    insert_av(&ed, v, a, 0, 10);
    let json = ed.to_json().unwrap();
    ed.undo().unwrap();

    let (l, rx) = ChannelListener::new();
    ed.subscribe(Arc::new(l)).unwrap();
    ed.replace_sequence_from_json(&json).unwrap();
    assert!(!ed.can_undo().unwrap());
    assert!(!ed.can_redo().unwrap());
    assert!(!ed.is_dirty().unwrap());
    assert_eq!(ed.read(|s| s.duration()).unwrap(), FrameIndex(10));
    assert!(matches!(
        rx.try_recv().unwrap(),
        ChangeEvent::StructureChanged { clips } if clips.len() == 2
    ));
    assert_eq!(rx.try_recv().unwrap(), ChangeEvent::DirtyChanged(false));
}
