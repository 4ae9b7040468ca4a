use super::*;
use crate::{
    edit::command::{ClipPlacement, TrimEdge},
    foundation::core::{FrameIndex, FrameRange, Fps, MediaId, MediaKind},
};

fn seq() -> Sequence {
    let mut s = Sequence::new("h", 4, 4, Fps::new(30, 1).unwrap(), 48_000);
    s.add_track(MediaKind::Video);
    s
}

fn insert(start: u64, end: u64) -> Command {
    Command::InsertClip {
        clips: vec![ClipPlacement {
            track: crate::foundation::core::TrackId(1),
            media: MediaId::new("m"),
            range: FrameRange::frames(start, end).unwrap(),
            clip_in: 0,
        }],
    }
}

#[test]
fn undo_then_redo_restores_exact_state() {
    let ctx = EditContext::default();
    let mut s = seq();
    let mut h = UndoStack::new(16);
    h.execute(insert(0, 10), &mut s, &ctx).unwrap();
    h.execute(
        Command::Split {
            clip: ClipId(2),
            at: FrameIndex(4),
        },
        &mut s,
        &ctx,
    )
    .unwrap();
    let after = s.clone();

    assert_eq!(h.undo(&mut s).map(|o| o.label), Some("split".to_string()));
    assert_eq!(s.clip(ClipId(2)).unwrap().range, FrameRange::frames(0, 10).unwrap());
    assert_eq!(s.track(crate::foundation::core::TrackId(1)).unwrap().clips.len(), 1);

    h.redo(&mut s, &ctx).unwrap();
    assert_eq!(s, after);
}

#[test]
fn rejected_command_leaves_history_alone() {
    let ctx = EditContext::default();
    let mut s = seq();
    let mut h = UndoStack::new(16);
    h.execute(insert(0, 10), &mut s, &ctx).unwrap();
    h.undo(&mut s);
    assert!(h.can_redo());
    assert!(h.execute(insert(0, 0), &mut s, &ctx).is_err());
    assert!(h.can_redo());
    assert_eq!(h.depth(), 0);
}

#[test]
fn new_command_clears_redo() {
    let ctx = EditContext::default();
    let mut s = seq();
    let mut h = UndoStack::new(16);
    h.execute(insert(0, 10), &mut s, &ctx).unwrap();
    h.undo(&mut s);
    h.execute(insert(20, 30), &mut s, &ctx).unwrap();
    assert!(!h.can_redo());
    assert_eq!(h.redo(&mut s, &ctx).unwrap(), None);
}

#[test]
fn limit_drops_oldest_entries() {
    let ctx = EditContext::default();
    let mut s = seq();
    let mut h = UndoStack::new(2);
    for i in 0..3 {
        h.execute(insert(i * 10, i * 10 + 5), &mut s, &ctx).unwrap();
    }
    assert_eq!(h.depth(), 2);
    h.undo(&mut s);
    h.undo(&mut s);
    assert!(h.undo(&mut s).is_none());
    assert_eq!(s.track(crate::foundation::core::TrackId(1)).unwrap().clips.len(), 1);
}

#[test]
fn applied_lists_only_retained_steps() {
    let ctx = EditContext::default();
    let mut s = seq();
    let mut h = UndoStack::new(2);
    for i in 0..3 {
        h.execute(insert(i * 10, i * 10 + 5), &mut s, &ctx).unwrap();
    }
    let applied: Vec<&Command> = h.applied().collect();
    assert_eq!(applied, vec![&insert(10, 15), &insert(20, 25)]);

    // Replaying from the original state misses the dropped first insert.
    let mut replayed = seq();
    for cmd in h.applied() {
        execute(cmd, &mut replayed, &ctx).unwrap();
    }
    let clips = |q: &Sequence| q.track(crate::foundation::core::TrackId(1)).unwrap().clips.len();
    assert_eq!(clips(&replayed), 2);
    assert_eq!(clips(&s), 3);
}

#[test]
fn labels_follow_the_stacks() {
    let ctx = EditContext::default();
    let mut s = seq();
    let mut h = UndoStack::new(8);
    h.execute(insert(0, 10), &mut s, &ctx).unwrap();
    h.execute(
        Command::Trim {
            clip: ClipId(2),
            edge: TrimEdge::End,
            to: FrameIndex(5),
            ripple: true,
        },
        &mut s,
        &ctx,
    )
    .unwrap();
    assert_eq!(h.undo_label().as_deref(), Some("ripple trim"));
    h.undo(&mut s);
    assert_eq!(h.redo_label().as_deref(), Some("ripple trim"));
    assert!(s.changed);
}
