use super::*;
use crate::foundation::core::MediaId;

fn seq() -> Sequence {
    let mut s = Sequence::new("main", 4, 4, Fps::new(30, 1).unwrap(), 48_000);
    let v0 = s.add_track(MediaKind::Video);
    let v1 = s.add_track(MediaKind::Video);
    let a0 = s.add_track(MediaKind::Audio);
    for (track, kind, start, end) in [
        (v0, MediaKind::Video, 0, 10),
        (v1, MediaKind::Video, 5, 15),
        (a0, MediaKind::Audio, 0, 10),
    ] {
        let id = ClipId(s.alloc_id());
        let c = Clip::new(
            id,
            track,
            kind,
            MediaId::new("m"),
            FrameRange::frames(start, end).unwrap(),
            0,
        );
        s.track_mut(track).unwrap().insert(c).unwrap();
    }
    s
}

#[test]
fn ids_are_allocated_from_one_counter() {
    let s = seq();
    let track_ids: Vec<_> = s.all_tracks().map(|t| t.id.0).collect();
    assert_eq!(track_ids, vec![1, 2, 3]);
    assert_eq!(s.clip(ClipId(4)).map(|c| c.track), Some(TrackId(1)));
    assert_eq!(s.next_id, 7);
    s.validate().unwrap();
}

#[test]
fn active_video_is_bottom_first() {
    let s = seq();
    let ids: Vec<_> = s.active_video(FrameIndex(7)).iter().map(|c| c.id.0).collect();
    assert_eq!(ids, vec![4, 5]);
    let ids: Vec<_> = s.active_video(FrameIndex(12)).iter().map(|c| c.id.0).collect();
    assert_eq!(ids, vec![5]);
}

#[test]
fn disabled_clips_are_not_active() {
    let mut s = seq();
    s.clip_mut(ClipId(4)).unwrap().enabled = false;
    assert_eq!(s.active_video(FrameIndex(2)).len(), 0);
}

#[test]
fn duration_spans_all_tracks() {
    assert_eq!(seq().duration(), FrameIndex(15));
}

#[test]
fn asymmetric_links_fail_validation() {
    let mut s = seq();
    s.clip_mut(ClipId(4)).unwrap().links.insert(ClipId(6));
    assert!(s.validate().is_err());
    s.clip_mut(ClipId(6)).unwrap().links.insert(ClipId(4));
    s.validate().unwrap();
    assert_eq!(
        s.link_group(ClipId(4)),
        BTreeSet::from([ClipId(4), ClipId(6)])
    );
    s.sweep_links(ClipId(6));
    assert!(s.clip(ClipId(4)).unwrap().links.is_empty());
}

#[test]
fn stale_next_id_fails_validation() {
    let mut s = seq();
    s.next_id = 3;
    assert!(s.validate().is_err());
}

#[test]
fn workarea_must_be_ordered() {
    assert!(Workarea::new(FrameIndex(5), FrameIndex(4)).is_err());
    let mut s = seq();
    s.workarea = Some(Workarea {
        start: FrameIndex(9),
        end: FrameIndex(1),
    });
    assert!(s.validate().is_err());
}
