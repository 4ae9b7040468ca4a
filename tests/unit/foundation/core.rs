use super::*;

#[test]
fn frame_range_contains_boundaries() {
    let r = FrameRange::frames(2, 5).unwrap();
    assert!(!r.contains(FrameIndex(1)));
    assert!(r.contains(FrameIndex(2)));
    assert!(r.contains(FrameIndex(4)));
    assert!(!r.contains(FrameIndex(5)));
}

#[test]
fn frame_range_rejects_inverted_bounds() {
    assert!(FrameRange::frames(5, 2).is_err());
}

#[test]
fn touching_ranges_do_not_overlap() {
    let a = FrameRange::frames(0, 10).unwrap();
    let b = FrameRange::frames(10, 20).unwrap();
    assert!(!a.overlaps(b));
    assert!(a.overlaps(FrameRange::frames(9, 11).unwrap()));
    assert_eq!(a.intersect(b), None);
    assert_eq!(
        a.intersect(FrameRange::frames(5, 30).unwrap()),
        Some(FrameRange::frames(5, 10).unwrap())
    );
}

#[test]
fn shift_refuses_to_underflow() {
    let r = FrameRange::frames(3, 8).unwrap();
    assert_eq!(r.checked_shift(-3), Some(FrameRange::frames(0, 5).unwrap()));
    assert_eq!(r.checked_shift(-4), None);
    assert_eq!(FrameIndex(7).delta_from(FrameIndex(10)), -3);
}

#[test]
fn frame_to_sample_uses_rational_fps() {
    let fps = Fps::new(30000, 1001).unwrap();
    assert_eq!(frame_to_sample(30000, fps, 48_000), 48_000 * 1001);
    let fps = Fps::new(25, 1).unwrap();
    assert_eq!(frame_to_sample(1, fps, 48_000), 1920);
    assert_eq!(sample_to_frame_floor(1919, fps, 48_000), 0);
    assert_eq!(sample_to_frame_floor(1920, fps, 48_000), 1);
    assert_eq!(sample_to_frame_ceil(1921, fps, 48_000), 2);
}

#[test]
fn nominal_rate_rounds_ntsc() {
    assert_eq!(Fps::new(30000, 1001).unwrap().nominal(), 30);
    assert_eq!(Fps::new(24, 1).unwrap().nominal(), 24);
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
}
