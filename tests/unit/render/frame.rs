use super::*;

#[test]
fn over_half_alpha_blends_evenly() {
    let bottom = Color::rgba(0.2, 0.4, 0.6, 1.0).premultiplied();
    let top = Color::rgba(1.0, 0.0, 0.5, 0.5).premultiplied();
    let out = over(bottom, top, 1.0);
    let expect = [
        0.5 * 1.0 + 0.5 * 0.2,
        0.5 * 0.0 + 0.5 * 0.4,
        0.5 * 0.5 + 0.5 * 0.6,
        1.0,
    ];
    for (a, b) in out.iter().zip(expect) {
        assert!((a - b).abs() < 1e-6, "{out:?}");
    }
}

#[test]
fn over_with_zero_opacity_is_identity() {
    let dst = [0.1, 0.2, 0.3, 0.4];
    assert_eq!(over(dst, [1.0, 1.0, 1.0, 1.0], 0.0), dst);
    assert_eq!(over(dst, [0.0, 0.0, 0.0, 0.0], 1.0), dst);
}

#[test]
fn over_in_place_requires_matching_sizes() {
    let mut a = VideoFrame::transparent(2, 2);
    let b = VideoFrame::transparent(3, 2);
    assert!(a.over_in_place(&b, 1.0).is_err());
}

#[test]
fn rgba8_conversion_round_trips_opaque_pixels() {
    let bytes = vec![255, 0, 128, 255, 10, 20, 30, 255];
    let frame = VideoFrame::from_straight_rgba8(2, 1, &bytes).unwrap();
    assert_eq!(frame.to_straight_rgba8(), bytes);
}

#[test]
fn scale_color_keeps_alpha() {
    let mut f = VideoFrame::solid(1, 1, Color::WHITE);
    f.scale_color(0.25);
    assert_eq!(f.pixel(0, 0), [0.25, 0.25, 0.25, 1.0]);
}
