use super::*;
use crate::foundation::core::Color;

#[test]
fn zero_length_is_rejected() {
    assert!(Transition::new(TransitionKind::CrossDissolve, 0).is_err());
}

#[test]
fn opening_visibility_ramps_up() {
    let t = Transition::new(TransitionKind::CrossDissolve, 4).unwrap();
    assert_eq!(t.visibility(TransitionSide::Opening, 0, 10), Some(0.25));
    assert_eq!(t.visibility(TransitionSide::Opening, 3, 10), Some(1.0));
    assert_eq!(t.visibility(TransitionSide::Opening, 4, 10), None);
}

#[test]
fn closing_visibility_mirrors_opening() {
    let t = Transition::new(TransitionKind::CrossDissolve, 4).unwrap();
    assert_eq!(t.visibility(TransitionSide::Closing, 9, 10), Some(0.25));
    assert_eq!(t.visibility(TransitionSide::Closing, 6, 10), Some(1.0));
    assert_eq!(t.visibility(TransitionSide::Closing, 5, 10), None);
}

#[test]
fn length_is_clamped_to_clip() {
    let t = Transition::new(TransitionKind::CrossDissolve, 30).unwrap();
    assert_eq!(t.visibility(TransitionSide::Opening, 4, 5), Some(1.0));
}

#[test]
fn dissolve_scales_alpha_and_dip_keeps_it() {
    let dissolve = Transition::new(TransitionKind::CrossDissolve, 2).unwrap();
    let mut f = VideoFrame::solid(1, 1, Color::WHITE);
    dissolve.apply_video(&mut f, 0.5);
    assert_eq!(f.pixel(0, 0), [0.5, 0.5, 0.5, 0.5]);

    let dip = Transition::new(TransitionKind::DipToBlack, 2).unwrap();
    let mut f = VideoFrame::solid(1, 1, Color::WHITE);
    dip.apply_video(&mut f, 0.5);
    assert_eq!(f.pixel(0, 0), [0.5, 0.5, 0.5, 1.0]);
}

#[test]
fn wipe_clears_unrevealed_columns() {
    let t = Transition::new(
        TransitionKind::Wipe {
            dir: WipeDir::LeftToRight,
        },
        2,
    )
    .unwrap();
    let mut f = VideoFrame::solid(4, 1, Color::WHITE);
    t.apply_video(&mut f, 0.5);
    assert_eq!(f.pixel(1, 0)[3], 1.0);
    assert_eq!(f.pixel(2, 0)[3], 0.0);
}

#[test]
fn kind_serializes_with_type_tag() {
    let json = serde_json::to_string(&TransitionKind::Wipe {
        dir: WipeDir::TopToBottom,
    })
    .unwrap();
    assert_eq!(json, r#"{"type":"wipe","dir":"top_to_bottom"}"#);
}
