use super::*;

fn linear_ramp() -> KeyframeCurve<f64> {
    KeyframeCurve::from_keys([
        Keyframe::new(0, 0.0, Interp::Linear),
        Keyframe::new(10, 1.0, Interp::Linear),
    ])
}

#[test]
fn linear_interpolates_midpoint() {
    assert_eq!(linear_ramp().value_at(FrameIndex(5)), Some(0.5));
}

#[test]
fn values_clamp_outside_keyed_span() {
    let curve = KeyframeCurve::from_keys([
        Keyframe::new(5, 2.0, Interp::Linear),
        Keyframe::new(10, 4.0, Interp::Linear),
    ]);
    assert_eq!(curve.value_at(FrameIndex(0)), Some(2.0));
    assert_eq!(curve.value_at(FrameIndex(500)), Some(4.0));
}

#[test]
fn hold_keeps_left_value_until_next_key() {
    let curve = KeyframeCurve::from_keys([
        Keyframe::new(0, "red".to_string(), Interp::Hold),
        Keyframe::new(10, "blue".to_string(), Interp::Hold),
    ]);
    assert_eq!(curve.value_at(FrameIndex(5)).as_deref(), Some("red"));
    assert_eq!(curve.value_at(FrameIndex(9)).as_deref(), Some("red"));
    assert_eq!(curve.value_at(FrameIndex(10)).as_deref(), Some("blue"));
}

#[test]
fn knots_return_stored_values_exactly() {
    let curve = KeyframeCurve::from_keys([
        Keyframe::new(0, 0.1, Interp::Smooth),
        Keyframe::new(7, 0.7, Interp::Linear),
        Keyframe::new(13, -3.3, Interp::Smooth),
        Keyframe::new(40, 1e-9, Interp::Hold),
    ]);
    for key in curve.keys() {
        assert_eq!(curve.value_at(key.frame), Some(key.value));
    }
}

#[test]
fn smooth_stays_within_bracketing_values() {
    let curve = KeyframeCurve::from_keys([
        Keyframe::new(0, 10.0, Interp::Smooth),
        Keyframe::new(30, -5.0, Interp::Linear),
    ]);
    let mut prev = f64::INFINITY;
    for f in 0..=30 {
        let v = curve.value_at(FrameIndex(f)).unwrap();
        assert!((-5.0..=10.0).contains(&v), "frame {f} -> {v}");
        assert!(v <= prev);
        prev = v;
    }
    // Eases in: the first step is smaller than the linear step.
    let first_step = 10.0 - curve.value_at(FrameIndex(1)).unwrap();
    assert!(first_step < 0.5);
}

#[test]
fn insert_at_existing_frame_replaces() {
    let mut curve = linear_ramp();
    let replaced = curve.insert(Keyframe::new(10, 3.0, Interp::Hold));
    assert_eq!(replaced.map(|k| k.value), Some(1.0));
    assert_eq!(curve.len(), 2);
    assert_eq!(curve.value_at(FrameIndex(10)), Some(3.0));
}

#[test]
fn insert_elsewhere_keeps_order() {
    let mut curve = linear_ramp();
    curve.insert(Keyframe::new(4, 9.0, Interp::Linear));
    let frames: Vec<u64> = curve.keys().iter().map(|k| k.frame.0).collect();
    assert_eq!(frames, vec![0, 4, 10]);
    assert!(curve.validate().is_ok());
}

#[test]
fn single_key_is_constant() {
    let curve = KeyframeCurve::from_keys([Keyframe::new(20, 7_i64, Interp::Linear)]);
    assert_eq!(curve.value_at(FrameIndex(0)), Some(7));
    assert_eq!(curve.value_at(FrameIndex(20)), Some(7));
    assert_eq!(curve.value_at(FrameIndex(1000)), Some(7));
}

#[test]
fn empty_curve_has_no_value() {
    let curve = KeyframeCurve::<f64>::new();
    assert_eq!(curve.value_at(FrameIndex(3)), None);
}

#[test]
fn remove_drops_only_matching_frame() {
    let mut curve = linear_ramp();
    assert!(curve.remove(FrameIndex(3)).is_none());
    assert!(curve.remove(FrameIndex(0)).is_some());
    assert_eq!(curve.value_at(FrameIndex(0)), Some(1.0));
}

#[test]
fn unsorted_deserialized_curve_fails_validation() {
    let json = r#"{"keys":[{"frame":5,"value":1.0},{"frame":5,"value":2.0}]}"#;
    let curve: KeyframeCurve<f64> = serde_json::from_str(json).unwrap();
    assert!(curve.validate().is_err());
}
