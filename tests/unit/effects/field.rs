use super::*;
use crate::animation::curve::Interp;

fn level() -> EffectField {
    EffectField::new(
        "level",
        FieldDomain::Double {
            min: 0.0,
            max: 100.0,
        },
        FieldValue::Double(50.0),
    )
}

#[test]
fn constant_is_used_until_keyframing_enabled() {
    let mut field = level();
    field
        .set_key(Keyframe::new(0, FieldValue::Double(10.0), Interp::Linear))
        .unwrap();
    assert_eq!(
        field.value_at(FrameIndex(0)).unwrap(),
        FieldValue::Double(50.0)
    );
    field.keyframing = true;
    assert_eq!(
        field.value_at(FrameIndex(0)).unwrap(),
        FieldValue::Double(10.0)
    );
}

#[test]
fn keyframed_doubles_interpolate() {
    let mut field = level();
    field.keyframing = true;
    field
        .set_key(Keyframe::new(0, FieldValue::Double(0.0), Interp::Linear))
        .unwrap();
    field
        .set_key(Keyframe::new(10, FieldValue::Double(100.0), Interp::Linear))
        .unwrap();
    assert_eq!(
        field.value_at(FrameIndex(5)).unwrap(),
        FieldValue::Double(50.0)
    );
}

#[test]
fn edits_clamp_to_the_numeric_range() {
    let mut field = level();
    field.set_constant(FieldValue::Double(250.0)).unwrap();
    assert_eq!(field.constant, FieldValue::Double(100.0));
}

#[test]
fn edits_reject_wrong_types_and_nan() {
    let mut field = level();
    assert!(matches!(
        field.set_constant(FieldValue::Bool(true)),
        Err(MontageError::Validation(_))
    ));
    assert!(field.set_constant(FieldValue::Double(f64::NAN)).is_err());
    assert_eq!(field.constant, FieldValue::Double(50.0));
}

#[test]
fn out_of_domain_enum_is_an_evaluation_error() {
    let mut field = EffectField::new(
        "shape",
        FieldDomain::options(&["a", "b"]),
        FieldValue::Enum(0),
    );
    field.constant = FieldValue::Enum(7);
    assert!(matches!(
        field.value_at(FrameIndex(0)),
        Err(MontageError::EffectEvaluation(_))
    ));
}

#[test]
fn colors_interpolate_per_component() {
    let a = FieldValue::Color(Color::rgba(0.0, 0.0, 0.0, 1.0));
    let b = FieldValue::Color(Color::rgba(1.0, 0.5, 0.0, 1.0));
    let mid = FieldValue::lerp(&a, &b, 0.5).as_color().unwrap();
    assert_eq!(mid, Color::rgba(0.5, 0.25, 0.0, 1.0));
}

#[test]
fn text_steps_at_the_next_key() {
    let a = FieldValue::Text("one".into());
    let b = FieldValue::Text("two".into());
    assert_eq!(FieldValue::lerp(&a, &b, 0.99), a);
    assert_eq!(FieldValue::lerp(&a, &b, 1.0), b);
}

#[test]
fn validate_flags_mistyped_keys() {
    let mut field = level();
    field
        .curve
        .insert(Keyframe::new(3, FieldValue::Text("x".into()), Interp::Hold));
    assert!(field.validate().is_err());
}
