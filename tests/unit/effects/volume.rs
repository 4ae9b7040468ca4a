use super::*;
use crate::{
    animation::curve::{Interp, Keyframe},
    effects::effect::{Effect, EffectKind},
    foundation::core::FrameIndex,
};

fn block<'a>(samples: &'a mut [f32], channels: u16, end: u64) -> AudioBlock<'a> {
    AudioBlock {
        samples,
        channels,
        sample_rate: 48_000,
        start: 0,
        frame_start: FrameIndex(0),
        frame_end: FrameIndex(end),
    }
}

#[test]
fn default_volume_leaves_samples_untouched() {
    let fx = Effect::new(EffectKind::Volume);
    let mut s = [0.2f32, -0.2, 0.2, -0.2];
    assert!(fx.apply_audio(&mut block(&mut s, 2, 0), &mut EffectRunState::default()));
    assert_eq!(s, [0.2, -0.2, 0.2, -0.2]);
}

#[test]
fn constant_gain_scales_every_sample() {
    let mut fx = Effect::new(EffectKind::Volume);
    fx.field_mut("volume")
        .unwrap()
        .set_constant(FieldValue::Double(50.0))
        .unwrap();
    let mut s = [0.4f32; 4];
    fx.apply_audio(&mut block(&mut s, 2, 0), &mut EffectRunState::default());
    assert!(s.iter().all(|v| (*v - 0.2).abs() < 1e-6));
}

#[test]
fn keyed_gain_ramps_across_block() {
    let mut fx = Effect::new(EffectKind::Volume);
    let f = fx.field_mut("volume").unwrap();
    f.keyframing = true;
    f.set_key(Keyframe::new(0, FieldValue::Double(0.0), Interp::Linear))
        .unwrap();
    f.set_key(Keyframe::new(10, FieldValue::Double(100.0), Interp::Linear))
        .unwrap();
    let mut s = [1.0f32; 3];
    fx.apply_audio(&mut block(&mut s, 1, 10), &mut EffectRunState::default());
    assert_eq!(s[0], 0.0);
    assert!((s[1] - 0.5).abs() < 1e-6);
    assert!((s[2] - 1.0).abs() < 1e-6);
}

#[test]
fn pan_attenuates_the_opposite_channel() {
    let mut fx = Effect::new(EffectKind::Volume);
    fx.field_mut("pan")
        .unwrap()
        .set_constant(FieldValue::Double(100.0))
        .unwrap();
    let mut s = [1.0f32, 1.0];
    fx.apply_audio(&mut block(&mut s, 2, 0), &mut EffectRunState::default());
    assert_eq!(s, [0.0, 1.0]);
}
