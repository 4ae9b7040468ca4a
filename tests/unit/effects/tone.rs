use super::*;
use crate::{
    effects::effect::{Effect, EffectKind},
    foundation::core::FrameIndex,
};

fn run(fx: &Effect, samples: &mut [f32], start: u64, state: &mut EffectRunState) {
    let mut block = AudioBlock {
        samples,
        channels: 1,
        sample_rate: 48_000,
        start,
        frame_start: FrameIndex(0),
        frame_end: FrameIndex(0),
    };
    assert!(fx.apply_audio(&mut block, state));
}

#[test]
fn contiguous_blocks_continue_the_phase() {
    let fx = Effect::new(EffectKind::Tone);
    let mut whole = vec![0.0f32; 96];
    run(&fx, &mut whole, 0, &mut EffectRunState::default());

    let mut state = EffectRunState::default();
    let mut a = vec![0.0f32; 48];
    let mut b = vec![0.0f32; 48];
    run(&fx, &mut a, 0, &mut state);
    run(&fx, &mut b, 48, &mut state);
    a.extend_from_slice(&b);
    for (x, y) in whole.iter().zip(&a) {
        assert!((x - y).abs() < 1e-6);
    }
}

#[test]
fn seeking_restarts_the_phase() {
    let fx = Effect::new(EffectKind::Tone);
    let mut state = EffectRunState::default();
    let mut a = vec![0.0f32; 10];
    run(&fx, &mut a, 0, &mut state);
    let mut b = vec![0.0f32; 10];
    run(&fx, &mut b, 5000, &mut state);
    // sin(0) at the start of a fresh run.
    assert_eq!(b[0], 0.0);
    assert_eq!(state.last_end, Some(5010));
}

#[test]
fn replace_mode_overwrites_input() {
    let mut fx = Effect::new(EffectKind::Tone);
    fx.field_mut("mix")
        .unwrap()
        .set_constant(FieldValue::Bool(false))
        .unwrap();
    fx.field_mut("type")
        .unwrap()
        .set_constant(FieldValue::Enum(1))
        .unwrap();
    let mut samples = vec![0.9f32; 4];
    run(&fx, &mut samples, 0, &mut EffectRunState::default());
    assert!(samples.iter().all(|s| (*s - 0.25).abs() < 1e-6));
}

#[test]
fn amount_scales_amplitude() {
    let mut fx = Effect::new(EffectKind::Tone);
    fx.field_mut("amount")
        .unwrap()
        .set_constant(FieldValue::Double(0.0))
        .unwrap();
    let mut samples = vec![0.3f32; 8];
    run(&fx, &mut samples, 0, &mut EffectRunState::default());
    assert!(samples.iter().all(|s| *s == 0.3));
}
