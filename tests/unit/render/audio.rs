use super::*;
use crate::{
    effects::{
        effect::{Effect, EffectKind},
        field::FieldValue,
    },
    foundation::core::{ClipId, FrameRange, MediaId, MediaKind, TrackId},
    media::decoder::{MemoryDecoder, MemorySource},
    model::transition::{Transition, TransitionKind},
};

// 25 fps at 100 Hz: four sample frames per video frame.
fn window(start: u64, frames: usize) -> SampleWindow {
    SampleWindow {
        start,
        frames,
        channels: 1,
        sample_rate: 100,
        fps: Fps::new(25, 1).unwrap(),
    }
}

fn clip(media: &str, start: u64, end: u64) -> Clip {
    Clip::new(
        ClipId(3),
        TrackId(2),
        MediaKind::Audio,
        MediaId::new(media),
        FrameRange::frames(start, end).unwrap(),
        0,
    )
}

fn decoder() -> MemoryDecoder {
    MemoryDecoder::new().with("hum", MemorySource::Constant(0.2))
}

#[test]
fn contribution_is_clipped_to_window() {
    let c = clip("hum", 2, 5);
    let mut states = Vec::new();
    let part = render_clip_audio(&c, &window(0, 16), &decoder(), &mut states).unwrap();
    assert_eq!(part.offset, 8);
    assert_eq!(part.samples, vec![0.2; 8]);
    assert_eq!(states.len(), 1);

    assert!(render_clip_audio(&c, &window(20, 4), &decoder(), &mut states).is_none());
}

#[test]
fn unavailable_media_contributes_silence() {
    let c = clip("gone", 0, 2);
    let part = render_clip_audio(&c, &window(0, 8), &decoder(), &mut Vec::new()).unwrap();
    assert_eq!(part.samples, vec![0.0; 8]);
}

#[test]
fn opening_transition_ramps_gain_per_frame() {
    let mut c = clip("hum", 0, 4);
    c.transition_in = Some(Transition::new(TransitionKind::CrossDissolve, 2).unwrap());
    let part = render_clip_audio(&c, &window(0, 12), &decoder(), &mut Vec::new()).unwrap();
    assert_eq!(&part.samples[..4], &[0.1; 4]);
    assert_eq!(&part.samples[4..], &[0.2; 8]);
}

#[test]
fn mix_sums_without_clamping() {
    let w = window(0, 4);
    let parts = [
        ClipAudio {
            offset: 0,
            samples: vec![0.75; 4],
        },
        ClipAudio {
            offset: 2,
            samples: vec![0.5; 2],
        },
    ];
    assert_eq!(mix(&w, &parts), vec![0.75, 0.75, 1.25, 1.25]);
    assert_eq!(mix(&w, &[]), vec![0.0; 4]);
}

fn tone_clip() -> Clip {
    let mut c = clip("hum", 0, 10);
    let mut tone = Effect::new(EffectKind::Tone);
    tone.field_mut("frequency")
        .unwrap()
        .set_constant(FieldValue::Double(20.0))
        .unwrap();
    c.effects.push(tone);
    c
}

#[test]
fn contiguous_windows_continue_oscillator_phase() {
    let c = tone_clip();
    let d = decoder();

    let whole = render_clip_audio(&c, &window(0, 16), &d, &mut Vec::new()).unwrap();
    let mut states = Vec::new();
    let a = render_clip_audio(&c, &window(0, 8), &d, &mut states).unwrap();
    let b = render_clip_audio(&c, &window(8, 8), &d, &mut states).unwrap();
    let joined: Vec<f32> = a.samples.into_iter().chain(b.samples).collect();
    assert_eq!(joined, whole.samples);
}

#[test]
fn seeking_resets_oscillator_phase() {
    let c = tone_clip();
    let d = decoder();

    let fresh = render_clip_audio(&c, &window(0, 8), &d, &mut Vec::new()).unwrap();
    let mut states = Vec::new();
    render_clip_audio(&c, &window(8, 8), &d, &mut states).unwrap();
    let after_seek = render_clip_audio(&c, &window(0, 8), &d, &mut states).unwrap();
    assert_eq!(after_seek, fresh);
}
