use crate::{
    effects::effect::{AudioBlock, EffectRunState},
    foundation::core::{FrameIndex, Fps, frame_to_sample, sample_to_frame_floor},
    media::decoder::MediaDecoder,
    model::clip::Clip,
};

/// Timeline sample window `[start, start + frames)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleWindow {
    /// First timeline sample frame.
    pub start: u64,
    /// Sample frames requested.
    pub frames: usize,
    /// Interleaved channel count.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Sequence frame rate.
    pub fps: Fps,
}

impl SampleWindow {
    /// One past the last timeline sample frame.
    pub fn end(&self) -> u64 {
        self.start + self.frames as u64
    }
}

/// A clip's processed contribution to a window.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipAudio {
    /// Offset of the first sample frame inside the window.
    pub offset: usize,
    /// Interleaved samples.
    pub samples: Vec<f32>,
}

/// Decode and process the part of `clip` overlapping `window`. `None` when the clip
/// does not overlap it.
///
/// `states` holds one run state per effect in the chain and is resized to match.
/// A decoder failure substitutes silence for this clip only.
pub fn render_clip_audio(
    clip: &Clip,
    window: &SampleWindow,
    decoder: &dyn MediaDecoder,
    states: &mut Vec<EffectRunState>,
) -> Option<ClipAudio> {
    let (fps, rate) = (window.fps, window.sample_rate);
    let clip_start = frame_to_sample(clip.range.start.0, fps, rate);
    let clip_end = frame_to_sample(clip.range.end.0, fps, rate);
    let s0 = clip_start.max(window.start);
    let s1 = clip_end.min(window.end());
    if s0 >= s1 {
        return None;
    }

    let channels = usize::from(window.channels.max(1));
    let frames = usize::try_from(s1 - s0).ok()?;
    let local_start = s0 - clip_start;
    let source_start = frame_to_sample(clip.clip_in, fps, rate) + local_start;

    let expected = frames * channels;
    let mut samples =
        match decoder.audio_samples(&clip.media, source_start, frames, window.channels, rate) {
            Ok(s) if s.len() == expected => s,
            Ok(s) => {
                tracing::warn!(
                    clip = %clip.id,
                    got = s.len(),
                    expected,
                    "decoded block has the wrong length; substituting silence"
                );
                vec![0.0; expected]
            }
            Err(e) => {
                tracing::warn!(clip = %clip.id, error = %e, "media unavailable; substituting silence");
                vec![0.0; expected]
            }
        };

    let local_frame = |s: u64| sample_to_frame_floor(s, fps, rate);
    let first_local = local_frame(local_start);
    let last_local = local_frame(local_start + frames as u64 - 1);

    states.resize_with(clip.effects.len(), EffectRunState::default);
    for (fx, state) in clip.effects.iter().zip(states.iter_mut()) {
        let mut block = AudioBlock {
            samples: &mut samples,
            channels: window.channels,
            sample_rate: rate,
            start: local_start,
            frame_start: FrameIndex(clip.clip_in + first_local),
            frame_end: FrameIndex(clip.clip_in + last_local),
        };
        fx.apply_audio(&mut block, state);
    }

    if clip.transition_in.is_some() || clip.transition_out.is_some() {
        apply_transition_gain(clip, &mut samples, channels, local_start, local_frame);
    }

    Some(ClipAudio {
        offset: usize::try_from(s0 - window.start).ok()?,
        samples,
    })
}

fn apply_transition_gain(
    clip: &Clip,
    samples: &mut [f32],
    channels: usize,
    local_start: u64,
    local_frame: impl Fn(u64) -> u64,
) {
    let mut cached: Option<(u64, f32)> = None;
    for (i, frame) in samples.chunks_exact_mut(channels).enumerate() {
        let local = local_frame(local_start + i as u64);
        let gain = match cached {
            Some((f, g)) if f == local => g,
            _ => {
                let g = clip
                    .active_transitions(local)
                    .into_iter()
                    .map(|(t, v)| t.audio_gain(v))
                    .product::<f32>();
                cached = Some((local, g));
                g
            }
        };
        if gain != 1.0 {
            for s in frame {
                *s *= gain;
            }
        }
    }
}

/// Sum contributions into a zeroed window buffer. No clamping.
pub fn mix(window: &SampleWindow, parts: &[ClipAudio]) -> Vec<f32> {
    let channels = usize::from(window.channels.max(1));
    let mut out = vec![0.0f32; window.frames * channels];
    for part in parts {
        let base = part.offset * channels;
        for (dst, src) in out[base..].iter_mut().zip(&part.samples) {
            *dst += *src;
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/audio.rs"]
mod tests;
