use crate::{
    effects::{
        effect::{AudioBlock, EffectProcessor, EffectRunState, Params},
        field::{EffectField, FieldDomain, FieldValue},
    },
    foundation::error::MontageResult,
};

/// Waveforms, indexed by the `type` field.
pub const TONE_WAVEFORMS: [&str; 4] = ["sine", "square", "triangle", "sawtooth"];

/// Oscillator that mixes into or replaces the clip's audio.
///
/// Phase is carried across contiguous blocks and restarts when playback jumps.
#[derive(Clone, Copy, Debug, Default)]
pub struct ToneEffect;

fn wave(kind: u32, phase: f64) -> f64 {
    match kind {
        1 => {
            if phase < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        2 => 1.0 - 4.0 * (phase - 0.5).abs(),
        3 => 2.0 * phase - 1.0,
        _ => (phase * std::f64::consts::TAU).sin(),
    }
}

impl EffectProcessor for ToneEffect {
    fn fields(&self) -> Vec<EffectField> {
        vec![
            EffectField::new(
                "type",
                FieldDomain::options(&TONE_WAVEFORMS),
                FieldValue::Enum(0),
            ),
            EffectField::new(
                "frequency",
                FieldDomain::Double {
                    min: 20.0,
                    max: 20_000.0,
                },
                FieldValue::Double(1000.0),
            ),
            EffectField::new(
                "amount",
                FieldDomain::Double {
                    min: 0.0,
                    max: 100.0,
                },
                FieldValue::Double(25.0),
            ),
            EffectField::new("mix", FieldDomain::Bool, FieldValue::Bool(true)),
        ]
    }

    fn process_audio(
        &self,
        params: Params<'_>,
        block: &mut AudioBlock<'_>,
        state: &mut EffectRunState,
    ) -> MontageResult<()> {
        let kind = params.choice("type")?;
        let freq = params.double("frequency")?;
        let amount = params.double("amount")? / 100.0;
        let mix = params.bool("mix")?;

        state.continue_at(block.start);
        let step = freq / f64::from(block.sample_rate.max(1));
        let channels = usize::from(block.channels.max(1));
        let mut phase = state.phase;
        for frame in block.samples.chunks_exact_mut(channels) {
            let v = (wave(kind, phase) * amount) as f32;
            for s in frame {
                if mix {
                    *s += v;
                } else {
                    *s = v;
                }
            }
            phase = (phase + step).fract();
        }
        state.phase = phase;
        state.last_end = Some(block.end());
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/tone.rs"]
mod tests;
