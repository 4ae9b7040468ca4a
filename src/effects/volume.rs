use crate::{
    effects::{
        effect::{AudioBlock, EffectProcessor, EffectRunState, Params},
        field::{EffectField, FieldDomain, FieldValue},
    },
    foundation::error::MontageResult,
};

/// Base audio effect: gain in percent, ramped across the block, and stereo pan.
#[derive(Clone, Copy, Debug, Default)]
pub struct VolumeEffect;

fn pan_gains(pan: f64) -> (f64, f64) {
    let p = (pan / 100.0).clamp(-1.0, 1.0);
    let left = if p > 0.0 { 1.0 - p } else { 1.0 };
    let right = if p < 0.0 { 1.0 + p } else { 1.0 };
    (left, right)
}

impl EffectProcessor for VolumeEffect {
    fn fields(&self) -> Vec<EffectField> {
        vec![
            EffectField::new(
                "volume",
                FieldDomain::Double {
                    min: 0.0,
                    max: 400.0,
                },
                FieldValue::Double(100.0),
            ),
            EffectField::new(
                "pan",
                FieldDomain::Double {
                    min: -100.0,
                    max: 100.0,
                },
                FieldValue::Double(0.0),
            ),
        ]
    }

    fn process_audio(
        &self,
        params: Params<'_>,
        block: &mut AudioBlock<'_>,
        _state: &mut EffectRunState,
    ) -> MontageResult<()> {
        let g0 = params.double("volume")? / 100.0;
        let g1 = params.at(block.frame_end).double("volume")? / 100.0;
        let pan = params.double("pan")?;

        let stereo = block.channels == 2;
        let (pl, pr) = if stereo { pan_gains(pan) } else { (1.0, 1.0) };
        if g0 == 1.0 && g1 == 1.0 && pl == 1.0 && pr == 1.0 {
            return Ok(());
        }

        let frames = block.frames();
        let channels = usize::from(block.channels.max(1));
        let denom = frames.saturating_sub(1).max(1) as f64;
        for (i, frame) in block.samples.chunks_exact_mut(channels).enumerate() {
            let g = g0 + (g1 - g0) * (i as f64 / denom);
            for (c, s) in frame.iter_mut().enumerate() {
                let p = match (stereo, c) {
                    (true, 0) => pl,
                    (true, _) => pr,
                    _ => 1.0,
                };
                *s = (f64::from(*s) * g * p) as f32;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/volume.rs"]
mod tests;
