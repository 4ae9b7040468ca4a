use crate::{
    effects::{
        effect::{AudioBlock, EffectProcessor, EffectRunState, Params},
        field::{EffectField, FieldDomain, FieldValue},
    },
    foundation::error::MontageResult,
};

/// Clamps samples to `[-ceiling, ceiling]`. Mixing never clips on its own; this is
/// the explicit way to do it.
#[derive(Clone, Copy, Debug, Default)]
pub struct LimiterEffect;

impl EffectProcessor for LimiterEffect {
    fn fields(&self) -> Vec<EffectField> {
        vec![EffectField::new(
            "ceiling",
            FieldDomain::Double { min: 0.0, max: 1.0 },
            FieldValue::Double(1.0),
        )]
    }

    fn process_audio(
        &self,
        params: Params<'_>,
        block: &mut AudioBlock<'_>,
        _state: &mut EffectRunState,
    ) -> MontageResult<()> {
        let ceiling = params.double("ceiling")? as f32;
        for s in block.samples.iter_mut() {
            *s = s.clamp(-ceiling, ceiling);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/limiter.rs"]
mod tests;
