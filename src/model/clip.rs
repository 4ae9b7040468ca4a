use std::collections::BTreeSet;

use crate::{
    effects::effect::{Effect, EffectKind},
    foundation::core::{ClipId, FrameIndex, FrameRange, MediaId, MediaKind, TrackId},
    foundation::error::{MontageError, MontageResult},
    model::transition::{Transition, TransitionSide},
};

/// A bounded reference to source media placed on a track.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Clip {
    /// Stable identity.
    pub id: ClipId,
    /// Owning track.
    pub track: TrackId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Media kind, equal to the owning track's.
    pub kind: MediaKind,
    /// Timeline `[in, out)`.
    pub range: FrameRange,
    /// Source frame shown at `range.start`.
    pub clip_in: u64,
    /// Source media.
    pub media: MediaId,
    /// Effect chain; index 0 is the base transform or volume effect.
    pub effects: Vec<Effect>,
    /// Clips that move, trim and delete together with this one.
    #[serde(default)]
    pub links: BTreeSet<ClipId>,
    /// Disabled clips are skipped by the compositor.
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    /// Opening transition.
    #[serde(default)]
    pub transition_in: Option<Transition>,
    /// Closing transition.
    #[serde(default)]
    pub transition_out: Option<Transition>,
}

fn enabled_default() -> bool {
    true
}

impl Clip {
    /// New clip carrying only its base effect.
    pub fn new(
        id: ClipId,
        track: TrackId,
        kind: MediaKind,
        media: MediaId,
        range: FrameRange,
        clip_in: u64,
    ) -> Self {
        Self {
            id,
            track,
            name: media.0.clone(),
            kind,
            range,
            clip_in,
            media,
            effects: vec![Effect::new(EffectKind::base_for(kind))],
            links: BTreeSet::new(),
            enabled: true,
            transition_in: None,
            transition_out: None,
        }
    }

    /// Length in frames.
    pub fn len_frames(&self) -> u64 {
        self.range.len_frames()
    }

    /// Offset of `frame` from the clip start, if the clip covers it.
    pub fn local_frame(&self, frame: FrameIndex) -> Option<u64> {
        self.range
            .contains(frame)
            .then(|| frame.0 - self.range.start.0)
    }

    /// Source frame shown at timeline `frame`: `clip_in + (frame - in)`.
    pub fn source_frame(&self, frame: FrameIndex) -> Option<FrameIndex> {
        self.local_frame(frame).map(|l| FrameIndex(self.clip_in + l))
    }

    /// Transition on `side`.
    pub fn transition(&self, side: TransitionSide) -> Option<&Transition> {
        match side {
            TransitionSide::Opening => self.transition_in.as_ref(),
            TransitionSide::Closing => self.transition_out.as_ref(),
        }
    }

    /// Mutable transition slot on `side`.
    pub fn transition_mut(&mut self, side: TransitionSide) -> &mut Option<Transition> {
        match side {
            TransitionSide::Opening => &mut self.transition_in,
            TransitionSide::Closing => &mut self.transition_out,
        }
    }

    /// Transitions active at clip-local frame `local`, with their visibility.
    pub fn active_transitions(&self, local: u64) -> Vec<(&Transition, f64)> {
        let len = self.len_frames();
        [TransitionSide::Opening, TransitionSide::Closing]
            .into_iter()
            .filter_map(|side| {
                let t = self.transition(side)?;
                t.visibility(side, local, len).map(|v| (t, v))
            })
            .collect()
    }

    /// Check clip-local invariants.
    pub fn validate(&self) -> MontageResult<()> {
        if self.range.is_empty() {
            return Err(MontageError::validation(format!(
                "{} must have out > in",
                self.id
            )));
        }
        let base = EffectKind::base_for(self.kind);
        match self.effects.first() {
            Some(fx) if fx.kind == base => {}
            _ => {
                return Err(MontageError::validation(format!(
                    "{} must start its effect chain with {base:?}",
                    self.id
                )));
            }
        }
        for fx in &self.effects {
            if let Some(kind) = fx.kind.media_kind()
                && kind != self.kind
            {
                return Err(MontageError::validation(format!(
                    "{} is a {} clip and cannot carry {:?}",
                    self.id, self.kind, fx.kind
                )));
            }
            fx.validate()?;
        }
        if self.links.contains(&self.id) {
            return Err(MontageError::validation(format!(
                "{} cannot link to itself",
                self.id
            )));
        }
        for side in [TransitionSide::Opening, TransitionSide::Closing] {
            if let Some(t) = self.transition(side)
                && (t.length == 0 || t.length > self.len_frames())
            {
                return Err(MontageError::validation(format!(
                    "{} transition length {} must be within 1..={}",
                    self.id,
                    t.length,
                    self.len_frames()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/clip.rs"]
mod tests;
