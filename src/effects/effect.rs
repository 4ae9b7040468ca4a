use crate::{
    effects::{
        field::{EffectField, FieldValue},
        limiter::LimiterEffect,
        raster::TextRasterizer,
        text::TextEffect,
        tone::ToneEffect,
        transform::TransformEffect,
        volume::VolumeEffect,
    },
    foundation::core::{Color, FrameIndex, MediaKind},
    foundation::error::{MontageError, MontageResult},
    render::frame::VideoFrame,
};

/// Closed set of effect variants.
///
/// Serialized as its snake_case name. A name this build does not know is kept
/// verbatim so that saving a document writes it back unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EffectKind {
    /// Base video effect: position, scale, rotation, opacity.
    Transform,
    /// Base audio effect: gain and pan.
    Volume,
    /// Oscillator mixed into (or replacing) the audio.
    Tone,
    /// Text overlay superimposed on the frame.
    Text,
    /// Hard sample ceiling.
    Limiter,
    /// Kind this build does not know; kept so documents load, never processed.
    Unknown(String),
}

impl EffectKind {
    /// Stored name.
    pub fn name(&self) -> &str {
        match self {
            Self::Transform => "transform",
            Self::Volume => "volume",
            Self::Tone => "tone",
            Self::Text => "text",
            Self::Limiter => "limiter",
            Self::Unknown(name) => name,
        }
    }

    fn processor(&self) -> Option<&'static dyn EffectProcessor> {
        match self {
            Self::Transform => Some(&TransformEffect),
            Self::Volume => Some(&VolumeEffect),
            Self::Tone => Some(&ToneEffect),
            Self::Text => Some(&TextEffect),
            Self::Limiter => Some(&LimiterEffect),
            Self::Unknown(_) => None,
        }
    }

    /// Media kind the effect applies to.
    pub fn media_kind(&self) -> Option<MediaKind> {
        match self {
            Self::Transform | Self::Text => Some(MediaKind::Video),
            Self::Volume | Self::Tone | Self::Limiter => Some(MediaKind::Audio),
            Self::Unknown(_) => None,
        }
    }

    /// Superimposing effects blend onto the incoming frame instead of replacing it.
    pub fn superimposes(&self) -> bool {
        matches!(self, Self::Text)
    }

    /// Base effect every clip of `kind` carries at chain index 0.
    pub fn base_for(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Video => Self::Transform,
            MediaKind::Audio => Self::Volume,
        }
    }
}

impl From<String> for EffectKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "transform" => Self::Transform,
            "volume" => Self::Volume,
            "tone" => Self::Tone,
            "text" => Self::Text,
            "limiter" => Self::Limiter,
            _ => Self::Unknown(name),
        }
    }
}

impl From<EffectKind> for String {
    fn from(kind: EffectKind) -> Self {
        match kind {
            EffectKind::Unknown(name) => name,
            known => known.name().to_string(),
        }
    }
}

/// Per-effect bookkeeping for one contiguous playback run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectRunState {
    /// End (exclusive, clip-local sample index) of the previous block.
    pub last_end: Option<u64>,
    /// Oscillator phase in `[0, 1)`.
    pub phase: f64,
}

impl EffectRunState {
    /// Reset unless `start` continues the previous block.
    pub fn continue_at(&mut self, start: u64) {
        if self.last_end != Some(start) {
            *self = Self::default();
        }
    }
}

/// Field values of one effect resolved at a clip source frame.
#[derive(Clone, Copy, Debug)]
pub struct Params<'a> {
    effect: &'a Effect,
    frame: FrameIndex,
}

impl<'a> Params<'a> {
    /// Resolve against `effect` at `frame`.
    pub fn new(effect: &'a Effect, frame: FrameIndex) -> Self {
        Self { effect, frame }
    }

    /// Same effect at another frame.
    pub fn at(self, frame: FrameIndex) -> Self {
        Self { frame, ..self }
    }

    /// Source frame the values are resolved at.
    pub fn frame(&self) -> FrameIndex {
        self.frame
    }

    /// Raw resolved value of `id`.
    pub fn value(&self, id: &str) -> MontageResult<FieldValue> {
        self.effect
            .field(id)
            .ok_or_else(|| MontageError::effect(format!("missing field '{id}'")))?
            .value_at(self.frame)
    }

    /// Number field.
    pub fn double(&self, id: &str) -> MontageResult<f64> {
        self.value(id)?.as_f64()
    }

    /// Toggle field.
    pub fn bool(&self, id: &str) -> MontageResult<bool> {
        self.value(id)?.as_bool()
    }

    /// Option index field.
    pub fn choice(&self, id: &str) -> MontageResult<u32> {
        self.value(id)?.as_enum()
    }

    /// Color field.
    pub fn color(&self, id: &str) -> MontageResult<Color> {
        self.value(id)?.as_color()
    }

    /// Text or font field.
    pub fn text(&self, id: &str) -> MontageResult<String> {
        Ok(self.value(id)?.as_str()?.to_string())
    }
}

/// Inputs shared by video processing calls.
#[derive(Clone, Copy)]
pub struct VideoContext<'a> {
    /// Glyph rasterizer for text effects.
    pub rasterizer: &'a dyn TextRasterizer,
}

/// A slice of interleaved samples belonging to one clip.
#[derive(Debug)]
pub struct AudioBlock<'a> {
    /// Interleaved samples, `frames * channels` long.
    pub samples: &'a mut [f32],
    /// Channel count.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Clip-local index of the first sample frame.
    pub start: u64,
    /// Clip source frame at the first sample.
    pub frame_start: FrameIndex,
    /// Clip source frame at the last sample.
    pub frame_end: FrameIndex,
}

impl AudioBlock<'_> {
    /// Number of sample frames.
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / usize::from(self.channels)
        }
    }

    /// Clip-local index one past the last sample frame.
    pub fn end(&self) -> u64 {
        self.start + self.frames() as u64
    }
}

/// Shared capability of every effect variant.
///
/// Processors must resolve every parameter before touching a buffer, so that a field
/// evaluation error leaves the input unchanged.
pub trait EffectProcessor: Sync {
    /// Default fields of a fresh instance, in display order.
    fn fields(&self) -> Vec<EffectField>;

    /// Transform `frame` in place.
    fn process_video(
        &self,
        _params: Params<'_>,
        _ctx: &VideoContext<'_>,
        _frame: &mut VideoFrame,
    ) -> MontageResult<()> {
        Ok(())
    }

    /// Transform `block` in place.
    fn process_audio(
        &self,
        _params: Params<'_>,
        _block: &mut AudioBlock<'_>,
        _state: &mut EffectRunState,
    ) -> MontageResult<()> {
        Ok(())
    }
}

/// One entry of a clip's effect chain.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Effect {
    /// Variant.
    pub kind: EffectKind,
    /// Disabled effects are skipped.
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    /// Ordered fields.
    pub fields: Vec<EffectField>,
}

fn enabled_default() -> bool {
    true
}

impl Effect {
    /// Fresh instance with default field values.
    pub fn new(kind: EffectKind) -> Self {
        let fields = kind.processor().map(|p| p.fields()).unwrap_or_default();
        Self {
            kind,
            enabled: true,
            fields,
        }
    }

    /// Field by id.
    pub fn field(&self, id: &str) -> Option<&EffectField> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Mutable field by id.
    pub fn field_mut(&mut self, id: &str) -> Option<&mut EffectField> {
        self.fields.iter_mut().find(|f| f.id == id)
    }

    /// Structural check: unique field ids, typed values, known fields present.
    pub fn validate(&self) -> MontageResult<()> {
        for (i, f) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|g| g.id == f.id) {
                return Err(MontageError::validation(format!(
                    "duplicate field '{}' in {:?} effect",
                    f.id, self.kind
                )));
            }
            f.validate()?;
        }
        if let Some(p) = self.kind.processor() {
            for expected in p.fields() {
                let Some(f) = self.field(&expected.id) else {
                    return Err(MontageError::validation(format!(
                        "{:?} effect is missing field '{}'",
                        self.kind, expected.id
                    )));
                };
                if f.domain != expected.domain {
                    return Err(MontageError::validation(format!(
                        "{:?} effect field '{}' has an unexpected domain",
                        self.kind, f.id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Run on `frame` at clip source frame `at`. Returns `true` when the effect ran.
    pub fn apply_video(&self, at: FrameIndex, ctx: &VideoContext<'_>, frame: &mut VideoFrame) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(p) = self.kind.processor() else {
            return false;
        };
        match p.process_video(Params::new(self, at), ctx, frame) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(kind = ?self.kind, error = %e, "video effect skipped");
                false
            }
        }
    }

    /// Run on `block`. Returns `true` when the effect ran.
    pub fn apply_audio(&self, block: &mut AudioBlock<'_>, state: &mut EffectRunState) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(p) = self.kind.processor() else {
            return false;
        };
        match p.process_audio(Params::new(self, block.frame_start), block, state) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(kind = ?self.kind, error = %e, "audio effect skipped");
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/effect.rs"]
mod tests;
