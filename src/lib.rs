//! Montage is a non-linear editing engine: the timeline model, keyframed effects, video
//! compositing, audio mixing and the undoable command system behind a video editor.
//!
//! # Pipeline overview
//!
//! 1. **Edit**: [`Command`]s are applied through an [`Editor`] (or a bare [`UndoStack`]).
//!    Each command is atomic; a rejected command leaves the [`Sequence`] untouched.
//! 2. **Resolve**: for a timeline frame, each visible [`Clip`] maps to a source frame and its
//!    effect chain resolves every field from constants or keyframe curves.
//! 3. **Render**: the [`Compositor`] composites video bottom track first and sums audio into
//!    fixed-length sample windows.
//! 4. **Play** (optional): a [`Playback`] cursor pulls frames and sample windows at a cadence
//!    chosen by the caller.
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic edits**: replaying the applied commands from the same starting sequence
//!   reproduces the same ids and topology.
//! - **No IO in renderers**: decoding is delegated to a [`MediaDecoder`].
//! - **Premultiplied RGBA** end-to-end inside the compositor.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Frame/time primitives, ids, errors and timecode formatting.
pub mod foundation {
    /// Frame and identity primitives.
    pub mod core;
    /// Error taxonomy.
    pub mod error;
    /// Timecode display.
    pub mod timecode;
}

/// Keyframe curves.
pub mod animation {
    /// Interpolated keyframe curves.
    pub mod curve;
}

/// Effect fields, the effect capability and the built-in effects.
pub mod effects {
    /// Effect instances and the processor capability.
    pub mod effect;
    /// Typed, animatable effect parameters.
    pub mod field;
    /// Font-backed text rasterizer.
    pub mod font;
    /// Output ceiling.
    pub mod limiter;
    /// Glyph masks and the text rasterizer seam.
    pub mod raster;
    /// Text overlay.
    pub mod text;
    /// Tone generator.
    pub mod tone;
    /// Base video effect.
    pub mod transform;
    /// Base audio effect.
    pub mod volume;
}

/// Sequences, tracks, clips and transitions.
pub mod model {
    /// Clips.
    pub mod clip;
    /// Sequences.
    pub mod sequence;
    /// Tracks.
    pub mod track;
    /// Clip transitions.
    pub mod transition;
}

/// Commands, undo history and the shared editor.
pub mod edit {
    /// Reversible structural commands.
    pub mod command;
    /// Shared-state editor facade.
    pub mod editor;
    /// Undo/redo stacks.
    pub mod history;
}

/// Frame buffers and compositing.
pub mod render {
    /// Per-clip audio and mixing.
    pub mod audio;
    /// Compositor entry point.
    pub mod compositor;
    /// Frame buffers.
    pub mod frame;
    /// Display-only guides.
    pub mod guides;
    /// Per-clip video and layer compositing.
    pub mod video;
}

/// Media decoding seam.
pub mod media {
    /// Decoder trait and bundled decoders.
    pub mod decoder;
}

/// Pull-based playback.
pub mod playback {
    /// Playback cursor.
    pub mod driver;
}

/// Document persistence.
pub mod persist {
    /// JSON sequence documents.
    pub mod document;
}

/// Engine configuration.
pub mod config;

pub use crate::animation::curve::{Interp, Keyframe, KeyframeCurve, Lerp};
pub use crate::config::{EngineConfig, RenderConfig, RippleScope, TitleSafeConfig};
pub use crate::edit::command::{ClipPlacement, Command, EditContext, TrimEdge};
pub use crate::edit::editor::{ChangeEvent, ChangeListener, ChannelListener, Editor};
pub use crate::edit::history::{Outcome, UndoStack};
pub use crate::effects::effect::{
    AudioBlock, Effect, EffectKind, EffectProcessor, EffectRunState, Params, VideoContext,
};
pub use crate::effects::field::{EffectField, FieldDomain, FieldValue};
pub use crate::effects::font::FontRasterizer;
pub use crate::effects::raster::{GlyphMask, TextLayoutRequest, TextRasterizer};
pub use crate::foundation::core::{
    ClipId, Color, FrameIndex, FrameRange, Fps, MediaId, MediaKind, TrackId, frame_to_sample,
};
pub use crate::foundation::error::{MontageError, MontageResult};
pub use crate::foundation::timecode::{TimecodeView, format_timecode};
pub use crate::media::decoder::{
    AudioPcm, MediaDecoder, MemoryDecoder, MemorySource, StillImageDecoder,
};
pub use crate::model::clip::Clip;
pub use crate::model::sequence::{Sequence, Workarea};
pub use crate::model::track::Track;
pub use crate::model::transition::{Transition, TransitionKind, TransitionSide, WipeDir};
pub use crate::persist::document::{
    FORMAT_VERSION, SequenceDocument, load_from_path, load_sequence, save_sequence, save_to_path,
};
pub use crate::playback::driver::Playback;
pub use crate::render::compositor::Compositor;
pub use crate::render::frame::VideoFrame;
pub use crate::render::guides::{safe_areas, title_safe_overlay, waveform_display};
