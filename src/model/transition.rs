use crate::{
    foundation::error::{MontageError, MontageResult},
    render::frame::VideoFrame,
};

/// Direction a wipe edge travels while the clip is revealed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WipeDir {
    /// Reveal from the left edge.
    LeftToRight,
    /// Reveal from the right edge.
    RightToLeft,
    /// Reveal from the top edge.
    TopToBottom,
    /// Reveal from the bottom edge.
    BottomToTop,
}

/// Transition variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransitionKind {
    /// Fade clip alpha.
    CrossDissolve,
    /// Fade clip colour through black.
    DipToBlack,
    /// Reveal behind a moving edge.
    Wipe {
        /// Edge direction.
        dir: WipeDir,
    },
}

/// Which end of a clip a transition sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionSide {
    /// Clip start.
    Opening,
    /// Clip end.
    Closing,
}

/// Transition attached to one side of a clip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Transition {
    /// Variant.
    pub kind: TransitionKind,
    /// Length in frames, at least one.
    pub length: u64,
}

impl Transition {
    /// Build a transition; `length` must be non-zero.
    pub fn new(kind: TransitionKind, length: u64) -> MontageResult<Self> {
        if length == 0 {
            return Err(MontageError::validation("transition length must be >= 1"));
        }
        Ok(Self { kind, length })
    }

    /// Visibility in `(0, 1]` at clip-local frame `local`, or `None` outside the
    /// transition window. Opening transitions reach `(local + 1) / length`; closing
    /// transitions mirror that towards the clip end.
    pub fn visibility(&self, side: TransitionSide, local: u64, clip_len: u64) -> Option<f64> {
        let len = self.length.min(clip_len);
        if len == 0 || local >= clip_len {
            return None;
        }
        let step = match side {
            TransitionSide::Opening => local + 1,
            TransitionSide::Closing => clip_len - local,
        };
        (step <= len).then(|| step as f64 / len as f64)
    }

    /// Apply to a processed clip frame at the given visibility.
    pub fn apply_video(&self, frame: &mut VideoFrame, visibility: f64) {
        let v = visibility.clamp(0.0, 1.0);
        if v >= 1.0 {
            return;
        }
        match self.kind {
            TransitionKind::CrossDissolve => frame.scale_alpha(v as f32),
            TransitionKind::DipToBlack => frame.scale_color(v as f32),
            TransitionKind::Wipe { dir } => wipe(frame, dir, v),
        }
    }

    /// Linear gain for audio at the given visibility.
    pub fn audio_gain(&self, visibility: f64) -> f32 {
        visibility.clamp(0.0, 1.0) as f32
    }
}

fn wipe(frame: &mut VideoFrame, dir: WipeDir, v: f64) {
    let (w, h) = (frame.width, frame.height);
    let edge_x = (f64::from(w) * v).round() as u32;
    let edge_y = (f64::from(h) * v).round() as u32;
    for y in 0..h {
        for x in 0..w {
            let visible = match dir {
                WipeDir::LeftToRight => x < edge_x,
                WipeDir::RightToLeft => x >= w - edge_x,
                WipeDir::TopToBottom => y < edge_y,
                WipeDir::BottomToTop => y >= h - edge_y,
            };
            if !visible {
                frame.set_pixel(x, y, [0.0; 4]);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/transition.rs"]
mod tests;
