use std::path::{Path, PathBuf};

use crate::foundation::{
    error::{MontageError, MontageResult},
    timecode::TimecodeView,
};

/// Which tracks a ripple edit shifts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RippleScope {
    /// Only the tracks holding the edited clips.
    Track,
    /// Edited tracks plus the tracks of clips linked to the edited clips.
    #[default]
    LinkedTracks,
    /// Every track in the sequence.
    AllTracks,
}

/// Title/action-safe guide settings.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TitleSafeConfig {
    /// Draw the guides on previews.
    pub enabled: bool,
    /// Constrain the guides to this width/height ratio instead of the frame's.
    pub custom_ratio: Option<f64>,
}

/// Compositor threading.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Evaluate clip effect chains on a rayon pool.
    pub parallel: bool,
    /// Pool size; `None` uses rayon's default.
    pub threads: Option<usize>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: None,
        }
    }
}

/// Engine-wide settings, passed explicitly to the editor and compositor.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ripple policy for trims and ripple deletes.
    pub ripple_scope: RippleScope,
    /// Maximum retained undo steps; oldest are dropped first.
    pub undo_limit: usize,
    /// Length in frames used by "add default transition".
    pub default_transition_length: u64,
    /// Display waveforms as absolute values.
    pub rectified_waveforms: bool,
    /// Timecode display style.
    pub timecode_view: TimecodeView,
    /// Safe-area guides.
    pub title_safe: TitleSafeConfig,
    /// Compositor threading.
    pub render: RenderConfig,
    /// Output channel count for mixes.
    pub audio_channels: u16,
    /// Move, trim, split and delete carry linked clips along.
    pub edit_selects_links: bool,
    /// Extra font directories for text effects, on top of the system fonts.
    pub font_dirs: Vec<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ripple_scope: RippleScope::default(),
            undo_limit: 256,
            default_transition_length: 30,
            rectified_waveforms: false,
            timecode_view: TimecodeView::default(),
            title_safe: TitleSafeConfig::default(),
            render: RenderConfig::default(),
            audio_channels: 2,
            edit_selects_links: true,
            font_dirs: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Range checks that serde cannot express.
    pub fn validate(&self) -> MontageResult<()> {
        if self.audio_channels == 0 {
            return Err(MontageError::validation("audio_channels must be > 0"));
        }
        if self.default_transition_length == 0 {
            return Err(MontageError::validation(
                "default_transition_length must be > 0",
            ));
        }
        if let Some(r) = self.title_safe.custom_ratio
            && !(r.is_finite() && r > 0.0)
        {
            return Err(MontageError::validation(
                "title_safe.custom_ratio must be finite and > 0",
            ));
        }
        if self.render.threads == Some(0) {
            return Err(MontageError::validation("render.threads must be > 0 when set"));
        }
        Ok(())
    }

    /// Parse and validate JSON.
    pub fn from_json_str(s: &str) -> MontageResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| MontageError::validation(format!("config parse: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> MontageResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(s) => Self::from_json_str(&s),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(MontageError::Other(anyhow::Error::new(e).context(format!(
                "read config '{}'",
                path.display()
            )))),
        }
    }

    /// Write pretty JSON to `path`.
    pub fn save(&self, path: &Path) -> MontageResult<()> {
        let s = serde_json::to_string_pretty(self)
            .map_err(|e| MontageError::Other(anyhow::Error::new(e)))?;
        std::fs::write(path, s).map_err(|e| {
            MontageError::Other(
                anyhow::Error::new(e).context(format!("write config '{}'", path.display())),
            )
        })
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
