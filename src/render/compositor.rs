use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use rayon::prelude::*;

use crate::{
    config::EngineConfig,
    effects::{
        effect::{EffectRunState, VideoContext},
        font::FontRasterizer,
        raster::TextRasterizer,
    },
    foundation::{
        core::{ClipId, FrameIndex, FrameRange, sample_to_frame_ceil, sample_to_frame_floor},
        error::{MontageError, MontageResult},
    },
    media::decoder::MediaDecoder,
    model::{clip::Clip, sequence::Sequence},
    render::{
        audio::{ClipAudio, SampleWindow, mix, render_clip_audio},
        frame::VideoFrame,
        guides::{title_safe_overlay, waveform_display},
        video::{composite_layers, render_clip},
    },
};

type RunStates = Arc<Mutex<Vec<EffectRunState>>>;

/// Produces composited frames and mixed sample windows from a sequence.
///
/// Rendering is read-only with respect to the sequence. The only mutable state is the
/// per-clip effect bookkeeping for contiguous audio playback, held behind one lock
/// per clip.
pub struct Compositor {
    config: EngineConfig,
    decoder: Arc<dyn MediaDecoder>,
    rasterizer: Arc<dyn TextRasterizer>,
    pool: Option<rayon::ThreadPool>,
    run_state: Mutex<HashMap<ClipId, RunStates>>,
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("config", &self.config)
            .field("parallel", &self.pool.is_some())
            .finish_non_exhaustive()
    }
}

impl Compositor {
    /// Compositor pulling media from `decoder`. Text renders through a
    /// [`FontRasterizer`] over the system fonts plus `config.font_dirs`.
    pub fn new(config: EngineConfig, decoder: Arc<dyn MediaDecoder>) -> MontageResult<Self> {
        config.validate()?;
        let pool = if config.render.parallel {
            Some(build_thread_pool(config.render.threads)?)
        } else {
            None
        };
        let fonts = FontRasterizer::new();
        for dir in &config.font_dirs {
            let n = fonts.register_font_dir(dir)?;
            tracing::debug!(dir = %dir.display(), fonts = n, "font dir registered");
        }
        Ok(Self {
            config,
            decoder,
            rasterizer: Arc::new(fonts),
            pool,
            run_state: Mutex::new(HashMap::new()),
        })
    }

    /// Replace the text rasterizer.
    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn TextRasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Composite every visible video clip at `frame`, bottom track first.
    #[tracing::instrument(level = "trace", skip(self, seq))]
    pub fn render_frame(&self, seq: &Sequence, frame: FrameIndex) -> VideoFrame {
        let (w, h) = (seq.width, seq.height);
        let clips = seq.active_video(frame);
        let ctx = VideoContext {
            rasterizer: &*self.rasterizer,
        };
        let decoder = &*self.decoder;
        let render = |c: &&Clip| render_clip(c, frame, w, h, decoder, &ctx);

        let layers: Vec<VideoFrame> = match &self.pool {
            Some(pool) if clips.len() > 1 => {
                pool.install(|| clips.par_iter().filter_map(render).collect())
            }
            _ => clips.iter().filter_map(render).collect(),
        };
        composite_layers(&layers, w, h)
    }

    /// [`Self::render_frame`] plus display guides enabled in the config.
    pub fn render_preview(&self, seq: &Sequence, frame: FrameIndex) -> VideoFrame {
        let out = self.render_frame(seq, frame);
        if self.config.title_safe.enabled {
            title_safe_overlay(&out, &self.config.title_safe)
        } else {
            out
        }
    }

    /// Mix `frames` interleaved sample frames starting at timeline sample `start`.
    /// The result always holds `frames * audio_channels` samples; silence is zero.
    #[tracing::instrument(level = "trace", skip(self, seq))]
    pub fn mix_audio(&self, seq: &Sequence, start: u64, frames: usize) -> Vec<f32> {
        let window = SampleWindow {
            start,
            frames,
            channels: self.config.audio_channels,
            sample_rate: seq.sample_rate,
            fps: seq.fps,
        };
        if frames == 0 {
            return Vec::new();
        }

        // One frame of slack on each side absorbs sample rounding at clip edges.
        let first = sample_to_frame_floor(start, seq.fps, seq.sample_rate).saturating_sub(1);
        let last = sample_to_frame_ceil(window.end(), seq.fps, seq.sample_rate) + 1;
        let Ok(span) = FrameRange::frames(first, last) else {
            return mix(&window, &[]);
        };
        self.prune_run_state(seq);
        let clips = seq.active_audio(span);
        let jobs: Vec<(&Clip, RunStates)> =
            clips.into_iter().map(|c| (c, self.states_for(c.id))).collect();

        let decoder = &*self.decoder;
        let render = |(clip, states): &(&Clip, RunStates)| -> Option<ClipAudio> {
            let mut states = states.lock().unwrap_or_else(PoisonError::into_inner);
            render_clip_audio(clip, &window, decoder, &mut states)
        };
        let parts: Vec<ClipAudio> = match &self.pool {
            Some(pool) if jobs.len() > 1 => {
                pool.install(|| jobs.par_iter().filter_map(render).collect())
            }
            _ => jobs.iter().filter_map(render).collect(),
        };
        mix(&window, &parts)
    }

    /// Mix a window and split it into per-channel display traces, rectified when
    /// `rectified_waveforms` is set in the config.
    pub fn waveform(&self, seq: &Sequence, start: u64, frames: usize) -> Vec<Vec<f32>> {
        let samples = self.mix_audio(seq, start, frames);
        waveform_display(
            &samples,
            self.config.audio_channels,
            self.config.rectified_waveforms,
        )
    }

    /// Forget all contiguous-playback bookkeeping.
    pub fn reset_run_state(&self) {
        self.run_state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    // Clip ids come back after undo, so state for clips that left the sequence goes.
    fn prune_run_state(&self, seq: &Sequence) {
        let mut map = self.run_state.lock().unwrap_or_else(PoisonError::into_inner);
        map.retain(|id, _| seq.clip(*id).is_some());
    }

    fn states_for(&self, clip: ClipId) -> RunStates {
        let mut map = self.run_state.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.entry(clip).or_default())
    }
}

fn build_thread_pool(threads: Option<usize>) -> MontageResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(MontageError::validation(
            "render.threads must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| MontageError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
