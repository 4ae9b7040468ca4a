use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use anyhow::Context;

use crate::{
    foundation::{
        core::{Color, FrameIndex, MediaId},
        error::{MontageError, MontageResult},
    },
    render::frame::VideoFrame,
};

/// Supplier of decoded media buffers.
///
/// Implementations live outside the engine (codec bindings, proxy caches). The
/// compositor substitutes black or silence for any clip whose request fails.
pub trait MediaDecoder: Send + Sync {
    /// Frame `source_frame` of `media`, scaled to `width x height`.
    fn video_frame(
        &self,
        media: &MediaId,
        source_frame: FrameIndex,
        width: u32,
        height: u32,
    ) -> MontageResult<VideoFrame>;

    /// `frames` interleaved sample frames of `media` starting at source sample
    /// `start`, resampled to `sample_rate` with `channels` channels.
    fn audio_samples(
        &self,
        media: &MediaId,
        start: u64,
        frames: usize,
        channels: u16,
        sample_rate: u32,
    ) -> MontageResult<Vec<f32>>;
}

/// Interleaved PCM at a fixed rate.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioPcm {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
    /// Interleaved samples.
    pub interleaved_f32: Vec<f32>,
}

/// What a [`MemoryDecoder`] returns for one media id.
#[derive(Clone, Debug)]
pub enum MemorySource {
    /// Every frame is this colour; no audio.
    Color(Color),
    /// Source frame `n` is colour `n`; no audio.
    Frames(Vec<Color>),
    /// Every sample is this value; no video.
    Constant(f32),
    /// Recorded PCM; reads past the end are silent. No video.
    Pcm(Arc<AudioPcm>),
}

/// Decoder over synthetic in-memory sources. Unknown ids are unavailable.
#[derive(Clone, Debug, Default)]
pub struct MemoryDecoder {
    sources: HashMap<MediaId, MemorySource>,
}

impl MemoryDecoder {
    /// Empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `source` under `media`, replacing any previous entry.
    pub fn with(mut self, media: impl Into<String>, source: MemorySource) -> Self {
        self.insert(media, source);
        self
    }

    /// Register `source` under `media`.
    pub fn insert(&mut self, media: impl Into<String>, source: MemorySource) {
        self.sources.insert(MediaId::new(media), source);
    }

    fn source(&self, media: &MediaId) -> MontageResult<&MemorySource> {
        self.sources
            .get(media)
            .ok_or_else(|| MontageError::media(media, "not registered"))
    }
}

impl MediaDecoder for MemoryDecoder {
    fn video_frame(
        &self,
        media: &MediaId,
        source_frame: FrameIndex,
        width: u32,
        height: u32,
    ) -> MontageResult<VideoFrame> {
        match self.source(media)? {
            MemorySource::Color(c) => Ok(VideoFrame::solid(width, height, *c)),
            MemorySource::Frames(colors) => usize::try_from(source_frame.0)
                .ok()
                .and_then(|i| colors.get(i))
                .map(|c| VideoFrame::solid(width, height, *c))
                .ok_or_else(|| {
                    MontageError::media(media, format!("no frame {}", source_frame.0))
                }),
            MemorySource::Constant(_) | MemorySource::Pcm(_) => {
                Err(MontageError::media(media, "audio-only source"))
            }
        }
    }

    fn audio_samples(
        &self,
        media: &MediaId,
        start: u64,
        frames: usize,
        channels: u16,
        sample_rate: u32,
    ) -> MontageResult<Vec<f32>> {
        let channels = usize::from(channels);
        match self.source(media)? {
            MemorySource::Constant(v) => Ok(vec![*v; frames * channels]),
            MemorySource::Pcm(pcm) => {
                if pcm.sample_rate != sample_rate {
                    return Err(MontageError::media(
                        media,
                        format!(
                            "recorded at {} Hz, requested {sample_rate} Hz",
                            pcm.sample_rate
                        ),
                    ));
                }
                let src_channels = usize::from(pcm.channels.max(1));
                let src_frames = pcm.interleaved_f32.len() / src_channels;
                let mut out = vec![0.0; frames * channels];
                for (i, frame) in out.chunks_exact_mut(channels).enumerate() {
                    let Some(src) = usize::try_from(start)
                        .ok()
                        .and_then(|s| s.checked_add(i))
                        .filter(|s| *s < src_frames)
                    else {
                        break;
                    };
                    for (c, sample) in frame.iter_mut().enumerate() {
                        *sample = pcm.interleaved_f32[src * src_channels + c % src_channels];
                    }
                }
                Ok(out)
            }
            MemorySource::Color(_) | MemorySource::Frames(_) => {
                Err(MontageError::media(media, "video-only source"))
            }
        }
    }
}

/// Decoder that serves still images from a directory. The media id is a path
/// relative to the root; every source frame shows the same image.
#[derive(Debug)]
pub struct StillImageDecoder {
    root: PathBuf,
    cache: Mutex<HashMap<MediaId, Arc<image::RgbaImage>>>,
}

impl StillImageDecoder {
    /// Serve images below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Directory images are read from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load(&self, media: &MediaId) -> MontageResult<Arc<image::RgbaImage>> {
        if let Some(img) = self
            .cache
            .lock()
            .map_err(|_| MontageError::poisoned("still cache"))?
            .get(media)
        {
            return Ok(Arc::clone(img));
        }

        let path = self.root.join(&media.0);
        let decoded = std::fs::read(&path)
            .with_context(|| format!("read '{}'", path.display()))
            .and_then(|bytes| {
                image::load_from_memory(&bytes).context("decode image from memory")
            })
            .map_err(|e| MontageError::media(media, format!("{e:#}")))?;
        let img = Arc::new(decoded.to_rgba8());
        tracing::debug!(media = %media.0, w = img.width(), h = img.height(), "still decoded");

        self.cache
            .lock()
            .map_err(|_| MontageError::poisoned("still cache"))?
            .insert(media.clone(), Arc::clone(&img));
        Ok(img)
    }
}

impl MediaDecoder for StillImageDecoder {
    fn video_frame(
        &self,
        media: &MediaId,
        _source_frame: FrameIndex,
        width: u32,
        height: u32,
    ) -> MontageResult<VideoFrame> {
        let img = self.load(media)?;
        if img.dimensions() == (width, height) {
            return VideoFrame::from_straight_rgba8(width, height, img.as_raw());
        }
        let scaled =
            image::imageops::resize(&*img, width, height, image::imageops::FilterType::Triangle);
        VideoFrame::from_straight_rgba8(width, height, scaled.as_raw())
    }

    fn audio_samples(
        &self,
        media: &MediaId,
        _start: u64,
        _frames: usize,
        _channels: u16,
        _sample_rate: u32,
    ) -> MontageResult<Vec<f32>> {
        Err(MontageError::media(media, "still images carry no audio"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/decoder.rs"]
mod tests;
