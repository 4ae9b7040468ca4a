use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use crate::{
    edit::editor::Editor,
    foundation::{
        core::{FrameIndex, frame_to_sample},
        error::MontageResult,
    },
    model::sequence::Sequence,
    render::{compositor::Compositor, frame::VideoFrame},
};

/// Pull-based playback cursor.
///
/// The driver owns the cadence; this type only hands out the next frame or sample
/// window. `stop` may be called from any thread and is observed before the next
/// request renders anything, so a stopped playback never surfaces a partial frame.
#[derive(Debug)]
pub struct Playback {
    running: Arc<AtomicBool>,
    looping: AtomicBool,
    frame: AtomicU64,
    sample: AtomicU64,
}

impl Default for Playback {
    fn default() -> Self {
        Self::new()
    }
}

impl Playback {
    /// Stopped playback at frame 0.
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            looping: AtomicBool::new(false),
            frame: AtomicU64::new(0),
            sample: AtomicU64::new(0),
        }
    }

    /// Handle that stops this playback when set to `false`.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Loop inside the sequence workarea, when one is set.
    pub fn set_looping(&self, looping: bool) {
        self.looping.store(looping, Ordering::Relaxed);
    }

    /// Start from the sequence playhead.
    pub fn start(&self, editor: &Editor) -> MontageResult<()> {
        let (playhead, sample) = editor.read(|s| (s.playhead, playhead_sample(s, s.playhead)))?;
        self.frame.store(playhead.0, Ordering::SeqCst);
        self.sample.store(sample, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
        tracing::info!(frame = playhead.0, "playback started");
        Ok(())
    }

    /// Request a stop; takes effect before the next request.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            tracing::info!(frame = self.frame.load(Ordering::SeqCst), "playback stopped");
        }
    }

    /// `true` until stopped.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Frame the next [`Self::next_frame`] renders.
    pub fn position(&self) -> FrameIndex {
        FrameIndex(self.frame.load(Ordering::SeqCst))
    }

    /// Jump to `frame`. Moves the editor playhead and drops effect run state, since
    /// the next window is not contiguous with the last one.
    pub fn seek(
        &self,
        editor: &Editor,
        compositor: &Compositor,
        frame: FrameIndex,
    ) -> MontageResult<()> {
        editor.seek(frame)?;
        let sample = editor.read(|s| playhead_sample(s, frame))?;
        self.frame.store(frame.0, Ordering::SeqCst);
        self.sample.store(sample, Ordering::SeqCst);
        compositor.reset_run_state();
        tracing::debug!(frame = frame.0, "playback seek");
        Ok(())
    }

    /// Render the frame under the cursor and advance. `Ok(None)` once stopped.
    pub fn next_frame(
        &self,
        editor: &Editor,
        compositor: &Compositor,
    ) -> MontageResult<Option<(FrameIndex, VideoFrame)>> {
        if !self.is_running() {
            return Ok(None);
        }
        let seq = editor.snapshot_read()?;
        if !self.is_running() {
            return Ok(None);
        }
        let at = FrameIndex(self.frame.load(Ordering::SeqCst));
        let frame = compositor.render_frame(&seq, at);

        let mut next = at.0 + 1;
        if let Some((start, end)) = self.loop_bounds(&seq)
            && next >= end
        {
            next = start;
        }
        self.frame.store(next, Ordering::SeqCst);
        Ok(Some((at, frame)))
    }

    /// Mix the next `frames` sample frames and advance. `Ok(None)` once stopped.
    pub fn next_audio(
        &self,
        editor: &Editor,
        compositor: &Compositor,
        frames: usize,
    ) -> MontageResult<Option<Vec<f32>>> {
        if !self.is_running() {
            return Ok(None);
        }
        let seq = editor.snapshot_read()?;
        if !self.is_running() {
            return Ok(None);
        }
        let start = self.sample.load(Ordering::SeqCst);
        let out = compositor.mix_audio(&seq, start, frames);

        let mut next = start + frames as u64;
        if let Some((lo, hi)) = self.loop_bounds(&seq) {
            let hi = frame_to_sample(hi, seq.fps, seq.sample_rate);
            if next >= hi {
                next = frame_to_sample(lo, seq.fps, seq.sample_rate);
            }
        }
        self.sample.store(next, Ordering::SeqCst);
        Ok(Some(out))
    }

    fn loop_bounds(&self, seq: &Sequence) -> Option<(u64, u64)> {
        if !self.looping.load(Ordering::Relaxed) {
            return None;
        }
        seq.workarea
            .filter(|w| w.end > w.start)
            .map(|w| (w.start.0, w.end.0))
    }
}

fn playhead_sample(seq: &Sequence, frame: FrameIndex) -> u64 {
    frame_to_sample(frame.0, seq.fps, seq.sample_rate)
}

#[cfg(test)]
#[path = "../../tests/unit/playback/driver.rs"]
mod tests;
