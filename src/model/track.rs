use crate::{
    foundation::core::{ClipId, FrameIndex, FrameRange, MediaKind, TrackId},
    foundation::error::{MontageError, MontageResult},
    model::clip::Clip,
};

/// Default lane height, kept for documents written by UI front ends.
pub const DEFAULT_TRACK_HEIGHT: u32 = 40;

fn height_default() -> u32 {
    DEFAULT_TRACK_HEIGHT
}

/// An ordered lane of non-overlapping clips of one media kind.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Track {
    /// Stable identity.
    pub id: TrackId,
    /// Media kind of every clip on the track.
    pub kind: MediaKind,
    /// Clips sorted by `range.start`.
    #[serde(default)]
    pub clips: Vec<Clip>,
    /// UI lane height; ignored by the engine.
    #[serde(default = "height_default")]
    pub height: u32,
    /// UI lock flag; ignored by the engine.
    #[serde(default)]
    pub locked: bool,
}

impl Track {
    /// Empty track.
    pub fn new(id: TrackId, kind: MediaKind) -> Self {
        Self {
            id,
            kind,
            clips: Vec::new(),
            height: DEFAULT_TRACK_HEIGHT,
            locked: false,
        }
    }

    /// Index of clip `id`.
    pub fn position(&self, id: ClipId) -> Option<usize> {
        self.clips.iter().position(|c| c.id == id)
    }

    /// Clip by id.
    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == id)
    }

    /// Mutable clip by id. Callers must keep ordering intact or call [`Self::sort`].
    pub fn clip_mut(&mut self, id: ClipId) -> Option<&mut Clip> {
        self.clips.iter_mut().find(|c| c.id == id)
    }

    /// The clip covering `frame`, if any.
    pub fn active_at(&self, frame: FrameIndex) -> Option<&Clip> {
        let idx = self.clips.partition_point(|c| c.range.start <= frame);
        let candidate = self.clips[..idx].last()?;
        candidate.range.contains(frame).then_some(candidate)
    }

    /// Clips whose range intersects `range`, in timeline order.
    pub fn overlapping(&self, range: FrameRange) -> &[Clip] {
        let lo = self.clips.partition_point(|c| c.range.end <= range.start);
        let hi = self.clips.partition_point(|c| c.range.start < range.end);
        &self.clips[lo..hi.max(lo)]
    }

    /// Insert keeping order; rejects overlaps and kind mismatches.
    pub fn insert(&mut self, mut clip: Clip) -> MontageResult<()> {
        if clip.kind != self.kind {
            return Err(MontageError::validation(format!(
                "{} is {} but {} holds {} clips",
                clip.id, clip.kind, self.id, self.kind
            )));
        }
        if let Some(other) = self.overlapping(clip.range).first() {
            return Err(MontageError::validation(format!(
                "{} would overlap {} on {}",
                clip.id, other.id, self.id
            )));
        }
        clip.track = self.id;
        let at = self
            .clips
            .partition_point(|c| c.range.start < clip.range.start);
        self.clips.insert(at, clip);
        Ok(())
    }

    /// Remove clip `id`.
    pub fn remove(&mut self, id: ClipId) -> Option<Clip> {
        let at = self.position(id)?;
        Some(self.clips.remove(at))
    }

    /// Restore start order after in-place edits.
    pub fn sort(&mut self) {
        self.clips.sort_by_key(|c| c.range.start);
    }

    /// Last frame covered by any clip.
    pub fn end(&self) -> FrameIndex {
        self.clips
            .last()
            .map(|c| c.range.end)
            .unwrap_or_default()
    }

    /// Ordering, overlap and ownership checks.
    pub fn validate(&self) -> MontageResult<()> {
        for c in &self.clips {
            if c.track != self.id || c.kind != self.kind {
                return Err(MontageError::validation(format!(
                    "{} does not belong on {}",
                    c.id, self.id
                )));
            }
            c.validate()?;
        }
        for pair in self.clips.windows(2) {
            if pair[0].range.end > pair[1].range.start {
                return Err(MontageError::validation(format!(
                    "{} and {} overlap or are out of order on {}",
                    pair[0].id, pair[1].id, self.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/track.rs"]
mod tests;
