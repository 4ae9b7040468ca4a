use std::collections::BTreeSet;

use crate::{
    foundation::core::{ClipId, FrameIndex, FrameRange, Fps, MediaKind, TrackId},
    foundation::error::{MontageError, MontageResult},
    model::{clip::Clip, track::Track},
};

/// Inclusive-start, exclusive-end loop/export region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Workarea {
    /// In point.
    pub start: FrameIndex,
    /// Out point, `>= start`.
    pub end: FrameIndex,
}

impl Workarea {
    /// Build a workarea; `start` must not exceed `end`.
    pub fn new(start: FrameIndex, end: FrameIndex) -> MontageResult<Self> {
        if start > end {
            return Err(MontageError::validation("workarea in must be <= out"));
        }
        Ok(Self { start, end })
    }
}

/// The top-level editable timeline.
///
/// Video track 0 is the bottom layer; compositing walks video tracks in ascending
/// index. Clip and track ids are drawn from one counter so that replaying the same
/// commands always produces the same ids.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Sequence {
    /// Display name.
    pub name: String,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Frame rate.
    pub fps: Fps,
    /// Audio sample rate in Hz.
    pub sample_rate: u32,
    /// Current playhead.
    #[serde(default)]
    pub playhead: FrameIndex,
    /// Optional in/out region.
    #[serde(default)]
    pub workarea: Option<Workarea>,
    /// Video lanes, bottom first.
    #[serde(default)]
    pub video_tracks: Vec<Track>,
    /// Audio lanes.
    #[serde(default)]
    pub audio_tracks: Vec<Track>,
    /// Next id handed out by [`Self::alloc_id`].
    #[serde(default)]
    pub next_id: u64,
    /// Dirty flag; not persisted.
    #[serde(skip)]
    pub changed: bool,
}

impl Sequence {
    /// Empty sequence.
    pub fn new(name: impl Into<String>, width: u32, height: u32, fps: Fps, sample_rate: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            fps,
            sample_rate,
            playhead: FrameIndex(0),
            workarea: None,
            video_tracks: Vec::new(),
            audio_tracks: Vec::new(),
            next_id: 1,
            changed: false,
        }
    }

    /// Hand out a fresh id.
    pub fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Tracks of `kind`.
    pub fn tracks(&self, kind: MediaKind) -> &[Track] {
        match kind {
            MediaKind::Video => &self.video_tracks,
            MediaKind::Audio => &self.audio_tracks,
        }
    }

    /// Mutable tracks of `kind`.
    pub fn tracks_mut(&mut self, kind: MediaKind) -> &mut Vec<Track> {
        match kind {
            MediaKind::Video => &mut self.video_tracks,
            MediaKind::Audio => &mut self.audio_tracks,
        }
    }

    /// Every track, video first.
    pub fn all_tracks(&self) -> impl Iterator<Item = &Track> {
        self.video_tracks.iter().chain(self.audio_tracks.iter())
    }

    /// Kind and index of track `id`.
    pub fn track_slot(&self, id: TrackId) -> Option<(MediaKind, usize)> {
        [MediaKind::Video, MediaKind::Audio]
            .into_iter()
            .find_map(|k| self.tracks(k).iter().position(|t| t.id == id).map(|i| (k, i)))
    }

    /// Track by id.
    pub fn track(&self, id: TrackId) -> Option<&Track> {
        let (kind, i) = self.track_slot(id)?;
        self.tracks(kind).get(i)
    }

    /// Mutable track by id.
    pub fn track_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        let (kind, i) = self.track_slot(id)?;
        self.tracks_mut(kind).get_mut(i)
    }

    /// Append a new empty track of `kind` (on top for video).
    pub fn add_track(&mut self, kind: MediaKind) -> TrackId {
        let id = TrackId(self.alloc_id());
        self.tracks_mut(kind).push(Track::new(id, kind));
        id
    }

    /// Owning track of clip `id`.
    pub fn clip_track(&self, id: ClipId) -> Option<TrackId> {
        self.all_tracks()
            .find(|t| t.clip(id).is_some())
            .map(|t| t.id)
    }

    /// Clip by id.
    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.all_tracks().find_map(|t| t.clip(id))
    }

    /// Mutable clip by id.
    pub fn clip_mut(&mut self, id: ClipId) -> Option<&mut Clip> {
        self.video_tracks
            .iter_mut()
            .chain(self.audio_tracks.iter_mut())
            .find_map(|t| t.clip_mut(id))
    }

    /// Enabled video clips visible at `frame`, bottom track first.
    pub fn active_video(&self, frame: FrameIndex) -> Vec<&Clip> {
        self.video_tracks
            .iter()
            .filter_map(|t| t.active_at(frame))
            .filter(|c| c.enabled)
            .collect()
    }

    /// Enabled audio clips intersecting `range`.
    pub fn active_audio(&self, range: FrameRange) -> Vec<&Clip> {
        self.audio_tracks
            .iter()
            .flat_map(|t| t.overlapping(range))
            .filter(|c| c.enabled)
            .collect()
    }

    /// First frame after every clip.
    pub fn duration(&self) -> FrameIndex {
        self.all_tracks().map(Track::end).max().unwrap_or_default()
    }

    /// Linked clip ids of `id` plus `id` itself.
    pub fn link_group(&self, id: ClipId) -> BTreeSet<ClipId> {
        let mut group = BTreeSet::from([id]);
        if let Some(c) = self.clip(id) {
            group.extend(c.links.iter().copied());
        }
        group
    }

    /// Remove `id` from every link set.
    pub fn sweep_links(&mut self, id: ClipId) {
        for t in self.video_tracks.iter_mut().chain(self.audio_tracks.iter_mut()) {
            for c in &mut t.clips {
                c.links.remove(&id);
            }
        }
    }

    /// Whole-sequence invariants: unique ids, symmetric links to live clips,
    /// ordered workarea, per-track checks.
    pub fn validate(&self) -> MontageResult<()> {
        if self.sample_rate == 0 {
            return Err(MontageError::validation("sample_rate must be > 0"));
        }
        Fps::new(self.fps.num, self.fps.den)?;
        if let Some(w) = self.workarea {
            Workarea::new(w.start, w.end)?;
        }

        let mut seen = BTreeSet::new();
        for (kind, tracks) in [
            (MediaKind::Video, &self.video_tracks),
            (MediaKind::Audio, &self.audio_tracks),
        ] {
            for t in tracks {
                if t.kind != kind {
                    return Err(MontageError::validation(format!(
                        "{} is listed with {kind} tracks but holds {}",
                        t.id, t.kind
                    )));
                }
                if !seen.insert(t.id.0) {
                    return Err(MontageError::validation(format!("duplicate id {}", t.id.0)));
                }
                t.validate()?;
                for c in &t.clips {
                    if !seen.insert(c.id.0) {
                        return Err(MontageError::validation(format!("duplicate id {}", c.id.0)));
                    }
                }
            }
        }
        if let Some(max) = seen.last()
            && *max >= self.next_id
        {
            return Err(MontageError::validation(format!(
                "next_id {} must exceed every id in use ({max})",
                self.next_id
            )));
        }

        for c in self.all_tracks().flat_map(|t| &t.clips) {
            for other in &c.links {
                let Some(o) = self.clip(*other) else {
                    return Err(MontageError::validation(format!(
                        "{} links to missing {other}",
                        c.id
                    )));
                };
                if !o.links.contains(&c.id) {
                    return Err(MontageError::validation(format!(
                        "link {} -> {other} is not mirrored",
                        c.id
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/sequence.rs"]
mod tests;
