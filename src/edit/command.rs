use std::collections::BTreeSet;

use crate::{
    animation::curve::Keyframe,
    config::{EngineConfig, RippleScope},
    effects::{
        effect::Effect,
        field::{EffectField, FieldValue},
    },
    foundation::core::{ClipId, FrameIndex, FrameRange, MediaId, MediaKind, TrackId},
    foundation::error::{MontageError, MontageResult},
    model::{
        clip::Clip,
        sequence::{Sequence, Workarea},
        track::Track,
        transition::{Transition, TransitionSide},
    },
};

/// Which clip edge a trim moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrimEdge {
    /// The `in` point.
    Start,
    /// The `out` point.
    End,
}

/// Where a new clip goes.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipPlacement {
    /// Destination track; its kind decides the clip kind.
    pub track: TrackId,
    /// Source media.
    pub media: MediaId,
    /// Timeline range.
    pub range: FrameRange,
    /// Source offset.
    pub clip_in: u64,
}

/// Policy values commands read while applying.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EditContext {
    /// Ripple policy.
    pub ripple_scope: RippleScope,
    /// Expand edits to linked clips.
    pub select_links: bool,
}

impl EditContext {
    /// Context derived from engine settings.
    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self {
            ripple_scope: cfg.ripple_scope,
            select_links: cfg.edit_selects_links,
        }
    }
}

impl Default for EditContext {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// A reversible structural edit, addressed purely by ids.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Insert clips; two or more are linked to each other.
    InsertClip {
        /// Placements, in insertion order.
        clips: Vec<ClipPlacement>,
    },
    /// Delete clips, sweeping them from link sets; `ripple` closes the gaps.
    DeleteClips {
        /// Clips to delete.
        clips: Vec<ClipId>,
        /// Close the gaps.
        ripple: bool,
    },
    /// Shift clips in time and across same-kind tracks.
    MoveClips {
        /// Clips to move.
        clips: Vec<ClipId>,
        /// Frame delta.
        delta: i64,
        /// Track index delta within the clip's kind.
        track_shift: i64,
    },
    /// Move one edge of a clip.
    Trim {
        /// Clip to trim.
        clip: ClipId,
        /// Edge to move.
        edge: TrimEdge,
        /// New edge position.
        to: FrameIndex,
        /// Shift following clips by the length change.
        ripple: bool,
    },
    /// Move the same edge of several clips to one frame and ripple following clips
    /// once per scope.
    RippleTrim {
        /// Clips to trim; linked clips are expanded as for [`Command::Trim`].
        clips: Vec<ClipId>,
        /// Edge to move.
        edge: TrimEdge,
        /// New edge position.
        to: FrameIndex,
    },
    /// Cut a clip in two at `at`.
    Split {
        /// Clip to split.
        clip: ClipId,
        /// Cut frame, strictly inside the clip.
        at: FrameIndex,
    },
    /// Link every listed clip to every other.
    Link {
        /// Clips to link.
        clips: Vec<ClipId>,
    },
    /// Drop every link of the listed clips.
    Unlink {
        /// Clips to unlink.
        clips: Vec<ClipId>,
    },
    /// Attach, replace or remove a transition.
    SetTransition {
        /// Target clip.
        clip: ClipId,
        /// Clip side.
        side: TransitionSide,
        /// New transition, `None` removes.
        transition: Option<Transition>,
    },
    /// Insert an effect into a clip's chain (never before the base effect).
    AddEffect {
        /// Target clip.
        clip: ClipId,
        /// Effect instance.
        effect: Effect,
        /// Chain index; `None` appends.
        index: Option<usize>,
    },
    /// Remove a non-base effect.
    RemoveEffect {
        /// Target clip.
        clip: ClipId,
        /// Chain index, at least 1.
        index: usize,
    },
    /// Replace a field's constant value.
    SetFieldValue {
        /// Target clip.
        clip: ClipId,
        /// Chain index.
        effect: usize,
        /// Field id.
        field: String,
        /// New value.
        value: FieldValue,
    },
    /// Insert or replace a keyframe (frames are clip source frames).
    SetKeyframe {
        /// Target clip.
        clip: ClipId,
        /// Chain index.
        effect: usize,
        /// Field id.
        field: String,
        /// Key to insert.
        key: Keyframe<FieldValue>,
    },
    /// Delete the keyframe at `frame`.
    RemoveKeyframe {
        /// Target clip.
        clip: ClipId,
        /// Chain index.
        effect: usize,
        /// Field id.
        field: String,
        /// Key frame.
        frame: FrameIndex,
    },
    /// Toggle keyframe-driven evaluation of a field.
    SetKeyframing {
        /// Target clip.
        clip: ClipId,
        /// Chain index.
        effect: usize,
        /// Field id.
        field: String,
        /// New state.
        enabled: bool,
    },
    /// Enable or disable one effect.
    SetEffectEnabled {
        /// Target clip.
        clip: ClipId,
        /// Chain index.
        effect: usize,
        /// New state.
        enabled: bool,
    },
    /// Enable or disable clips.
    SetClipEnabled {
        /// Target clips.
        clips: Vec<ClipId>,
        /// New state.
        enabled: bool,
    },
    /// Set or clear the workarea.
    SetWorkarea {
        /// New workarea.
        workarea: Option<Workarea>,
    },
    /// Append an empty track.
    AddTrack {
        /// Track kind.
        kind: MediaKind,
    },
    /// Several commands applied atomically as one undo step.
    Batch {
        /// Display label.
        label: String,
        /// Commands in order.
        commands: Vec<Command>,
    },
}

impl Command {
    /// Short human-readable name.
    pub fn label(&self) -> String {
        match self {
            Self::InsertClip { .. } => "insert clip".into(),
            Self::DeleteClips { ripple: true, .. } => "ripple delete".into(),
            Self::DeleteClips { .. } => "delete clips".into(),
            Self::MoveClips { .. } => "move clips".into(),
            Self::Trim { ripple: true, .. } => "ripple trim".into(),
            Self::Trim { .. } => "trim".into(),
            Self::RippleTrim { .. } => "ripple trim".into(),
            Self::Split { .. } => "split".into(),
            Self::Link { .. } => "link".into(),
            Self::Unlink { .. } => "unlink".into(),
            Self::SetTransition { .. } => "set transition".into(),
            Self::AddEffect { .. } => "add effect".into(),
            Self::RemoveEffect { .. } => "remove effect".into(),
            Self::SetFieldValue { .. } => "set field value".into(),
            Self::SetKeyframe { .. } => "set keyframe".into(),
            Self::RemoveKeyframe { .. } => "remove keyframe".into(),
            Self::SetKeyframing { .. } => "set keyframing".into(),
            Self::SetEffectEnabled { .. } => "set effect enabled".into(),
            Self::SetClipEnabled { .. } => "set clip enabled".into(),
            Self::SetWorkarea { .. } => "set workarea".into(),
            Self::AddTrack { .. } => "add track".into(),
            Self::Batch { label, .. } => label.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Meta {
    next_id: u64,
    workarea: Option<Workarea>,
    video_len: usize,
    audio_len: usize,
}

impl Meta {
    fn capture(seq: &Sequence) -> Self {
        Self {
            next_id: seq.next_id,
            workarea: seq.workarea,
            video_len: seq.video_tracks.len(),
            audio_len: seq.audio_tracks.len(),
        }
    }
}

/// Pre-edit state of everything a command touched.
#[derive(Clone, Debug, PartialEq)]
pub struct Inverse {
    tracks: Vec<Track>,
    meta: Meta,
}

impl Inverse {
    /// Put the captured state back.
    pub fn restore(self, seq: &mut Sequence) {
        seq.video_tracks.truncate(self.meta.video_len);
        seq.audio_tracks.truncate(self.meta.audio_len);
        for saved in self.tracks {
            if let Some(slot) = seq.track_mut(saved.id) {
                *slot = saved;
            }
        }
        seq.next_id = self.meta.next_id;
        seq.workarea = self.meta.workarea;
    }
}

/// Outcome of a successful command.
#[derive(Clone, Debug, PartialEq)]
pub struct Applied {
    /// State needed to undo.
    pub inverse: Inverse,
    /// Clips created, changed or removed.
    pub clips: BTreeSet<ClipId>,
}

/// Copy-on-first-touch view of a sequence during one command.
struct Transaction<'a> {
    seq: &'a mut Sequence,
    saved: Vec<Track>,
    meta: Meta,
    touched: BTreeSet<ClipId>,
}

impl<'a> Transaction<'a> {
    fn begin(seq: &'a mut Sequence) -> Self {
        let meta = Meta::capture(seq);
        Self {
            seq,
            saved: Vec::new(),
            meta,
            touched: BTreeSet::new(),
        }
    }

    fn seq(&self) -> &Sequence {
        &*self.seq
    }

    fn track_mut(&mut self, id: TrackId) -> MontageResult<&mut Track> {
        let Some(track) = self.seq.track(id) else {
            return Err(MontageError::validation(format!("unknown {id}")));
        };
        if !self.saved.iter().any(|t| t.id == id) {
            self.saved.push(track.clone());
        }
        self.seq
            .track_mut(id)
            .ok_or_else(|| MontageError::validation(format!("unknown {id}")))
    }

    fn clip(&self, id: ClipId) -> MontageResult<&Clip> {
        self.seq
            .clip(id)
            .ok_or_else(|| MontageError::validation(format!("unknown {id}")))
    }

    fn clip_mut(&mut self, id: ClipId) -> MontageResult<&mut Clip> {
        let track = self
            .seq
            .clip_track(id)
            .ok_or_else(|| MontageError::validation(format!("unknown {id}")))?;
        self.touched.insert(id);
        self.track_mut(track)?
            .clip_mut(id)
            .ok_or_else(|| MontageError::validation(format!("unknown {id}")))
    }

    fn remove_clip(&mut self, id: ClipId) -> MontageResult<Clip> {
        let track = self
            .seq
            .clip_track(id)
            .ok_or_else(|| MontageError::validation(format!("unknown {id}")))?;
        self.touched.insert(id);
        self.track_mut(track)?
            .remove(id)
            .ok_or_else(|| MontageError::validation(format!("unknown {id}")))
    }

    fn insert_clip(&mut self, clip: Clip) -> MontageResult<()> {
        self.touched.insert(clip.id);
        let track = clip.track;
        self.track_mut(track)?.insert(clip)
    }

    /// `ids`, plus their linked clips when `select_links` is set.
    fn expand(&self, ids: &[ClipId], select_links: bool) -> MontageResult<BTreeSet<ClipId>> {
        let mut out = BTreeSet::new();
        for id in ids {
            self.clip(*id)?;
            if select_links {
                out.extend(self.seq.link_group(*id));
            } else {
                out.insert(*id);
            }
        }
        Ok(out)
    }

    fn ripple_tracks(&self, seeds: &BTreeSet<ClipId>, scope: RippleScope) -> Vec<TrackId> {
        let mut tracks = BTreeSet::new();
        match scope {
            RippleScope::AllTracks => tracks.extend(self.seq.all_tracks().map(|t| t.id)),
            RippleScope::Track | RippleScope::LinkedTracks => {
                for id in seeds {
                    let Some(c) = self.seq.clip(*id) else {
                        continue;
                    };
                    tracks.insert(c.track);
                    if scope == RippleScope::LinkedTracks {
                        tracks.extend(c.links.iter().filter_map(|l| self.seq.clip_track(*l)));
                    }
                }
            }
        }
        tracks.into_iter().collect()
    }

    /// Shift every clip starting at or after `point` on `tracks` by `delta`, except `skip`.
    fn shift_from(
        &mut self,
        tracks: &[TrackId],
        point: FrameIndex,
        delta: i64,
        skip: &BTreeSet<ClipId>,
    ) -> MontageResult<()> {
        if delta == 0 {
            return Ok(());
        }
        for tid in tracks {
            let movers: Vec<ClipId> = match self.seq.track(*tid) {
                Some(t) => t
                    .clips
                    .iter()
                    .filter(|c| c.range.start >= point && !skip.contains(&c.id))
                    .map(|c| c.id)
                    .collect(),
                None => continue,
            };
            if movers.is_empty() {
                continue;
            }
            self.touched.extend(movers.iter().copied());
            let track = self.track_mut(*tid)?;
            for c in track.clips.iter_mut().filter(|c| movers.contains(&c.id)) {
                c.range = c.range.checked_shift(delta).ok_or_else(|| {
                    MontageError::validation(format!(
                        "ripple would move {} before frame 0",
                        c.id
                    ))
                })?;
            }
            track.sort();
        }
        Ok(())
    }

    /// Post-edit checks over the touched tracks.
    fn check(&self) -> MontageResult<()> {
        if let Some(w) = self.seq.workarea {
            Workarea::new(w.start, w.end)?;
        }
        for saved in &self.saved {
            let Some(track) = self.seq.track(saved.id) else {
                continue;
            };
            track.validate()?;
            for c in &track.clips {
                for l in &c.links {
                    let mirrored = self
                        .seq
                        .clip(*l)
                        .is_some_and(|o| o.links.contains(&c.id));
                    if !mirrored {
                        return Err(MontageError::validation(format!(
                            "{} has a dangling link to {l}",
                            c.id
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn into_inverse(self) -> (Inverse, BTreeSet<ClipId>) {
        (
            Inverse {
                tracks: self.saved,
                meta: self.meta,
            },
            self.touched,
        )
    }
}

/// Apply `cmd` atomically. On error the sequence is left exactly as it was.
pub fn execute(cmd: &Command, seq: &mut Sequence, ctx: &EditContext) -> MontageResult<Applied> {
    let mut tx = Transaction::begin(seq);
    let result = apply(cmd, &mut tx, ctx).and_then(|()| tx.check());
    let (inverse, clips) = tx.into_inverse();
    match result {
        Ok(()) => Ok(Applied { inverse, clips }),
        Err(e) => {
            inverse.restore(seq);
            Err(e)
        }
    }
}

fn apply(cmd: &Command, tx: &mut Transaction<'_>, ctx: &EditContext) -> MontageResult<()> {
    match cmd {
        Command::InsertClip { clips } => insert(tx, clips),
        Command::DeleteClips { clips, ripple } => delete(tx, ctx, clips, *ripple),
        Command::MoveClips {
            clips,
            delta,
            track_shift,
        } => move_clips(tx, ctx, clips, *delta, *track_shift),
        Command::Trim {
            clip,
            edge,
            to,
            ripple,
        } => trim(tx, ctx, *clip, *edge, *to, *ripple),
        Command::RippleTrim { clips, edge, to } => ripple_trim(tx, ctx, clips, *edge, *to),
        Command::Split { clip, at } => split(tx, ctx, *clip, *at),
        Command::Link { clips } => link(tx, clips),
        Command::Unlink { clips } => unlink(tx, clips),
        Command::SetTransition {
            clip,
            side,
            transition,
        } => {
            *tx.clip_mut(*clip)?.transition_mut(*side) = *transition;
            Ok(())
        }
        Command::AddEffect {
            clip,
            effect,
            index,
        } => {
            let c = tx.clip_mut(*clip)?;
            let at = index.unwrap_or(c.effects.len());
            if at == 0 || at > c.effects.len() {
                return Err(MontageError::validation(format!(
                    "effect index {at} is outside 1..={} on {clip}",
                    c.effects.len()
                )));
            }
            c.effects.insert(at, effect.clone());
            Ok(())
        }
        Command::RemoveEffect { clip, index } => {
            let c = tx.clip_mut(*clip)?;
            if *index == 0 {
                return Err(MontageError::validation(format!(
                    "the base effect of {clip} cannot be removed"
                )));
            }
            if *index >= c.effects.len() {
                return Err(MontageError::validation(format!(
                    "{clip} has no effect at index {index}"
                )));
            }
            c.effects.remove(*index);
            Ok(())
        }
        Command::SetFieldValue {
            clip,
            effect,
            field,
            value,
        } => field_mut(tx, *clip, *effect, field)?.set_constant(value.clone()),
        Command::SetKeyframe {
            clip,
            effect,
            field,
            key,
        } => field_mut(tx, *clip, *effect, field)?
            .set_key(key.clone())
            .map(|_| ()),
        Command::RemoveKeyframe {
            clip,
            effect,
            field,
            frame,
        } => {
            let f = field_mut(tx, *clip, *effect, field)?;
            f.curve.remove(*frame).map(|_| ()).ok_or_else(|| {
                MontageError::validation(format!("no keyframe at frame {} on '{field}'", frame.0))
            })
        }
        Command::SetKeyframing {
            clip,
            effect,
            field,
            enabled,
        } => {
            field_mut(tx, *clip, *effect, field)?.keyframing = *enabled;
            Ok(())
        }
        Command::SetEffectEnabled {
            clip,
            effect,
            enabled,
        } => {
            effect_mut(tx, *clip, *effect)?.enabled = *enabled;
            Ok(())
        }
        Command::SetClipEnabled { clips, enabled } => {
            for id in clips {
                tx.clip_mut(*id)?.enabled = *enabled;
            }
            Ok(())
        }
        Command::SetWorkarea { workarea } => {
            tx.seq.workarea = *workarea;
            Ok(())
        }
        Command::AddTrack { kind } => {
            tx.seq.add_track(*kind);
            Ok(())
        }
        Command::Batch { commands, .. } => {
            for c in commands {
                apply(c, tx, ctx)?;
            }
            Ok(())
        }
    }
}

fn effect_mut<'t>(
    tx: &'t mut Transaction<'_>,
    clip: ClipId,
    index: usize,
) -> MontageResult<&'t mut Effect> {
    tx.clip_mut(clip)?
        .effects
        .get_mut(index)
        .ok_or_else(|| MontageError::validation(format!("{clip} has no effect at index {index}")))
}

fn field_mut<'t>(
    tx: &'t mut Transaction<'_>,
    clip: ClipId,
    index: usize,
    field: &str,
) -> MontageResult<&'t mut EffectField> {
    effect_mut(tx, clip, index)?
        .field_mut(field)
        .ok_or_else(|| MontageError::validation(format!("no field '{field}' on {clip}")))
}

fn insert(tx: &mut Transaction<'_>, placements: &[ClipPlacement]) -> MontageResult<()> {
    if placements.is_empty() {
        return Err(MontageError::validation("insert needs at least one clip"));
    }
    let mut ids = Vec::with_capacity(placements.len());
    for p in placements {
        let kind = tx
            .seq()
            .track(p.track)
            .map(|t| t.kind)
            .ok_or_else(|| MontageError::validation(format!("unknown {}", p.track)))?;
        if p.range.is_empty() {
            return Err(MontageError::validation("inserted clip must have out > in"));
        }
        let id = ClipId(tx.seq.alloc_id());
        let clip = Clip::new(id, p.track, kind, p.media.clone(), p.range, p.clip_in);
        tx.insert_clip(clip)?;
        ids.push(id);
    }
    if ids.len() > 1 {
        link(tx, &ids)?;
    }
    Ok(())
}

fn link(tx: &mut Transaction<'_>, clips: &[ClipId]) -> MontageResult<()> {
    let set: BTreeSet<ClipId> = clips.iter().copied().collect();
    if set.len() < 2 {
        return Err(MontageError::validation("link needs at least two clips"));
    }
    for id in &set {
        let c = tx.clip_mut(*id)?;
        c.links.extend(set.iter().copied().filter(|o| o != id));
    }
    Ok(())
}

fn unlink(tx: &mut Transaction<'_>, clips: &[ClipId]) -> MontageResult<()> {
    for id in clips {
        let partners = std::mem::take(&mut tx.clip_mut(*id)?.links);
        for p in partners {
            tx.clip_mut(p)?.links.remove(id);
        }
    }
    Ok(())
}

/// Length of `[0, before)` covered by the merged `gaps`.
fn gap_before(gaps: &[FrameRange], before: FrameIndex) -> u64 {
    gaps.iter()
        .filter(|g| g.start < before)
        .map(|g| g.end.min(before).0 - g.start.0)
        .sum()
}

fn merge_ranges(mut ranges: Vec<FrameRange>) -> Vec<FrameRange> {
    ranges.sort_by_key(|r| r.start);
    let mut out: Vec<FrameRange> = Vec::with_capacity(ranges.len());
    for r in ranges {
        match out.last_mut() {
            Some(last) if r.start <= last.end => last.end = last.end.max(r.end),
            _ => out.push(r),
        }
    }
    out
}

fn delete(
    tx: &mut Transaction<'_>,
    ctx: &EditContext,
    clips: &[ClipId],
    ripple: bool,
) -> MontageResult<()> {
    let targets = tx.expand(clips, ctx.select_links)?;
    let scope_tracks = ripple.then(|| tx.ripple_tracks(&targets, ctx.ripple_scope));

    let mut removed = Vec::with_capacity(targets.len());
    for id in &targets {
        let clip = tx.remove_clip(*id)?;
        for partner in &clip.links {
            if !targets.contains(partner) {
                tx.clip_mut(*partner)?.links.remove(id);
            }
        }
        removed.push(clip.range);
    }

    let Some(tracks) = scope_tracks else {
        return Ok(());
    };
    let gaps = merge_ranges(removed);
    for tid in tracks {
        let shifts: Vec<(ClipId, u64)> = match tx.seq().track(tid) {
            Some(t) => t
                .clips
                .iter()
                .map(|c| (c.id, gap_before(&gaps, c.range.start)))
                .filter(|(_, s)| *s > 0)
                .collect(),
            None => continue,
        };
        if shifts.is_empty() {
            continue;
        }
        tx.touched.extend(shifts.iter().map(|(id, _)| *id));
        let track = tx.track_mut(tid)?;
        for (id, s) in shifts {
            if let Some(c) = track.clip_mut(id) {
                c.range = c.range.checked_shift(-(s as i64)).ok_or_else(|| {
                    MontageError::validation(format!("ripple would move {id} before frame 0"))
                })?;
            }
        }
        track.sort();
    }
    Ok(())
}

fn move_clips(
    tx: &mut Transaction<'_>,
    ctx: &EditContext,
    clips: &[ClipId],
    delta: i64,
    track_shift: i64,
) -> MontageResult<()> {
    let targets = tx.expand(clips, ctx.select_links)?;
    let mut moved = Vec::with_capacity(targets.len());
    for id in &targets {
        let clip = tx.remove_clip(*id)?;
        moved.push(clip);
    }
    for mut clip in moved {
        clip.range = clip.range.checked_shift(delta).ok_or_else(|| {
            MontageError::validation(format!("move would place {} before frame 0", clip.id))
        })?;
        if track_shift != 0 {
            let (kind, idx) = tx
                .seq()
                .track_slot(clip.track)
                .ok_or_else(|| MontageError::validation(format!("unknown {}", clip.track)))?;
            let dest = i64::try_from(idx)
                .ok()
                .and_then(|i| i.checked_add(track_shift))
                .and_then(|i| usize::try_from(i).ok())
                .and_then(|i| tx.seq().tracks(kind).get(i))
                .map(|t| t.id)
                .ok_or_else(|| {
                    MontageError::validation(format!(
                        "no {kind} track {track_shift:+} from {}",
                        clip.track
                    ))
                })?;
            clip.track = dest;
        }
        tx.insert_clip(clip)?;
    }
    Ok(())
}

fn trim(
    tx: &mut Transaction<'_>,
    ctx: &EditContext,
    id: ClipId,
    edge: TrimEdge,
    to: FrameIndex,
    ripple: bool,
) -> MontageResult<()> {
    if ripple {
        return ripple_trim(tx, ctx, &[id], edge, to);
    }
    let delta = edge_delta(tx.clip(id)?, edge, to);
    if delta == 0 {
        return Ok(());
    }
    let targets = tx.expand(&[id], ctx.select_links)?;
    resize(tx, &targets, edge, delta, false)
}

/// Trim `edge` of every listed clip (and link group) to `to`, then ripple once per
/// scope. Under [`RippleScope::AllTracks`] the whole timeline moves by a single shift,
/// the smallest one that keeps every trimmed track free of overlaps.
fn ripple_trim(
    tx: &mut Transaction<'_>,
    ctx: &EditContext,
    ids: &[ClipId],
    edge: TrimEdge,
    to: FrameIndex,
) -> MontageResult<()> {
    // (group, delta, original end of the addressed clip)
    let mut groups: Vec<(BTreeSet<ClipId>, i64, FrameIndex)> = Vec::new();
    let mut covered = BTreeSet::new();
    for id in ids {
        if covered.contains(id) {
            continue;
        }
        let clip = tx.clip(*id)?;
        let (delta, end) = (edge_delta(clip, edge, to), clip.range.end);
        let targets = tx.expand(&[*id], ctx.select_links)?;
        covered.extend(targets.iter().copied());
        if delta != 0 {
            groups.push((targets, delta, end));
        }
    }
    for (targets, delta, _) in &groups {
        resize(tx, targets, edge, *delta, true)?;
    }

    let shift_of = |delta: i64| match edge {
        TrimEdge::End => delta,
        TrimEdge::Start => -delta,
    };
    if ctx.ripple_scope == RippleScope::AllTracks {
        let mut edits = groups.iter().map(|(_, d, end)| (shift_of(*d), *end));
        let Some(first) = edits.next() else {
            return Ok(());
        };
        let (shift, from) = edits.fold(first, |(s, f), (d, e)| (s.max(d), f.min(e)));
        let tracks = tx.ripple_tracks(&covered, RippleScope::AllTracks);
        return tx.shift_from(&tracks, from, shift, &covered);
    }
    // A track rippled by one group is not rippled again by another.
    let mut rippled = BTreeSet::new();
    for (targets, delta, end) in &groups {
        let tracks: Vec<TrackId> = tx
            .ripple_tracks(targets, ctx.ripple_scope)
            .into_iter()
            .filter(|t| rippled.insert(*t))
            .collect();
        tx.shift_from(&tracks, *end, shift_of(*delta), &covered)?;
    }
    Ok(())
}

fn edge_delta(clip: &Clip, edge: TrimEdge, to: FrameIndex) -> i64 {
    match edge {
        TrimEdge::Start => to.delta_from(clip.range.start),
        TrimEdge::End => to.delta_from(clip.range.end),
    }
}

/// Move `edge` of every target by `delta`. A ripple start trim keeps the clip's
/// timeline position and consumes source content instead.
fn resize(
    tx: &mut Transaction<'_>,
    targets: &BTreeSet<ClipId>,
    edge: TrimEdge,
    delta: i64,
    ripple: bool,
) -> MontageResult<()> {
    for cid in targets {
        let c = tx.clip_mut(*cid)?;
        let underflow =
            || MontageError::validation(format!("trim would move {cid} before frame 0"));
        match (edge, ripple) {
            (TrimEdge::End, _) => {
                let end = c.range.end.checked_shift(delta).ok_or_else(underflow)?;
                c.range = FrameRange::new(c.range.start, end)?;
            }
            (TrimEdge::Start, false) => {
                let start = c.range.start.checked_shift(delta).ok_or_else(underflow)?;
                c.range = FrameRange::new(start, c.range.end)?;
                c.clip_in = c.clip_in.checked_add_signed(delta).ok_or_else(|| {
                    MontageError::validation(format!("trim would read {cid} before its source start"))
                })?;
            }
            (TrimEdge::Start, true) => {
                let end = c.range.end.checked_shift(-delta).ok_or_else(underflow)?;
                c.range = FrameRange::new(c.range.start, end)?;
                c.clip_in = c.clip_in.checked_add_signed(delta).ok_or_else(|| {
                    MontageError::validation(format!("trim would read {cid} before its source start"))
                })?;
            }
        }
        if c.range.is_empty() {
            return Err(MontageError::validation(format!(
                "trim would leave {cid} empty"
            )));
        }
        let len = c.range.len_frames();
        for t in [&mut c.transition_in, &mut c.transition_out].into_iter().flatten() {
            t.length = t.length.min(len);
        }
    }
    Ok(())
}

fn split(
    tx: &mut Transaction<'_>,
    ctx: &EditContext,
    id: ClipId,
    at: FrameIndex,
) -> MontageResult<()> {
    let inside = |c: &Clip| c.range.start < at && at < c.range.end;
    if !inside(tx.clip(id)?) {
        return Err(MontageError::validation(format!(
            "split frame {} is not strictly inside {id}",
            at.0
        )));
    }
    let group = tx.expand(&[id], ctx.select_links)?;
    let mut targets = Vec::new();
    for cid in group {
        if inside(tx.clip(cid)?) {
            targets.push(cid);
        }
    }

    let mut halves = Vec::with_capacity(targets.len());
    for cid in &targets {
        let right_id = ClipId(tx.seq.alloc_id());
        let left = tx.clip_mut(*cid)?;
        let mut right = left.clone();
        let offset = at.0 - left.range.start.0;

        left.range = FrameRange::new(left.range.start, at)?;
        left.transition_out = None;
        if let Some(t) = &mut left.transition_in {
            t.length = t.length.min(offset);
        }

        right.id = right_id;
        right.range = FrameRange::new(at, right.range.end)?;
        right.clip_in += offset;
        right.transition_in = None;
        let right_len = right.range.len_frames();
        if let Some(t) = &mut right.transition_out {
            t.length = t.length.min(right_len);
        }
        right.links.clear();
        halves.push(right);
    }

    let right_ids: Vec<ClipId> = halves.iter().map(|c| c.id).collect();
    for mut right in halves {
        right
            .links
            .extend(right_ids.iter().copied().filter(|o| *o != right.id));
        tx.insert_clip(right)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/edit/command.rs"]
mod tests;
