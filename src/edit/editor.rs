//! Shared-state facade over a sequence and its history.
//!
//! Every mutation runs under the sequence write lock, so a concurrent render holding
//! the read lock sees either the whole pre-edit or the whole post-edit state.
//! Listeners are notified after all locks are released.

use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex, RwLock, RwLockReadGuard, mpsc},
};

use crate::{
    config::EngineConfig,
    edit::{
        command::{Command, EditContext, TrimEdge},
        history::{Outcome, UndoStack},
    },
    foundation::{
        core::{ClipId, FrameIndex},
        error::{MontageError, MontageResult},
        timecode::format_timecode,
    },
    model::{
        sequence::Sequence,
        transition::{Transition, TransitionKind, TransitionSide},
    },
    persist::document::{load_sequence, save_sequence},
};

/// Notification emitted after the sequence changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangeEvent {
    /// Tracks, clips or effects changed. `clips` lists the affected clips when known.
    StructureChanged {
        /// Affected clip ids, ascending.
        clips: Vec<ClipId>,
    },
    /// The dirty flag flipped to the carried value.
    DirtyChanged(bool),
}

/// Receiver of [`ChangeEvent`]s.
pub trait ChangeListener: Send + Sync {
    /// Called once per event, outside every editor lock.
    fn on_change(&self, event: &ChangeEvent);
}

/// Forwards events into an mpsc channel.
#[derive(Debug)]
pub struct ChannelListener {
    tx: mpsc::Sender<ChangeEvent>,
}

impl ChannelListener {
    /// Listener plus the receiving end of its channel.
    pub fn new() -> (Self, mpsc::Receiver<ChangeEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl ChangeListener for ChannelListener {
    fn on_change(&self, event: &ChangeEvent) {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.tx.send(event.clone());
    }
}

/// Owner of the shared sequence, its undo history and the change listeners.
pub struct Editor {
    sequence: Arc<RwLock<Sequence>>,
    history: Mutex<UndoStack>,
    config: EngineConfig,
    ctx: EditContext,
    listeners: RwLock<Vec<Arc<dyn ChangeListener>>>,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("config", &self.config)
            .field("ctx", &self.ctx)
            .finish_non_exhaustive()
    }
}

impl Editor {
    /// Wrap `sequence`, validating it first.
    pub fn new(sequence: Sequence, config: EngineConfig) -> MontageResult<Self> {
        config.validate()?;
        sequence.validate()?;
        Ok(Self {
            sequence: Arc::new(RwLock::new(sequence)),
            history: Mutex::new(UndoStack::new(config.undo_limit)),
            ctx: EditContext::from_config(&config),
            config,
            listeners: RwLock::new(Vec::new()),
        })
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Shared handle to the sequence, for readers living outside the editor.
    pub fn shared(&self) -> Arc<RwLock<Sequence>> {
        Arc::clone(&self.sequence)
    }

    /// Read lock on the sequence. Hold it for the duration of one render request.
    pub fn snapshot_read(&self) -> MontageResult<RwLockReadGuard<'_, Sequence>> {
        self.sequence
            .read()
            .map_err(|_| MontageError::poisoned("sequence"))
    }

    /// Run `f` against the sequence under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&Sequence) -> R) -> MontageResult<R> {
        Ok(f(&*self.snapshot_read()?))
    }

    /// Owned copy of the current sequence.
    pub fn snapshot(&self) -> MontageResult<Sequence> {
        self.read(Sequence::clone)
    }

    /// Register a listener.
    pub fn subscribe(&self, listener: Arc<dyn ChangeListener>) -> MontageResult<()> {
        self.listeners
            .write()
            .map_err(|_| MontageError::poisoned("listeners"))?
            .push(listener);
        Ok(())
    }

    /// Apply `cmd` as one undo step.
    pub fn execute(&self, cmd: Command) -> MontageResult<Outcome> {
        self.mutate(|seq, history, ctx| history.execute(cmd, seq, ctx))
    }

    /// Revert the last command. `Ok(None)` when there is nothing to undo.
    pub fn undo(&self) -> MontageResult<Option<Outcome>> {
        self.mutate(|seq, history, _| Ok(history.undo(seq)))
    }

    /// Re-apply the last undone command. `Ok(None)` when there is nothing to redo.
    pub fn redo(&self) -> MontageResult<Option<Outcome>> {
        self.mutate(|seq, history, ctx| history.redo(seq, ctx))
    }

    /// `true` when [`Self::undo`] would do something.
    pub fn can_undo(&self) -> MontageResult<bool> {
        Ok(self.history()?.can_undo())
    }

    /// `true` when [`Self::redo`] would do something.
    pub fn can_redo(&self) -> MontageResult<bool> {
        Ok(self.history()?.can_redo())
    }

    /// Move the playhead. Not an undoable edit.
    pub fn seek(&self, frame: FrameIndex) -> MontageResult<()> {
        self.sequence
            .write()
            .map_err(|_| MontageError::poisoned("sequence"))?
            .playhead = frame;
        Ok(())
    }

    /// Playhead formatted in the configured timecode view.
    pub fn playhead_timecode(&self) -> MontageResult<String> {
        let view = self.config.timecode_view;
        self.read(|s| format_timecode(s.playhead, s.fps, view))
    }

    /// Whether the sequence has unsaved changes.
    pub fn is_dirty(&self) -> MontageResult<bool> {
        self.read(|s| s.changed)
    }

    /// Clear the dirty flag after a successful save.
    pub fn mark_saved(&self) -> MontageResult<()> {
        let was_dirty = {
            let mut seq = self
                .sequence
                .write()
                .map_err(|_| MontageError::poisoned("sequence"))?;
            std::mem::replace(&mut seq.changed, false)
        };
        if was_dirty {
            self.emit(&[ChangeEvent::DirtyChanged(false)]);
        }
        Ok(())
    }

    /// Serialize the current sequence.
    pub fn to_json(&self) -> MontageResult<String> {
        save_sequence(&*self.snapshot_read()?)
    }

    /// Parse `json` and install it. On failure the current sequence and history are
    /// left untouched.
    pub fn replace_sequence_from_json(&self, json: &str) -> MontageResult<()> {
        let loaded = load_sequence(json)?;
        let mut clips: Vec<ClipId> = loaded
            .all_tracks()
            .flat_map(|t| t.clips.iter().map(|c| c.id))
            .collect();
        clips.sort();

        let was_dirty = {
            let mut history = self.history()?;
            let mut seq = self
                .sequence
                .write()
                .map_err(|_| MontageError::poisoned("sequence"))?;
            history.clear();
            std::mem::replace(&mut *seq, loaded).changed
        };
        tracing::debug!(clips = clips.len(), "sequence replaced");

        let mut events = vec![ChangeEvent::StructureChanged { clips }];
        if was_dirty {
            events.push(ChangeEvent::DirtyChanged(false));
        }
        self.emit(&events);
        Ok(())
    }

    /// Split every clip under the playhead as one undo step. Linked clips are split
    /// together.
    pub fn split_at_playhead(&self) -> MontageResult<Outcome> {
        self.build_and_execute(|seq, ctx| {
            let at = seq.playhead;
            let mut covered = BTreeSet::new();
            let mut commands = Vec::new();
            for id in clips_under(seq, at) {
                if !covered.insert(id) {
                    continue;
                }
                if ctx.select_links {
                    covered.extend(seq.link_group(id));
                }
                commands.push(Command::Split { clip: id, at });
            }
            batch("split at playhead", commands, at)
        })
    }

    /// Ripple-trim every clip under the playhead so that `edge` lands on it, as one
    /// ripple per scope.
    pub fn ripple_to_point(&self, edge: TrimEdge) -> MontageResult<Outcome> {
        self.build_and_execute(|seq, _| {
            let at = seq.playhead;
            let clips = clips_under(seq, at);
            if clips.is_empty() {
                return Err(MontageError::validation(format!(
                    "no clip spans frame {}",
                    at.0
                )));
            }
            let label = match edge {
                TrimEdge::Start => "ripple start to playhead",
                TrimEdge::End => "ripple end to playhead",
            };
            Ok(Command::Batch {
                label: label.to_string(),
                commands: vec![Command::RippleTrim {
                    clips,
                    edge,
                    to: at,
                }],
            })
        })
    }

    /// Link the clips when none of them is linked, otherwise unlink them all.
    pub fn toggle_links(&self, clips: &[ClipId]) -> MontageResult<Outcome> {
        let clips = clips.to_vec();
        self.build_and_execute(move |seq, _| {
            let mut any_linked = false;
            for id in &clips {
                let clip = seq
                    .clip(*id)
                    .ok_or_else(|| MontageError::validation(format!("unknown {id}")))?;
                any_linked |= !clip.links.is_empty();
            }
            Ok(if any_linked {
                Command::Unlink { clips }
            } else {
                Command::Link { clips }
            })
        })
    }

    /// Attach a cross dissolve of the configured default length, clamped to the clip.
    pub fn add_default_transition(
        &self,
        clip: ClipId,
        side: TransitionSide,
    ) -> MontageResult<Outcome> {
        let default_len = self.config.default_transition_length;
        self.build_and_execute(move |seq, _| {
            let len = seq
                .clip(clip)
                .ok_or_else(|| MontageError::validation(format!("unknown {clip}")))?
                .len_frames();
            let transition = Transition::new(TransitionKind::CrossDissolve, default_len.min(len))?;
            Ok(Command::SetTransition {
                clip,
                side,
                transition: Some(transition),
            })
        })
    }

    fn history(&self) -> MontageResult<std::sync::MutexGuard<'_, UndoStack>> {
        self.history
            .lock()
            .map_err(|_| MontageError::poisoned("history"))
    }

    /// Build a command from the current state and apply it in the same critical
    /// section.
    fn build_and_execute(
        &self,
        build: impl FnOnce(&Sequence, &EditContext) -> MontageResult<Command>,
    ) -> MontageResult<Outcome> {
        self.mutate(|seq, history, ctx| {
            let cmd = build(seq, ctx)?;
            history.execute(cmd, seq, ctx)
        })
    }

    /// Lock order: history, then sequence.
    fn mutate<R: OutcomeLike>(
        &self,
        f: impl FnOnce(&mut Sequence, &mut UndoStack, &EditContext) -> MontageResult<R>,
    ) -> MontageResult<R> {
        let (result, was_dirty, now_dirty) = {
            let mut history = self.history()?;
            let mut seq = self
                .sequence
                .write()
                .map_err(|_| MontageError::poisoned("sequence"))?;
            let was_dirty = seq.changed;
            let result = f(&mut *seq, &mut *history, &self.ctx)?;
            (result, was_dirty, seq.changed)
        };

        let mut events = Vec::new();
        if let Some(outcome) = result.outcome() {
            events.push(ChangeEvent::StructureChanged {
                clips: outcome.clips.iter().copied().collect(),
            });
        }
        if was_dirty != now_dirty {
            events.push(ChangeEvent::DirtyChanged(now_dirty));
        }
        self.emit(&events);
        Ok(result)
    }

    fn emit(&self, events: &[ChangeEvent]) {
        if events.is_empty() {
            return;
        }
        let listeners = match self.listeners.read() {
            Ok(l) => l.clone(),
            Err(_) => {
                tracing::warn!("listener registry poisoned; events dropped");
                return;
            }
        };
        for event in events {
            for l in &listeners {
                l.on_change(event);
            }
        }
    }
}

/// Results of [`Editor::mutate`] that may carry an outcome worth announcing.
trait OutcomeLike {
    fn outcome(&self) -> Option<&Outcome>;
}

impl OutcomeLike for Outcome {
    fn outcome(&self) -> Option<&Outcome> {
        Some(self)
    }
}

impl OutcomeLike for Option<Outcome> {
    fn outcome(&self) -> Option<&Outcome> {
        self.as_ref()
    }
}

/// Clips strictly spanning `at`, in track order.
fn clips_under(seq: &Sequence, at: FrameIndex) -> Vec<ClipId> {
    seq.all_tracks()
        .filter_map(|t| t.active_at(at))
        .filter(|c| c.range.start < at)
        .map(|c| c.id)
        .collect()
}

fn batch(label: &str, mut commands: Vec<Command>, at: FrameIndex) -> MontageResult<Command> {
    match commands.len() {
        0 => Err(MontageError::validation(format!(
            "no clip spans frame {}",
            at.0
        ))),
        1 => Ok(commands.remove(0)),
        _ => Ok(Command::Batch {
            label: label.to_string(),
            commands,
        }),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/edit/editor.rs"]
mod tests;
