//! Command-based undo/redo history.
//!
//! - `execute` validates and applies a command atomically, then pushes it and clears
//!   the redo stack.
//! - `undo` restores the captured pre-edit state of the most recent command.
//! - `redo` re-applies the most recently undone command against the restored state,
//!   which reproduces the same ids and topology.
//! - The undo stack is bounded; the oldest entries are dropped first.

use std::collections::BTreeSet;

use crate::{
    edit::command::{Applied, Command, EditContext, execute},
    foundation::{core::ClipId, error::MontageResult},
    model::sequence::Sequence,
};

/// A command that is currently applied.
#[derive(Clone, Debug)]
struct Entry {
    command: Command,
    applied: Applied,
}

/// Result of an execute, undo or redo.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    /// Command label.
    pub label: String,
    /// Clips created, changed or removed.
    pub clips: BTreeSet<ClipId>,
}

/// Undo/redo stacks of commands.
#[derive(Clone, Debug)]
pub struct UndoStack {
    undo: Vec<Entry>,
    redo: Vec<Command>,
    limit: usize,
}

impl UndoStack {
    /// Empty history keeping at most `limit` undo steps.
    pub fn new(limit: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Apply `cmd` and record it. A rejected command leaves both the sequence and
    /// the history untouched.
    pub fn execute(
        &mut self,
        cmd: Command,
        seq: &mut Sequence,
        ctx: &EditContext,
    ) -> MontageResult<Outcome> {
        let label = cmd.label();
        let applied = match execute(&cmd, seq, ctx) {
            Ok(a) => a,
            Err(e) => {
                tracing::warn!(label = %label, error = %e, "command rejected");
                return Err(e);
            }
        };
        seq.changed = true;
        let clips = applied.clips.clone();
        self.redo.clear();
        self.undo.push(Entry {
            command: cmd,
            applied,
        });
        while self.undo.len() > self.limit {
            self.undo.remove(0);
        }
        tracing::debug!(label = %label, undo_depth = self.undo.len(), "command applied");
        Ok(Outcome { label, clips })
    }

    /// Revert the most recent command. `None` when there is nothing to undo.
    pub fn undo(&mut self, seq: &mut Sequence) -> Option<Outcome> {
        let entry = self.undo.pop()?;
        let label = entry.command.label();
        let clips = entry.applied.clips.clone();
        entry.applied.inverse.restore(seq);
        seq.changed = true;
        self.redo.push(entry.command);
        tracing::debug!(
            label = %label,
            undo_remaining = self.undo.len(),
            redo_depth = self.redo.len(),
            "undo"
        );
        Some(Outcome { label, clips })
    }

    /// Re-apply the most recently undone command. `Ok(None)` when there is nothing
    /// to redo.
    pub fn redo(
        &mut self,
        seq: &mut Sequence,
        ctx: &EditContext,
    ) -> MontageResult<Option<Outcome>> {
        let Some(command) = self.redo.pop() else {
            return Ok(None);
        };
        let label = command.label();
        let applied = match execute(&command, seq, ctx) {
            Ok(a) => a,
            Err(e) => {
                tracing::warn!(label = %label, error = %e, "redo rejected");
                self.redo.push(command);
                return Err(e);
            }
        };
        seq.changed = true;
        let clips = applied.clips.clone();
        self.undo.push(Entry { command, applied });
        tracing::debug!(label = %label, redo_remaining = self.redo.len(), "redo");
        Ok(Some(Outcome { label, clips }))
    }

    /// `true` when [`Self::undo`] would do something.
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// `true` when [`Self::redo`] would do something.
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Label of the next undo step.
    pub fn undo_label(&self) -> Option<String> {
        self.undo.last().map(|e| e.command.label())
    }

    /// Label of the next redo step.
    pub fn redo_label(&self) -> Option<String> {
        self.redo.last().map(Command::label)
    }

    /// Number of undoable steps.
    pub fn depth(&self) -> usize {
        self.undo.len()
    }

    /// Commands currently applied, oldest first.
    ///
    /// Only the retained undo steps are listed. Once the undo limit has dropped older
    /// steps, replaying these commands reproduces the sequence only when starting from
    /// the state the oldest retained step was applied to, not from the original one.
    pub fn applied(&self) -> impl Iterator<Item = &Command> {
        self.undo.iter().map(|e| &e.command)
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/edit/history.rs"]
mod tests;
