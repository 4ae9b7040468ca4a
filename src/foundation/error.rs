use crate::foundation::core::MediaId;

/// Convenience result type used across the engine.
pub type MontageResult<T> = Result<T, MontageError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Only [`MontageError::Validation`] and [`MontageError::Persistence`] are surfaced to
/// callers as hard failures. Media and effect errors are absorbed by the compositor,
/// which substitutes a placeholder or skips the effect.
#[derive(thiserror::Error, Debug)]
pub enum MontageError {
    /// A command's preconditions failed; the sequence was left untouched.
    #[error("validation error: {0}")]
    Validation(String),

    /// The decoder could not supply a buffer for the given media.
    #[error("media unavailable '{media}': {reason}")]
    MediaUnavailable {
        /// Media that failed to decode.
        media: MediaId,
        /// Decoder-provided reason.
        reason: String,
    },

    /// An effect field resolved to an invalid value (NaN, out-of-domain enum, wrong type).
    #[error("effect evaluation error: {0}")]
    EffectEvaluation(String),

    /// Saved state could not be parsed or failed validation.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MontageError {
    /// Build a [`MontageError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MontageError::MediaUnavailable`] value.
    pub fn media(media: &MediaId, reason: impl Into<String>) -> Self {
        Self::MediaUnavailable {
            media: media.clone(),
            reason: reason.into(),
        }
    }

    /// Build a [`MontageError::EffectEvaluation`] value.
    pub fn effect(msg: impl Into<String>) -> Self {
        Self::EffectEvaluation(msg.into())
    }

    /// Build a [`MontageError::Persistence`] value.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Wrap a poisoned lock into [`MontageError::Other`].
    pub(crate) fn poisoned(what: &str) -> Self {
        Self::Other(anyhow::anyhow!("{what} lock poisoned"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
