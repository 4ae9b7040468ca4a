use std::path::Path;

use crate::{
    foundation::error::{MontageError, MontageResult},
    model::sequence::Sequence,
};

/// Current document schema version.
pub const FORMAT_VERSION: u32 = 1;

/// On-disk wrapper around a sequence.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SequenceDocument {
    /// Schema version; must equal [`FORMAT_VERSION`].
    pub format_version: u32,
    /// The timeline.
    pub sequence: Sequence,
}

/// Serialize `seq` to pretty JSON.
pub fn save_sequence(seq: &Sequence) -> MontageResult<String> {
    let doc = SequenceDocument {
        format_version: FORMAT_VERSION,
        sequence: seq.clone(),
    };
    serde_json::to_string_pretty(&doc)
        .map_err(|e| MontageError::persistence(format!("serialize sequence: {e}")))
}

/// Parse and fully validate a document. Nothing is returned unless every invariant
/// holds.
#[tracing::instrument(skip(json), fields(len = json.len()))]
pub fn load_sequence(json: &str) -> MontageResult<Sequence> {
    let result = parse(json);
    if let Err(e) = &result {
        tracing::warn!(error = %e, "sequence load failed");
    }
    result
}

fn parse(json: &str) -> MontageResult<Sequence> {
    let doc: SequenceDocument = serde_json::from_str(json)
        .map_err(|e| MontageError::persistence(format!("parse: {e}")))?;
    if doc.format_version != FORMAT_VERSION {
        return Err(MontageError::persistence(format!(
            "unsupported format_version {} (expected {FORMAT_VERSION})",
            doc.format_version
        )));
    }
    let mut seq = doc.sequence;
    seq.validate()
        .map_err(|e| MontageError::persistence(format!("invalid sequence: {e}")))?;
    seq.changed = false;
    Ok(seq)
}

/// Write `seq` to `path`.
pub fn save_to_path(seq: &Sequence, path: &Path) -> MontageResult<()> {
    let json = save_sequence(seq)?;
    std::fs::write(path, json).map_err(|e| {
        MontageError::persistence(format!("write '{}': {e}", path.display()))
    })
}

/// Read and validate a sequence from `path`.
pub fn load_from_path(path: &Path) -> MontageResult<Sequence> {
    let json = std::fs::read_to_string(path).map_err(|e| {
        MontageError::persistence(format!("read '{}': {e}", path.display()))
    })?;
    load_sequence(&json)
}

#[cfg(test)]
#[path = "../../tests/unit/persist/document.rs"]
mod tests;
