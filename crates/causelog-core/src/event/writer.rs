//! Event log line serializer.
//!
//! Serializes [`EventRecord`]s to single-line JSON for the append-only log
//! and the event store. Guarantees:
//!
//! - One-line invariant: the serialized form contains no literal `\n`.
//! - Deterministic for a given record (serde_json emits struct fields in
//!   declaration order and the vector clock is an ordered map).

use super::EventRecord;

/// Errors that can occur while serializing an event.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// The serialized record contained a literal newline.
    #[error("serialized event contains a literal newline; one-line invariant violated")]
    NewlineInRecord,

    /// JSON serialization failed.
    #[error("failed to serialize event record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Serialize a record to a single JSON line (no trailing newline).
///
/// # Errors
///
/// Returns [`WriteError::NewlineInRecord`] if the JSON embeds a literal
/// newline (cannot happen with valid payload values, but enforced), or
/// [`WriteError::Serialize`] on serializer failure.
pub fn to_log_line(record: &EventRecord) -> Result<String, WriteError> {
    let line = serde_json::to_string(record)?;
    if line.contains('\n') {
        return Err(WriteError::NewlineInRecord);
    }
    Ok(line)
}

/// Serialize a record to a JSON line with trailing newline.
///
/// # Errors
///
/// Same as [`to_log_line`].
pub fn write_line(record: &EventRecord) -> Result<String, WriteError> {
    let mut line = to_log_line(record)?;
    line.push('\n');
    Ok(line)
}
