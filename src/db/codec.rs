use thiserror::Error;

use crate::models::Exercise;

/// Errors from the exercise-list column codec.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode exercise list: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("exercise list blob is not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Encodes an ordered exercise list into the single TEXT column form.
///
/// Deterministic and lossless: field order is fixed by the struct, list
/// order is preserved, and an absent `notes` omits the key entirely so it
/// stays distinguishable from an empty string.
pub fn encode_exercise_list(exercises: &[Exercise]) -> Result<String, CodecError> {
    serde_json::to_string(exercises).map_err(CodecError::Encode)
}

/// Decodes the TEXT column back into the exercise list.
///
/// A NULL or empty column reads as an empty list. Anything else must parse;
/// a corrupted blob is an integrity error, never silently an empty list.
pub fn decode_exercise_list(blob: Option<&str>) -> Result<Vec<Exercise>, CodecError> {
    match blob {
        None => Ok(Vec::new()),
        Some(s) if s.is_empty() => Ok(Vec::new()),
        Some(s) => serde_json::from_str(s).map_err(CodecError::Decode),
    }
}
