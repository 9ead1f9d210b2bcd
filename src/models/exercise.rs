use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A single movement prescription inside a workout routine.
///
/// `sets` and `reps` are free-form strings so that ranges like "8-12"
/// can be recorded. `notes` is omitted from the serialized form when
/// absent, which keeps "no notes" distinct from an empty note.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: Uuid,
    pub name: String,
    pub sets: String,
    pub reps: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Exercise {
    pub fn new(name: impl Into<String>, sets: impl Into<String>, reps: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            sets: sets.into(),
            reps: reps.into(),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} x {})", self.name, self.sets, self.reps)?;
        if let Some(notes) = &self.notes {
            write!(f, " - {}", notes)?;
        }
        Ok(())
    }
}
