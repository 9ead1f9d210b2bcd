use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::exercise::Exercise;

/// A named workout routine owning an ordered list of exercises.
///
/// The exercise order is significant and is preserved through
/// persistence exactly as inserted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workout {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

impl Workout {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            exercises: Vec::new(),
        }
    }

    pub fn with_exercises(mut self, exercises: Vec<Exercise>) -> Self {
        self.exercises = exercises;
        self
    }
}

impl fmt::Display for Workout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "{}", "=".repeat(self.name.len()))?;
        writeln!(f, "ID: {}", self.id)?;

        if self.exercises.is_empty() {
            writeln!(f, "\nNo exercises yet")?;
        } else {
            writeln!(f, "\nExercises:")?;
            for exercise in &self.exercises {
                writeln!(f, "  [{}] {}", exercise.id, exercise)?;
            }
        }

        Ok(())
    }
}
