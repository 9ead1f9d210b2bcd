use clap::{Args, Subcommand};
use uuid::Uuid;

use super::workout::resolve_workout;
use crate::db::WorkoutRepository;
use crate::models::Exercise;
use crate::service::WorkoutService;

#[derive(Args)]
pub struct ExerciseCommand {
    #[command(subcommand)]
    pub command: ExerciseSubcommand,
}

#[derive(Subcommand)]
pub enum ExerciseSubcommand {
    /// Add an exercise to the end of a workout
    Add {
        /// Workout ID (UUID) or name
        workout: String,

        /// Exercise name
        #[arg(long)]
        name: String,

        /// Sets, free-form (e.g. "4")
        #[arg(long)]
        sets: String,

        /// Reps, free-form (e.g. "8-12")
        #[arg(long)]
        reps: String,

        /// Optional notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Edit an exercise, keeping its position in the workout
    Edit {
        /// Workout ID (UUID) or name
        workout: String,

        /// Exercise ID (UUID)
        exercise: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New sets
        #[arg(long)]
        sets: Option<String>,

        /// New reps
        #[arg(long)]
        reps: Option<String>,

        /// New notes ("" clears them)
        #[arg(long)]
        notes: Option<String>,
    },

    /// Remove an exercise from a workout
    Remove {
        /// Workout ID (UUID) or name
        workout: String,

        /// Exercise ID (UUID)
        exercise: String,
    },
}

impl ExerciseCommand {
    pub async fn run(
        &self,
        service: &WorkoutService,
        repo: &WorkoutRepository,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ExerciseSubcommand::Add {
                workout,
                name,
                sets,
                reps,
                notes,
            } => {
                if name.trim().is_empty() {
                    return Err("Exercise name cannot be empty".into());
                }
                if sets.trim().is_empty() {
                    return Err("Sets cannot be empty".into());
                }
                if reps.trim().is_empty() {
                    return Err("Reps cannot be empty".into());
                }

                let target = match resolve_workout(repo, workout).await? {
                    Some(w) => w,
                    None => return Err(format!("Workout not found: {}", workout).into()),
                };

                let mut exercise = Exercise::new(name.trim(), sets.trim(), reps.trim());
                if let Some(notes) = notes {
                    exercise = exercise.with_notes(notes.clone());
                }

                println!("Added to '{}':", target.name);
                println!("  {}", exercise);
                service.add_exercise_to_workout(target.id, exercise);
                Ok(())
            }

            ExerciseSubcommand::Edit {
                workout,
                exercise,
                name,
                sets,
                reps,
                notes,
            } => {
                let has_updates =
                    name.is_some() || sets.is_some() || reps.is_some() || notes.is_some();
                if !has_updates {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                for (label, value) in [("name", name), ("sets", sets), ("reps", reps)] {
                    if let Some(value) = value {
                        if value.trim().is_empty() {
                            return Err(format!("Exercise {} cannot be empty", label).into());
                        }
                    }
                }

                let exercise_id = Uuid::parse_str(exercise)
                    .map_err(|_| format!("Invalid exercise id: {}", exercise))?;

                let target = match resolve_workout(repo, workout).await? {
                    Some(w) => w,
                    None => return Err(format!("Workout not found: {}", workout).into()),
                };

                let current = match target.exercises.iter().find(|e| e.id == exercise_id) {
                    Some(e) => e,
                    None => {
                        return Err(format!(
                            "Exercise {} not found in '{}'",
                            exercise_id, target.name
                        )
                        .into())
                    }
                };

                // Keep the id; replace only the provided fields
                let replacement = Exercise {
                    id: current.id,
                    name: name.clone().unwrap_or_else(|| current.name.clone()),
                    sets: sets.clone().unwrap_or_else(|| current.sets.clone()),
                    reps: reps.clone().unwrap_or_else(|| current.reps.clone()),
                    notes: match notes {
                        Some(n) if n.is_empty() => None,
                        Some(n) => Some(n.clone()),
                        None => current.notes.clone(),
                    },
                };

                println!("Updated in '{}':", target.name);
                println!("  {}", replacement);
                service.update_exercise_in_workout(target.id, exercise_id, replacement);
                Ok(())
            }

            ExerciseSubcommand::Remove { workout, exercise } => {
                let exercise_id = Uuid::parse_str(exercise)
                    .map_err(|_| format!("Invalid exercise id: {}", exercise))?;

                let target = match resolve_workout(repo, workout).await? {
                    Some(w) => w,
                    None => return Err(format!("Workout not found: {}", workout).into()),
                };

                match target.exercises.iter().find(|e| e.id == exercise_id) {
                    Some(found) => println!("Removed from '{}': {}", target.name, found.name),
                    None => {
                        return Err(format!(
                            "Exercise {} not found in '{}'",
                            exercise_id, target.name
                        )
                        .into())
                    }
                }

                service.delete_exercise_from_workout(target.id, exercise_id);
                Ok(())
            }
        }
    }
}
