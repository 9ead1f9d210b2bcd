use clap::{Args, Subcommand, ValueEnum};
use std::io::{self, Write};
use uuid::Uuid;

use crate::db::{StoreError, WorkoutRepository};
use crate::models::Workout;
use crate::service::WorkoutService;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct WorkoutCommand {
    #[command(subcommand)]
    pub command: WorkoutSubcommand,
}

#[derive(Subcommand)]
pub enum WorkoutSubcommand {
    /// Create a new workout routine
    Add {
        /// Name of the workout
        name: String,
    },

    /// List all workouts, sorted by name
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a workout's details
    Show {
        /// Workout ID (UUID) or name
        identifier: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a workout and all its exercises
    Delete {
        /// Workout ID (UUID) or name
        identifier: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Follow live snapshots of all workouts, or of one workout
    Watch {
        /// Workout ID (UUID) or name; omit to watch the whole list
        identifier: Option<String>,
    },
}

impl WorkoutCommand {
    pub async fn run(
        &self,
        service: &WorkoutService,
        repo: &WorkoutRepository,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            WorkoutSubcommand::Add { name } => {
                if name.trim().is_empty() {
                    return Err("Workout name cannot be empty".into());
                }

                service.add_workout(name.trim());
                println!("Added workout '{}'", name.trim());
                Ok(())
            }

            WorkoutSubcommand::List { format } => {
                let workouts = repo.get_all().await?;

                if workouts.is_empty() {
                    println!("No workouts found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&workouts)?);
                    }
                    OutputFormat::Text => {
                        print_workout_table(&workouts);
                    }
                }
                Ok(())
            }

            WorkoutSubcommand::Show { identifier, format } => {
                match resolve_workout(repo, identifier).await? {
                    Some(workout) => {
                        match format {
                            OutputFormat::Json => {
                                println!("{}", serde_json::to_string_pretty(&workout)?);
                            }
                            OutputFormat::Text => {
                                println!("{}", workout);
                            }
                        }
                        Ok(())
                    }
                    None => Err(format!("Workout not found: {}", identifier).into()),
                }
            }

            WorkoutSubcommand::Delete { identifier, force } => {
                let workout = match resolve_workout(repo, identifier).await? {
                    Some(w) => w,
                    None => return Err(format!("Workout not found: {}", identifier).into()),
                };

                // Confirm deletion unless --force is used
                if !force {
                    print!(
                        "Delete workout '{}' and its {} exercise(s)? [y/N] ",
                        workout.name,
                        workout.exercises.len()
                    );
                    io::stdout().flush()?;

                    let mut input = String::new();
                    io::stdin().read_line(&mut input)?;

                    if !input.trim().eq_ignore_ascii_case("y") {
                        println!("Deletion cancelled.");
                        return Ok(());
                    }
                }

                service.delete_workout(&workout);
                println!("Deleted workout: {}", workout.name);
                Ok(())
            }

            WorkoutSubcommand::Watch { identifier } => match identifier {
                Some(identifier) => {
                    // A raw UUID may be watched before the record exists
                    let id = match Uuid::parse_str(identifier) {
                        Ok(id) => id,
                        Err(_) => match resolve_workout(repo, identifier).await? {
                            Some(w) => w.id,
                            None => {
                                return Err(format!("Workout not found: {}", identifier).into())
                            }
                        },
                    };

                    println!("Watching workout {} (Ctrl-C to stop)", id);
                    let mut feed = repo.watch_by_id(id);
                    while let Some(snapshot) = feed.next().await {
                        match snapshot? {
                            Some(workout) => println!("{}", workout),
                            None => println!("(no workout with this id)"),
                        }
                    }
                    Ok(())
                }
                None => {
                    println!("Watching all workouts (Ctrl-C to stop)");
                    let mut feed = repo.watch_all();
                    while let Some(snapshot) = feed.next().await {
                        let workouts = snapshot?;
                        if workouts.is_empty() {
                            println!("(no workouts)");
                        } else {
                            print_workout_table(&workouts);
                        }
                        println!();
                    }
                    Ok(())
                }
            },
        }
    }
}

fn print_workout_table(workouts: &[Workout]) {
    println!("{:<36}  {:<30}  EXERCISES", "ID", "NAME");
    println!("{}", "-".repeat(80));
    for workout in workouts {
        let name = if workout.name.len() > 30 {
            format!("{}...", &workout.name[..27])
        } else {
            workout.name.clone()
        };
        println!(
            "{:<36}  {:<30}  {}",
            workout.id,
            name,
            workout.exercises.len()
        );
    }
    println!("\nTotal: {} workout(s)", workouts.len());
}

/// Resolves an identifier as a UUID first, then as an exact name.
pub(super) async fn resolve_workout(
    repo: &WorkoutRepository,
    identifier: &str,
) -> Result<Option<Workout>, StoreError> {
    if let Ok(id) = Uuid::parse_str(identifier) {
        return repo.get_by_id(id).await;
    }
    let workouts = repo.get_all().await?;
    Ok(workouts.into_iter().find(|w| w.name == identifier))
}
