mod config_cmd;
mod exercise;
mod workout;

pub use config_cmd::ConfigCommand;
pub use exercise::ExerciseCommand;
pub use workout::WorkoutCommand;
