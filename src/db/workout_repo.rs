use sqlx::SqlitePool;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::codec::{decode_exercise_list, encode_exercise_list, CodecError};
use crate::models::Workout;

/// Buffer for the commit notification channel. A subscriber that falls
/// further behind than this collapses the missed commits into one
/// re-query (see `live`).
const COMMIT_CHANNEL_CAPACITY: usize = 64;

/// Errors from the workout store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("workout {id} has a corrupt exercise list: {source}")]
    Corrupt { id: Uuid, source: CodecError },

    #[error("workout row has invalid id '{value}': {source}")]
    InvalidId { value: String, source: uuid::Error },
}

/// Notification that a write was committed to the store.
#[derive(Debug, Clone)]
pub struct Commit {
    pub workout_id: Uuid,
}

/// Keyed storage of workout records, one row per id.
///
/// Cloning is cheap; clones share the pool and the commit channel. Every
/// successful write broadcasts exactly one [`Commit`] so live queries can
/// re-read without polling.
#[derive(Clone)]
pub struct WorkoutRepository {
    pool: SqlitePool,
    commits: broadcast::Sender<Commit>,
}

// Row type for database queries
#[derive(sqlx::FromRow)]
struct WorkoutRow {
    id: String,
    name: String,
    exercises: Option<String>,
}

impl WorkoutRepository {
    pub fn new(pool: SqlitePool) -> Self {
        let (commits, _) = broadcast::channel(COMMIT_CHANNEL_CAPACITY);
        Self { pool, commits }
    }

    /// Writes the full record, replacing any existing row with the same id.
    ///
    /// Repeating the call with identical content is idempotent; a duplicate
    /// id is a replacement, not an error.
    pub async fn insert_or_replace(&self, workout: &Workout) -> Result<(), StoreError> {
        let exercises = encode_exercise_list(&workout.exercises)
            .map_err(|source| StoreError::Corrupt {
                id: workout.id,
                source,
            })?;

        sqlx::query("INSERT OR REPLACE INTO workouts (id, name, exercises) VALUES (?, ?, ?)")
            .bind(workout.id.to_string())
            .bind(&workout.name)
            .bind(&exercises)
            .execute(&self.pool)
            .await?;

        self.notify(workout.id);
        Ok(())
    }

    /// Full-replace write, same semantics as [`insert_or_replace`];
    /// kept separate to mark mutation intent at call sites.
    ///
    /// [`insert_or_replace`]: Self::insert_or_replace
    pub async fn update(&self, workout: &Workout) -> Result<(), StoreError> {
        self.insert_or_replace(workout).await
    }

    /// Removes the record by id. Deleting a missing id is a no-op and
    /// commits nothing.
    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM workouts WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            self.notify(id);
        }
        Ok(())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Workout>, StoreError> {
        let row: Option<WorkoutRow> = sqlx::query_as("SELECT * FROM workouts WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(hydrate_workout).transpose()
    }

    /// Returns every record, sorted ascending by name (BINARY collation).
    pub async fn get_all(&self) -> Result<Vec<Workout>, StoreError> {
        let rows: Vec<WorkoutRow> = sqlx::query_as("SELECT * FROM workouts ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(hydrate_workout).collect()
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM workouts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    /// Subscribes to the raw commit feed. Most callers want the snapshot
    /// feeds in `live` instead.
    pub fn subscribe(&self) -> broadcast::Receiver<Commit> {
        self.commits.subscribe()
    }

    fn notify(&self, workout_id: Uuid) {
        // Ignore send errors (no subscribers)
        let _ = self.commits.send(Commit { workout_id });
    }
}

fn hydrate_workout(row: WorkoutRow) -> Result<Workout, StoreError> {
    let id = Uuid::parse_str(&row.id).map_err(|source| StoreError::InvalidId {
        value: row.id.clone(),
        source,
    })?;

    let exercises = decode_exercise_list(row.exercises.as_deref())
        .map_err(|source| StoreError::Corrupt { id, source })?;

    Ok(Workout {
        id,
        name: row.name,
        exercises,
    })
}
