//! Live query feeds over the workout store.
//!
//! Each feed yields an initial snapshot of its query, then one fresh
//! snapshot per commit notification received from the repository. Delivery
//! is push: subscribers never poll. Dropping a feed cancels its
//! subscription.

use futures::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use uuid::Uuid;

use crate::db::{Commit, StoreError, WorkoutRepository};
use crate::models::Workout;

impl WorkoutRepository {
    /// Live view of all workouts, sorted ascending by name.
    pub fn watch_all(&self) -> AllWorkoutsFeed {
        AllWorkoutsFeed::new(self.clone())
    }

    /// Live view of a single workout by id; `None` snapshots while the
    /// record does not exist.
    pub fn watch_by_id(&self, id: Uuid) -> WorkoutByIdFeed {
        WorkoutByIdFeed::new(self.clone(), id)
    }
}

/// Live, push-updated view of the full sorted workout list.
pub struct AllWorkoutsFeed {
    repo: WorkoutRepository,
    commits: Receiver<Commit>,
    primed: bool,
}

impl AllWorkoutsFeed {
    pub fn new(repo: WorkoutRepository) -> Self {
        let commits = repo.subscribe();
        Self {
            repo,
            commits,
            primed: false,
        }
    }

    /// Waits for the next snapshot. The first call resolves immediately
    /// with the current state; later calls resolve once per commit.
    /// Returns `None` if the commit channel closed.
    pub async fn next(&mut self) -> Option<Result<Vec<Workout>, StoreError>> {
        if !self.primed {
            self.primed = true;
            return Some(self.repo.get_all().await);
        }

        if !wait_for_commit(&mut self.commits).await {
            return None;
        }
        Some(self.repo.get_all().await)
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<Workout>, StoreError>> {
        stream::unfold(self, |mut feed| async move {
            feed.next().await.map(|snapshot| (snapshot, feed))
        })
    }
}

/// Live, push-updated view of one workout record.
pub struct WorkoutByIdFeed {
    repo: WorkoutRepository,
    id: Uuid,
    commits: Receiver<Commit>,
    primed: bool,
}

impl WorkoutByIdFeed {
    pub fn new(repo: WorkoutRepository, id: Uuid) -> Self {
        let commits = repo.subscribe();
        Self {
            repo,
            id,
            commits,
            primed: false,
        }
    }

    /// Waits for the next snapshot of the record (or `None` inside the
    /// `Some(Ok(..))` when the record is absent). Invalidation is
    /// table-level: commits to unrelated workouts also trigger an
    /// emission. Returns `None` if the commit channel closed.
    pub async fn next(&mut self) -> Option<Result<Option<Workout>, StoreError>> {
        if !self.primed {
            self.primed = true;
            return Some(self.repo.get_by_id(self.id).await);
        }

        if !wait_for_commit(&mut self.commits).await {
            return None;
        }
        Some(self.repo.get_by_id(self.id).await)
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<Option<Workout>, StoreError>> {
        stream::unfold(self, |mut feed| async move {
            feed.next().await.map(|snapshot| (snapshot, feed))
        })
    }
}

/// Waits for one commit. Lagging collapses missed commits into the next
/// re-query, so the snapshot a slow subscriber sees is still current.
/// Returns false once the channel is closed.
async fn wait_for_commit(commits: &mut Receiver<Commit>) -> bool {
    match commits.recv().await {
        Ok(_) | Err(RecvError::Lagged(_)) => true,
        Err(RecvError::Closed) => false,
    }
}
