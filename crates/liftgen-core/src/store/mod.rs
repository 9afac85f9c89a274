//! Persistence gateway used by the pipeline.
//!
//! The pipeline never touches SQL directly; it goes through
//! [`WorkoutStore`]. [`PgStore`] backs it with PostgreSQL and
//! [`MemoryStore`] keeps everything in process for tests and dry runs.

pub mod memory;
pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use liftgen_db::models::{Exercise, Workout, WorkoutExerciseDetail};
use liftgen_db::queries::exercises::NewExercise;
use liftgen_db::queries::workouts::{NewWorkout, NewWorkoutExercise};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// The operations the generation pipeline needs from storage.
#[async_trait]
pub trait WorkoutStore: Send + Sync {
    /// Whether the user is an administrator. Unknown users are not.
    async fn is_admin(&self, user_id: Uuid) -> Result<bool>;

    /// Workouts the user created inside `(window_start, window_end]`.
    async fn count_workouts_since(
        &self,
        user_id: Uuid,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<i64>;

    async fn find_exercise_by_search_key(&self, search_key: &str) -> Result<Option<Exercise>>;

    /// Insert a canonical exercise. Returns `None` if the search key is
    /// already taken.
    async fn insert_exercise(&self, new: &NewExercise<'_>) -> Result<Option<Exercise>>;

    async fn get_workout(&self, id: Uuid) -> Result<Option<Workout>>;

    /// A workout's link rows joined with their exercises, in order.
    async fn list_workout_exercises(&self, workout_id: Uuid) -> Result<Vec<WorkoutExerciseDetail>>;

    /// Insert a workout and its link rows atomically.
    async fn insert_workout(
        &self,
        workout: &NewWorkout<'_>,
        links: &[NewWorkoutExercise<'_>],
    ) -> Result<Workout>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn WorkoutStore) {}
};
