//! [`WorkoutStore`] over PostgreSQL.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use liftgen_db::models::{Exercise, Workout, WorkoutExerciseDetail};
use liftgen_db::queries::exercises::{self, NewExercise};
use liftgen_db::queries::profiles;
use liftgen_db::queries::workouts::{self, NewWorkout, NewWorkoutExercise};

use super::WorkoutStore;

/// PostgreSQL-backed store. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl WorkoutStore for PgStore {
    async fn is_admin(&self, user_id: Uuid) -> Result<bool> {
        profiles::is_admin(&self.pool, user_id).await
    }

    async fn count_workouts_since(
        &self,
        user_id: Uuid,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<i64> {
        workouts::count_workouts_in_window(&self.pool, user_id, window_start, window_end).await
    }

    async fn find_exercise_by_search_key(&self, search_key: &str) -> Result<Option<Exercise>> {
        exercises::find_by_search_key(&self.pool, search_key).await
    }

    async fn insert_exercise(&self, new: &NewExercise<'_>) -> Result<Option<Exercise>> {
        exercises::insert_exercise(&self.pool, new).await
    }

    async fn get_workout(&self, id: Uuid) -> Result<Option<Workout>> {
        workouts::get_workout(&self.pool, id).await
    }

    async fn list_workout_exercises(&self, workout_id: Uuid) -> Result<Vec<WorkoutExerciseDetail>> {
        workouts::list_exercise_details_for_workout(&self.pool, workout_id).await
    }

    async fn insert_workout(
        &self,
        workout: &NewWorkout<'_>,
        links: &[NewWorkoutExercise<'_>],
    ) -> Result<Workout> {
        workouts::insert_workout_with_exercises(&self.pool, workout, links).await
    }
}
