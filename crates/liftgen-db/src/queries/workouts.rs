//! Database query functions for the `workouts` and `workout_exercises`
//! tables.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Workout, WorkoutExercise, WorkoutExerciseDetail};

/// Parameters for inserting a generated workout.
#[derive(Debug, Clone)]
pub struct NewWorkout<'a> {
    pub user_id: Uuid,
    pub workout_data: &'a serde_json::Value,
    pub total_duration_minutes: i32,
    pub muscle_groups_targeted: &'a str,
    pub joint_groups_affected: &'a str,
    pub equipment_needed: &'a str,
    pub raw_ai_response: &'a str,
    pub ai_model: &'a str,
    pub prompt_tokens: Option<i32>,
    pub completion_tokens: Option<i32>,
    pub generation_time_ms: Option<i64>,
    pub parse_attempts: i32,
    pub muscle_focus: &'a [String],
    pub workout_focus: &'a [String],
    pub exercise_count: i32,
    pub special_instructions: Option<&'a str>,
    pub total_sets: i32,
    pub total_exercises: i32,
    pub estimated_duration_minutes: i32,
    pub primary_muscles_targeted: &'a [String],
    pub equipment_needed_array: &'a [String],
}

/// Parameters for one `workout_exercises` link row.
#[derive(Debug, Clone)]
pub struct NewWorkoutExercise<'a> {
    pub exercise_id: Uuid,
    pub order_index: i32,
    pub sets: i32,
    pub reps: i32,
    pub rest_seconds: i32,
    pub weight_unit: &'a str,
    pub weight_recommendation_type: Option<&'a str>,
    pub weight_recommendation_value: Option<f64>,
    pub rationale: Option<&'a str>,
}

/// Count the user's workouts created inside `(window_start, window_end]`.
pub async fn count_workouts_in_window(
    pool: &PgPool,
    user_id: Uuid,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM workouts \
         WHERE user_id = $1 AND created_at > $2 AND created_at <= $3",
    )
    .bind(user_id)
    .bind(window_start)
    .bind(window_end)
    .fetch_one(pool)
    .await
    .context("failed to count workouts in window")?;

    Ok(count)
}

/// Insert a workout and all of its exercise links inside a single
/// transaction. Either every row is written or none is.
pub async fn insert_workout_with_exercises(
    pool: &PgPool,
    workout: &NewWorkout<'_>,
    links: &[NewWorkoutExercise<'_>],
) -> Result<Workout> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let row = sqlx::query_as::<_, Workout>(
        "INSERT INTO workouts (user_id, workout_data, total_duration_minutes, \
         muscle_groups_targeted, joint_groups_affected, equipment_needed, raw_ai_response, \
         ai_model, prompt_tokens, completion_tokens, generation_time_ms, parse_attempts, \
         muscle_focus, workout_focus, exercise_count, special_instructions, total_sets, \
         total_exercises, estimated_duration_minutes, primary_muscles_targeted, \
         equipment_needed_array) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
         $17, $18, $19, $20, $21) \
         RETURNING *",
    )
    .bind(workout.user_id)
    .bind(workout.workout_data)
    .bind(workout.total_duration_minutes)
    .bind(workout.muscle_groups_targeted)
    .bind(workout.joint_groups_affected)
    .bind(workout.equipment_needed)
    .bind(workout.raw_ai_response)
    .bind(workout.ai_model)
    .bind(workout.prompt_tokens)
    .bind(workout.completion_tokens)
    .bind(workout.generation_time_ms)
    .bind(workout.parse_attempts)
    .bind(workout.muscle_focus)
    .bind(workout.workout_focus)
    .bind(workout.exercise_count)
    .bind(workout.special_instructions)
    .bind(workout.total_sets)
    .bind(workout.total_exercises)
    .bind(workout.estimated_duration_minutes)
    .bind(workout.primary_muscles_targeted)
    .bind(workout.equipment_needed_array)
    .fetch_one(&mut *tx)
    .await
    .context("failed to insert workout")?;

    for link in links {
        sqlx::query(
            "INSERT INTO workout_exercises \
             (workout_id, exercise_id, order_index, sets, reps, rest_seconds, weight_unit, \
              weight_recommendation_type, weight_recommendation_value, rationale) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(row.id)
        .bind(link.exercise_id)
        .bind(link.order_index)
        .bind(link.sets)
        .bind(link.reps)
        .bind(link.rest_seconds)
        .bind(link.weight_unit)
        .bind(link.weight_recommendation_type)
        .bind(link.weight_recommendation_value)
        .bind(link.rationale)
        .execute(&mut *tx)
        .await
        .with_context(|| {
            format!(
                "failed to link exercise {} at position {} to workout",
                link.exercise_id, link.order_index
            )
        })?;
    }

    tx.commit().await.context("failed to commit transaction")?;

    Ok(row)
}

/// Fetch a workout by ID.
pub async fn get_workout(pool: &PgPool, id: Uuid) -> Result<Option<Workout>> {
    let workout = sqlx::query_as::<_, Workout>("SELECT * FROM workouts WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch workout")?;

    Ok(workout)
}

/// List a user's workouts, newest first.
pub async fn list_workouts_for_user(pool: &PgPool, user_id: Uuid, limit: i64) -> Result<Vec<Workout>> {
    let workouts = sqlx::query_as::<_, Workout>(
        "SELECT * FROM workouts WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("failed to list workouts for user")?;

    Ok(workouts)
}

/// Raw link rows for a workout, in prescribed order.
pub async fn list_links_for_workout(pool: &PgPool, workout_id: Uuid) -> Result<Vec<WorkoutExercise>> {
    let links = sqlx::query_as::<_, WorkoutExercise>(
        "SELECT * FROM workout_exercises WHERE workout_id = $1 ORDER BY order_index ASC",
    )
    .bind(workout_id)
    .fetch_all(pool)
    .await
    .context("failed to list workout exercise links")?;

    Ok(links)
}

/// Link rows joined with their canonical exercise, in prescribed order.
pub async fn list_exercise_details_for_workout(
    pool: &PgPool,
    workout_id: Uuid,
) -> Result<Vec<WorkoutExerciseDetail>> {
    let rows = sqlx::query_as::<_, WorkoutExerciseDetail>(
        "SELECT we.order_index, we.exercise_id, e.name, we.sets, we.reps, we.rest_seconds, \
                we.weight_unit, we.rationale, e.equipment, e.movement_type \
         FROM workout_exercises we \
         JOIN exercises e ON e.id = we.exercise_id \
         WHERE we.workout_id = $1 \
         ORDER BY we.order_index ASC",
    )
    .bind(workout_id)
    .fetch_all(pool)
    .await
    .context("failed to list exercises for workout")?;

    Ok(rows)
}
