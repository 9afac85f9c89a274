//! Database query functions for the canonical `exercises` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Exercise, MovementType};

/// Parameters for inserting a new canonical exercise.
#[derive(Debug, Clone)]
pub struct NewExercise<'a> {
    pub name: &'a str,
    pub search_key: &'a str,
    pub primary_muscles: &'a [String],
    pub secondary_muscles: &'a [String],
    pub equipment: Option<&'a str>,
    pub movement_type: Option<MovementType>,
}

/// Look up an exercise by its normalized search key.
pub async fn find_by_search_key(pool: &PgPool, search_key: &str) -> Result<Option<Exercise>> {
    let exercise = sqlx::query_as::<_, Exercise>("SELECT * FROM exercises WHERE search_key = $1")
        .bind(search_key)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("failed to look up exercise by search key {search_key:?}"))?;

    Ok(exercise)
}

/// Fetch an exercise by ID.
pub async fn get_exercise(pool: &PgPool, id: Uuid) -> Result<Option<Exercise>> {
    let exercise = sqlx::query_as::<_, Exercise>("SELECT * FROM exercises WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch exercise")?;

    Ok(exercise)
}

/// Insert a canonical exercise.
///
/// Returns `None` when another row already owns the search key, which
/// happens when two requests race to create the same exercise. The caller
/// should re-read the existing row.
pub async fn insert_exercise(pool: &PgPool, new: &NewExercise<'_>) -> Result<Option<Exercise>> {
    let exercise = sqlx::query_as::<_, Exercise>(
        "INSERT INTO exercises \
         (name, search_key, primary_muscles, secondary_muscles, equipment, movement_type) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (search_key) DO NOTHING \
         RETURNING *",
    )
    .bind(new.name)
    .bind(new.search_key)
    .bind(new.primary_muscles)
    .bind(new.secondary_muscles)
    .bind(new.equipment)
    .bind(new.movement_type)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("failed to insert exercise {:?}", new.name))?;

    Ok(exercise)
}

/// List all canonical exercises, alphabetically.
pub async fn list_exercises(pool: &PgPool) -> Result<Vec<Exercise>> {
    let exercises = sqlx::query_as::<_, Exercise>("SELECT * FROM exercises ORDER BY name ASC")
        .fetch_all(pool)
        .await
        .context("failed to list exercises")?;

    Ok(exercises)
}
