use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Whether an exercise works several joints or a single one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Compound,
    Isolation,
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Compound => "compound",
            Self::Isolation => "isolation",
        };
        f.write_str(s)
    }
}

impl FromStr for MovementType {
    type Err = MovementTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compound" => Ok(Self::Compound),
            "isolation" => Ok(Self::Isolation),
            _ => Err(MovementTypeParseError(s.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`MovementType`] string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid movement type: {0:?}")]
pub struct MovementTypeParseError(pub String);

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A user profile row. Only `is_admin` matters to the generation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub email: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// A canonical exercise: the shared record every equivalent name variant
/// resolves to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Exercise {
    pub id: Uuid,
    pub name: String,
    pub search_key: String,
    pub primary_muscles: Vec<String>,
    pub secondary_muscles: Vec<String>,
    pub equipment: Option<String>,
    pub movement_type: Option<MovementType>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted, generated workout.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Workout {
    pub id: Uuid,
    pub user_id: Uuid,
    pub workout_data: serde_json::Value,
    pub total_duration_minutes: i32,
    pub muscle_groups_targeted: String,
    pub joint_groups_affected: String,
    pub equipment_needed: String,
    pub raw_ai_response: String,
    pub ai_model: String,
    pub prompt_tokens: Option<i32>,
    pub completion_tokens: Option<i32>,
    pub generation_time_ms: Option<i64>,
    pub parse_attempts: i32,
    pub muscle_focus: Vec<String>,
    pub workout_focus: Vec<String>,
    pub exercise_count: i32,
    pub special_instructions: Option<String>,
    pub total_sets: i32,
    pub total_exercises: i32,
    pub estimated_duration_minutes: i32,
    pub primary_muscles_targeted: Vec<String>,
    pub equipment_needed_array: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Link between a workout and a canonical exercise, carrying the
/// per-workout prescription.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkoutExercise {
    pub id: Uuid,
    pub workout_id: Uuid,
    pub exercise_id: Uuid,
    pub order_index: i32,
    pub sets: i32,
    pub reps: i32,
    pub rest_seconds: i32,
    pub weight_unit: String,
    /// How to pick a load, e.g. `percent_1rm` or `rpe`. Unset by generation.
    pub weight_recommendation_type: Option<String>,
    pub weight_recommendation_value: Option<f64>,
    pub rationale: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A link row joined with its exercise name, for display.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkoutExerciseDetail {
    pub order_index: i32,
    pub exercise_id: Uuid,
    pub name: String,
    pub sets: i32,
    pub reps: i32,
    pub rest_seconds: i32,
    pub weight_unit: String,
    pub rationale: Option<String>,
    pub equipment: Option<String>,
    pub movement_type: Option<MovementType>,
}
