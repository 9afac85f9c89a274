//! End-to-end workout generation.
//!
//! ```text
//! validate -> quota -> prompt -> model (repair loop) -> canonicalize
//!          -> summarize -> persist (one transaction) -> workout id
//! ```
//!
//! Every stage runs before the single write, so a failure anywhere leaves
//! no workout behind.

pub mod response;

use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use liftgen_db::models::Workout;
use liftgen_db::queries::workouts::{NewWorkout, NewWorkoutExercise};

use crate::generation::{GenerationClient, GenerationError};
use crate::matcher::{self, MatchError};
use crate::parse::WorkoutExercise;
use crate::parse::repair::{self, RepairError};
use crate::quota;
use crate::request::{GenerationRequest, ValidationError};
use crate::store::WorkoutStore;
use crate::summary::{self, SummaryInput};

pub use response::GenerationResponse;

/// Weight unit recorded on every link row.
pub const DEFAULT_WEIGHT_UNIT: &str = "lbs";

/// Per-request handle: who is asking and where to read and write.
#[derive(Clone)]
pub struct RequestContext {
    pub user_id: Uuid,
    pub store: Arc<dyn WorkoutStore>,
}

impl RequestContext {
    pub fn new(user_id: Uuid, store: Arc<dyn WorkoutStore>) -> Self {
        Self { user_id, store }
    }
}

/// Tunables for [`generate_workout`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Repair-loop ceiling, clamped to 1..=5.
    pub max_attempts: u32,
    pub weight_unit: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_attempts: repair::DEFAULT_MAX_ATTEMPTS,
            weight_unit: DEFAULT_WEIGHT_UNIT.to_owned(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("daily generation limit reached ({used}/{limit})")]
    QuotaExceeded { used: i64, limit: i64 },

    #[error("model provider is rate limiting requests")]
    ProviderRateLimited(#[source] GenerationError),

    #[error("workout generation failed")]
    Generation(#[source] RepairError),

    #[error("could not check generation quota: {0:#}")]
    QuotaCheck(anyhow::Error),

    #[error("could not resolve exercise {exercise:?}")]
    Canonicalization {
        exercise: String,
        #[source]
        source: MatchError,
    },

    #[error("could not save workout: {0:#}")]
    Persistence(anyhow::Error),
}

impl PipelineError {
    /// Machine-readable category for callers.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::QuotaExceeded { .. } | Self::ProviderRateLimited(_) => "rate_limit",
            Self::Generation(_) => "generation",
            Self::QuotaCheck(_) | Self::Canonicalization { .. } | Self::Persistence(_) => {
                "persistence"
            }
        }
    }

    /// Message safe to show an end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::QuotaExceeded { limit, .. } => format!(
                "You have reached the limit of {limit} workout generations per 24 hours. \
                 Please try again later."
            ),
            Self::ProviderRateLimited(_) => {
                "The workout generator is busy right now. Please try again in a few minutes."
                    .to_owned()
            }
            Self::Generation(_) => "Failed to generate a valid workout. Please try again.".to_owned(),
            Self::QuotaCheck(_) | Self::Canonicalization { .. } | Self::Persistence(_) => {
                "Failed to save the workout. Please try again.".to_owned()
            }
        }
    }
}

/// Denormalized copy of the final workout kept in `workouts.workout_data`.
#[derive(Debug, Serialize)]
struct WorkoutData<'a> {
    exercises: Vec<&'a WorkoutExercise>,
    total_duration_minutes: u32,
    muscle_groups_targeted: &'a str,
    joint_groups_affected: &'a str,
    equipment_needed: &'a str,
}

/// Run the whole pipeline for one request and return the stored workout.
///
/// `now` anchors the quota window.
pub async fn generate_workout(
    ctx: &RequestContext,
    client: &dyn GenerationClient,
    config: &PipelineConfig,
    request: GenerationRequest,
    now: DateTime<Utc>,
) -> Result<Workout, PipelineError> {
    let user_id = ctx.user_id;
    let store = ctx.store.as_ref();

    let request = request.validate().inspect_err(|e| {
        info!(user_id = %user_id, error = %e, "generation request rejected");
    })?;

    let status = quota::check_quota(store, user_id, now)
        .await
        .map_err(PipelineError::QuotaCheck)?;
    if status.is_exhausted() {
        warn!(user_id = %user_id, used = status.used, "daily generation limit reached");
        return Err(PipelineError::QuotaExceeded {
            used: status.used,
            limit: status.limit,
        });
    }

    info!(
        user_id = %user_id,
        client = client.name(),
        model = client.model(),
        exercise_count = request.exercise_count,
        muscle_focus = ?request.muscle_focus,
        workout_focus = ?request.workout_focus,
        "generating workout"
    );

    let outcome = repair::generate_with_repair(client, &request, config.max_attempts)
        .await
        .map_err(|e| match e {
            RepairError::RateLimited(inner) => PipelineError::ProviderRateLimited(inner),
            other => PipelineError::Generation(other),
        })?;

    let resolved = matcher::canonicalize_workout(store, &outcome.workout)
        .await
        .map_err(|(exercise, source)| PipelineError::Canonicalization { exercise, source })?;

    let inputs: Vec<SummaryInput<'_>> = resolved
        .iter()
        .map(|r| SummaryInput {
            primary_muscles: r.entry.primary_muscles.as_deref().unwrap_or_default(),
            equipment: r.entry.equipment.as_deref(),
            sets: r.entry.sets,
            rest_seconds: r.entry.rest_time_seconds,
        })
        .collect();
    let summary = summary::calculate_summary(&inputs);

    let parsed = &outcome.workout;
    let muscles_joined = summary.primary_muscles_targeted.join(", ");
    let equipment_joined = summary.equipment_needed.join(", ");
    let total_duration = parsed
        .total_duration_minutes
        .unwrap_or(summary.estimated_duration_minutes);

    let data = WorkoutData {
        exercises: resolved.iter().map(|r| &r.entry).collect(),
        total_duration_minutes: total_duration,
        muscle_groups_targeted: non_blank_or(&parsed.muscle_groups_targeted, &muscles_joined),
        joint_groups_affected: &parsed.joint_groups_affected,
        equipment_needed: non_blank_or(&parsed.equipment_needed, &equipment_joined),
    };
    let workout_data = serde_json::to_value(&data)
        .context("failed to serialize workout data")
        .map_err(PipelineError::Persistence)?;

    let new = NewWorkout {
        user_id,
        workout_data: &workout_data,
        total_duration_minutes: to_i32(total_duration),
        muscle_groups_targeted: data.muscle_groups_targeted,
        joint_groups_affected: data.joint_groups_affected,
        equipment_needed: data.equipment_needed,
        raw_ai_response: &outcome.raw_text,
        ai_model: &outcome.model,
        prompt_tokens: outcome.telemetry.prompt_tokens.map(to_i32),
        completion_tokens: outcome.telemetry.completion_tokens.map(to_i32),
        generation_time_ms: Some(i64::try_from(outcome.telemetry.elapsed_ms).unwrap_or(i64::MAX)),
        parse_attempts: to_i32(outcome.attempts),
        muscle_focus: &request.muscle_focus,
        workout_focus: &request.workout_focus,
        exercise_count: to_i32(request.exercise_count),
        special_instructions: request.special_instructions.as_deref(),
        total_sets: to_i32(summary.total_sets),
        total_exercises: to_i32(summary.total_exercises),
        estimated_duration_minutes: to_i32(summary.estimated_duration_minutes),
        primary_muscles_targeted: &summary.primary_muscles_targeted,
        equipment_needed_array: &summary.equipment_needed,
    };

    let links: Vec<NewWorkoutExercise<'_>> = resolved
        .iter()
        .enumerate()
        .map(|(i, r)| NewWorkoutExercise {
            exercise_id: r.exercise_id,
            order_index: to_i32(u32::try_from(i + 1).unwrap_or(u32::MAX)),
            sets: to_i32(r.entry.sets),
            reps: to_i32(r.entry.reps),
            rest_seconds: to_i32(r.entry.rest_time_seconds),
            weight_unit: &config.weight_unit,
            weight_recommendation_type: None,
            weight_recommendation_value: None,
            rationale: Some(r.entry.rationale.as_str()).filter(|s| !s.is_empty()),
        })
        .collect();

    let workout = store
        .insert_workout(&new, &links)
        .await
        .map_err(PipelineError::Persistence)?;

    info!(
        user_id = %user_id,
        workout_id = %workout.id,
        parse_attempts = outcome.attempts,
        new_exercises = resolved.iter().filter(|r| r.created).count(),
        estimated_minutes = summary.estimated_duration_minutes,
        "workout generated"
    );

    Ok(workout)
}

fn non_blank_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() { fallback } else { value }
}

fn to_i32(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}
