//! Exercise canonicalization.
//!
//! Every exercise the model names resolves to one shared row in the
//! `exercises` table, keyed by its [`search_key`]. The first request to
//! mention an exercise creates the row; later requests reuse it as-is.

pub mod infer;

use tracing::{debug, info};
use uuid::Uuid;

use liftgen_db::models::{Exercise, MovementType};
use liftgen_db::queries::exercises::NewExercise;

use crate::parse::{ParsedWorkout, WorkoutExercise};
use crate::store::WorkoutStore;

pub use infer::{infer_equipment, infer_movement_type, search_key};

/// An exercise as submitted for matching.
#[derive(Debug, Clone, Copy)]
pub struct ExerciseSubmission<'a> {
    pub name: &'a str,
    pub primary_muscles: &'a [String],
    pub secondary_muscles: &'a [String],
    pub equipment: Option<&'a str>,
    pub movement_type: Option<MovementType>,
}

impl<'a> ExerciseSubmission<'a> {
    pub fn from_workout_exercise(exercise: &'a WorkoutExercise) -> Self {
        Self {
            name: &exercise.name,
            primary_muscles: exercise.primary_muscles.as_deref().unwrap_or_default(),
            secondary_muscles: exercise.secondary_muscles.as_deref().unwrap_or_default(),
            equipment: exercise.equipment.as_deref(),
            movement_type: exercise.movement_type,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("exercise name {0:?} has no letters or digits")]
    EmptyKey(String),

    #[error("exercise {key:?} was neither inserted nor found")]
    Vanished { key: String },

    #[error("exercise store failed: {0:#}")]
    Store(anyhow::Error),
}

/// One in-workout exercise after matching.
#[derive(Debug, Clone)]
pub struct ResolvedExercise {
    pub exercise_id: Uuid,
    /// Whether this request created the canonical row.
    pub created: bool,
    /// The in-workout entry rewritten with canonical data.
    pub entry: WorkoutExercise,
}

/// Find the canonical exercise for `submission`, creating it if needed.
///
/// Returns the row and whether this call created it. An existing row wins
/// over whatever was submitted. A new row takes the submitted equipment and
/// movement type when present and infers them from the name otherwise.
///
/// If another request inserts the same key between our lookup and insert,
/// the winner's row is returned with `created = false`.
pub async fn find_or_create(
    store: &dyn WorkoutStore,
    submission: ExerciseSubmission<'_>,
) -> Result<(Exercise, bool), MatchError> {
    let key = search_key(submission.name);
    if key.is_empty() {
        return Err(MatchError::EmptyKey(submission.name.to_owned()));
    }

    if let Some(existing) = store
        .find_exercise_by_search_key(&key)
        .await
        .map_err(MatchError::Store)?
    {
        debug!(search_key = %key, exercise_id = %existing.id, "matched existing exercise");
        return Ok((existing, false));
    }

    let primary = infer::normalize_muscles(submission.primary_muscles);
    let secondary = infer::normalize_muscles(submission.secondary_muscles);
    let equipment = submission
        .equipment
        .and_then(infer::normalize_equipment)
        .or_else(|| infer_equipment(submission.name).map(str::to_owned));
    let movement_type = submission
        .movement_type
        .unwrap_or_else(|| infer_movement_type(submission.name, &primary));

    let new = NewExercise {
        name: submission.name.trim(),
        search_key: &key,
        primary_muscles: &primary,
        secondary_muscles: &secondary,
        equipment: equipment.as_deref(),
        movement_type: Some(movement_type),
    };

    match store.insert_exercise(&new).await.map_err(MatchError::Store)? {
        Some(created) => {
            info!(
                search_key = %key,
                exercise_id = %created.id,
                equipment = ?created.equipment,
                movement_type = %movement_type,
                "created canonical exercise"
            );
            Ok((created, true))
        }
        None => {
            debug!(search_key = %key, "lost exercise insert race, re-reading");
            let winner = store
                .find_exercise_by_search_key(&key)
                .await
                .map_err(MatchError::Store)?
                .ok_or(MatchError::Vanished { key })?;
            Ok((winner, false))
        }
    }
}

/// Resolve every exercise in `workout`, in order, one at a time.
///
/// The returned entries carry the canonical name, muscles, equipment and
/// movement type, with `order_index` renumbered `1..=n`. Stops at the first
/// failure; `Err` carries the offending exercise name.
pub async fn canonicalize_workout(
    store: &dyn WorkoutStore,
    workout: &ParsedWorkout,
) -> Result<Vec<ResolvedExercise>, (String, MatchError)> {
    let mut resolved = Vec::with_capacity(workout.exercises.len());

    for (position, exercise) in workout.exercises.iter().enumerate() {
        let submission = ExerciseSubmission::from_workout_exercise(exercise);
        let (canonical, created) = find_or_create(store, submission)
            .await
            .map_err(|e| (exercise.name.clone(), e))?;

        let entry = WorkoutExercise {
            name: canonical.name.clone(),
            sets: exercise.sets,
            reps: exercise.reps,
            rest_time_seconds: exercise.rest_time_seconds,
            rationale: exercise.rationale.clone(),
            primary_muscles: Some(canonical.primary_muscles.clone()),
            secondary_muscles: Some(canonical.secondary_muscles.clone()),
            equipment: canonical.equipment.clone(),
            movement_type: canonical.movement_type,
            order_index: Some(u32::try_from(position + 1).unwrap_or(u32::MAX)),
        };

        resolved.push(ResolvedExercise {
            exercise_id: canonical.id,
            created,
            entry,
        });
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn submission<'a>(name: &'a str, muscles: &'a [String]) -> ExerciseSubmission<'a> {
        ExerciseSubmission {
            name,
            primary_muscles: muscles,
            secondary_muscles: &[],
            equipment: None,
            movement_type: None,
        }
    }

    #[tokio::test]
    async fn same_key_resolves_to_same_row() {
        let store = MemoryStore::new();
        let chest = vec!["Chest".to_owned(), "triceps".to_owned()];

        let (first, created) = find_or_create(&store, submission("Barbell Bench Press", &chest))
            .await
            .unwrap();
        assert!(created);
        assert_eq!(first.search_key, "barbell bench press");
        assert_eq!(first.equipment.as_deref(), Some("barbell"));
        assert_eq!(first.movement_type, Some(MovementType::Compound));
        assert_eq!(first.primary_muscles, vec!["chest", "triceps"]);

        let (second, created) = find_or_create(&store, submission("barbell   bench press", &[]))
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(second.name, "Barbell Bench Press");
        assert_eq!(store.exercises().await.len(), 1);
    }

    #[tokio::test]
    async fn supplied_fields_beat_inference() {
        let store = MemoryStore::new();
        let sub = ExerciseSubmission {
            equipment: Some("Dumbbells"),
            movement_type: Some(MovementType::Isolation),
            ..submission("Bench Press", &[])
        };
        let (ex, _) = find_or_create(&store, sub).await.unwrap();
        assert_eq!(ex.equipment.as_deref(), Some("dumbbell"));
        assert_eq!(ex.movement_type, Some(MovementType::Isolation));
    }

    #[tokio::test]
    async fn existing_row_wins_over_submission() {
        let store = MemoryStore::new();
        find_or_create(&store, submission("Goblet Squat", &[])).await.unwrap();

        let sub = ExerciseSubmission {
            equipment: Some("kettlebell"),
            movement_type: Some(MovementType::Isolation),
            ..submission("goblet squat", &[])
        };
        let (ex, created) = find_or_create(&store, sub).await.unwrap();
        assert!(!created);
        assert_eq!(ex.equipment, None);
        assert_eq!(ex.movement_type, Some(MovementType::Compound));
    }

    #[tokio::test]
    async fn punctuation_only_name_is_rejected() {
        let store = MemoryStore::new();
        let err = find_or_create(&store, submission("???", &[])).await.unwrap_err();
        assert!(matches!(err, MatchError::EmptyKey(_)));
    }

    #[tokio::test]
    async fn canonicalize_rewrites_entries_and_renumbers() {
        let store = MemoryStore::new();
        let workout: ParsedWorkout = serde_json::from_str(
            r#"{"exercises": [
                {"name": "Cable  Fly", "sets": 3, "reps": 12, "rest_time_seconds": 60,
                 "rationale": "Stretch.", "order_index": 7, "primary_muscles": ["chest"]},
                {"name": "Push-Up", "sets": 2, "reps": 15, "rest_time_seconds": 45}
            ]}"#,
        )
        .unwrap();

        let resolved = canonicalize_workout(&store, &workout).await.unwrap();
        assert_eq!(resolved.len(), 2);
        assert!(resolved.iter().all(|r| r.created));

        let fly = &resolved[0].entry;
        assert_eq!(fly.name, "Cable  Fly");
        assert_eq!(fly.order_index, Some(1));
        assert_eq!(fly.equipment.as_deref(), Some("cable"));
        assert_eq!(fly.movement_type, Some(MovementType::Isolation));
        assert_eq!(fly.rationale, "Stretch.");

        let pushup = &resolved[1].entry;
        assert_eq!(pushup.order_index, Some(2));
        assert_eq!(pushup.equipment.as_deref(), Some("bodyweight"));
        assert_eq!(pushup.movement_type, Some(MovementType::Compound));
        assert_eq!(pushup.primary_muscles, Some(vec![]));

        let again = canonicalize_workout(&store, &workout).await.unwrap();
        assert!(again.iter().all(|r| !r.created));
        assert_eq!(again[0].exercise_id, resolved[0].exercise_id);
    }
}
