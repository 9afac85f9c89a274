//! Decoding untrusted model output into a [`ParsedWorkout`].
//!
//! The model is asked for `{"workout": {...}}` but frequently returns the
//! inner object bare, wraps it in a markdown fence, or prefixes it with a
//! sentence. All of those are accepted. Anything that does not decode to the
//! documented shape, or that carries the wrong number of exercises, is a
//! [`ParseError`] and triggers a retry in [`repair`].

pub mod repair;

use serde::{Deserialize, Deserializer, Serialize};

use liftgen_db::models::MovementType;

use crate::matcher::search_key;

/// Plausible bounds for a single exercise prescription.
pub const SETS_RANGE: (u32, u32) = (1, 20);
pub const REPS_RANGE: (u32, u32) = (1, 300);
pub const REST_SECONDS_RANGE: (u32, u32) = (0, 3600);

/// One exercise as emitted by the model (and, after canonicalization, as
/// stored in `workout_data`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutExercise {
    pub name: String,
    #[serde(deserialize_with = "whole_number")]
    pub sets: u32,
    #[serde(deserialize_with = "whole_number")]
    pub reps: u32,
    #[serde(deserialize_with = "whole_number")]
    pub rest_time_seconds: u32,
    #[serde(default)]
    pub rationale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_muscles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_muscles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<String>,
    #[serde(default, deserialize_with = "lenient_movement_type", skip_serializing_if = "Option::is_none")]
    pub movement_type: Option<MovementType>,
    #[serde(default, deserialize_with = "optional_whole_number", skip_serializing_if = "Option::is_none")]
    pub order_index: Option<u32>,
}

/// A structurally valid workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedWorkout {
    pub exercises: Vec<WorkoutExercise>,
    /// The model's own duration estimate.
    #[serde(default, deserialize_with = "optional_whole_number")]
    pub total_duration_minutes: Option<u32>,
    #[serde(default)]
    pub muscle_groups_targeted: String,
    #[serde(default)]
    pub joint_groups_affected: String,
    #[serde(default)]
    pub equipment_needed: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("model response was empty")]
    Empty,

    #[error("model response is not a valid workout: {0}")]
    Json(String),

    #[error("expected {expected} exercises, model returned {actual}")]
    WrongExerciseCount { expected: usize, actual: usize },

    #[error("exercise {position} has no usable name")]
    BlankName { position: usize },

    #[error("exercise {position} has {field} = {value}, expected {min}..={max}")]
    OutOfRange {
        position: usize,
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
}

/// Decode `raw` and check it has exactly `expected_count` exercises.
pub fn parse_workout(raw: &str, expected_count: usize) -> Result<ParsedWorkout, ParseError> {
    let body = extract_json(raw).ok_or(ParseError::Empty)?;

    let mut value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ParseError::Json(e.to_string()))?;

    if let Some(inner) = value.get_mut("workout") {
        if inner.is_object() {
            value = inner.take();
        }
    }

    let workout: ParsedWorkout =
        serde_json::from_value(value).map_err(|e| ParseError::Json(e.to_string()))?;

    if workout.exercises.len() != expected_count {
        return Err(ParseError::WrongExerciseCount {
            expected: expected_count,
            actual: workout.exercises.len(),
        });
    }

    for (i, exercise) in workout.exercises.iter().enumerate() {
        check_exercise(i + 1, exercise)?;
    }

    Ok(workout)
}

/// The name must survive normalization and the numbers must be plausible.
fn check_exercise(position: usize, exercise: &WorkoutExercise) -> Result<(), ParseError> {
    if search_key(&exercise.name).is_empty() {
        return Err(ParseError::BlankName { position });
    }

    let fields = [
        ("sets", exercise.sets, SETS_RANGE),
        ("reps", exercise.reps, REPS_RANGE),
        ("rest_time_seconds", exercise.rest_time_seconds, REST_SECONDS_RANGE),
    ];
    for (field, value, (min, max)) in fields {
        if !(min..=max).contains(&value) {
            return Err(ParseError::OutOfRange {
                position,
                field,
                value,
                min,
                max,
            });
        }
    }
    Ok(())
}

/// Strip fences and surrounding prose, leaving the outermost `{...}`.
fn extract_json(raw: &str) -> Option<&str> {
    let trimmed = strip_code_fences(raw);
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('{') {
        return Some(trimmed);
    }
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => Some(&trimmed[start..=end]),
        _ => Some(trimmed),
    }
}

fn strip_code_fences(s: &str) -> &str {
    let mut trimmed = s.trim();
    if let Some(stripped) = trimmed.strip_prefix("```json") {
        trimmed = stripped;
    } else if let Some(stripped) = trimmed.strip_prefix("```") {
        trimmed = stripped;
    }
    if let Some(stripped) = trimmed.strip_suffix("```") {
        trimmed = stripped;
    }
    trimmed.trim()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrFloat {
    Int(u64),
    Float(f64),
}

fn to_whole<E: serde::de::Error>(n: IntOrFloat) -> Result<u32, E> {
    match n {
        IntOrFloat::Int(i) => {
            u32::try_from(i).map_err(|_| E::custom(format!("number out of range: {i}")))
        }
        IntOrFloat::Float(f) => {
            if f.is_finite() && f >= 0.0 && f <= f64::from(u32::MAX) {
                Ok(f.round() as u32)
            } else {
                Err(E::custom(format!("invalid count: {f}")))
            }
        }
    }
}

/// Non-negative integer, also accepting floats like `10.0`.
fn whole_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    to_whole(IntOrFloat::deserialize(deserializer)?)
}

fn optional_whole_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<IntOrFloat>::deserialize(deserializer)?
        .map(to_whole)
        .transpose()
}

/// Unknown movement types are dropped so the matcher can infer one.
fn lenient_movement_type<'de, D>(deserializer: D) -> Result<Option<MovementType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO: &str = r#"{
      "workout": {
        "exercises": [
          {"name": "Barbell Bench Press", "sets": 3, "reps": 10, "rest_time_seconds": 90,
           "rationale": "Heavy press.", "primary_muscles": ["chest", "triceps"],
           "equipment": "barbell", "movement_type": "compound", "order_index": 1},
          {"name": "Cable Triceps Pushdown", "sets": 3.0, "reps": 12, "rest_time_seconds": 60,
           "rationale": "Finisher."}
        ],
        "total_duration_minutes": 25,
        "muscle_groups_targeted": "Chest, triceps",
        "joint_groups_affected": "Shoulders, elbows",
        "equipment_needed": "Barbell, cable"
      }
    }"#;

    #[test]
    fn parses_wrapped_workout() {
        let w = parse_workout(TWO, 2).unwrap();
        assert_eq!(w.exercises.len(), 2);
        assert_eq!(w.exercises[0].movement_type, Some(MovementType::Compound));
        assert_eq!(w.exercises[0].order_index, Some(1));
        assert_eq!(w.exercises[1].sets, 3);
        assert_eq!(w.exercises[1].primary_muscles, None);
        assert_eq!(w.total_duration_minutes, Some(25));
        assert_eq!(w.joint_groups_affected, "Shoulders, elbows");
    }

    #[test]
    fn parses_bare_object_in_fence_with_prose() {
        let raw = "Here is your workout:\n```json\n{\"exercises\": [{\"name\": \"Plank\", \
                   \"sets\": 3, \"reps\": 1, \"rest_time_seconds\": 45}]}\n```";
        let w = parse_workout(raw, 1).unwrap();
        assert_eq!(w.exercises[0].name, "Plank");
        assert_eq!(w.exercises[0].rationale, "");
        assert_eq!(w.total_duration_minutes, None);
        assert_eq!(w.muscle_groups_targeted, "");
    }

    #[test]
    fn wrong_count_is_an_error() {
        assert_eq!(
            parse_workout(TWO, 3),
            Err(ParseError::WrongExerciseCount { expected: 3, actual: 2 })
        );
    }

    #[test]
    fn empty_and_garbage_are_errors() {
        assert_eq!(parse_workout("   ", 1), Err(ParseError::Empty));
        assert_eq!(parse_workout("```\n```", 1), Err(ParseError::Empty));
        assert!(matches!(parse_workout("I cannot help with that.", 1), Err(ParseError::Json(_))));
        assert!(matches!(parse_workout("{\"workout\": {}}", 1), Err(ParseError::Json(_))));
    }

    #[test]
    fn rejects_negative_and_fractional_nonsense() {
        let neg = r#"{"exercises": [{"name": "Squat", "sets": -3, "reps": 5, "rest_time_seconds": 120}]}"#;
        assert!(matches!(parse_workout(neg, 1), Err(ParseError::Json(_))));

        let rounded = r#"{"exercises": [{"name": "Squat", "sets": 2.6, "reps": 5, "rest_time_seconds": 120}]}"#;
        assert_eq!(parse_workout(rounded, 1).unwrap().exercises[0].sets, 3);

        let missing = r#"{"exercises": [{"name": "Squat", "sets": 3, "rest_time_seconds": 120}]}"#;
        assert!(matches!(parse_workout(missing, 1), Err(ParseError::Json(_))));
    }

    #[test]
    fn unknown_movement_type_is_dropped() {
        let raw = r#"{"exercises": [{"name": "Box Jump", "sets": 3, "reps": 5,
                      "rest_time_seconds": 120, "movement_type": "plyometric"}]}"#;
        assert_eq!(parse_workout(raw, 1).unwrap().exercises[0].movement_type, None);
    }

    #[test]
    fn blank_name_is_an_error() {
        let raw = r#"{"exercises": [{"name": "  ", "sets": 3, "reps": 5, "rest_time_seconds": 60}]}"#;
        assert_eq!(parse_workout(raw, 1), Err(ParseError::BlankName { position: 1 }));
    }

    #[test]
    fn punctuation_only_name_is_an_error() {
        let raw = r#"{"exercises": [{"name": "Plank", "sets": 3, "reps": 1, "rest_time_seconds": 60},
                                    {"name": "---", "sets": 3, "reps": 5, "rest_time_seconds": 60}]}"#;
        assert_eq!(parse_workout(raw, 2), Err(ParseError::BlankName { position: 2 }));
    }

    #[test]
    fn implausible_numbers_are_errors() {
        let huge_sets = r#"{"exercises": [{"name": "Squat", "sets": 4294967295, "reps": 5,
                            "rest_time_seconds": 120}]}"#;
        assert_eq!(
            parse_workout(huge_sets, 1),
            Err(ParseError::OutOfRange { position: 1, field: "sets", value: u32::MAX, min: 1, max: 20 })
        );

        let zero_reps = r#"{"exercises": [{"name": "Squat", "sets": 3, "reps": 0, "rest_time_seconds": 120}]}"#;
        assert!(matches!(
            parse_workout(zero_reps, 1),
            Err(ParseError::OutOfRange { field: "reps", .. })
        ));

        let long_rest = r#"{"exercises": [{"name": "Squat", "sets": 3, "reps": 5, "rest_time_seconds": 3601}]}"#;
        assert!(matches!(
            parse_workout(long_rest, 1),
            Err(ParseError::OutOfRange { field: "rest_time_seconds", value: 3601, .. })
        ));

        let edges = r#"{"exercises": [{"name": "Squat", "sets": 20, "reps": 300, "rest_time_seconds": 0}]}"#;
        assert!(parse_workout(edges, 1).is_ok());
    }
}
