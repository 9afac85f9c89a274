//! Inbound generation request and its bounds checks.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::catalog;

/// Minimum and maximum number of muscle-focus tags.
pub const MUSCLE_FOCUS_RANGE: (usize, usize) = (1, 4);
/// Minimum and maximum number of workout-focus tags.
pub const WORKOUT_FOCUS_RANGE: (usize, usize) = (1, 3);
/// Minimum and maximum number of exercises per workout.
pub const EXERCISE_COUNT_RANGE: (u32, u32) = (1, 10);
/// Maximum length of the free-text instructions, in characters.
pub const MAX_SPECIAL_INSTRUCTIONS: usize = 140;

/// A user's workout-generation request.
///
/// Construct it however is convenient, then call
/// [`GenerationRequest::validate`] before anything external is touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub muscle_focus: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub workout_focus: Vec<String>,
    pub exercise_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
}

/// Reasons a request is rejected before generation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("select between {min} and {max} muscle groups (got {actual})")]
    MuscleFocusCount { min: usize, max: usize, actual: usize },

    #[error("unknown muscle group: {0:?}")]
    UnknownMuscle(String),

    #[error("muscle group {0:?} selected more than once")]
    DuplicateMuscle(String),

    #[error("select between {min} and {max} workout focus types (got {actual})")]
    WorkoutFocusCount { min: usize, max: usize, actual: usize },

    #[error("unknown workout focus: {0:?}")]
    UnknownFocus(String),

    #[error("workout focus {0:?} selected more than once")]
    DuplicateFocus(String),

    #[error("exercise count must be between {min} and {max} (got {actual})")]
    ExerciseCount { min: u32, max: u32, actual: u32 },

    #[error("special instructions must be at most {max} characters (got {actual})")]
    InstructionsTooLong { max: usize, actual: usize },
}

impl GenerationRequest {
    /// Check every bound and return the normalized request.
    ///
    /// Muscle and focus tags are trimmed and lowercased. Blank special
    /// instructions become `None`.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let cat = catalog::catalog();

        let muscle_focus = normalize_tags(self.muscle_focus);
        check_count(
            muscle_focus.len(),
            MUSCLE_FOCUS_RANGE,
            |min, max, actual| ValidationError::MuscleFocusCount { min, max, actual },
        )?;
        let mut seen = HashSet::new();
        for tag in &muscle_focus {
            if cat.muscle_group(tag).is_none() {
                return Err(ValidationError::UnknownMuscle(tag.clone()));
            }
            if !seen.insert(tag.as_str()) {
                return Err(ValidationError::DuplicateMuscle(tag.clone()));
            }
        }

        let workout_focus = normalize_tags(self.workout_focus);
        check_count(
            workout_focus.len(),
            WORKOUT_FOCUS_RANGE,
            |min, max, actual| ValidationError::WorkoutFocusCount { min, max, actual },
        )?;
        let mut seen = HashSet::new();
        for tag in &workout_focus {
            if cat.focus(tag).is_none() {
                return Err(ValidationError::UnknownFocus(tag.clone()));
            }
            if !seen.insert(tag.as_str()) {
                return Err(ValidationError::DuplicateFocus(tag.clone()));
            }
        }

        let (min, max) = EXERCISE_COUNT_RANGE;
        if !(min..=max).contains(&self.exercise_count) {
            return Err(ValidationError::ExerciseCount {
                min,
                max,
                actual: self.exercise_count,
            });
        }

        let special_instructions = match self.special_instructions {
            Some(text) if text.trim().is_empty() => None,
            Some(text) => {
                let len = text.chars().count();
                if len > MAX_SPECIAL_INSTRUCTIONS {
                    return Err(ValidationError::InstructionsTooLong {
                        max: MAX_SPECIAL_INSTRUCTIONS,
                        actual: len,
                    });
                }
                Some(text)
            }
            None => None,
        };

        Ok(Self {
            muscle_focus,
            workout_focus,
            exercise_count: self.exercise_count,
            special_instructions,
        })
    }
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_lowercase())
        .collect()
}

fn check_count(
    actual: usize,
    (min, max): (usize, usize),
    err: impl FnOnce(usize, usize, usize) -> ValidationError,
) -> Result<(), ValidationError> {
    if (min..=max).contains(&actual) {
        Ok(())
    } else {
        Err(err(min, max, actual))
    }
}

/// Older clients send `"workout_focus": "strength"` instead of a list.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}
