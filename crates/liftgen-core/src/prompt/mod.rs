//! Prompt construction for the generation model.

pub mod template;

use std::collections::HashMap;

use crate::catalog;
use crate::request::GenerationRequest;

pub use template::{Segment, Slot};

/// Which prompt to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    /// First attempt.
    Initial,
    /// A previous attempt failed; restate everything and add the repair block.
    Retry,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromptError {
    #[error("unknown workout focus: {0:?}")]
    UnknownFocus(String),

    #[error("template slot {0} has no value")]
    MissingSlot(&'static str),
}

/// How many exercises must hit the muscle focus: half the workout, rounded
/// up, at least one and never more than the workout has.
pub fn min_exercises_for_muscle(exercise_count: u32) -> u32 {
    exercise_count.div_ceil(2).max(1).min(exercise_count.max(1))
}

/// Render the prompt for `request`.
///
/// `request` is expected to be validated already.
pub fn build_prompt(request: &GenerationRequest, mode: PromptMode) -> Result<String, PromptError> {
    let cat = catalog::catalog();

    let mut blocks = Vec::with_capacity(request.workout_focus.len());
    for id in &request.workout_focus {
        let entry = cat
            .focus(id)
            .ok_or_else(|| PromptError::UnknownFocus(id.clone()))?;
        blocks.push(format!("{}:\n{}", id.to_uppercase(), entry.instructions));
    }

    let mut values = HashMap::new();
    values.insert(Slot::MuscleFocus, request.muscle_focus.join(", "));
    values.insert(Slot::WorkoutFocus, request.workout_focus.join(", "));
    values.insert(
        Slot::WorkoutFocusUpper,
        request.workout_focus.join(", ").to_uppercase(),
    );
    values.insert(Slot::ExerciseCount, request.exercise_count.to_string());
    values.insert(
        Slot::MinExercisesForMuscle,
        min_exercises_for_muscle(request.exercise_count).to_string(),
    );
    values.insert(Slot::FocusInstructions, blocks.join("\n\n"));
    if let Some(text) = request.special_instructions.as_deref() {
        if !text.trim().is_empty() {
            values.insert(Slot::SpecialInstructions, text.to_owned());
        }
    }

    let mut out = render(&template::standard(), &values)?;
    if mode == PromptMode::Retry {
        out.push_str(template::RETRY_BLOCK);
    }
    Ok(out)
}

/// Render `segments` against `values`.
pub fn render(segments: &[Segment], values: &HashMap<Slot, String>) -> Result<String, PromptError> {
    let mut out = String::new();
    render_into(&mut out, segments, values)?;
    Ok(out)
}

fn render_into(
    out: &mut String,
    segments: &[Segment],
    values: &HashMap<Slot, String>,
) -> Result<(), PromptError> {
    for segment in segments {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Slot(slot) => {
                let value = values.get(slot).ok_or(PromptError::MissingSlot(slot.name()))?;
                out.push_str(value);
            }
            Segment::WhenPresent(slot, inner) => {
                if values.contains_key(slot) {
                    render_into(out, inner, values)?;
                }
            }
        }
    }
    Ok(())
}
