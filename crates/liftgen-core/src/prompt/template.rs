//! Prompt template as data.
//!
//! A template is an ordered list of [`Segment`]s: literal text, required
//! substitutions, and optional sections that render only when their slot
//! has a value.

/// Named substitution points in the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    MuscleFocus,
    WorkoutFocus,
    WorkoutFocusUpper,
    ExerciseCount,
    MinExercisesForMuscle,
    FocusInstructions,
    SpecialInstructions,
}

impl Slot {
    pub fn name(self) -> &'static str {
        match self {
            Self::MuscleFocus => "muscle_focus",
            Self::WorkoutFocus => "workout_focus",
            Self::WorkoutFocusUpper => "workout_focus_upper",
            Self::ExerciseCount => "exercise_count",
            Self::MinExercisesForMuscle => "min_exercises_for_muscle",
            Self::FocusInstructions => "focus_instructions",
            Self::SpecialInstructions => "special_instructions",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(&'static str),
    Slot(Slot),
    /// Rendered only when the slot has a value; inner slots are then
    /// required as usual.
    WhenPresent(Slot, Vec<Segment>),
}

use Segment::{Slot as S, Text as T, WhenPresent};

/// The full generation template used for every attempt.
pub fn standard() -> Vec<Segment> {
    vec![
        T("You are a professional fitness coach and exercise scientist.\n\
           Generate a workout for a user based on the following inputs.\n\n\
           USER REQUIREMENTS:\n- MUSCLE_FOCUS: "),
        S(Slot::MuscleFocus),
        T("\n- WORKOUT_FOCUS: "),
        S(Slot::WorkoutFocus),
        T("\n- EXERCISE_COUNT: "),
        S(Slot::ExerciseCount),
        T("\n"),
        WhenPresent(
            Slot::SpecialInstructions,
            vec![
                T("- SPECIAL_INSTRUCTIONS: "),
                S(Slot::SpecialInstructions),
                T("\n"),
            ],
        ),
        T("\nSPECIFIC INSTRUCTIONS FOR "),
        S(Slot::WorkoutFocusUpper),
        T(" TRAINING:\n"),
        S(Slot::FocusInstructions),
        T("\n\n------------------------------\nMANDATORY RULES:\n\
           - You MUST include EXACTLY "),
        S(Slot::ExerciseCount),
        T(" exercises, no more and no less\n- At least "),
        S(Slot::MinExercisesForMuscle),
        T(" exercises must directly target the muscles in MUSCLE_FOCUS\n\
           - All exercises must align with the "),
        S(Slot::WorkoutFocus),
        T(" training style\n"),
        WhenPresent(
            Slot::SpecialInstructions,
            vec![
                T("- PRIORITIZE AND INCLUDE THIS USER INSTRUCTION: "),
                S(Slot::SpecialInstructions),
                T("\n"),
            ],
        ),
        T("- If WORKOUT_FOCUS is plyometric, include plyometric exercises\n\
           - Running and jumping exercises outside the gym are allowed where they fit\n\
           - Order exercises according to current training science for "),
        S(Slot::WorkoutFocus),
        T("\n- With a single muscle focus, cover the muscle from different angles\n\
           - Do not repeat near-identical exercises (e.g. bench press and dumbbell bench press)\n\n"),
        T(RESPONSE_FORMAT),
    ]
}

/// Output contract and worked example appended to every prompt.
const RESPONSE_FORMAT: &str = r#"EXERCISE FORMAT:
- Name every exercise "Equipment Exercise Name" (e.g. "Barbell Bench Press", "Dumbbell Lateral Raise")
- Equipment terms: Barbell, Dumbbell, Cable, Machine, Kettlebell, Resistance Band, EZ Bar, Bodyweight, Trap bar, Bar, Box
- Give reps as a single number and rest time in seconds
- List primary and secondary muscles and the movement type (compound or isolation)
- Rationale: how to perform it, its benefit, and its risk

RESPOND IN JSON:
{
  "workout": {
    "exercises": [
      {
        "name": "Barbell Bench Press",
        "sets": 3,
        "reps": 10,
        "rest_time_seconds": 90,
        "primary_muscles": ["chest", "triceps"],
        "secondary_muscles": ["shoulders"],
        "equipment": "barbell",
        "movement_type": "compound",
        "order_index": 1,
        "rationale": "Heavy horizontal press for chest hypertrophy."
      }
    ],
    "total_duration_minutes": 30,
    "muscle_groups_targeted": "Chest, triceps",
    "joint_groups_affected": "Shoulders, elbows",
    "equipment_needed": "Barbell, bench"
  }
}

Respond with ONLY this JSON object and nothing else."#;

/// Appended after the full template on every attempt after the first.
pub const RETRY_BLOCK: &str = "\n\nIMPORTANT: Your previous response failed to parse or did not \
follow the required format. Make sure that:\n\
1. The response is VALID JSON with the EXACT structure shown above\n\
2. The exercise list has exactly the requested number of entries\n\
3. Equipment names use the standardized terms listed above\n\
4. There is no explanation or text outside the JSON object";
