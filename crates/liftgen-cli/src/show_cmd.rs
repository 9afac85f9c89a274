//! `liftgen show` and `liftgen quota`: read-only views over stored data.

use anyhow::{Context, Result};
use chrono::Utc;
use uuid::Uuid;

use liftgen_core::quota;
use liftgen_core::store::WorkoutStore;
use liftgen_db::models::{Workout, WorkoutExerciseDetail};

/// Print a stored workout and its exercises.
pub async fn run_show(store: &dyn WorkoutStore, workout_id: Uuid) -> Result<()> {
    let workout = store
        .get_workout(workout_id)
        .await?
        .with_context(|| format!("workout {workout_id} not found"))?;
    let details = store.list_workout_exercises(workout_id).await?;

    print!("{}", render_workout(&workout, &details));
    Ok(())
}

pub async fn run_quota(store: &dyn WorkoutStore, user_id: Uuid) -> Result<()> {
    let status = quota::check_quota(store, user_id, Utc::now()).await?;

    println!("User: {user_id}");
    if status.exempt {
        println!("Used: {} (admin, not limited)", status.used);
    } else {
        println!("Used: {}/{}", status.used, status.limit);
        println!("Remaining: {}", status.remaining().unwrap_or(0));
    }
    println!("Window start: {}", status.window_start.to_rfc3339());
    Ok(())
}

fn render_workout(workout: &Workout, details: &[WorkoutExerciseDetail]) -> String {
    let mut out = String::new();
    let mut line = |s: String| {
        out.push_str(&s);
        out.push('\n');
    };

    line(format!("Workout: {}", workout.id));
    line(format!("Created: {}", workout.created_at.to_rfc3339()));
    line(format!(
        "Focus: {} / {}",
        workout.muscle_focus.join(", "),
        workout.workout_focus.join(", ")
    ));
    if let Some(text) = &workout.special_instructions {
        line(format!("Instructions: {text}"));
    }
    line(format!(
        "Model: {} (attempts: {})",
        workout.ai_model, workout.parse_attempts
    ));
    line(format!(
        "Summary: {} exercises, {} sets, ~{} min (model estimate {} min)",
        workout.total_exercises,
        workout.total_sets,
        workout.estimated_duration_minutes,
        workout.total_duration_minutes
    ));
    if !workout.equipment_needed_array.is_empty() {
        line(format!("Equipment: {}", workout.equipment_needed_array.join(", ")));
    }
    line(String::new());

    line(format!(
        "{:<4} {:<36} {:>5} {:>5} {:>6}  {:<12}",
        "#", "EXERCISE", "SETS", "REPS", "REST", "EQUIPMENT"
    ));
    line("-".repeat(74));
    for d in details {
        line(format!(
            "{:<4} {:<36} {:>5} {:>5} {:>5}s  {:<12}",
            d.order_index,
            d.name,
            d.sets,
            d.reps,
            d.rest_seconds,
            d.equipment.as_deref().unwrap_or("-")
        ));
        if let Some(rationale) = &d.rationale {
            line(format!("     {rationale}"));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;

    fn workout() -> Workout {
        Workout {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            workout_data: json!({ "exercises": [] }),
            total_duration_minutes: 20,
            muscle_groups_targeted: "Chest".to_string(),
            joint_groups_affected: String::new(),
            equipment_needed: "Barbell".to_string(),
            raw_ai_response: "{}".to_string(),
            ai_model: "gpt-4o-mini".to_string(),
            prompt_tokens: None,
            completion_tokens: None,
            generation_time_ms: None,
            parse_attempts: 2,
            muscle_focus: vec!["chest".to_string()],
            workout_focus: vec!["strength".to_string()],
            exercise_count: 1,
            special_instructions: Some("keep it short".to_string()),
            total_sets: 5,
            total_exercises: 1,
            estimated_duration_minutes: 18,
            primary_muscles_targeted: vec!["chest".to_string()],
            equipment_needed_array: vec!["barbell".to_string()],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn render_lists_exercises_in_order() {
        let details = vec![WorkoutExerciseDetail {
            order_index: 1,
            exercise_id: Uuid::new_v4(),
            name: "Barbell Bench Press".to_string(),
            sets: 5,
            reps: 5,
            rest_seconds: 180,
            weight_unit: "lbs".to_string(),
            rationale: Some("Heavy press.".to_string()),
            equipment: Some("barbell".to_string()),
            movement_type: None,
        }];

        let text = render_workout(&workout(), &details);
        assert!(text.contains("Focus: chest / strength"));
        assert!(text.contains("Instructions: keep it short"));
        assert!(text.contains("attempts: 2"));
        assert!(text.contains("Barbell Bench Press"));
        assert!(text.contains("180s"));
        assert!(text.contains("Heavy press."));
    }
}
