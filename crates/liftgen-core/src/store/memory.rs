//! In-process [`WorkoutStore`].

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use liftgen_db::models::{Exercise, Workout, WorkoutExercise, WorkoutExerciseDetail};
use liftgen_db::queries::exercises::NewExercise;
use liftgen_db::queries::workouts::{NewWorkout, NewWorkoutExercise};

use super::WorkoutStore;

#[derive(Default)]
struct Tables {
    admins: HashSet<Uuid>,
    exercises: HashMap<String, Exercise>,
    workouts: Vec<Workout>,
    links: Vec<WorkoutExercise>,
}

/// Store operations that can be made to fail.
#[derive(Debug, Clone, Copy, Default)]
struct Failures {
    workout_writes: bool,
    exercise_lookups: bool,
    quota_reads: bool,
}

/// Keeps every table in memory behind one mutex.
///
/// Counts `insert_workout` calls so tests can assert nothing was written.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    workout_writes: AtomicUsize,
    fail: Failures,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose `insert_workout` always fails.
    pub fn failing_writes() -> Self {
        Self::failing(Failures {
            workout_writes: true,
            ..Failures::default()
        })
    }

    /// A store whose exercise lookups always fail.
    pub fn failing_exercise_lookups() -> Self {
        Self::failing(Failures {
            exercise_lookups: true,
            ..Failures::default()
        })
    }

    /// A store whose admin and window-count reads always fail.
    pub fn failing_quota_reads() -> Self {
        Self::failing(Failures {
            quota_reads: true,
            ..Failures::default()
        })
    }

    fn failing(fail: Failures) -> Self {
        Self {
            fail,
            ..Self::default()
        }
    }

    pub async fn set_admin(&self, user_id: Uuid, admin: bool) {
        let mut tables = self.tables.lock().await;
        if admin {
            tables.admins.insert(user_id);
        } else {
            tables.admins.remove(&user_id);
        }
    }

    /// Insert `count` workouts for `user_id` stamped `created_at`, bypassing
    /// the write counter.
    pub async fn seed_workouts(&self, user_id: Uuid, created_at: DateTime<Utc>, count: usize) {
        let mut tables = self.tables.lock().await;
        for _ in 0..count {
            tables.workouts.push(blank_workout(user_id, created_at));
        }
    }

    /// Number of `insert_workout` calls, successful or not.
    pub fn workout_writes(&self) -> usize {
        self.workout_writes.load(Ordering::SeqCst)
    }

    pub async fn workouts(&self) -> Vec<Workout> {
        self.tables.lock().await.workouts.clone()
    }

    pub async fn links_for(&self, workout_id: Uuid) -> Vec<WorkoutExercise> {
        let tables = self.tables.lock().await;
        let mut links: Vec<_> = tables
            .links
            .iter()
            .filter(|l| l.workout_id == workout_id)
            .cloned()
            .collect();
        links.sort_by_key(|l| l.order_index);
        links
    }

    pub async fn exercises(&self) -> Vec<Exercise> {
        let tables = self.tables.lock().await;
        let mut all: Vec<_> = tables.exercises.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }
}

#[async_trait]
impl WorkoutStore for MemoryStore {
    async fn is_admin(&self, user_id: Uuid) -> Result<bool> {
        if self.fail.quota_reads {
            bail!("profile reads are disabled for this store");
        }
        Ok(self.tables.lock().await.admins.contains(&user_id))
    }

    async fn count_workouts_since(
        &self,
        user_id: Uuid,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<i64> {
        if self.fail.quota_reads {
            bail!("workout counts are disabled for this store");
        }
        let tables = self.tables.lock().await;
        let n = tables
            .workouts
            .iter()
            .filter(|w| w.user_id == user_id && w.created_at > window_start && w.created_at <= window_end)
            .count();
        Ok(i64::try_from(n)?)
    }

    async fn find_exercise_by_search_key(&self, search_key: &str) -> Result<Option<Exercise>> {
        if self.fail.exercise_lookups {
            bail!("exercise lookups are disabled for this store");
        }
        Ok(self.tables.lock().await.exercises.get(search_key).cloned())
    }

    async fn insert_exercise(&self, new: &NewExercise<'_>) -> Result<Option<Exercise>> {
        let mut tables = self.tables.lock().await;
        if tables.exercises.contains_key(new.search_key) {
            return Ok(None);
        }
        let now = Utc::now();
        let exercise = Exercise {
            id: Uuid::new_v4(),
            name: new.name.to_owned(),
            search_key: new.search_key.to_owned(),
            primary_muscles: new.primary_muscles.to_vec(),
            secondary_muscles: new.secondary_muscles.to_vec(),
            equipment: new.equipment.map(str::to_owned),
            movement_type: new.movement_type,
            created_at: now,
            updated_at: now,
        };
        tables
            .exercises
            .insert(exercise.search_key.clone(), exercise.clone());
        Ok(Some(exercise))
    }

    async fn get_workout(&self, id: Uuid) -> Result<Option<Workout>> {
        let tables = self.tables.lock().await;
        Ok(tables.workouts.iter().find(|w| w.id == id).cloned())
    }

    async fn list_workout_exercises(&self, workout_id: Uuid) -> Result<Vec<WorkoutExerciseDetail>> {
        let tables = self.tables.lock().await;
        let mut details = Vec::new();
        for link in tables.links.iter().filter(|l| l.workout_id == workout_id) {
            let Some(exercise) = tables.exercises.values().find(|e| e.id == link.exercise_id) else {
                bail!("link references unknown exercise {}", link.exercise_id);
            };
            details.push(WorkoutExerciseDetail {
                order_index: link.order_index,
                exercise_id: link.exercise_id,
                name: exercise.name.clone(),
                sets: link.sets,
                reps: link.reps,
                rest_seconds: link.rest_seconds,
                weight_unit: link.weight_unit.clone(),
                rationale: link.rationale.clone(),
                equipment: exercise.equipment.clone(),
                movement_type: exercise.movement_type,
            });
        }
        details.sort_by_key(|d| d.order_index);
        Ok(details)
    }

    async fn insert_workout(
        &self,
        workout: &NewWorkout<'_>,
        links: &[NewWorkoutExercise<'_>],
    ) -> Result<Workout> {
        self.workout_writes.fetch_add(1, Ordering::SeqCst);
        if self.fail.workout_writes {
            bail!("workout writes are disabled for this store");
        }

        let mut tables = self.tables.lock().await;

        let mut seen = HashSet::new();
        for link in links {
            if !seen.insert(link.order_index) {
                bail!("duplicate order_index {} in workout links", link.order_index);
            }
            if !tables.exercises.values().any(|e| e.id == link.exercise_id) {
                bail!("link references unknown exercise {}", link.exercise_id);
            }
        }

        let row = Workout {
            id: Uuid::new_v4(),
            user_id: workout.user_id,
            workout_data: workout.workout_data.clone(),
            total_duration_minutes: workout.total_duration_minutes,
            muscle_groups_targeted: workout.muscle_groups_targeted.to_owned(),
            joint_groups_affected: workout.joint_groups_affected.to_owned(),
            equipment_needed: workout.equipment_needed.to_owned(),
            raw_ai_response: workout.raw_ai_response.to_owned(),
            ai_model: workout.ai_model.to_owned(),
            prompt_tokens: workout.prompt_tokens,
            completion_tokens: workout.completion_tokens,
            generation_time_ms: workout.generation_time_ms,
            parse_attempts: workout.parse_attempts,
            muscle_focus: workout.muscle_focus.to_vec(),
            workout_focus: workout.workout_focus.to_vec(),
            exercise_count: workout.exercise_count,
            special_instructions: workout.special_instructions.map(str::to_owned),
            total_sets: workout.total_sets,
            total_exercises: workout.total_exercises,
            estimated_duration_minutes: workout.estimated_duration_minutes,
            primary_muscles_targeted: workout.primary_muscles_targeted.to_vec(),
            equipment_needed_array: workout.equipment_needed_array.to_vec(),
            created_at: Utc::now(),
        };

        let now = row.created_at;
        for link in links {
            tables.links.push(WorkoutExercise {
                id: Uuid::new_v4(),
                workout_id: row.id,
                exercise_id: link.exercise_id,
                order_index: link.order_index,
                sets: link.sets,
                reps: link.reps,
                rest_seconds: link.rest_seconds,
                weight_unit: link.weight_unit.to_owned(),
                weight_recommendation_type: link.weight_recommendation_type.map(str::to_owned),
                weight_recommendation_value: link.weight_recommendation_value,
                rationale: link.rationale.map(str::to_owned),
                created_at: now,
            });
        }
        tables.workouts.push(row.clone());

        Ok(row)
    }
}

fn blank_workout(user_id: Uuid, created_at: DateTime<Utc>) -> Workout {
    Workout {
        id: Uuid::new_v4(),
        user_id,
        workout_data: serde_json::json!({ "exercises": [] }),
        total_duration_minutes: 0,
        muscle_groups_targeted: String::new(),
        joint_groups_affected: String::new(),
        equipment_needed: String::new(),
        raw_ai_response: String::new(),
        ai_model: "seed".to_owned(),
        prompt_tokens: None,
        completion_tokens: None,
        generation_time_ms: None,
        parse_attempts: 1,
        muscle_focus: Vec::new(),
        workout_focus: Vec::new(),
        exercise_count: 0,
        special_instructions: None,
        total_sets: 0,
        total_exercises: 0,
        estimated_duration_minutes: 0,
        primary_muscles_targeted: Vec::new(),
        equipment_needed_array: Vec::new(),
        created_at,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[tokio::test]
    async fn insert_exercise_refuses_duplicate_key() {
        let store = MemoryStore::new();
        let muscles = vec!["chest".to_owned()];
        let new = NewExercise {
            name: "Barbell Bench Press",
            search_key: "barbell bench press",
            primary_muscles: &muscles,
            secondary_muscles: &[],
            equipment: Some("barbell"),
            movement_type: None,
        };
        assert!(store.insert_exercise(&new).await.unwrap().is_some());
        assert!(store.insert_exercise(&new).await.unwrap().is_none());
        assert_eq!(store.exercises().await.len(), 1);
    }

    #[tokio::test]
    async fn window_is_half_open() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let now = Utc::now();
        let start = now - Duration::hours(24);
        store.seed_workouts(user, start, 1).await;
        store.seed_workouts(user, now, 2).await;
        store.seed_workouts(Uuid::new_v4(), now, 5).await;

        assert_eq!(store.count_workouts_since(user, start, now).await.unwrap(), 2);
        assert_eq!(store.workout_writes(), 0);
    }
}
