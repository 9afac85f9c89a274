//! Query-function tests against a real PostgreSQL.

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use liftgen_db::models::MovementType;
use liftgen_db::queries::exercises::{self, NewExercise};
use liftgen_db::queries::profiles;
use liftgen_db::queries::workouts::{self, NewWorkout, NewWorkoutExercise};
use liftgen_test_utils::TestDb;

fn muscles(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

async fn bench_press(pool: &sqlx::PgPool) -> liftgen_db::models::Exercise {
    let primary = muscles(&["chest", "triceps"]);
    let secondary = muscles(&["shoulders"]);
    exercises::insert_exercise(
        pool,
        &NewExercise {
            name: "Barbell Bench Press",
            search_key: "barbell bench press",
            primary_muscles: &primary,
            secondary_muscles: &secondary,
            equipment: Some("barbell"),
            movement_type: Some(MovementType::Compound),
        },
    )
    .await
    .expect("insert exercise")
    .expect("fresh key should insert")
}

fn new_workout<'a>(user_id: Uuid, data: &'a serde_json::Value, focus: &'a [String]) -> NewWorkout<'a> {
    NewWorkout {
        user_id,
        workout_data: data,
        total_duration_minutes: 20,
        muscle_groups_targeted: "Chest",
        joint_groups_affected: "Shoulders",
        equipment_needed: "Barbell",
        raw_ai_response: "{}",
        ai_model: "test-model",
        prompt_tokens: Some(100),
        completion_tokens: Some(50),
        generation_time_ms: Some(1234),
        parse_attempts: 1,
        muscle_focus: focus,
        workout_focus: focus,
        exercise_count: 1,
        special_instructions: None,
        total_sets: 3,
        total_exercises: 1,
        estimated_duration_minutes: 8,
        primary_muscles_targeted: focus,
        equipment_needed_array: &[],
    }
}

#[tokio::test]
async fn exercise_insert_and_lookup() {
    let db = TestDb::create().await;

    let created = bench_press(&db.pool).await;
    assert_eq!(created.primary_muscles, vec!["chest", "triceps"]);
    assert_eq!(created.movement_type, Some(MovementType::Compound));

    let found = exercises::find_by_search_key(&db.pool, "barbell bench press")
        .await
        .unwrap()
        .expect("exercise should be found");
    assert_eq!(found.id, created.id);

    let by_id = exercises::get_exercise(&db.pool, created.id).await.unwrap();
    assert_eq!(by_id.map(|e| e.name), Some("Barbell Bench Press".to_owned()));

    assert!(
        exercises::find_by_search_key(&db.pool, "cable fly")
            .await
            .unwrap()
            .is_none()
    );

    db.teardown().await;
}

#[tokio::test]
async fn duplicate_search_key_returns_none() {
    let db = TestDb::create().await;

    let first = bench_press(&db.pool).await;
    let again = exercises::insert_exercise(
        &db.pool,
        &NewExercise {
            name: "barbell bench press",
            search_key: "barbell bench press",
            primary_muscles: &[],
            secondary_muscles: &[],
            equipment: None,
            movement_type: None,
        },
    )
    .await
    .unwrap();
    assert!(again.is_none());

    let all = exercises::list_exercises(&db.pool).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, first.id);

    db.teardown().await;
}

#[tokio::test]
async fn admin_flag_defaults_to_false() {
    let db = TestDb::create().await;
    let user = Uuid::new_v4();

    assert!(!profiles::is_admin(&db.pool, user).await.unwrap());
    assert!(profiles::get_profile(&db.pool, user).await.unwrap().is_none());

    profiles::upsert_profile(&db.pool, user, Some("coach@example.com"), true)
        .await
        .unwrap();
    assert!(profiles::is_admin(&db.pool, user).await.unwrap());

    let profile = profiles::upsert_profile(&db.pool, user, None, false).await.unwrap();
    assert!(!profile.is_admin);
    assert_eq!(profile.email.as_deref(), Some("coach@example.com"));

    let stored = profiles::get_profile(&db.pool, user)
        .await
        .unwrap()
        .expect("profile should exist after upsert");
    assert_eq!(stored.id, user);
    assert!(!stored.is_admin);

    db.teardown().await;
}

#[tokio::test]
async fn workout_insert_writes_links_in_one_transaction() {
    let db = TestDb::create().await;
    let exercise = bench_press(&db.pool).await;
    let user = Uuid::new_v4();
    let data = json!({ "exercises": [] });
    let focus = muscles(&["chest"]);

    let links = [NewWorkoutExercise {
        exercise_id: exercise.id,
        order_index: 1,
        sets: 3,
        reps: 10,
        rest_seconds: 90,
        weight_unit: "lbs",
        weight_recommendation_type: Some("percent_1rm"),
        weight_recommendation_value: Some(75.0),
        rationale: Some("Heavy press."),
    }];
    let workout = workouts::insert_workout_with_exercises(&db.pool, &new_workout(user, &data, &focus), &links)
        .await
        .expect("insert workout");

    assert_eq!(workout.user_id, user);
    assert_eq!(workout.generation_time_ms, Some(1234));

    let details = workouts::list_exercise_details_for_workout(&db.pool, workout.id)
        .await
        .unwrap();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0].name, "Barbell Bench Press");
    assert_eq!(details[0].weight_unit, "lbs");

    let raw = workouts::list_links_for_workout(&db.pool, workout.id).await.unwrap();
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0].workout_id, workout.id);
    assert_eq!(raw[0].order_index, 1);
    assert_eq!(raw[0].sets, 3);
    assert_eq!(raw[0].weight_recommendation_type.as_deref(), Some("percent_1rm"));
    assert_eq!(raw[0].weight_recommendation_value, Some(75.0));
    assert_eq!(raw[0].rationale.as_deref(), Some("Heavy press."));

    let listed = workouts::list_workouts_for_user(&db.pool, user, 10).await.unwrap();
    assert_eq!(listed.len(), 1);

    db.teardown().await;
}

#[tokio::test]
async fn failed_link_rolls_back_workout() {
    let db = TestDb::create().await;
    let exercise = bench_press(&db.pool).await;
    let user = Uuid::new_v4();
    let data = json!({ "exercises": [] });
    let focus = muscles(&["chest"]);

    let links = [
        NewWorkoutExercise {
            exercise_id: exercise.id,
            order_index: 1,
            sets: 3,
            reps: 10,
            rest_seconds: 90,
            weight_unit: "lbs",
            weight_recommendation_type: None,
            weight_recommendation_value: None,
            rationale: None,
        },
        NewWorkoutExercise {
            exercise_id: Uuid::new_v4(),
            order_index: 2,
            sets: 3,
            reps: 10,
            rest_seconds: 90,
            weight_unit: "lbs",
            weight_recommendation_type: None,
            weight_recommendation_value: None,
            rationale: None,
        },
    ];
    let result =
        workouts::insert_workout_with_exercises(&db.pool, &new_workout(user, &data, &focus), &links).await;
    assert!(result.is_err());

    let count = workouts::count_workouts_in_window(
        &db.pool,
        user,
        Utc::now() - Duration::hours(24),
        Utc::now() + Duration::minutes(1),
    )
    .await
    .unwrap();
    assert_eq!(count, 0);

    db.teardown().await;
}

#[tokio::test]
async fn window_count_excludes_old_rows() {
    let db = TestDb::create().await;
    let user = Uuid::new_v4();
    let data = json!({ "exercises": [] });
    let focus = muscles(&["chest"]);

    for _ in 0..3 {
        workouts::insert_workout_with_exercises(&db.pool, &new_workout(user, &data, &focus), &[])
            .await
            .unwrap();
    }
    sqlx::query(
        "UPDATE workouts SET created_at = now() - interval '25 hours' \
         WHERE id = (SELECT id FROM workouts LIMIT 1)",
    )
    .execute(&db.pool)
    .await
    .unwrap();

    let now = Utc::now() + Duration::seconds(1);
    let count = workouts::count_workouts_in_window(&db.pool, user, now - Duration::hours(24), now)
        .await
        .unwrap();
    assert_eq!(count, 2);

    let other = workouts::count_workouts_in_window(&db.pool, Uuid::new_v4(), now - Duration::hours(24), now)
        .await
        .unwrap();
    assert_eq!(other, 0);

    db.teardown().await;
}
