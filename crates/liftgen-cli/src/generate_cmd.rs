//! `liftgen generate` command: run one generation request end to end.

use std::sync::Arc;

use anyhow::{Result, bail};
use chrono::Utc;
use uuid::Uuid;

use liftgen_core::generation::OpenAiClient;
use liftgen_core::pipeline::{GenerationResponse, RequestContext, generate_workout};
use liftgen_core::prompt::{self, PromptMode};
use liftgen_core::request::GenerationRequest;
use liftgen_core::store::PgStore;
use liftgen_db::pool;

use crate::config::LiftgenConfig;

pub struct GenerateArgs {
    pub user: Uuid,
    pub muscles: Vec<String>,
    pub focus: Vec<String>,
    pub count: u32,
    pub instructions: Option<String>,
    pub dry_run: bool,
}

impl GenerateArgs {
    fn request(&self) -> GenerationRequest {
        GenerationRequest {
            muscle_focus: self.muscles.clone(),
            workout_focus: self.focus.clone(),
            exercise_count: self.count,
            special_instructions: self.instructions.clone(),
        }
    }
}

/// Validate the request and print the prompt the model would receive.
fn print_dry_run(request: GenerationRequest) -> Result<()> {
    let request = request.validate()?;
    let text = prompt::build_prompt(&request, PromptMode::Initial)?;
    println!("{text}");
    Ok(())
}

pub async fn run_generate(config: &LiftgenConfig, args: GenerateArgs) -> Result<()> {
    if args.dry_run {
        return print_dry_run(args.request());
    }

    let client = OpenAiClient::new(config.generation.clone())?;
    let db_pool = pool::create_pool(&config.db_config).await?;
    let ctx = RequestContext::new(args.user, Arc::new(PgStore::new(db_pool.clone())));

    let result = generate_workout(&ctx, &client, &config.pipeline, args.request(), Utc::now()).await;
    db_pool.close().await;

    let response = GenerationResponse::from_result(&result, |w| w.id);
    println!("{}", serde_json::to_string_pretty(&response)?);

    match result {
        Ok(workout) => {
            println!();
            println!(
                "Generated {} exercises, {} sets, about {} minutes (attempts: {}).",
                workout.total_exercises,
                workout.total_sets,
                workout.estimated_duration_minutes,
                workout.parse_attempts
            );
            println!("Run `liftgen show {}` for details.", workout.id);
            Ok(())
        }
        Err(e) => bail!("{}", e.user_message()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> GenerateArgs {
        GenerateArgs {
            user: Uuid::new_v4(),
            muscles: vec!["Chest".to_string(), "triceps".to_string()],
            focus: vec!["hypertrophy".to_string()],
            count: 4,
            instructions: None,
            dry_run: true,
        }
    }

    #[test]
    fn request_carries_every_flag() {
        let mut a = args();
        a.instructions = Some("no barbell".to_string());
        let request = a.request();
        assert_eq!(request.muscle_focus, vec!["Chest", "triceps"]);
        assert_eq!(request.exercise_count, 4);
        assert_eq!(request.special_instructions.as_deref(), Some("no barbell"));
    }

    #[test]
    fn dry_run_accepts_valid_request() {
        assert!(print_dry_run(args().request()).is_ok());
    }

    #[test]
    fn dry_run_rejects_invalid_request() {
        let mut a = args();
        a.count = 0;
        let err = print_dry_run(a.request()).unwrap_err();
        assert!(err.to_string().contains("exercise count"), "unexpected error: {err}");
    }
}
