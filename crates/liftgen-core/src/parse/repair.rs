//! Bounded generate-parse-retry loop.

use tracing::{info, warn};

use super::{ParseError, ParsedWorkout, parse_workout};
use crate::generation::{GenerationClient, GenerationError};
use crate::prompt::{self, PromptError, PromptMode};
use crate::request::GenerationRequest;

/// Attempts made when the caller does not configure a ceiling.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Allowed range for the attempt ceiling.
pub const MAX_ATTEMPTS_RANGE: (u32, u32) = (1, 5);

/// Token and timing totals across every attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Telemetry {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub elapsed_ms: u64,
}

impl Telemetry {
    fn add(&mut self, prompt_tokens: Option<u32>, completion_tokens: Option<u32>, elapsed_ms: u64) {
        self.prompt_tokens = sum_opt(self.prompt_tokens, prompt_tokens);
        self.completion_tokens = sum_opt(self.completion_tokens, completion_tokens);
        self.elapsed_ms = self.elapsed_ms.saturating_add(elapsed_ms);
    }
}

fn sum_opt(a: Option<u32>, b: Option<u32>) -> Option<u32> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.saturating_add(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

/// A workout that parsed, with what it took to get it.
#[derive(Debug, Clone)]
pub struct RepairOutcome {
    pub workout: ParsedWorkout,
    /// Raw text of the successful attempt.
    pub raw_text: String,
    /// Model identifier of the successful attempt.
    pub model: String,
    /// 1-based number of the successful attempt.
    pub attempts: u32,
    pub telemetry: Telemetry,
}

/// Why a single attempt did not yield a workout.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, thiserror::Error)]
pub enum RepairError {
    /// The provider throttled us. Not retried.
    #[error("model provider is rate limiting requests")]
    RateLimited(#[source] GenerationError),

    #[error("no valid workout after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: AttemptError },

    #[error(transparent)]
    Prompt(#[from] PromptError),
}

/// Ask `client` for a workout until one parses or `max_attempts` is spent.
///
/// The first attempt uses the initial prompt; every later attempt uses the
/// retry prompt. Generation failures other than rate limiting count against
/// the same ceiling as parse failures. `max_attempts` is clamped to
/// [`MAX_ATTEMPTS_RANGE`].
pub async fn generate_with_repair(
    client: &dyn GenerationClient,
    request: &GenerationRequest,
    max_attempts: u32,
) -> Result<RepairOutcome, RepairError> {
    let (lo, hi) = MAX_ATTEMPTS_RANGE;
    let max_attempts = max_attempts.clamp(lo, hi);
    let expected = request.exercise_count as usize;

    let initial = prompt::build_prompt(request, PromptMode::Initial)?;
    let retry = prompt::build_prompt(request, PromptMode::Retry)?;
    let mut telemetry = Telemetry::default();
    let mut last_error: Option<AttemptError> = None;

    for attempt in 1..=max_attempts {
        let prompt = if attempt == 1 { &initial } else { &retry };

        let output = match client.generate(prompt).await {
            Ok(output) => output,
            Err(e) if e.is_rate_limited() => {
                warn!(attempt, client = client.name(), error = %e, "provider rate limited generation");
                return Err(RepairError::RateLimited(e));
            }
            Err(e) => {
                warn!(attempt, max_attempts, client = client.name(), error = %e, "generation attempt failed");
                last_error = Some(e.into());
                continue;
            }
        };

        telemetry.add(output.prompt_tokens, output.completion_tokens, output.elapsed_ms);

        match parse_workout(&output.text, expected) {
            Ok(workout) => {
                info!(
                    attempt,
                    model = %output.model,
                    elapsed_ms = telemetry.elapsed_ms,
                    "model response parsed"
                );
                return Ok(RepairOutcome {
                    workout,
                    raw_text: output.text,
                    model: output.model,
                    attempts: attempt,
                    telemetry,
                });
            }
            Err(e) => {
                warn!(attempt, max_attempts, error = %e, "model response failed to parse");
                last_error = Some(e.into());
            }
        }
    }

    Err(RepairError::Exhausted {
        attempts: max_attempts,
        last_error: last_error.unwrap_or(AttemptError::Parse(ParseError::Empty)),
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::generation::ScriptedClient;
    use crate::prompt::template::RETRY_BLOCK;

    fn request(count: u32) -> GenerationRequest {
        GenerationRequest {
            muscle_focus: vec!["chest".into()],
            workout_focus: vec!["strength".into()],
            exercise_count: count,
            special_instructions: None,
        }
    }

    fn one_exercise() -> String {
        r#"{"workout": {"exercises": [{"name": "Barbell Bench Press", "sets": 5,
            "reps": 5, "rest_time_seconds": 180, "rationale": "Heavy."}]}}"#
            .to_owned()
    }

    #[tokio::test]
    async fn first_attempt_success() {
        let client = ScriptedClient::from_texts([one_exercise()]);
        let out = generate_with_repair(&client, &request(1), 3).await.unwrap();
        assert_eq!(out.attempts, 1);
        assert_eq!(out.model, "scripted");
        assert_eq!(client.calls(), 1);
        assert!(!client.prompts().await[0].contains(RETRY_BLOCK));
    }

    #[tokio::test]
    async fn retries_use_retry_prompt_and_accumulate_telemetry() {
        let client = ScriptedClient::from_texts(["not json".to_owned(), one_exercise()]);
        let out = generate_with_repair(&client, &request(1), 3).await.unwrap();
        assert_eq!(out.attempts, 2);
        assert_eq!(out.raw_text, one_exercise());
        assert_eq!(out.telemetry.elapsed_ms, 20);
        assert_eq!(out.telemetry.completion_tokens, Some(100));

        let prompts = client.prompts().await;
        assert!(!prompts[0].ends_with(RETRY_BLOCK));
        assert!(prompts[1].ends_with(RETRY_BLOCK));
    }

    #[tokio::test]
    async fn exhaustion_reports_last_error() {
        let client = ScriptedClient::repeating("{\"exercises\": []}");
        let err = generate_with_repair(&client, &request(1), 3).await.unwrap_err();
        match err {
            RepairError::Exhausted { attempts, last_error } => {
                assert_eq!(attempts, 3);
                assert!(matches!(
                    last_error,
                    AttemptError::Parse(ParseError::WrongExerciseCount { expected: 1, actual: 0 })
                ));
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn timeouts_count_against_the_ceiling() {
        let client = ScriptedClient::new([
            Err(GenerationError::Timeout(Duration::from_secs(60))),
            Ok(one_exercise()),
        ]);
        let out = generate_with_repair(&client, &request(1), 2).await.unwrap();
        assert_eq!(out.attempts, 2);

        let client = ScriptedClient::new([
            Err(GenerationError::Timeout(Duration::from_secs(60))),
            Err(GenerationError::EmptyResponse),
        ]);
        let err = generate_with_repair(&client, &request(1), 2).await.unwrap_err();
        assert!(matches!(
            err,
            RepairError::Exhausted { attempts: 2, last_error: AttemptError::Generation(GenerationError::EmptyResponse) }
        ));
    }

    #[tokio::test]
    async fn rate_limit_aborts_immediately() {
        let client = ScriptedClient::new([
            Err(GenerationError::RateLimited("429".into())),
            Ok(one_exercise()),
        ]);
        let err = generate_with_repair(&client, &request(1), 3).await.unwrap_err();
        assert!(matches!(err, RepairError::RateLimited(_)));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn ceiling_is_clamped() {
        let client = ScriptedClient::repeating("nope");
        let err = generate_with_repair(&client, &request(1), 0).await.unwrap_err();
        assert!(matches!(err, RepairError::Exhausted { attempts: 1, .. }));

        let client = ScriptedClient::repeating("nope");
        let err = generate_with_repair(&client, &request(1), 99).await.unwrap_err();
        assert!(matches!(err, RepairError::Exhausted { attempts: 5, .. }));
        assert_eq!(client.calls(), 5);
    }
}
