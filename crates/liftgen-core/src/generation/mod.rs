//! Generation client interface for the external language model.
//!
//! [`GenerationClient`] is the seam between the pipeline and whatever
//! produces workout text. [`OpenAiClient`] talks to an OpenAI-compatible
//! chat completions endpoint; [`ScriptedClient`] replays canned responses.
//!
//! Clients make exactly one provider call per [`GenerationClient::generate`].
//! Retrying with a fresh prompt is the repair loop's job
//! (see [`crate::parse::repair`]).

pub mod openai;
pub mod scripted;

use std::time::Duration;

use async_trait::async_trait;

pub use openai::{OpenAiClient, OpenAiConfig};
pub use scripted::ScriptedClient;

/// Raw model output for one attempt, plus telemetry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutput {
    pub text: String,
    /// Model identifier reported by the provider.
    pub model: String,
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub elapsed_ms: u64,
}

/// Failure of a single provider call.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The provider throttled us (HTTP 429 or a rate-limit error code).
    #[error("model provider rate limit: {0}")]
    RateLimited(String),

    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    /// Transport failure (connect, DNS, TLS, body read).
    #[error("HTTP request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("model provider error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("model returned no content")]
    EmptyResponse,

    #[error("could not decode provider response: {0}")]
    Decode(String),
}

impl GenerationError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

/// Something that turns a prompt into raw workout text.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Short client name for logs (e.g. "openai").
    fn name(&self) -> &str;

    /// Model identifier requested from the provider.
    fn model(&self) -> &str;

    /// Send `prompt` and return the raw reply.
    async fn generate(&self, prompt: &str) -> Result<GenerationOutput, GenerationError>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn GenerationClient) {}
};
