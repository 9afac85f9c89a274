//! A [`GenerationClient`] that replays canned replies.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{GenerationClient, GenerationError, GenerationOutput};

/// Replays a queue of replies in order and records every prompt.
///
/// Once the queue is drained, every further call fails with
/// [`GenerationError::EmptyResponse`] unless a repeating reply was set with
/// [`ScriptedClient::repeating`].
pub struct ScriptedClient {
    model: String,
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    repeat: Option<String>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn new(replies: impl IntoIterator<Item = Result<String, GenerationError>>) -> Self {
        Self {
            model: "scripted".to_owned(),
            replies: Mutex::new(replies.into_iter().collect()),
            repeat: None,
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Reply with the given texts, in order.
    pub fn from_texts<S: Into<String>>(texts: impl IntoIterator<Item = S>) -> Self {
        Self::new(texts.into_iter().map(|t| Ok(t.into())))
    }

    /// Reply with `text` on every call.
    pub fn repeating(text: impl Into<String>) -> Self {
        let mut client = Self::new([]);
        client.repeat = Some(text.into());
        client
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every prompt received, in call order.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<GenerationOutput, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().await.push(prompt.to_owned());

        let next = self.replies.lock().await.pop_front();
        let text = match (next, &self.repeat) {
            (Some(reply), _) => reply?,
            (None, Some(text)) => text.clone(),
            (None, None) => return Err(GenerationError::EmptyResponse),
        };

        Ok(GenerationOutput {
            text,
            model: self.model.clone(),
            prompt_tokens: Some(u32::try_from(prompt.len() / 4).unwrap_or(u32::MAX)),
            completion_tokens: Some(50),
            elapsed_ms: 10,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_in_order_then_runs_dry() {
        let client = ScriptedClient::new([
            Ok("first".to_owned()),
            Err(GenerationError::RateLimited("429".into())),
        ]);

        assert_eq!(client.generate("p1").await.unwrap().text, "first");
        assert!(client.generate("p2").await.unwrap_err().is_rate_limited());
        assert!(matches!(
            client.generate("p3").await,
            Err(GenerationError::EmptyResponse)
        ));
        assert_eq!(client.calls(), 3);
        assert_eq!(client.prompts().await, vec!["p1", "p2", "p3"]);
    }

    #[tokio::test]
    async fn repeating_never_runs_dry() {
        let client = ScriptedClient::repeating("same").with_model("test-model");
        for _ in 0..4 {
            let out = client.generate("p").await.unwrap();
            assert_eq!(out.text, "same");
            assert_eq!(out.model, "test-model");
        }
        assert_eq!(client.calls(), 4);
    }
}
