//! Shared test doubles for the pipeline suites.

use async_trait::async_trait;
use std::sync::Mutex;

use lexcabinet::error::PipelineError;
use lexcabinet::provider::{ChatCompletion, ChatOptions, LlmProvider, TokenUsage};

/// One recorded provider call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: String,
    pub user: String,
    pub options: ChatOptions,
}

/// Provider double that replays canned responses in order and records
/// every call for prompt assertions.
pub struct ScriptedProvider {
    responses: Mutex<Vec<Result<String, PipelineError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedProvider {
    pub fn new<I>(responses: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(|r| Ok(r.into())).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            responses: Mutex::new(vec![Err(PipelineError::Upstream(message.to_string()))]),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn chat(
        &self,
        system: &str,
        user: &str,
        options: ChatOptions,
    ) -> Result<ChatCompletion, PipelineError> {
        self.calls.lock().unwrap().push(RecordedCall {
            system: system.to_string(),
            user: user.to_string(),
            options,
        });
        let next = {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Err(PipelineError::Upstream("script épuisé".to_string()))
            } else {
                responses.remove(0)
            }
        };
        next.map(|content| ChatCompletion {
            content,
            usage: TokenUsage {
                prompt_tokens: 100,
                completion_tokens: 50,
                total_tokens: 150,
            },
        })
    }
}
