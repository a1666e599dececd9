use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

/// One assembled request against the chat-completion endpoint: a system
/// and user message pair, optionally demanding strict JSON output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub json_only: bool,
}

#[async_trait]
pub trait ChatCompletionClient: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String>;
}

#[async_trait]
impl<T: ChatCompletionClient + ?Sized> ChatCompletionClient for Arc<T> {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        (**self).complete(request).await
    }
}

/// Test double that replays canned completions in order. Calls beyond the
/// scripted responses fail, which surfaces unexpected extra round-trips.
#[derive(Debug, Default)]
pub struct ScriptedChatClient {
    responses: Mutex<Vec<String>>,
}

impl ScriptedChatClient {
    pub fn with_responses(responses: Vec<String>) -> Self {
        let mut ordered = responses;
        ordered.reverse();
        Self { responses: Mutex::new(ordered) }
    }
}

#[async_trait]
impl ChatCompletionClient for ScriptedChatClient {
    async fn complete(&self, _request: &ChatRequest) -> Result<String> {
        let mut responses = self.responses.lock().expect("scripted responses lock");
        responses.pop().ok_or_else(|| anyhow::anyhow!("no scripted completion left"))
    }
}

#[cfg(test)]
mod tests {
    use super::{ChatCompletionClient, ChatRequest, ScriptedChatClient};

    #[tokio::test]
    async fn scripted_client_replays_in_order_then_fails() {
        let client = ScriptedChatClient::with_responses(vec![
            "first".to_string(),
            "second".to_string(),
        ]);
        let request = ChatRequest {
            system: "system".to_string(),
            user: "user".to_string(),
            json_only: false,
        };

        assert_eq!(client.complete(&request).await.expect("first"), "first");
        assert_eq!(client.complete(&request).await.expect("second"), "second");
        assert!(client.complete(&request).await.is_err());
    }
}
