use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::Mutex;

use crate::models::message::Message;
use crate::models::tool::Tool;
use crate::providers::base::{Completion, FinishReason, Provider, Usage};

/// A mock provider that returns pre-configured completions for testing
pub struct MockProvider {
    responses: Arc<Mutex<Vec<Result<Completion>>>>,
    requests: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of responses
    pub fn new(responses: Vec<Result<Completion>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Snapshot of the conversation sent on each call, in call order
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// A completion that ends the turn with text
pub fn stop(text: &str) -> Result<Completion> {
    Ok(Completion {
        message: Message::assistant().with_text(text),
        finish_reason: FinishReason::Stop,
        usage: Usage::new(Some(10), Some(5), Some(15)),
    })
}

/// A completion that asks for tool calls
pub fn tool_calls(message: Message) -> Result<Completion> {
    Ok(Completion {
        message,
        finish_reason: FinishReason::ToolCalls,
        usage: Usage::new(Some(10), Some(5), Some(15)),
    })
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, messages: &[Message], _tools: &[Tool]) -> Result<Completion> {
        self.requests.lock().unwrap().push(messages.to_vec());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            // Return empty response if no more pre-configured responses
            stop("")
        } else {
            responses.remove(0)
        }
    }
}
