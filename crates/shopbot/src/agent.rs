use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::errors::{AgentError, AgentResult};
use crate::models::message::{Message, ToolRequest};
use crate::providers::base::{Completion, FinishReason, Provider, Usage};
use crate::providers::configs::DEFAULT_TIMEOUT;
use crate::tools::ToolRegistry;

pub const DEFAULT_MAX_ROUNDS: usize = 5;

/// Outcome of one reply, including the full running conversation
#[derive(Debug, Clone)]
pub struct Exchange {
    /// Text the caller sees
    pub text: String,
    /// Every message sent to or received from the model, in order
    pub messages: Vec<Message>,
    /// Number of completion calls made
    pub rounds: usize,
    /// True when the round limit ended the loop before the model finished
    pub ceiling_reached: bool,
    pub usage: Usage,
}

/// Agent pairs the completion provider with the shop's tools and system prompt.
///
/// Nothing in here is mutated by a reply, so one Agent serves concurrent requests; each
/// reply owns its conversation.
pub struct Agent {
    provider: Arc<dyn Provider>,
    registry: Arc<ToolRegistry>,
    system_prompt: Arc<str>,
    max_rounds: usize,
    request_timeout: Duration,
}

impl Agent {
    pub fn new(
        provider: Arc<dyn Provider>,
        registry: Arc<ToolRegistry>,
        system_prompt: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            provider,
            registry,
            system_prompt: system_prompt.into(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            request_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Answer a single user message, returning only the final text
    pub async fn run(&self, user_message: &str) -> AgentResult<String> {
        self.converse(user_message).await.map(|exchange| exchange.text)
    }

    /// Answer a single user message, resolving tool calls until the model finishes or the
    /// round limit is hit.
    pub async fn converse(&self, user_message: &str) -> AgentResult<Exchange> {
        let mut messages = vec![
            Message::system().with_text(self.system_prompt.as_ref()),
            Message::user().with_text(user_message),
        ];
        let mut usage = Usage::default();
        let mut last_text = String::new();

        for round in 1..=self.max_rounds {
            let completion = self.complete(&messages).await?;
            usage = usage.add(&completion.usage);
            last_text = completion.message.text();

            if completion.finish_reason != FinishReason::ToolCalls {
                debug!(round, finish_reason = ?completion.finish_reason, "Model finished");
                messages.push(completion.message);
                info!(
                    rounds = round,
                    total_tokens = ?usage.total_tokens,
                    "Reply complete"
                );
                return Ok(Exchange {
                    text: last_text,
                    messages,
                    rounds: round,
                    ceiling_reached: false,
                    usage,
                });
            }

            let requests: Vec<ToolRequest> = completion
                .message
                .tool_requests()
                .into_iter()
                .cloned()
                .collect();
            messages.push(completion.message);

            for request in requests {
                let call = request.tool_call?;
                let result = self.registry.dispatch(&call)?;
                messages.push(Message::tool().with_tool_response(request.id, result));
            }
        }

        warn!(
            max_rounds = self.max_rounds,
            "Round limit reached before the model finished; returning last content"
        );
        Ok(Exchange {
            text: last_text,
            messages,
            rounds: self.max_rounds,
            ceiling_reached: true,
            usage,
        })
    }

    async fn complete(&self, messages: &[Message]) -> AgentResult<Completion> {
        match timeout(
            self.request_timeout,
            self.provider.complete(messages, self.registry.describe()),
        )
        .await
        {
            Ok(Ok(completion)) => Ok(completion),
            Ok(Err(e)) => Err(AgentError::upstream(&e)),
            Err(_) => Err(AgentError::Timeout(self.request_timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::MessageContent;
    use crate::models::role::Role;
    use crate::models::tool::{Tool, ToolCall};
    use crate::notifier::testing::RecordingNotifier;
    use crate::providers::mock::{stop, tool_calls, MockProvider};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use serde_json::json;

    fn agent_with(
        responses: Vec<anyhow::Result<Completion>>,
    ) -> (Agent, Arc<MockProvider>, RecordingNotifier) {
        let provider = Arc::new(MockProvider::new(responses));
        let notifier = RecordingNotifier::default();
        let registry = Arc::new(ToolRegistry::new(Arc::new(notifier.clone())));
        let agent = Agent::new(provider.clone(), registry, "You are Ummu Nada Assistant");
        (agent, provider, notifier)
    }

    fn lead_request(id: &str) -> Message {
        Message::assistant().with_tool_request(
            id,
            Ok(ToolCall::new(
                "record_user_details",
                json!({"phone_number": "0812xxxx"}),
            )),
        )
    }

    #[tokio::test]
    async fn test_simple_response() -> AgentResult<()> {
        let (agent, provider, _) = agent_with(vec![stop("Halo Kak!")]);

        let exchange = agent.converse("Halo").await?;

        assert_eq!(exchange.text, "Halo Kak!");
        assert_eq!(exchange.rounds, 1);
        assert!(!exchange.ceiling_reached);
        assert_eq!(provider.call_count(), 1);

        let requests = provider.requests();
        let sent = &requests[0];
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].role, Role::System);
        assert_eq!(sent[0].text(), agent.system_prompt());
        assert_eq!(agent.system_prompt(), "You are Ummu Nada Assistant");
        assert_eq!(sent[1].role, Role::User);
        assert_eq!(sent[1].text(), "Halo");
        Ok(())
    }

    #[tokio::test]
    async fn test_run_returns_literal_content() -> AgentResult<()> {
        let (agent, _, _) = agent_with(vec![stop("  Ada Onde-onde 😊\n")]);
        assert_eq!(agent.run("Ada onde-onde?").await?, "  Ada Onde-onde 😊\n");
        Ok(())
    }

    #[tokio::test]
    async fn test_tool_call_round() -> AgentResult<()> {
        let (agent, provider, notifier) =
            agent_with(vec![tool_calls(lead_request("call_1")), stop("Terima kasih!")]);

        let exchange = agent.converse("Nomor saya 0812xxxx").await?;

        assert_eq!(exchange.text, "Terima kasih!");
        assert_eq!(exchange.rounds, 2);
        assert_eq!(notifier.messages().len(), 1);

        // second call sees system, user, assistant request, tool result
        let requests = provider.requests();
        let second = &requests[1];
        assert_eq!(second.len(), 4);
        assert_eq!(second[2].role, Role::Assistant);
        assert_eq!(second[3].role, Role::Tool);
        assert_eq!(
            second[3].content[0],
            MessageContent::tool_response("call_1", json!({"recorded": "ok"}))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_multiple_tool_calls_answered_in_order() -> AgentResult<()> {
        let request = Message::assistant()
            .with_tool_request(
                "b",
                Ok(ToolCall::new(
                    "record_unknown_question",
                    json!({"question": "Bisa kirim ke luar kota?"}),
                )),
            )
            .with_tool_request("a", Ok(ToolCall::new("delete_everything", json!({}))))
            .with_tool_request(
                "c",
                Ok(ToolCall::new(
                    "record_user_details",
                    json!({"phone_number": "0812", "name": "Sari"}),
                )),
            );
        let (agent, provider, notifier) = agent_with(vec![tool_calls(request), stop("Siap Kak")]);

        let exchange = agent.converse("Halo").await?;
        assert_eq!(exchange.text, "Siap Kak");

        let requests = provider.requests();
        let second = &requests[1];
        let tool_messages: Vec<_> = second.iter().filter(|m| m.role == Role::Tool).collect();
        assert_eq!(tool_messages.len(), 3);
        let ids: Vec<&str> = tool_messages
            .iter()
            .map(|m| m.content[0].as_tool_response().unwrap().id.as_str())
            .collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(
            tool_messages[1].content[0].as_tool_response().unwrap().tool_result,
            json!({})
        );
        assert_eq!(notifier.messages().len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_round_limit_returns_last_content() -> AgentResult<()> {
        let responses = (0..10)
            .map(|i| {
                tool_calls(lead_request(&format!("call_{}", i)).with_text(format!("step {}", i)))
            })
            .collect();
        let (agent, provider, notifier) = agent_with(responses);

        let exchange = agent.converse("Halo").await?;

        assert!(exchange.ceiling_reached);
        assert_eq!(exchange.rounds, DEFAULT_MAX_ROUNDS);
        assert_eq!(provider.call_count(), DEFAULT_MAX_ROUNDS);
        assert_eq!(exchange.text, "step 4");
        assert_eq!(notifier.messages().len(), DEFAULT_MAX_ROUNDS);
        // system + user + (assistant + tool) per round
        assert_eq!(exchange.messages.len(), 2 + 2 * DEFAULT_MAX_ROUNDS);
        Ok(())
    }

    #[tokio::test]
    async fn test_round_limit_without_content_is_empty() -> AgentResult<()> {
        let responses = (0..5).map(|i| tool_calls(lead_request(&i.to_string()))).collect();
        let (agent, _, _) = agent_with(responses);
        assert_eq!(agent.run("Halo").await?, "");
        Ok(())
    }

    #[tokio::test]
    async fn test_custom_round_limit() -> AgentResult<()> {
        let responses = (0..5).map(|i| tool_calls(lead_request(&i.to_string()))).collect();
        let (agent, provider, _) = agent_with(responses);
        let agent = agent.with_max_rounds(2);

        let exchange = agent.converse("Halo").await?;
        assert!(exchange.ceiling_reached);
        assert_eq!(provider.call_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_provider_error_is_upstream() {
        let (agent, provider, _) = agent_with(vec![
            tool_calls(lead_request("1")),
            Err(anyhow!("Server error: 503 Service Unavailable")),
            stop("never reached"),
        ]);

        let err = agent.run("Halo").await.unwrap_err();
        assert_eq!(
            err,
            AgentError::Upstream("Server error: 503 Service Unavailable".to_string())
        );
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_invalid_arguments_abort_reply() {
        let (agent, provider, notifier) = agent_with(vec![
            tool_calls(Message::assistant().with_tool_request(
                "1",
                Ok(ToolCall::new("record_user_details", json!({"name": "Sari"}))),
            )),
            stop("never reached"),
        ]);

        let err = agent.run("Halo").await.unwrap_err();
        assert!(matches!(err, AgentError::InvalidParameters(_)));
        assert_eq!(provider.call_count(), 1);
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_arguments_abort_reply() {
        let (agent, _, _) = agent_with(vec![tool_calls(Message::assistant().with_tool_request(
            "1",
            Err(AgentError::InvalidParameters("bad json".to_string())),
        ))]);

        let err = agent.run("Halo").await.unwrap_err();
        assert_eq!(err, AgentError::InvalidParameters("bad json".to_string()));
    }

    #[tokio::test]
    async fn test_stop_with_tool_requests_is_final() -> AgentResult<()> {
        // Only the finish condition drives the loop
        let message = lead_request("1").with_text("Sudah dicatat");
        let (agent, provider, notifier) = agent_with(vec![Ok(Completion {
            message,
            finish_reason: FinishReason::Stop,
            usage: Usage::default(),
        })]);

        assert_eq!(agent.run("Halo").await?, "Sudah dicatat");
        assert_eq!(provider.call_count(), 1);
        assert!(notifier.messages().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_usage_accumulates() -> AgentResult<()> {
        let (agent, _, _) = agent_with(vec![tool_calls(lead_request("1")), stop("ok")]);
        let exchange = agent.converse("Halo").await?;
        assert_eq!(exchange.usage, Usage::new(Some(20), Some(10), Some(30)));
        Ok(())
    }

    struct SlowProvider;

    #[async_trait]
    impl Provider for SlowProvider {
        async fn complete(&self, _: &[Message], _: &[Tool]) -> anyhow::Result<Completion> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            stop("too late")
        }
    }

    #[tokio::test]
    async fn test_timeout_fails_reply() {
        let registry = Arc::new(ToolRegistry::new(Arc::new(RecordingNotifier::default())));
        let agent = Agent::new(Arc::new(SlowProvider), registry, "prompt")
            .with_request_timeout(Duration::from_millis(20));

        let err = agent.run("Halo").await.unwrap_err();
        assert_eq!(err, AgentError::Timeout(Duration::from_millis(20)));
    }
}
