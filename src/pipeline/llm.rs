//! Chat stage: send the transcript to the chat model and return its reply.
//!
//! [`ChatClient`] is the seam the session talks to. The production
//! [`ProviderChatClient`] adapts any `edgequake_llm` provider; the default is
//! Mistral, built with the same API key and base URL as the OCR client.
//!
//! There is no retry here: a failed call fails the turn, and the user can
//! send the message again.

use crate::config::ReviewConfig;
use crate::error::{ChatError, ConfigError};
use crate::transcript::{Message, Role};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, MistralProvider, ProviderFactory};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const MISTRAL_EMBEDDING_MODEL: &str = "mistral-embed";

/// Remote chat-completion capability.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send the ordered messages and return the first choice's content.
    async fn complete(&self, messages: &[Message], temperature: f32) -> Result<String, ChatError>;
}

/// [`ChatClient`] backed by an edgequake-llm provider.
pub struct ProviderChatClient {
    provider: Arc<dyn LLMProvider>,
    max_tokens: Option<usize>,
    timeout_secs: u64,
}

impl ProviderChatClient {
    /// Wrap a pre-built provider.
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ReviewConfig) -> Self {
        Self {
            provider,
            max_tokens: config.max_tokens,
            timeout_secs: config.api_timeout_secs,
        }
    }

    /// Create the provider named in the config (`chat_provider` + `chat_model`).
    ///
    /// `mistral` uses `config.api_key` and `config.api_base_url`, so OCR and
    /// chat share one credential. Other providers come from the provider
    /// factory, which reads their keys from the environment.
    pub fn from_config(config: &ReviewConfig) -> Result<Self, ConfigError> {
        let not_configured = |e: edgequake_llm::LlmError| ConfigError::ProviderNotConfigured {
            provider: config.chat_provider.clone(),
            hint: format!("{e}"),
        };

        let provider: Arc<dyn LLMProvider> = if config.chat_provider.eq_ignore_ascii_case("mistral")
        {
            Arc::new(
                MistralProvider::new(
                    config.api_key.clone(),
                    config.chat_model.clone(),
                    MISTRAL_EMBEDDING_MODEL.to_string(),
                    Some(config.api_base_url.clone()),
                )
                .map_err(not_configured)?,
            )
        } else {
            ProviderFactory::create_llm_provider(&config.chat_provider, &config.chat_model)
                .map_err(not_configured)?
        };
        debug!("Chat provider: {}/{}", provider.name(), provider.model());
        Ok(Self::new(provider, config))
    }
}

#[async_trait]
impl ChatClient for ProviderChatClient {
    async fn complete(&self, messages: &[Message], temperature: f32) -> Result<String, ChatError> {
        let start = Instant::now();
        let request = to_provider_messages(messages);
        let options = build_options(temperature, self.max_tokens);

        let call = self.provider.chat(&request, Some(&options));
        let response = match tokio::time::timeout(Duration::from_secs(self.timeout_secs), call).await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!("Chat call failed — {}", e);
                return Err(ChatError::ApiError {
                    message: format!("{e}"),
                });
            }
            Err(_) => {
                warn!("Chat call timed out after {}s", self.timeout_secs);
                return Err(ChatError::Timeout {
                    secs: self.timeout_secs,
                });
            }
        };

        debug!(
            "Chat reply: {} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        if response.content.trim().is_empty() {
            return Err(ChatError::EmptyReply);
        }
        Ok(response.content)
    }
}

/// Map transcript messages onto the provider's message type, preserving order.
fn to_provider_messages(messages: &[Message]) -> Vec<ChatMessage> {
    messages
        .iter()
        .map(|m| match m.role {
            Role::System => ChatMessage::system(m.content.as_str()),
            Role::Assistant => ChatMessage::assistant(m.content.as_str()),
            Role::User => ChatMessage::user(m.content.as_str()),
        })
        .collect()
}

fn build_options(temperature: f32, max_tokens: Option<usize>) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(temperature),
        max_tokens,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgequake_llm::{ChatRole, LLMResponse, LlmError, MockProvider};

    /// Provider whose chat call either fails or never finishes.
    enum BrokenProvider {
        Failing,
        Stalled,
    }

    #[async_trait]
    impl LLMProvider for BrokenProvider {
        fn name(&self) -> &str {
            "broken"
        }

        fn model(&self) -> &str {
            "broken-model"
        }

        fn max_context_length(&self) -> usize {
            4096
        }

        async fn complete(&self, _prompt: &str) -> edgequake_llm::Result<LLMResponse> {
            match self {
                BrokenProvider::Failing => {
                    Err(LlmError::ApiError("503 Service Unavailable".to_string()))
                }
                BrokenProvider::Stalled => std::future::pending().await,
            }
        }

        async fn complete_with_options(
            &self,
            prompt: &str,
            _options: &CompletionOptions,
        ) -> edgequake_llm::Result<LLMResponse> {
            self.complete(prompt).await
        }

        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _options: Option<&CompletionOptions>,
        ) -> edgequake_llm::Result<LLMResponse> {
            self.complete("").await
        }
    }

    fn config() -> ReviewConfig {
        ReviewConfig::builder()
            .api_key("k")
            .api_timeout_secs(1)
            .build()
            .unwrap()
    }

    fn transcript() -> Vec<Message> {
        vec![Message::system("s"), Message::user("q")]
    }

    #[test]
    fn build_options_is_deterministic_by_default() {
        let config = ReviewConfig::builder().api_key("k").build().unwrap();
        let opts = build_options(config.temperature, config.max_tokens);
        assert_eq!(opts.temperature, Some(0.0));
        assert_eq!(opts.max_tokens, None);
    }

    #[test]
    fn provider_messages_keep_order() {
        let msgs = vec![
            Message::system("s"),
            Message::assistant("hello"),
            Message::user("q"),
            Message::assistant("a"),
        ];
        let out = to_provider_messages(&msgs);
        let pairs: Vec<(ChatRole, &str)> =
            out.iter().map(|m| (m.role, m.content.as_str())).collect();
        assert_eq!(
            pairs,
            vec![
                (ChatRole::System, "s"),
                (ChatRole::Assistant, "hello"),
                (ChatRole::User, "q"),
                (ChatRole::Assistant, "a"),
            ]
        );
    }

    #[test]
    fn mistral_provider_uses_configured_key() {
        std::env::remove_var("MISTRAL_API_KEY");
        let config = ReviewConfig::builder()
            .api_key("configured-key")
            .chat_model("mistral-small-latest")
            .build()
            .unwrap();

        let client = ProviderChatClient::from_config(&config).expect("no env var needed");
        assert_eq!(client.provider.name(), "mistral");
        assert_eq!(client.provider.model(), "mistral-small-latest");
    }

    #[tokio::test]
    async fn reply_content_is_returned() {
        let mock = MockProvider::new();
        mock.add_response("Looks solid.").await;
        let client = ProviderChatClient::new(Arc::new(mock), &config());

        let reply = client.complete(&transcript(), 0.0).await.unwrap();
        assert_eq!(reply, "Looks solid.");
    }

    #[tokio::test]
    async fn blank_reply_is_an_error() {
        let mock = MockProvider::new();
        mock.add_response("  \n").await;
        let client = ProviderChatClient::new(Arc::new(mock), &config());

        let err = client.complete(&transcript(), 0.0).await.unwrap_err();
        assert!(matches!(err, ChatError::EmptyReply), "got {err:?}");
    }

    #[tokio::test]
    async fn provider_error_maps_to_api_error() {
        let client = ProviderChatClient::new(Arc::new(BrokenProvider::Failing), &config());

        match client.complete(&transcript(), 0.0).await.unwrap_err() {
            ChatError::ApiError { message } => assert!(message.contains("503"), "{message}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn stalled_provider_times_out() {
        let client = ProviderChatClient::new(Arc::new(BrokenProvider::Stalled), &config());

        let err = client.complete(&transcript(), 0.0).await.unwrap_err();
        assert!(matches!(err, ChatError::Timeout { secs: 1 }), "got {err:?}");
    }
}
