use async_trait::async_trait;

use super::error::CompletionError;

/// A chat-completion backend. Receives a system/user message pair and
/// returns the generated text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// provider name (e.g. "openai")
    fn name(&self) -> &str;

    /// single non-streaming completion
    async fn complete(&self, system_message: &str, user_message: &str)
        -> Result<String, CompletionError>;
}
