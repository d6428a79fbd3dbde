pub mod error;
pub mod openai;
pub mod provider;
pub mod types;


pub use error::CompletionError;
pub use openai::OpenAiClient;
pub use provider::CompletionClient;
pub use types::{ChatMessage, ChatRequest};
