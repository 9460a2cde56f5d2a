pub mod chat_client;
pub mod metrics;
pub mod prompts;

pub use chat_client::{ChatClient, ChatError, ChatMessage, ChatRequest, ResponseFormat};
