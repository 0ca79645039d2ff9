//! ghosttext-cloud
//!
//! Streaming completion transport for ghosttext-core: prompt construction
//! and a blocking client for OpenAI-compatible chat-completions endpoints.

pub mod prompt;
pub use prompt::{build_messages, system_prompt, ChatMessage};

pub mod client;
pub use client::CompletionClient;
