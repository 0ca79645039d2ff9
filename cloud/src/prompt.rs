//! Prompt construction for the completion generator.
//!
//! The document snapshot travels as the user message; the system message
//! pins down the output contract (short continuation, plain string, leading
//! space when a new sentence starts). The response rules are enforced again
//! on the receiving side; generators do not always follow them.

use ghosttext_core::Config;
use serde::{Deserialize, Serialize};

/// One chat message in the request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Render the system instruction for the configured completion length.
pub fn system_prompt(config: &Config) -> String {
    format!(
        "Your task is to provide completion for the document. \
         Complete the current sentence or start a new one based on the context \
         provided in the JSON object. \
         Do not add more than {} sentences to the document. \
         Pay attention to the context and structure of the document. \
         Prepend your response with space if you're starting a new sentence to \
         ensure it fits seamlessly into the document. \
         Respond with a completion text only as a string. Always return a \
         string, not a stringified JSON. No quotes.",
        config.max_completion_sentences
    )
}

/// Build the message list for one generation request. `snapshot` is the
/// serialized document JSON produced by the controller.
pub fn build_messages(snapshot: &str, config: &Config) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_prompt(config)),
        ChatMessage::user(snapshot),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_carries_sentence_limit() {
        let config = Config::default();
        let prompt = system_prompt(&config);
        assert!(prompt.contains("not add more than 2 sentences"));

        let mut longer = Config::default();
        longer.max_completion_sentences = 5;
        assert!(system_prompt(&longer).contains("not add more than 5 sentences"));
    }

    #[test]
    fn test_build_messages_order_and_roles() {
        let config = Config::default();
        let messages = build_messages("{\"blocks\":[]}", &config);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, "{\"blocks\":[]}");
    }
}
