//! Streaming completion client.
//!
//! Talks to any OpenAI-compatible chat-completions endpoint with
//! `stream: true` and relays the growing assistant text as `StreamMessage`s
//! tagged with the originating request id. The controller on the other side
//! decides whether each message still applies.
//!
//! Uses `reqwest` blocking client for simplicity - no async runtime needed!
//! Completions are optional polish on top of local editing, so every network
//! or parse failure is silent: the callback simply stops being invoked.

use crate::prompt;
use ghosttext_core::{CompletionRequest, Config, Role, StreamMessage, StreamStatus};
use serde::Deserialize;
use std::io::{BufRead, BufReader};
use std::time::Duration;
use tracing::debug;

/// One parsed server-sent-events line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SsePayload {
    /// A content delta to append to the accumulated text.
    Delta(String),
    /// The `[DONE]` sentinel; the stream is finished.
    Done,
    /// Comments, keep-alives, empty lines, deltas without content.
    Skip,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

fn parse_sse_line(line: &str) -> SsePayload {
    let Some(data) = line.strip_prefix("data:") else {
        return SsePayload::Skip;
    };
    let data = data.trim();
    if data == "[DONE]" {
        return SsePayload::Done;
    }
    match serde_json::from_str::<ChatChunk>(data) {
        Ok(chunk) => match chunk.choices.into_iter().next().and_then(|c| c.delta.content) {
            Some(content) if !content.is_empty() => SsePayload::Delta(content),
            _ => SsePayload::Skip,
        },
        Err(_) => SsePayload::Skip,
    }
}

/// Client for an OpenAI-compatible streaming completion endpoint.
pub struct CompletionClient {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout_ms: u64,
}

impl CompletionClient {
    /// Create a client for `endpoint` (base URL, no trailing path) and model.
    pub fn new<E: Into<String>, M: Into<String>>(endpoint: E, model: M) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: None,
            timeout_ms: 30_000,
        }
    }

    pub fn with_api_key<S: Into<String>>(mut self, key: S) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the whole-request timeout in milliseconds. Streams that outlive
    /// it are cut off mid-flight, which the receiving side tolerates.
    pub fn set_timeout(&mut self, timeout_ms: u64) {
        self.timeout_ms = timeout_ms;
    }

    /// Stream a completion for `request`, invoking `on_message` with the
    /// accumulated text after every delta and once more with `Complete` at
    /// the end of the stream (blocking call with timeout).
    ///
    /// Returns false without invoking the callback further if the request
    /// fails at any point. Completions are optional; failure is silent.
    pub fn stream_completion(
        &self,
        request: &CompletionRequest,
        config: &Config,
        on_message: &mut dyn FnMut(StreamMessage),
    ) -> bool {
        match self.stream_blocking(request, config, on_message) {
            Ok(()) => true,
            Err(err) => {
                debug!(id = %request.id, %err, "completion stream failed");
                false
            }
        }
    }

    fn stream_blocking(
        &self,
        request: &CompletionRequest,
        config: &Config,
        on_message: &mut dyn FnMut(StreamMessage),
    ) -> Result<(), Box<dyn std::error::Error>> {
        let url = format!("{}/v1/chat/completions", self.endpoint.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.model,
            "stream": true,
            "messages": prompt::build_messages(&request.snapshot, config),
        });

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(self.timeout_ms))
            .build()?;

        let mut req = client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let response = req.send()?.error_for_status()?;

        let mut accumulated = String::new();
        let reader = BufReader::new(response);
        for line in reader.lines() {
            match parse_sse_line(&line?) {
                SsePayload::Delta(content) => {
                    accumulated.push_str(&content);
                    on_message(StreamMessage::new(
                        request.id.clone(),
                        Role::Assistant,
                        accumulated.clone(),
                        StreamStatus::Streaming,
                    ));
                }
                SsePayload::Done => break,
                SsePayload::Skip => {}
            }
        }

        on_message(StreamMessage::new(
            request.id.clone(),
            Role::Assistant,
            accumulated,
            StreamStatus::Complete,
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_delta_line() {
        let line = r#"data: {"choices":[{"delta":{"content":" wor"}}]}"#;
        assert_eq!(parse_sse_line(line), SsePayload::Delta(" wor".to_string()));
    }

    #[test]
    fn test_parse_done_sentinel() {
        assert_eq!(parse_sse_line("data: [DONE]"), SsePayload::Done);
        assert_eq!(parse_sse_line("data:[DONE]"), SsePayload::Done);
    }

    #[test]
    fn test_non_data_lines_are_skipped() {
        assert_eq!(parse_sse_line(""), SsePayload::Skip);
        assert_eq!(parse_sse_line(": keep-alive"), SsePayload::Skip);
        assert_eq!(parse_sse_line("event: message"), SsePayload::Skip);
    }

    #[test]
    fn test_empty_or_missing_content_is_skipped() {
        let role_only = r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert_eq!(parse_sse_line(role_only), SsePayload::Skip);
        let empty = r#"data: {"choices":[{"delta":{"content":""}}]}"#;
        assert_eq!(parse_sse_line(empty), SsePayload::Skip);
    }

    #[test]
    fn test_malformed_json_is_skipped() {
        assert_eq!(parse_sse_line("data: {not json"), SsePayload::Skip);
    }

    // Requires a live endpoint; skipped in normal test runs.
    #[test]
    #[ignore]
    fn test_stream_real_network() {
        let endpoint =
            std::env::var("GHOSTTEXT_ENDPOINT").unwrap_or("https://api.openai.com".to_string());
        let mut client = CompletionClient::new(endpoint, "gpt-4o");
        if let Ok(key) = std::env::var("GHOSTTEXT_API_KEY") {
            client = client.with_api_key(key);
        }
        client.set_timeout(10_000);

        let request = CompletionRequest {
            id: "req-1".to_string(),
            snapshot: r#"{"blocks":[{"inlines":[{"type":"text","text":"The weather today is "}]}],"selection":21}"#.to_string(),
        };
        let mut last = None;
        let ok = client.stream_completion(&request, &Config::default(), &mut |msg| {
            last = Some(msg);
        });
        if ok {
            let msg = last.expect("at least the terminal message");
            assert_eq!(msg.status, StreamStatus::Complete);
            println!("completion: {:?}", msg.content);
        }
    }
}
