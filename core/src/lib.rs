//! ghosttext-core
//!
//! Inline ghost-text suggestion engine: document model, suggestion command
//! set, lifecycle controller and gesture handling, shared by transport
//! crates.
//!
//! Public API:
//! - `SuggestionNode` - Atomic inline suggestion leaf
//! - `Document` / `Transaction` - Block/inline document model with
//!   all-or-nothing edits and selection mapping
//! - `commands` - insert/update/cancel/confirm against the single pending
//!   suggestion
//! - `CompletionController` - Debounced request lifecycle and stream
//!   application
//! - `GestureHandler` - Keyboard and touch confirm/cancel gestures
//! - `Config` - Configuration and tuning knobs

use serde::{Deserialize, Serialize};

pub mod node;
pub use node::SuggestionNode;

pub mod document;
pub use document::{Block, Document, Inline, Step, Transaction, TransactionError};

pub mod commands;
pub use commands::{cancel_suggestion, confirm_suggestion, insert_suggestion, update_suggestion};

pub mod timer;
pub use timer::{Debouncer, Tap, TapTimer};

pub mod stream;
pub use stream::{CompletionRequest, Role, StreamMessage, StreamStatus};

pub mod controller;
pub use controller::CompletionController;

pub mod gesture;
pub use gesture::{DeviceClass, GestureHandler, Key, KeyDisposition};

/// Engine configuration and tuning knobs.
///
/// Transport-specific options (endpoints, models, credentials) belong to the
/// transport crates, not here.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Quiet period after the last edit before a generation request fires,
    /// in milliseconds.
    pub debounce_ms: u64,

    /// Window within which a second space counts as a confirm gesture on
    /// touch devices, in milliseconds.
    pub double_tap_window_ms: u64,

    /// Viewports at or below this width (CSS pixels) are classified as touch.
    pub touch_max_viewport_width: u32,

    /// User-agent substrings (case-insensitive) that classify as touch.
    pub touch_user_agents: Vec<String>,

    /// Provenance tag stamped on inserted suggestion nodes.
    pub suggestion_kind: String,

    /// Upper bound on completion length requested from the generator,
    /// in sentences.
    pub max_completion_sentences: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debounce_ms: 800,
            double_tap_window_ms: 300,
            touch_max_viewport_width: 768,
            touch_user_agents: [
                "Android",
                "webOS",
                "iPhone",
                "iPad",
                "iPod",
                "BlackBerry",
                "IEMobile",
                "Opera Mini",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            suggestion_kind: "user".to_string(),
            max_completion_sentences: 2,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Utility helpers.
pub mod utils {
    /// Normalize a string to NFC.
    pub fn nfc(s: &str) -> String {
        use unicode_normalization::UnicodeNormalization;
        s.nfc().collect()
    }

    /// Strip one layer of wrapping quotes when the first and last character
    /// are the same quote mark. Generators occasionally quote their output;
    /// the quotes are never part of the continuation.
    pub fn trim_wrapping_quotes(s: &str) -> &str {
        const QUOTES: [char; 3] = ['"', '\'', '`'];
        let mut chars = s.chars();
        let (Some(first), Some(last)) = (chars.next(), chars.next_back()) else {
            return s;
        };
        if first == last && QUOTES.contains(&first) {
            &s[first.len_utf8()..s.len() - last.len_utf8()]
        } else {
            s
        }
    }
}
