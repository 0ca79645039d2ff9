//! Lifecycle controller: owns the identity of the pending suggestion.
//!
//! One controller per editor instance. It reacts to debounced document
//! changes by issuing generation requests, applies streamed results through
//! the command set, and exposes confirm/cancel entry points for the gesture
//! handler. The controller never assumes a suggestion still exists: every
//! command re-verifies against current document state, so "nothing changed"
//! is always an acceptable outcome.

use crate::commands;
use crate::document::{Document, Inline};
use crate::node::SuggestionNode;
use crate::stream::{CompletionRequest, Role, StreamMessage};
use crate::timer::Debouncer;
use crate::utils;
use crate::Config;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Drives the pending-suggestion state machine for one editor instance.
#[derive(Debug)]
pub struct CompletionController {
    /// Identity of the suggestion currently materialized in the document,
    /// or None if no suggestion is pending.
    current_suggestion_id: Option<String>,

    /// Identity of the newest issued generation request. Messages for any
    /// other response id are stale and ignored (newest request wins).
    pending_request_id: Option<String>,

    /// Monotonic counter backing request ids.
    request_seq: u64,

    /// Quiet-period detector for document changes.
    debouncer: Debouncer,

    /// Streamed updates are applied only while the editor has input focus.
    focused: bool,

    /// Provenance tag written into inserted suggestion nodes.
    kind: String,
}

impl CompletionController {
    pub fn new(config: &Config) -> Self {
        Self {
            current_suggestion_id: None,
            pending_request_id: None,
            request_seq: 0,
            debouncer: Debouncer::new(Duration::from_millis(config.debounce_ms)),
            focused: false,
            kind: config.suggestion_kind.clone(),
        }
    }

    /// Identity of the pending suggestion, if any.
    pub fn current_suggestion_id(&self) -> Option<&str> {
        self.current_suggestion_id.as_deref()
    }

    pub fn has_active_completion(&self) -> bool {
        self.current_suggestion_id.is_some()
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// Record a document edit: reschedules the quiet-period deadline so only
    /// one generation request fires per burst of typing.
    pub fn note_edit(&mut self, now: Instant) {
        self.debouncer.note(now);
    }

    /// Drive the debounce deadline. Returns a request to hand to the
    /// completion source once the quiet period elapses. No request is issued
    /// while the trailing content of the document is itself a pending
    /// suggestion: asking the model to complete its own unconfirmed output
    /// would loop.
    pub fn poll(&mut self, doc: &Document, now: Instant) -> Option<CompletionRequest> {
        if !self.debouncer.fire(now) {
            return None;
        }
        if matches!(doc.deepest_last_inline(), Some(Inline::Suggestion(_))) {
            trace!("trailing content is a suggestion; no request issued");
            return None;
        }
        let snapshot = doc.to_json().ok()?;
        self.request_seq += 1;
        let id = format!("req-{}", self.request_seq);
        self.pending_request_id = Some(id.clone());
        debug!(id = %id, "issuing generation request");
        Some(CompletionRequest { id, snapshot })
    }

    /// Apply one streamed message. Returns true if the document changed.
    ///
    /// The first chunk of the tracked response inserts a fresh suggestion
    /// node; later chunks rewrite its value in place. Messages are skipped
    /// (not queued, not retried) when the editor is unfocused, when they are
    /// not assistant output, or when they belong to a superseded request.
    pub fn apply_message(&mut self, doc: &mut Document, msg: &StreamMessage) -> bool {
        if msg.role != Role::Assistant {
            return false;
        }
        if !self.focused {
            trace!(id = %msg.response_id, "editor unfocused; suppressing stream update");
            return false;
        }
        if self.pending_request_id.as_deref() != Some(msg.response_id.as_str()) {
            trace!(id = %msg.response_id, "stale response id; ignoring chunk");
            return false;
        }

        let value = utils::trim_wrapping_quotes(&utils::nfc(&msg.content)).to_string();

        if self.current_suggestion_id.as_deref() == Some(msg.response_id.as_str()) {
            commands::update_suggestion(doc, &msg.response_id, &value)
        } else {
            let node = SuggestionNode::new(msg.response_id.clone(), value, self.kind.clone());
            let inserted = commands::insert_suggestion(doc, node);
            if inserted {
                self.current_suggestion_id = Some(msg.response_id.clone());
            }
            inserted
        }
    }

    /// Accept the pending suggestion, materializing it as plain text.
    /// No-op when nothing is pending. Returns true if the document changed.
    pub fn confirm_completion(&mut self, doc: &mut Document) -> bool {
        let Some(id) = self.current_suggestion_id.take() else {
            return false;
        };
        self.pending_request_id = None;
        commands::confirm_suggestion(doc, &id)
    }

    /// Discard the pending suggestion. The recorded id is cleared
    /// unconditionally, so this also serves as a controller reset even when
    /// there was nothing to cancel. Returns true if the document changed.
    pub fn cancel_completion(&mut self, doc: &mut Document) -> bool {
        let changed = match self.current_suggestion_id.as_deref() {
            Some(id) => commands::cancel_suggestion(doc, id),
            None => false,
        };
        self.current_suggestion_id = None;
        self.pending_request_id = None;
        changed
    }
}
