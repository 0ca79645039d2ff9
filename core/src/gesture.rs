//! Gesture handling for pending suggestions.
//!
//! Keyboard: Tab accepts the pending suggestion and must be suppressed so the
//! host does not also move focus; any other content key discards it and then
//! proceeds normally. Modifier keys on their own do neither.
//!
//! Touch: soft keyboards rarely deliver a usable Tab, so acceptance is a
//! double space within a short window. A lone space is typed as usual but
//! arms a deadline; if no second space arrives before it expires, the
//! suggestion is discarded. Touch input often arrives through composition,
//! so the composition-end and input paths route the composed space through
//! the same tap machinery after undoing its direct insertion.

use crate::controller::CompletionController;
use crate::document::{Document, Transaction};
use crate::timer::{Tap, TapTimer};
use crate::Config;
use std::time::{Duration, Instant};
use tracing::debug;

/// Whether a key event should be swallowed or handed back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// The gesture consumed the event; the host must not apply its default.
    Suppressed,
    /// The host applies its default handling.
    PassThrough,
}

/// Normalized key identity, independent of the host's event encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Tab,
    Space,
    Enter,
    Backspace,
    Escape,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Char(char),
    /// Shift, Ctrl, Alt, Meta and friends pressed on their own.
    Modifier,
}

/// Input device classification, decided once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Pointer,
    Touch,
}

impl DeviceClass {
    /// Classify from viewport width and user-agent string: a narrow viewport
    /// or a known mobile token means touch. Matching is case-insensitive.
    pub fn detect(viewport_width: u32, user_agent: &str, config: &Config) -> Self {
        if viewport_width <= config.touch_max_viewport_width {
            return DeviceClass::Touch;
        }
        let ua = user_agent.to_lowercase();
        if config
            .touch_user_agents
            .iter()
            .any(|token| ua.contains(&token.to_lowercase()))
        {
            return DeviceClass::Touch;
        }
        DeviceClass::Pointer
    }
}

/// Routes key, composition, input and focus events to the controller.
#[derive(Debug)]
pub struct GestureHandler {
    device: DeviceClass,
    tap: TapTimer,
}

impl GestureHandler {
    pub fn new(device: DeviceClass, config: &Config) -> Self {
        Self {
            device,
            tap: TapTimer::new(Duration::from_millis(config.double_tap_window_ms)),
        }
    }

    pub fn device(&self) -> DeviceClass {
        self.device
    }

    /// Handle a key-down event. Only meaningful while a suggestion is
    /// pending; otherwise every key passes through untouched.
    pub fn on_key_down(
        &mut self,
        ctl: &mut CompletionController,
        doc: &mut Document,
        key: Key,
        now: Instant,
    ) -> KeyDisposition {
        if !ctl.has_active_completion() {
            return KeyDisposition::PassThrough;
        }
        match key {
            Key::Tab => {
                ctl.confirm_completion(doc);
                KeyDisposition::Suppressed
            }
            Key::Space if self.device == DeviceClass::Touch => {
                self.handle_space_press(ctl, doc, now)
            }
            Key::Modifier => KeyDisposition::PassThrough,
            _ => {
                debug!(?key, "content key pressed; discarding pending suggestion");
                ctl.cancel_completion(doc);
                KeyDisposition::PassThrough
            }
        }
    }

    /// Composition-end on touch devices. A composed space is undone and
    /// replayed through the tap machinery; any other non-blank composition
    /// is ordinary typing and discards the suggestion.
    pub fn on_composition_end(
        &mut self,
        ctl: &mut CompletionController,
        doc: &mut Document,
        data: &str,
        now: Instant,
    ) {
        if !ctl.has_active_completion() || self.device != DeviceClass::Touch {
            return;
        }
        if data == " " {
            self.remove_space_before_cursor(doc);
            self.handle_space_press(ctl, doc, now);
        } else if !data.trim().is_empty() {
            ctl.cancel_completion(doc);
        }
    }

    /// Direct input on touch devices, for hosts that deliver text without a
    /// composition. Events that are part of a composition are ignored here;
    /// the composition-end path owns them.
    pub fn on_input(
        &mut self,
        ctl: &mut CompletionController,
        doc: &mut Document,
        is_composing: bool,
        data: &str,
        now: Instant,
    ) {
        if !ctl.has_active_completion() || self.device != DeviceClass::Touch || is_composing {
            return;
        }
        if data == " " {
            self.remove_space_before_cursor(doc);
            self.handle_space_press(ctl, doc, now);
        } else if !data.is_empty() {
            ctl.cancel_completion(doc);
        }
    }

    /// The editor gained input focus: streamed updates may apply again. Any
    /// suggestion left over from before the focus change is stale and is
    /// discarded.
    pub fn on_focus(&mut self, ctl: &mut CompletionController, doc: &mut Document) {
        ctl.set_focused(true);
        ctl.cancel_completion(doc);
    }

    /// The editor lost input focus: discard the pending suggestion so stale
    /// ghost text never lingers in a backgrounded editor.
    pub fn on_blur(&mut self, ctl: &mut CompletionController, doc: &mut Document) {
        ctl.set_focused(false);
        ctl.cancel_completion(doc);
        self.tap.clear();
    }

    /// Drive the double-tap deadline. When a lone space's window expires the
    /// pending suggestion is discarded. Returns true if the document changed.
    pub fn poll(
        &mut self,
        ctl: &mut CompletionController,
        doc: &mut Document,
        now: Instant,
    ) -> bool {
        if self.tap.poll(now) && ctl.has_active_completion() {
            debug!("double-tap window expired; discarding pending suggestion");
            return ctl.cancel_completion(doc);
        }
        false
    }

    /// Resolve one space press against the double-tap window. The second tap
    /// of a pair confirms and swallows the key; a first tap types the space
    /// itself and arms the expiry deadline.
    fn handle_space_press(
        &mut self,
        ctl: &mut CompletionController,
        doc: &mut Document,
        now: Instant,
    ) -> KeyDisposition {
        match self.tap.tap(now) {
            Tap::Double => {
                ctl.confirm_completion(doc);
                KeyDisposition::Suppressed
            }
            Tap::Single => {
                let mut tx = Transaction::new();
                tx.insert_text(doc.selection(), " ");
                let _ = doc.commit(tx);
                KeyDisposition::Suppressed
            }
        }
    }

    fn remove_space_before_cursor(&self, doc: &mut Document) {
        let sel = doc.selection();
        if sel > 0 && doc.text_between(sel - 1, sel) == " " {
            let mut tx = Transaction::new();
            tx.delete(sel - 1, sel);
            let _ = doc.commit(tx);
        }
    }
}
