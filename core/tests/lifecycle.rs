//! End-to-end lifecycle tests: document edits drive debounced requests,
//! streamed responses materialize ghost text, and gestures or focus changes
//! resolve it. All timing runs on simulated `Instant`s.

use ghosttext_core::{
    CompletionController, Config, DeviceClass, Document, GestureHandler, Inline, Key,
    KeyDisposition, Role, StreamMessage, StreamStatus, SuggestionNode, Transaction,
};
use std::time::{Duration, Instant};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

struct Session {
    config: Config,
    ctl: CompletionController,
    keyboard: GestureHandler,
    doc: Document,
    t0: Instant,
}

impl Session {
    fn new(text: &str, device: DeviceClass) -> Self {
        let config = Config::default();
        let ctl = CompletionController::new(&config);
        let keyboard = GestureHandler::new(device, &config);
        let doc = Document::from_text(text);
        let mut session = Session {
            config,
            ctl,
            keyboard,
            doc,
            t0: Instant::now(),
        };
        session.keyboard_focus();
        session
    }

    fn keyboard_focus(&mut self) {
        let Session { ctl, keyboard, doc, .. } = self;
        keyboard.on_focus(ctl, doc);
    }

    /// Type one character at the cursor and notify the controller.
    fn type_char(&mut self, ch: char, at: Duration) {
        let sel = self.doc.selection();
        let mut tx = Transaction::new();
        tx.insert_text(sel, ch.to_string());
        self.doc.commit(tx).unwrap();
        self.ctl.note_edit(self.t0 + at);
    }

    /// Let the debounce elapse and stream a full response for the request.
    fn complete_with(&mut self, content: &str, at: Duration) -> String {
        let req = self.ctl.poll(&self.doc, self.t0 + at).expect("request");
        let msg = StreamMessage::new(
            req.id.clone(),
            Role::Assistant,
            content,
            StreamStatus::Complete,
        );
        assert!(self.ctl.apply_message(&mut self.doc, &msg));
        req.id
    }
}

#[test]
fn test_full_keyboard_lifecycle_tab_confirms() {
    let mut s = Session::new("", DeviceClass::Pointer);

    s.type_char('F', ms(0));
    s.type_char('o', ms(100));
    s.type_char('o', ms(200));
    s.type_char(' ', ms(300));
    assert_eq!(s.doc.text(), "Foo ");

    // No request fires while typing is still fresh.
    assert!(s.ctl.poll(&s.doc, s.t0 + ms(900)).is_none());

    // 800ms after the last edit the request fires with the snapshot.
    let req = s.ctl.poll(&s.doc, s.t0 + ms(1100)).expect("request");
    assert!(req.snapshot.contains("Foo "));

    // Stream two chunks: insert then grow.
    let chunk = StreamMessage::new(&req.id, Role::Assistant, " wor", StreamStatus::Streaming);
    assert!(s.ctl.apply_message(&mut s.doc, &chunk));
    let done = StreamMessage::new(&req.id, Role::Assistant, " world", StreamStatus::Complete);
    assert!(s.ctl.apply_message(&mut s.doc, &done));

    assert_eq!(s.doc.suggestion_count(), 1);
    let (pos, node) = s.doc.find_suggestion(&req.id).unwrap();
    assert_eq!(pos, 4);
    assert_eq!(node.value, " world");
    // Cursor stays before the ghost text.
    assert_eq!(s.doc.selection(), 4);

    // Tab accepts, suppressing the host default.
    let d = s
        .keyboard
        .on_key_down(&mut s.ctl, &mut s.doc, Key::Tab, s.t0 + ms(2000));
    assert_eq!(d, KeyDisposition::Suppressed);
    assert_eq!(s.doc.text(), "Foo world");
    assert_eq!(s.doc.suggestion_count(), 0);
    assert_eq!(s.doc.selection(), 10); // " world" is 6 chars past position 4
}

#[test]
fn test_any_content_key_cancels_before_host_default() {
    let mut s = Session::new("Foo ", DeviceClass::Pointer);
    s.ctl.note_edit(s.t0);
    s.complete_with(" world", ms(800));
    assert_eq!(s.doc.suggestion_count(), 1);

    // The key both cancels and passes through, so the host's insertion of
    // 'x' lands in a document that no longer holds the ghost text.
    let d = s
        .keyboard
        .on_key_down(&mut s.ctl, &mut s.doc, Key::Char('x'), s.t0 + ms(900));
    assert_eq!(d, KeyDisposition::PassThrough);
    assert_eq!(s.doc.suggestion_count(), 0);
    assert_eq!(s.doc.text(), "Foo ");
}

#[test]
fn test_single_pending_invariant_across_streams() {
    let mut s = Session::new("Foo ", DeviceClass::Pointer);

    // First completion arrives.
    s.ctl.note_edit(s.t0);
    s.complete_with(" world", ms(800));

    // User types through the ghost text: cancel fires, then new edits.
    s.keyboard
        .on_key_down(&mut s.ctl, &mut s.doc, Key::Char('b'), s.t0 + ms(900));
    s.type_char('b', ms(900));
    s.type_char('a', ms(1000));
    s.type_char('r', ms(1100));

    // Second completion arrives; exactly one node, the newest, remains.
    let id = s.complete_with(" baz", ms(1900));
    assert_eq!(s.doc.suggestion_count(), 1);
    assert_eq!(s.doc.find_suggestion(&id).unwrap().1.value, " baz");
    assert_eq!(s.doc.text(), "Foo bar baz"); // ghost text contributes its value
}

#[test]
fn test_stale_stream_chunks_are_ignored() {
    let mut s = Session::new("Foo ", DeviceClass::Pointer);

    s.ctl.note_edit(s.t0);
    let first = s.ctl.poll(&s.doc, s.t0 + ms(800)).expect("request");

    // More typing supersedes the first request before its response lands.
    s.type_char('b', ms(900));
    let second = s.ctl.poll(&s.doc, s.t0 + ms(1700)).expect("request");
    assert_ne!(first.id, second.id);

    // Late chunk of the superseded stream changes nothing.
    let stale = StreamMessage::new(&first.id, Role::Assistant, "old", StreamStatus::Streaming);
    assert!(!s.ctl.apply_message(&mut s.doc, &stale));
    assert_eq!(s.doc.suggestion_count(), 0);

    // The live stream applies as usual.
    let live = StreamMessage::new(&second.id, Role::Assistant, "az ", StreamStatus::Complete);
    assert!(s.ctl.apply_message(&mut s.doc, &live));
    assert_eq!(s.doc.suggestion_count(), 1);
}

#[test]
fn test_no_request_when_trailing_content_is_ghost_text() {
    let mut s = Session::new("Foo ", DeviceClass::Pointer);
    s.ctl.note_edit(s.t0);
    s.complete_with(" world", ms(800));
    assert!(matches!(
        s.doc.deepest_last_inline(),
        Some(Inline::Suggestion(_))
    ));

    // A later quiet period elapses, but the ghost text is the trailing
    // content, so no request is issued.
    s.ctl.note_edit(s.t0 + ms(1000));
    assert!(s.ctl.poll(&s.doc, s.t0 + ms(2000)).is_none());
}

#[test]
fn test_focus_loss_suppresses_and_blur_cancels() {
    let mut s = Session::new("Foo ", DeviceClass::Pointer);
    s.ctl.note_edit(s.t0);
    let id = s.complete_with(" wo", ms(800));

    // Blur: the pending ghost text is discarded.
    s.keyboard.on_blur(&mut s.ctl, &mut s.doc);
    assert_eq!(s.doc.suggestion_count(), 0);

    // A chunk arriving while unfocused is dropped.
    let msg = StreamMessage::new(&id, Role::Assistant, " world", StreamStatus::Streaming);
    assert!(!s.ctl.apply_message(&mut s.doc, &msg));

    // Refocusing does not resurrect anything.
    s.keyboard_focus();
    assert_eq!(s.doc.suggestion_count(), 0);
}

#[test]
fn test_touch_double_space_confirms() {
    let mut s = Session::new("Foo ", DeviceClass::Touch);
    s.ctl.note_edit(s.t0);
    s.complete_with("bar", ms(800));

    // First space is typed and swallowed by the gesture; the ghost text
    // shifts past it but stays pending.
    let d1 = s
        .keyboard
        .on_key_down(&mut s.ctl, &mut s.doc, Key::Space, s.t0 + ms(1000));
    assert_eq!(d1, KeyDisposition::Suppressed);
    assert_eq!(s.doc.text(), "Foo  bar");
    assert_eq!(s.doc.suggestion_count(), 1);

    // Second space inside the window confirms instead of typing.
    let d2 = s
        .keyboard
        .on_key_down(&mut s.ctl, &mut s.doc, Key::Space, s.t0 + ms(1200));
    assert_eq!(d2, KeyDisposition::Suppressed);
    assert_eq!(s.doc.text(), "Foo  bar");
    assert_eq!(s.doc.suggestion_count(), 0);
}

#[test]
fn test_touch_lone_space_cancels_after_window() {
    let mut s = Session::new("Foo ", DeviceClass::Touch);
    s.ctl.note_edit(s.t0);
    s.complete_with("bar", ms(800));

    s.keyboard
        .on_key_down(&mut s.ctl, &mut s.doc, Key::Space, s.t0 + ms(1000));
    assert_eq!(s.doc.suggestion_count(), 1);

    // Window still open: nothing happens.
    assert!(!s.keyboard.poll(&mut s.ctl, &mut s.doc, s.t0 + ms(1299)));
    // Window expired: the ghost text is discarded, the typed space stays.
    assert!(s.keyboard.poll(&mut s.ctl, &mut s.doc, s.t0 + ms(1300)));
    assert_eq!(s.doc.text(), "Foo  ");
    assert_eq!(s.doc.suggestion_count(), 0);
}

#[test]
fn test_streamed_quotes_are_trimmed_before_display() {
    let mut s = Session::new("Foo ", DeviceClass::Pointer);
    s.ctl.note_edit(s.t0);
    let req = s.ctl.poll(&s.doc, s.t0 + ms(800)).expect("request");

    let msg = StreamMessage::new(&req.id, Role::Assistant, "\" world\"", StreamStatus::Complete);
    assert!(s.ctl.apply_message(&mut s.doc, &msg));
    assert_eq!(s.doc.find_suggestion(&req.id).unwrap().1.value, " world");
}

#[test]
fn test_markup_round_trip_preserves_identity() {
    let node = SuggestionNode::new("req-7", " say <hi> & \"bye\"", "user");
    let markup = node.to_markup();
    let parsed = SuggestionNode::from_markup(&markup).unwrap();
    assert_eq!(parsed, node);
}

#[test]
fn test_document_json_round_trip_with_ghost_text() {
    let mut s = Session::new("Foo ", DeviceClass::Pointer);
    s.ctl.note_edit(s.t0);
    s.complete_with(" world", ms(800));

    let json = s.doc.to_json().unwrap();
    let restored = Document::from_json(&json).unwrap();
    assert_eq!(restored.text(), s.doc.text());
    assert_eq!(restored.suggestion_count(), 1);
}

#[test]
fn test_confirm_offsets_count_chars() {
    let mut s = Session::new("héllo ", DeviceClass::Pointer);
    assert_eq!(s.doc.selection(), 6);
    s.ctl.note_edit(s.t0);
    s.complete_with("wörld", ms(800));

    s.keyboard
        .on_key_down(&mut s.ctl, &mut s.doc, Key::Tab, s.t0 + ms(1000));
    assert_eq!(s.doc.text(), "héllo wörld");
    assert_eq!(s.doc.selection(), 11);
}

#[test]
fn test_debounce_uses_configured_quiet_period() {
    let mut s = Session::new("Foo ", DeviceClass::Pointer);
    assert_eq!(s.config.debounce_ms, 800);

    s.ctl.note_edit(s.t0);
    assert!(s.ctl.poll(&s.doc, s.t0 + ms(799)).is_none());
    assert!(s.ctl.poll(&s.doc, s.t0 + ms(800)).is_some());
}
