//! The suggestion command set: insert, update, cancel, confirm.
//!
//! Each command is all-or-nothing against the document's current state and
//! returns a bool: false means the preconditions were not met and nothing
//! changed. Failures are never surfaced as errors; a suggestion that is no
//! longer there is an acceptable outcome, not a fault.
//!
//! Commands never trust cached offsets. The document may have changed between
//! the moment a caller learned an id and the moment the command runs, so
//! every command re-derives positions by scanning the tree.

use crate::document::{Document, Inline, Transaction};
use crate::node::SuggestionNode;
use tracing::debug;

/// Insert a new suggestion node at the cursor, removing every existing one
/// first so the document never holds more than one. The cursor stays
/// immediately before the inserted node, so subsequent typing lands in front
/// of it.
pub fn insert_suggestion(doc: &mut Document, attrs: SuggestionNode) -> bool {
    let cursor = doc.selection();
    let existing = doc.suggestion_positions();

    let mut tx = Transaction::new();
    // Remove in reverse position order so earlier offsets stay valid.
    for (pos, _) in existing.iter().rev() {
        tx.delete(*pos, pos + 1);
    }
    let at = cursor - existing.iter().filter(|(pos, _)| *pos < cursor).count();
    let id = attrs.id.clone();
    tx.insert_node(at, Inline::Suggestion(attrs));
    tx.set_selection(at);

    let ok = doc.commit(tx).is_ok();
    if ok {
        debug!(id = %id, at, "inserted suggestion");
    }
    ok
}

/// Rewrite the value of the suggestion with the given id, leaving id and kind
/// untouched. Any *other* suggestion node is removed first, re-establishing
/// the single-pending invariant even if it was somehow violated. Returns
/// false if no node with this id exists.
pub fn update_suggestion(doc: &mut Document, id: &str, value: &str) -> bool {
    let Some((target, _)) = doc.find_suggestion(id) else {
        return false;
    };
    let others: Vec<usize> = doc
        .suggestion_positions()
        .into_iter()
        .filter(|(_, other_id)| other_id != id)
        .map(|(pos, _)| pos)
        .collect();

    let mut tx = Transaction::new();
    for pos in others.iter().rev() {
        tx.delete(*pos, pos + 1);
    }
    // Recompute the target position for the removals that precede it.
    let at = target - others.iter().filter(|pos| **pos < target).count();
    tx.set_suggestion_value(at, value);

    // Preserve the cursor when it sits at or before the target's original
    // position; otherwise default transaction mapping applies.
    let sel = doc.selection();
    if sel <= target {
        let mapped = sel - others.iter().filter(|pos| **pos < sel).count();
        tx.set_selection(mapped);
    }

    let ok = doc.commit(tx).is_ok();
    if ok {
        debug!(id = %id, at, "updated suggestion");
    }
    ok
}

/// Delete the suggestion with the given id. The cursor is unaffected beyond
/// the implicit offset shift. Returns false if no node with this id exists.
pub fn cancel_suggestion(doc: &mut Document, id: &str) -> bool {
    let Some((pos, _)) = doc.find_suggestion(id) else {
        return false;
    };
    let mut tx = Transaction::new();
    tx.delete(pos, pos + 1);

    let ok = doc.commit(tx).is_ok();
    if ok {
        debug!(id = %id, pos, "cancelled suggestion");
    }
    ok
}

/// Replace the suggestion with the given id by plain text equal to its
/// current value, and move the cursor to the end of that text. Returns false
/// if no node with this id exists.
pub fn confirm_suggestion(doc: &mut Document, id: &str) -> bool {
    let Some((pos, node)) = doc.find_suggestion(id) else {
        return false;
    };
    let value = node.value.clone();
    let text_len = node.text_len();

    let mut tx = Transaction::new();
    tx.delete(pos, pos + 1);
    tx.insert_text(pos, value);
    tx.set_selection(pos + text_len);

    let ok = doc.commit(tx).is_ok();
    if ok {
        debug!(id = %id, pos, "confirmed suggestion");
    }
    ok
}
