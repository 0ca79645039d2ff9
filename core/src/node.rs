//! Suggestion node: the atomic inline leaf carrying a pending completion.
//!
//! A `SuggestionNode` holds `{id, value, kind}`. The document tree treats it
//! as a single indivisible unit: it occupies exactly one position regardless
//! of how long its `value` grows, it cannot be split, and its text is only
//! editable through the `SetSuggestionValue` transaction step. Rendering it
//! non-draggable and non-selectable is the view's job; the model enforces
//! atomicity.

use serde::{Deserialize, Serialize};

/// An atomic inline leaf holding a pending completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionNode {
    /// Opaque identity correlating to one generation request/response pair.
    pub id: String,
    /// Current textual content; mutates in place as streaming progresses.
    pub value: String,
    /// Provenance tag (e.g. "user"); empty by default.
    #[serde(default)]
    pub kind: String,
}

impl SuggestionNode {
    pub fn new<I, V, K>(id: I, value: V, kind: K) -> Self
    where
        I: Into<String>,
        V: Into<String>,
        K: Into<String>,
    {
        Self {
            id: id.into(),
            value: value.into(),
            kind: kind.into(),
        }
    }

    /// Textual length of the suggestion in chars.
    ///
    /// This is what cursor math after `confirm` uses; it is distinct from the
    /// node's position size, which is always 1.
    pub fn text_len(&self) -> usize {
        self.value.chars().count()
    }

    /// Render the node to its markup representation:
    /// `<span data-id="ID" data-suggestion="KIND">VALUE</span>`.
    pub fn to_markup(&self) -> String {
        format!(
            "<span data-id=\"{}\" data-suggestion=\"{}\">{}</span>",
            escape_attr(&self.id),
            escape_attr(&self.kind),
            escape_text(&self.value),
        )
    }

    /// Parse a node back from its markup representation.
    ///
    /// Returns `None` for anything that is not a well-formed suggestion span.
    /// Attribute order does not matter; a missing `data-suggestion` attribute
    /// yields an empty `kind`, matching the node's default.
    pub fn from_markup(markup: &str) -> Option<Self> {
        let rest = markup.trim().strip_prefix("<span")?;
        let attr_end = rest.find('>')?;
        let (attrs, body) = rest.split_at(attr_end);
        let value = body
            .strip_prefix('>')?
            .strip_suffix("</span>")?
            .to_string();

        let mut id = None;
        let mut kind = String::new();
        for (name, raw) in parse_attrs(attrs) {
            match name {
                "data-id" => id = Some(unescape(raw)),
                "data-suggestion" => kind = unescape(raw),
                _ => {}
            }
        }

        Some(Self {
            id: id?,
            value: unescape(&value),
            kind,
        })
    }
}

/// Iterate `name="value"` pairs in an attribute string.
fn parse_attrs(mut attrs: &str) -> Vec<(&str, &str)> {
    let mut pairs = Vec::new();
    loop {
        attrs = attrs.trim_start();
        let Some(eq) = attrs.find("=\"") else {
            return pairs;
        };
        let name = &attrs[..eq];
        let rest = &attrs[eq + 2..];
        let Some(close) = rest.find('"') else {
            return pairs;
        };
        pairs.push((name, &rest[..close]));
        attrs = &rest[close + 1..];
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

fn unescape(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_len_counts_chars() {
        let node = SuggestionNode::new("a", " wörld", "user");
        assert_eq!(node.text_len(), 6);
    }

    #[test]
    fn test_markup_round_trip() {
        let node = SuggestionNode::new("abc-123", " hello world", "user");
        let markup = node.to_markup();
        assert_eq!(
            markup,
            "<span data-id=\"abc-123\" data-suggestion=\"user\"> hello world</span>"
        );
        assert_eq!(SuggestionNode::from_markup(&markup), Some(node));
    }

    #[test]
    fn test_markup_escapes_special_chars() {
        let node = SuggestionNode::new("a\"b", "1 < 2 & 3 > 0", "");
        let round_tripped = SuggestionNode::from_markup(&node.to_markup()).unwrap();
        assert_eq!(round_tripped, node);
    }

    #[test]
    fn test_markup_attribute_order_is_irrelevant() {
        let parsed = SuggestionNode::from_markup(
            "<span data-suggestion=\"user\" data-id=\"x\">hi</span>",
        )
        .unwrap();
        assert_eq!(parsed.id, "x");
        assert_eq!(parsed.kind, "user");
        assert_eq!(parsed.value, "hi");
    }

    #[test]
    fn test_markup_missing_kind_defaults_empty() {
        let parsed = SuggestionNode::from_markup("<span data-id=\"x\">hi</span>").unwrap();
        assert_eq!(parsed.kind, "");
    }

    #[test]
    fn test_markup_rejects_malformed_input() {
        assert_eq!(SuggestionNode::from_markup("<div data-id=\"x\">hi</div>"), None);
        assert_eq!(SuggestionNode::from_markup("<span>hi</span>"), None);
        assert_eq!(SuggestionNode::from_markup("plain text"), None);
    }
}
