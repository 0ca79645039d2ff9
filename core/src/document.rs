//! Document tree with integer-offset positions and atomic transactions.
//!
//! The document is an ordered tree: blocks (paragraphs) containing inline
//! content. Positions are integer offsets over a depth-first walk of the
//! inline content: each text char counts 1, a suggestion node counts 1
//! (atomic, regardless of its value length), and each block boundary after
//! the first counts 1. Offsets shift whenever content is inserted or removed
//! before them, so they are never cached across asynchronous boundaries;
//! lookups re-scan the tree by id instead.
//!
//! All mutation goes through a `Transaction`: an ordered batch of steps that
//! either applies in full or not at all. The cursor is mapped through every
//! step automatically unless a `SetSelection` step overrides it.

use crate::node::SuggestionNode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inline content: plain text or an atomic suggestion node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    Text { text: String },
    Suggestion(SuggestionNode),
}

impl Inline {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Inline::Text { text: text.into() }
    }

    /// Size in position units: char count for text, always 1 for a
    /// suggestion node.
    pub fn size(&self) -> usize {
        match self {
            Inline::Text { text } => text.chars().count(),
            Inline::Suggestion(_) => 1,
        }
    }

    /// Textual length in chars (a suggestion node reports its value length).
    pub fn text_len(&self) -> usize {
        match self {
            Inline::Text { text } => text.chars().count(),
            Inline::Suggestion(node) => node.text_len(),
        }
    }

    pub fn is_suggestion(&self) -> bool {
        matches!(self, Inline::Suggestion(_))
    }

    pub fn as_suggestion(&self) -> Option<&SuggestionNode> {
        match self {
            Inline::Suggestion(node) => Some(node),
            Inline::Text { .. } => None,
        }
    }
}

/// A block-level node (paragraph) holding ordered inline content.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Block {
    pub inlines: Vec<Inline>,
}

/// Unit of content in the flattened position space.
#[derive(Debug, Clone)]
enum Atom {
    Char(char),
    Node(SuggestionNode),
    Break,
}

/// A single mutation inside a transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Delete the content in `from..to`.
    Delete { from: usize, to: usize },
    /// Insert an inline node at `at`.
    InsertNode { at: usize, node: Inline },
    /// Rewrite the value of the suggestion node at `at`, leaving id and kind
    /// untouched. Fails if `at` is not a suggestion node.
    SetSuggestionValue { at: usize, value: String },
    /// Move the cursor to `at`, overriding automatic mapping.
    SetSelection { at: usize },
}

/// An atomic batch of document mutations applied as a single commit.
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    steps: Vec<Step>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delete(&mut self, from: usize, to: usize) -> &mut Self {
        self.steps.push(Step::Delete { from, to });
        self
    }

    pub fn insert_node(&mut self, at: usize, node: Inline) -> &mut Self {
        self.steps.push(Step::InsertNode { at, node });
        self
    }

    pub fn insert_text<S: Into<String>>(&mut self, at: usize, text: S) -> &mut Self {
        self.insert_node(at, Inline::text(text))
    }

    pub fn set_suggestion_value<S: Into<String>>(&mut self, at: usize, value: S) -> &mut Self {
        self.steps.push(Step::SetSuggestionValue {
            at,
            value: value.into(),
        });
        self
    }

    pub fn set_selection(&mut self, at: usize) -> &mut Self {
        self.steps.push(Step::SetSelection { at });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Why a transaction failed to commit. The document is untouched either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    OutOfBounds { at: usize, len: usize },
    InvalidRange { from: usize, to: usize, len: usize },
    NotASuggestion { at: usize },
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionError::OutOfBounds { at, len } => {
                write!(f, "position {} out of bounds (len {})", at, len)
            }
            TransactionError::InvalidRange { from, to, len } => {
                write!(f, "invalid range {}..{} (len {})", from, to, len)
            }
            TransactionError::NotASuggestion { at } => {
                write!(f, "node at position {} is not a suggestion", at)
            }
        }
    }
}

impl std::error::Error for TransactionError {}

/// The document tree plus the cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    blocks: Vec<Block>,
    selection: usize,
}

impl Document {
    /// Create an empty single-paragraph document with the cursor at 0.
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::default()],
            selection: 0,
        }
    }

    /// Create a single-paragraph document from plain text, cursor at the end.
    pub fn from_text<S: Into<String>>(text: S) -> Self {
        let text = text.into();
        let selection = text.chars().count();
        let inlines = if text.is_empty() {
            Vec::new()
        } else {
            vec![Inline::text(text)]
        };
        Self {
            blocks: vec![Block { inlines }],
            selection,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Total size of the document in position units.
    pub fn len(&self) -> usize {
        let content: usize = self
            .blocks
            .iter()
            .map(|b| b.inlines.iter().map(Inline::size).sum::<usize>())
            .sum();
        content + self.blocks.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current cursor offset.
    pub fn selection(&self) -> usize {
        self.selection
    }

    /// Move the cursor, clamped into the valid range.
    pub fn set_selection(&mut self, at: usize) {
        self.selection = at.min(self.len());
    }

    /// Every inline node with its position, in document order.
    pub fn descendants(&self) -> Vec<(usize, &Inline)> {
        let mut out = Vec::new();
        let mut pos = 0;
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                pos += 1;
            }
            for inline in &block.inlines {
                out.push((pos, inline));
                pos += inline.size();
            }
        }
        out
    }

    /// Positions and ids of every suggestion node, in document order.
    pub fn suggestion_positions(&self) -> Vec<(usize, String)> {
        self.descendants()
            .into_iter()
            .filter_map(|(pos, inline)| {
                inline.as_suggestion().map(|node| (pos, node.id.clone()))
            })
            .collect()
    }

    pub fn suggestion_count(&self) -> usize {
        self.descendants()
            .iter()
            .filter(|(_, inline)| inline.is_suggestion())
            .count()
    }

    /// Scan the tree for the suggestion node with the given id.
    pub fn find_suggestion(&self, id: &str) -> Option<(usize, &SuggestionNode)> {
        self.descendants().into_iter().find_map(|(pos, inline)| {
            inline
                .as_suggestion()
                .filter(|node| node.id == id)
                .map(|node| (pos, node))
        })
    }

    /// The deepest last content node of the document, if any.
    ///
    /// Used to decide whether the trailing content is itself a pending
    /// suggestion (in which case no new generation request should fire).
    pub fn deepest_last_inline(&self) -> Option<&Inline> {
        self.blocks
            .iter()
            .rev()
            .find_map(|block| block.inlines.last())
    }

    /// Full document text; suggestion nodes contribute their value, block
    /// boundaries contribute a newline.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            for inline in &block.inlines {
                match inline {
                    Inline::Text { text } => out.push_str(text),
                    Inline::Suggestion(node) => out.push_str(&node.value),
                }
            }
        }
        out
    }

    /// Text in `from..to` of the position space (clamped). A suggestion node
    /// contributes its value, a block boundary a newline.
    pub fn text_between(&self, from: usize, to: usize) -> String {
        let atoms = self.to_atoms();
        let to = to.min(atoms.len());
        if from >= to {
            return String::new();
        }
        let mut out = String::new();
        for atom in &atoms[from..to] {
            match atom {
                Atom::Char(c) => out.push(*c),
                Atom::Node(node) => out.push_str(&node.value),
                Atom::Break => out.push('\n'),
            }
        }
        out
    }

    /// Serialize the document to JSON (the generation-request snapshot form).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a document back from its JSON snapshot.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut doc: Document = serde_json::from_str(json)?;
        doc.blocks = Self::rebuild(doc.to_atoms());
        doc.selection = doc.selection.min(doc.len());
        Ok(doc)
    }

    /// Apply a transaction atomically. Either every step applies and the new
    /// state becomes visible in one commit, or the document is unchanged.
    pub fn commit(&mut self, tx: Transaction) -> Result<(), TransactionError> {
        let mut atoms = self.to_atoms();
        let mut selection = self.selection;

        for step in &tx.steps {
            match step {
                Step::Delete { from, to } => {
                    if from > to || *to > atoms.len() {
                        return Err(TransactionError::InvalidRange {
                            from: *from,
                            to: *to,
                            len: atoms.len(),
                        });
                    }
                    atoms.drain(from..to);
                    let removed = to - from;
                    if selection >= *to {
                        selection -= removed;
                    } else if selection > *from {
                        selection = *from;
                    }
                }
                Step::InsertNode { at, node } => {
                    if *at > atoms.len() {
                        return Err(TransactionError::OutOfBounds {
                            at: *at,
                            len: atoms.len(),
                        });
                    }
                    match node {
                        Inline::Text { text } => {
                            atoms.splice(at..at, text.chars().map(Atom::Char));
                        }
                        Inline::Suggestion(n) => atoms.insert(*at, Atom::Node(n.clone())),
                    }
                    if selection >= *at {
                        selection += node.size();
                    }
                }
                Step::SetSuggestionValue { at, value } => match atoms.get_mut(*at) {
                    Some(Atom::Node(node)) => node.value = value.clone(),
                    Some(_) => return Err(TransactionError::NotASuggestion { at: *at }),
                    None => {
                        return Err(TransactionError::OutOfBounds {
                            at: *at,
                            len: atoms.len(),
                        })
                    }
                },
                Step::SetSelection { at } => {
                    if *at > atoms.len() {
                        return Err(TransactionError::OutOfBounds {
                            at: *at,
                            len: atoms.len(),
                        });
                    }
                    selection = *at;
                }
            }
        }

        self.blocks = Self::rebuild(atoms);
        self.selection = selection.min(self.len());
        Ok(())
    }

    /// Flatten the tree into the position space.
    fn to_atoms(&self) -> Vec<Atom> {
        let mut atoms = Vec::new();
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                atoms.push(Atom::Break);
            }
            for inline in &block.inlines {
                match inline {
                    Inline::Text { text } => atoms.extend(text.chars().map(Atom::Char)),
                    Inline::Suggestion(node) => atoms.push(Atom::Node(node.clone())),
                }
            }
        }
        atoms
    }

    /// Rebuild the tree from atoms. Adjacent text merges and empty text
    /// inlines disappear as a side effect.
    fn rebuild(atoms: Vec<Atom>) -> Vec<Block> {
        let mut blocks = vec![Block::default()];
        let mut text = String::new();

        fn flush(blocks: &mut [Block], text: &mut String) {
            if !text.is_empty() {
                let block = blocks.last_mut().expect("at least one block");
                block.inlines.push(Inline::Text {
                    text: std::mem::take(text),
                });
            }
        }

        for atom in atoms {
            match atom {
                Atom::Char(c) => text.push(c),
                Atom::Node(node) => {
                    flush(&mut blocks, &mut text);
                    let block = blocks.last_mut().expect("at least one block");
                    block.inlines.push(Inline::Suggestion(node));
                }
                Atom::Break => {
                    flush(&mut blocks, &mut text);
                    blocks.push(Block::default());
                }
            }
        }
        flush(&mut blocks, &mut text);
        blocks
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
