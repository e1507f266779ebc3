//! The surface vocabulary: what a conforming to-do list UI must expose
//!
//! Elements are identified by accessible role, name, placeholder, or text
//! content. Drivers resolve them through whatever discovery mechanism their
//! backend offers; nothing in the contract refers to markup structure or
//! styling hooks.

use serde::{Deserialize, Serialize};

/// Accessible name the heading must match (case-insensitive).
pub const HEADING_NAME: &str = "todo app";

/// Placeholder fragment identifying the add-todo input.
pub const INPUT_PLACEHOLDER: &str = "Add a new todo";

/// Accessible name the submit control must match (case-insensitive).
pub const ADD_BUTTON_NAME: &str = "add todo";

/// Accessible name per-item delete controls must match (case-insensitive).
pub const DELETE_BUTTON_NAME: &str = "delete";

/// Content fragment identifying the zero-items message (case-insensitive).
pub const EMPTY_MESSAGE_TEXT: &str = "no todos yet";

/// How textual content is matched against the rendered surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", content = "value", rename_all = "snake_case")]
pub enum TextMatch {
    /// The rendered text equals the value exactly.
    Exact(String),
    /// The rendered text contains the value, case-insensitively.
    Contains(String),
}

impl TextMatch {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            TextMatch::Exact(expected) => text == expected,
            TextMatch::Contains(needle) => {
                text.to_lowercase().contains(&needle.to_lowercase())
            }
        }
    }

    /// The raw pattern value, for labelling.
    pub fn pattern(&self) -> &str {
        match self {
            TextMatch::Exact(value) | TextMatch::Contains(value) => value,
        }
    }
}

/// A discoverable part of the target surface.
///
/// `nth` indices are in document order; items, their checkboxes, and their
/// delete controls share indices because a conforming surface renders exactly
/// one checkbox and one delete control per item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "element", rename_all = "snake_case")]
pub enum Element {
    /// The application heading.
    Heading,

    /// The add-todo text input.
    Input,

    /// The submit control.
    AddButton,

    /// The nth rendered item.
    Item {
        #[serde(default)]
        nth: usize,
    },

    /// An item label located by its text.
    ItemText { matcher: TextMatch },

    /// The nth item checkbox.
    Checkbox {
        #[serde(default)]
        nth: usize,
    },

    /// The nth item delete control.
    DeleteButton {
        #[serde(default)]
        nth: usize,
    },

    /// The zero-items message.
    EmptyMessage,
}

impl Element {
    /// Short label used in step names and failure messages.
    pub fn describe(&self) -> String {
        match self {
            Element::Heading => "heading".to_string(),
            Element::Input => "input".to_string(),
            Element::AddButton => "add-button".to_string(),
            Element::Item { nth } => format!("item[{}]", nth),
            Element::ItemText { matcher } => format!("item-text({:?})", matcher.pattern()),
            Element::Checkbox { nth } => format!("checkbox[{}]", nth),
            Element::DeleteButton { nth } => format!("delete-button[{}]", nth),
            Element::EmptyMessage => "empty-message".to_string(),
        }
    }
}
