//! Reference model of the list semantics the contract polices
//!
//! Composite scenarios use this model to compute the state a conforming
//! surface must end up in, so cumulative-effect assertions are derived
//! rather than hand-maintained.

use serde::{Deserialize, Serialize};

/// One to-do entry as the user can observe it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub text: String,
    pub completed: bool,
}

impl TodoItem {
    pub fn new(text: impl Into<String>) -> Self {
        TodoItem { text: text.into(), completed: false }
    }
}

/// The canonical list behavior: ordered, duplicates allowed, trim on submit,
/// blank submissions silently rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoModel {
    items: Vec<TodoItem>,
}

impl TodoModel {
    pub fn new() -> Self {
        TodoModel::default()
    }

    /// Submit raw input text. Returns whether an item was created.
    ///
    /// Leading/trailing whitespace is removed; input that trims to empty
    /// creates nothing and surfaces no error.
    pub fn submit(&mut self, raw: &str) -> bool {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.items.push(TodoItem::new(trimmed));
        true
    }

    /// Flip the completed flag of the nth item. Returns false if out of range.
    pub fn toggle(&mut self, nth: usize) -> bool {
        match self.items.get_mut(nth) {
            Some(item) => {
                item.completed = !item.completed;
                true
            }
            None => false,
        }
    }

    /// Remove exactly the nth item, leaving the rest in order.
    pub fn delete(&mut self, nth: usize) -> Option<TodoItem> {
        if nth < self.items.len() {
            Some(self.items.remove(nth))
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[TodoItem] {
        &self.items
    }

    pub fn texts(&self) -> Vec<String> {
        self.items.iter().map(|item| item.text.clone()).collect()
    }

    pub fn completed(&self, nth: usize) -> Option<bool> {
        self.items.get(nth).map(|item| item.completed)
    }
}
