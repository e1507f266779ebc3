//! In-memory simulated surface
//!
//! `SimDriver` behaves like a conforming to-do list UI without a browser,
//! which keeps the whole scenario catalog runnable hermetically. Its quirks
//! exist for the opposite purpose: each one plants a specific conformance
//! fault so the catalog's power to reject a broken surface is itself under
//! test.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::driver::{Driver, Verdict};
use crate::error::{DriverError, DriverResult};
use crate::model::TodoItem;
use crate::step::{Check, Key};
use crate::surface::{Element, TextMatch};

/// Conformance faults the simulated surface can exhibit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimQuirks {
    /// Store submitted text without trimming.
    pub skip_trim: bool,
    /// Create an item from every submission, blank or not.
    pub accept_blank: bool,
    /// Toggling any checkbox flips every item.
    pub toggle_all: bool,
    /// Delete removes the item after the requested one when there is one.
    pub delete_off_by_one: bool,
    /// Leave the input populated after a successful submit.
    pub keep_input: bool,
    /// Never show the zero-items message.
    pub hide_empty_message: bool,
    /// Render completed items without strikethrough.
    pub no_strikethrough: bool,
}

/// Driver over an in-memory list.
pub struct SimDriver {
    items: Vec<TodoItem>,
    input: String,
    focused: Option<Element>,
    navigated: bool,
    quirks: SimQuirks,
}

impl SimDriver {
    /// A surface with no faults.
    pub fn conforming() -> Self {
        Self::with_quirks(SimQuirks::default())
    }

    pub fn with_quirks(quirks: SimQuirks) -> Self {
        SimDriver {
            items: Vec::new(),
            input: String::new(),
            focused: None,
            navigated: false,
            quirks,
        }
    }

    fn require_navigated(&self, action: &str) -> DriverResult<()> {
        if self.navigated {
            Ok(())
        } else {
            Err(DriverError::action(action, "surface not loaded"))
        }
    }

    fn submit_input(&mut self) {
        let raw = self.input.clone();
        let trimmed = raw.trim();

        let accepted = !trimmed.is_empty() || self.quirks.accept_blank;
        if accepted {
            let text = if self.quirks.skip_trim || trimmed.is_empty() {
                raw
            } else {
                trimmed.to_string()
            };
            debug!(text = %text, "sim: item created");
            self.items.push(TodoItem::new(text));
            if !self.quirks.keep_input {
                self.input.clear();
            }
        }
    }

    fn toggle(&mut self, nth: usize) -> DriverResult<()> {
        if nth >= self.items.len() {
            return Err(DriverError::action(
                format!("toggle:{}", nth),
                "no such checkbox",
            ));
        }
        if self.quirks.toggle_all {
            for item in &mut self.items {
                item.completed = !item.completed;
            }
        } else {
            self.items[nth].completed = !self.items[nth].completed;
        }
        Ok(())
    }

    fn delete(&mut self, nth: usize) -> DriverResult<()> {
        if nth >= self.items.len() {
            return Err(DriverError::action(
                format!("delete:{}", nth),
                "no such delete control",
            ));
        }
        let idx = if self.quirks.delete_off_by_one && nth + 1 < self.items.len() {
            nth + 1
        } else {
            nth
        };
        let removed = self.items.remove(idx);
        debug!(text = %removed.text, "sim: item removed");
        Ok(())
    }

    fn empty_message_visible(&self) -> bool {
        self.items.is_empty() && !self.quirks.hide_empty_message
    }

    fn find_item(&self, matcher: &TextMatch) -> Option<&TodoItem> {
        self.items.iter().find(|item| matcher.matches(&item.text))
    }

    fn count_of(&self, target: &Element) -> DriverResult<usize> {
        Ok(match target {
            Element::Heading => 1,
            Element::Input => 1,
            Element::AddButton => 1,
            Element::Item { .. } | Element::Checkbox { .. } | Element::DeleteButton { .. } => {
                self.items.len()
            }
            Element::ItemText { matcher } => self
                .items
                .iter()
                .filter(|item| matcher.matches(&item.text))
                .count(),
            Element::EmptyMessage => usize::from(self.empty_message_visible()),
        })
    }

    fn is_visible(&self, target: &Element) -> DriverResult<bool> {
        Ok(match target {
            Element::Heading | Element::Input | Element::AddButton => self.navigated,
            Element::Item { nth } | Element::Checkbox { nth } | Element::DeleteButton { nth } => {
                *nth < self.items.len()
            }
            Element::ItemText { matcher } => self.find_item(matcher).is_some(),
            Element::EmptyMessage => self.empty_message_visible(),
        })
    }

    fn text_of(&self, target: &Element) -> DriverResult<Option<String>> {
        match target {
            Element::Heading => Ok(Some("Todo App".to_string())),
            Element::EmptyMessage => Ok(self
                .empty_message_visible()
                .then(|| "No todos yet. Add one above!".to_string())),
            Element::Item { nth } => Ok(self.items.get(*nth).map(|item| item.text.clone())),
            Element::ItemText { matcher } => {
                Ok(self.find_item(matcher).map(|item| item.text.clone()))
            }
            other => Err(DriverError::Evaluate(format!(
                "text not observable for {}",
                other.describe()
            ))),
        }
    }
}

#[async_trait]
impl Driver for SimDriver {
    fn name(&self) -> &str {
        "sim"
    }

    async fn navigate(&mut self) -> DriverResult<()> {
        // A fresh navigation resets the surface; nothing persists across it.
        self.items.clear();
        self.input.clear();
        self.focused = None;
        self.navigated = true;
        Ok(())
    }

    async fn fill(&mut self, target: &Element, value: &str) -> DriverResult<()> {
        self.require_navigated("fill")?;
        match target {
            Element::Input => {
                self.input = value.to_string();
                self.focused = Some(Element::Input);
                Ok(())
            }
            other => Err(DriverError::action(
                format!("fill:{}", other.describe()),
                "not a text input",
            )),
        }
    }

    async fn click(&mut self, target: &Element) -> DriverResult<()> {
        self.require_navigated("click")?;
        match target {
            Element::AddButton => {
                self.submit_input();
                Ok(())
            }
            Element::Checkbox { nth } => self.toggle(*nth),
            Element::DeleteButton { nth } => self.delete(*nth),
            Element::Input => {
                self.focused = Some(Element::Input);
                Ok(())
            }
            Element::Heading | Element::Item { .. } | Element::ItemText { .. } => Ok(()),
            Element::EmptyMessage => Ok(()),
        }
    }

    async fn press(&mut self, target: Option<&Element>, key: Key) -> DriverResult<()> {
        self.require_navigated("press")?;
        match (target, key) {
            (Some(Element::Input), Key::Enter) => {
                self.submit_input();
                Ok(())
            }
            (_, Key::Tab) => {
                // Focus moves somewhere else; the list itself is untouched.
                self.focused = None;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    async fn set_checked(&mut self, target: &Element, checked: bool) -> DriverResult<()> {
        self.require_navigated("set_checked")?;
        match target {
            Element::Checkbox { nth } => {
                if *nth >= self.items.len() {
                    return Err(DriverError::action(
                        format!("set_checked:{}", nth),
                        "no such checkbox",
                    ));
                }
                if self.items[*nth].completed != checked {
                    self.toggle(*nth)?;
                }
                Ok(())
            }
            other => Err(DriverError::action(
                format!("set_checked:{}", other.describe()),
                "not a checkbox",
            )),
        }
    }

    async fn focus(&mut self, target: &Element) -> DriverResult<()> {
        self.require_navigated("focus")?;
        self.focused = Some(target.clone());
        Ok(())
    }

    async fn evaluate(&mut self, check: &Check) -> DriverResult<Verdict> {
        self.require_navigated("evaluate")
            .map_err(|_| DriverError::Evaluate("surface not loaded".to_string()))?;

        Ok(match check {
            Check::Visible { target } => {
                let visible = self.is_visible(target)?;
                Verdict::from_bool(visible, if visible { "visible" } else { "not visible" })
            }
            Check::Absent { target } => {
                let count = self.count_of(target)?;
                Verdict::from_bool(count == 0, format!("{} present", count))
            }
            Check::Text { target, expected } => match self.text_of(target)? {
                Some(text) => Verdict::from_bool(text == *expected, format!("{:?}", text)),
                None => Verdict::fail("element absent"),
            },
            Check::InputValue { expected } => {
                Verdict::from_bool(self.input == *expected, format!("{:?}", self.input))
            }
            Check::Checked { nth, expected } => match self.items.get(*nth) {
                Some(item) => Verdict::from_bool(
                    item.completed == *expected,
                    format!("checked={}", item.completed),
                ),
                None => Verdict::fail("no such checkbox"),
            },
            Check::Count { target, expected } => {
                let count = self.count_of(target)?;
                Verdict::from_bool(count == *expected, format!("count={}", count))
            }
            Check::ItemsInOrder { expected } => {
                let texts: Vec<String> =
                    self.items.iter().map(|item| item.text.clone()).collect();
                Verdict::from_bool(texts == *expected, format!("{:?}", texts))
            }
            Check::StruckThrough { matcher, expected } => match self.find_item(matcher) {
                Some(item) => {
                    let struck = item.completed && !self.quirks.no_strikethrough;
                    Verdict::from_bool(struck == *expected, format!("struck={}", struck))
                }
                None => Verdict::fail("element absent"),
            },
            Check::Focused { target } => {
                let focused = self.focused.as_ref() == Some(target);
                Verdict::from_bool(focused, format!("focused={:?}", self.focused))
            }
            Check::Enabled { target } => match target {
                Element::Input | Element::AddButton => Verdict::pass("enabled"),
                other => Verdict::fail(format!("{} has no enabled state", other.describe())),
            },
        })
    }

    async fn capture_artifacts(&mut self, dir: &Path) -> DriverResult<Vec<PathBuf>> {
        #[derive(Serialize)]
        struct Snapshot<'a> {
            items: &'a [TodoItem],
            input: &'a str,
        }

        std::fs::create_dir_all(dir)?;
        let path = dir.join("sim-state.json");
        let snapshot = Snapshot { items: &self.items, input: &self.input };
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| DriverError::Artifact(e.to_string()))?;
        std::fs::write(&path, json)?;
        Ok(vec![path])
    }

    async fn close(&mut self) -> DriverResult<()> {
        self.navigated = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn conforming_surface_trims_and_clears() {
        let mut sim = SimDriver::conforming();
        sim.navigate().await.unwrap();
        sim.fill(&Element::Input, "  Trimmed todo  ").await.unwrap();
        sim.click(&Element::AddButton).await.unwrap();

        let verdict = sim
            .evaluate(&Check::ItemsInOrder { expected: vec!["Trimmed todo".to_string()] })
            .await
            .unwrap();
        assert!(verdict.passed, "{}", verdict.actual);

        let verdict = sim
            .evaluate(&Check::InputValue { expected: String::new() })
            .await
            .unwrap();
        assert!(verdict.passed, "{}", verdict.actual);
    }

    #[tokio::test]
    async fn blank_submission_is_silently_dropped() {
        let mut sim = SimDriver::conforming();
        sim.navigate().await.unwrap();
        sim.fill(&Element::Input, "   ").await.unwrap();
        sim.press(Some(&Element::Input), Key::Enter).await.unwrap();

        let verdict = sim
            .evaluate(&Check::Visible { target: Element::EmptyMessage })
            .await
            .unwrap();
        assert!(verdict.passed, "{}", verdict.actual);
    }

    #[tokio::test]
    async fn skip_trim_quirk_stores_raw_text() {
        let mut sim = SimDriver::with_quirks(SimQuirks { skip_trim: true, ..Default::default() });
        sim.navigate().await.unwrap();
        sim.fill(&Element::Input, "  padded  ").await.unwrap();
        sim.click(&Element::AddButton).await.unwrap();

        let verdict = sim
            .evaluate(&Check::Visible {
                target: Element::ItemText { matcher: TextMatch::Exact("padded".to_string()) },
            })
            .await
            .unwrap();
        assert!(!verdict.passed);
    }

    #[tokio::test]
    async fn navigation_resets_the_list() {
        let mut sim = SimDriver::conforming();
        sim.navigate().await.unwrap();
        sim.fill(&Element::Input, "ephemeral").await.unwrap();
        sim.click(&Element::AddButton).await.unwrap();
        sim.navigate().await.unwrap();

        let verdict = sim
            .evaluate(&Check::Count { target: Element::Item { nth: 0 }, expected: 0 })
            .await
            .unwrap();
        assert!(verdict.passed, "{}", verdict.actual);
    }
}
