//! Steps and checks: the operations scenarios are written in

use serde::{Deserialize, Serialize};

use crate::surface::{Element, TextMatch};

/// Keys scenarios are allowed to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Enter,
    Tab,
}

impl Key {
    /// Key name as understood by browser automation backends.
    pub fn as_str(&self) -> &'static str {
        match self {
            Key::Enter => "Enter",
            Key::Tab => "Tab",
        }
    }
}

/// A single step in a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Load the target surface fresh. Every scenario starts here; a reload
    /// resets the list.
    Navigate,

    /// Replace the content of a text input.
    Fill { target: Element, value: String },

    /// Click an element.
    Click { target: Element },

    /// Press a key, either into a specific element or at page level.
    Press {
        #[serde(default)]
        target: Option<Element>,
        key: Key,
    },

    /// Set a checkbox to checked.
    Check { target: Element },

    /// Set a checkbox to unchecked.
    Uncheck { target: Element },

    /// Give an element keyboard focus.
    Focus { target: Element },

    /// Assert an observation about the surface. Polled until it holds or the
    /// assertion timeout elapses.
    Expect { check: Check },
}

impl Step {
    /// Label used in step reports.
    pub fn label(&self) -> String {
        match self {
            Step::Navigate => "navigate".to_string(),
            Step::Fill { target, .. } => format!("fill:{}", target.describe()),
            Step::Click { target } => format!("click:{}", target.describe()),
            Step::Press { target, key } => match target {
                Some(el) => format!("press:{}:{}", el.describe(), key.as_str()),
                None => format!("press:{}", key.as_str()),
            },
            Step::Check { target } => format!("check:{}", target.describe()),
            Step::Uncheck { target } => format!("uncheck:{}", target.describe()),
            Step::Focus { target } => format!("focus:{}", target.describe()),
            Step::Expect { check } => format!("expect:{}", check.describe()),
        }
    }
}

/// A single observation about the surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Check {
    /// The element is present and visible.
    Visible { target: Element },

    /// No instance of the element is present.
    Absent { target: Element },

    /// The element's rendered text equals `expected` exactly.
    Text { target: Element, expected: String },

    /// The add-todo input currently holds `expected`.
    InputValue { expected: String },

    /// The nth checkbox's checked-state equals `expected`.
    Checked { nth: usize, expected: bool },

    /// Exactly `expected` instances of the element are present.
    Count { target: Element, expected: usize },

    /// The item texts equal `expected`, in document order.
    ItemsInOrder { expected: Vec<String> },

    /// Whether the matched item label is rendered struck through.
    StruckThrough { matcher: TextMatch, expected: bool },

    /// The element has keyboard focus.
    Focused { target: Element },

    /// The control is enabled.
    Enabled { target: Element },
}

impl Check {
    /// Label used in step reports and failure messages.
    pub fn describe(&self) -> String {
        match self {
            Check::Visible { target } => format!("visible:{}", target.describe()),
            Check::Absent { target } => format!("absent:{}", target.describe()),
            Check::Text { target, expected } => {
                format!("text:{}={:?}", target.describe(), expected)
            }
            Check::InputValue { expected } => format!("input-value={:?}", expected),
            Check::Checked { nth, expected } => format!("checked[{}]={}", nth, expected),
            Check::Count { target, expected } => {
                format!("count:{}={}", target.describe(), expected)
            }
            Check::ItemsInOrder { expected } => format!("items-in-order:{}", expected.len()),
            Check::StruckThrough { matcher, expected } => {
                format!("struck-through({:?})={}", matcher.pattern(), expected)
            }
            Check::Focused { target } => format!("focused:{}", target.describe()),
            Check::Enabled { target } => format!("enabled:{}", target.describe()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_round_trips_through_yaml() {
        let step = Step::Fill {
            target: Element::Input,
            value: "Test todo".to_string(),
        };
        let yaml = serde_yaml::to_string(&step).unwrap();
        let back: Step = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, step);
    }

    #[test]
    fn press_without_target_parses() {
        let yaml = "action: press\nkey: tab\n";
        let step: Step = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(step, Step::Press { target: None, key: Key::Tab });
    }

    #[test]
    fn expect_labels_are_stable() {
        let step = Step::Expect {
            check: Check::Checked { nth: 1, expected: true },
        };
        assert_eq!(step.label(), "expect:checked[1]=true");
    }
}
