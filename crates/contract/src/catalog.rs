//! Built-in scenario catalog
//!
//! Every scenario starts from a fresh navigation and owns its session, so
//! any subset can run in parallel. Composite scenarios replay their actions
//! against [`TodoModel`] and assert the surface against the state the model
//! ends up in.

use crate::model::TodoModel;
use crate::scenario::Scenario;
use crate::step::{Check, Key, Step};
use crate::surface::{Element, TextMatch};

/// All built-in scenarios, in a stable order.
pub fn builtin() -> Vec<Scenario> {
    let mut scenarios = Vec::new();
    scenarios.extend(basic());
    scenarios.extend(adding());
    scenarios.extend(toggling());
    scenarios.extend(deleting());
    scenarios.extend(workflows());
    scenarios.extend(edge_cases());
    scenarios.extend(accessibility());
    scenarios
}

/// Known tag values, one per scenario group.
pub const TAGS: &[&str] = &[
    "basic",
    "adding",
    "toggling",
    "deleting",
    "workflow",
    "edge",
    "a11y",
];

struct Build {
    scenario: Scenario,
}

/// Every scenario begins with a fresh navigation.
fn scenario(name: &str, tag: &str, description: &str) -> Build {
    Build {
        scenario: Scenario {
            name: name.to_string(),
            description: description.to_string(),
            tags: vec![tag.to_string()],
            steps: vec![Step::Navigate],
        },
    }
}

impl Build {
    fn step(mut self, step: Step) -> Self {
        self.scenario.steps.push(step);
        self
    }

    fn expect(self, check: Check) -> Self {
        self.step(Step::Expect { check })
    }

    /// Fill the input and submit via the add button.
    fn add(self, text: &str) -> Self {
        self.step(Step::Fill { target: Element::Input, value: text.to_string() })
            .step(Step::Click { target: Element::AddButton })
    }

    /// Fill the input and submit via the Enter key.
    fn add_enter(self, text: &str) -> Self {
        self.step(Step::Fill { target: Element::Input, value: text.to_string() })
            .step(Step::Press { target: Some(Element::Input), key: Key::Enter })
    }

    fn done(self) -> Scenario {
        self.scenario
    }
}

fn exact(text: &str) -> TextMatch {
    TextMatch::Exact(text.to_string())
}

fn item_text(text: &str) -> Element {
    Element::ItemText { matcher: exact(text) }
}

fn visible(target: Element) -> Check {
    Check::Visible { target }
}

fn absent(target: Element) -> Check {
    Check::Absent { target }
}

fn item_count(expected: usize) -> Check {
    Check::Count { target: Element::Item { nth: 0 }, expected }
}

fn input_empty() -> Check {
    Check::InputValue { expected: String::new() }
}

fn basic() -> Vec<Scenario> {
    vec![
        scenario("heading-visible", "basic", "The application heading renders")
            .expect(visible(Element::Heading))
            .done(),
        scenario(
            "empty-message-on-load",
            "basic",
            "With zero items the empty-state message is shown",
        )
        .expect(visible(Element::EmptyMessage))
        .done(),
        scenario(
            "input-and-button-present",
            "basic",
            "The add form is present and usable",
        )
        .expect(visible(Element::Input))
        .expect(visible(Element::AddButton))
        .expect(Check::Enabled { target: Element::AddButton })
        .done(),
    ]
}

fn adding() -> Vec<Scenario> {
    let long_text = "A".repeat(500);
    let special_text = r##"Todo with <>&"' special chars! @#$%^&*()"##;
    let unicode_text = "待办事项 🎉 日本語 العربية";

    vec![
        scenario(
            "add-via-button",
            "adding",
            "Submitting with the button appends the item and clears the input",
        )
        .add("Test todo")
        .expect(visible(item_text("Test todo")))
        .expect(input_empty())
        .done(),
        scenario(
            "add-via-enter",
            "adding",
            "Submitting with Enter appends the item and clears the input",
        )
        .add_enter("Enter key todo")
        .expect(visible(item_text("Enter key todo")))
        .expect(input_empty())
        .done(),
        scenario(
            "reject-whitespace-only",
            "adding",
            "Whitespace-only input creates nothing",
        )
        .add("   ")
        .expect(visible(Element::EmptyMessage))
        .expect(item_count(0))
        .done(),
        scenario("reject-empty-submit", "adding", "Empty input creates nothing")
            .add("")
            .expect(visible(Element::EmptyMessage))
            .expect(item_count(0))
            .done(),
        scenario(
            "trims-submitted-text",
            "adding",
            "Leading/trailing whitespace is removed before display",
        )
        .add("  Trimmed todo  ")
        .expect(visible(item_text("Trimmed todo")))
        .expect(Check::Text {
            target: Element::ItemText { matcher: TextMatch::Contains("trimmed todo".to_string()) },
            expected: "Trimmed todo".to_string(),
        })
        .done(),
        scenario(
            "one-control-pair-per-item",
            "adding",
            "Each item renders exactly one checkbox and one delete control",
        )
        .add("First todo")
        .add("Second todo")
        .add("Third todo")
        .expect(item_count(3))
        .expect(Check::Count { target: Element::Checkbox { nth: 0 }, expected: 3 })
        .expect(Check::Count { target: Element::DeleteButton { nth: 0 }, expected: 3 })
        .done(),
        scenario(
            "adds-preserve-order",
            "adding",
            "Items appear in insertion order",
        )
        .add("First todo")
        .add("Second todo")
        .add("Third todo")
        .expect(Check::ItemsInOrder {
            expected: vec![
                "First todo".to_string(),
                "Second todo".to_string(),
                "Third todo".to_string(),
            ],
        })
        .done(),
        scenario("long-text", "adding", "A 500-character item renders intact")
            .add_enter(&long_text)
            .expect(visible(item_text(&long_text)))
            .done(),
        scenario(
            "special-characters",
            "adding",
            "Markup-sensitive characters render without corruption",
        )
        .add_enter(special_text)
        .expect(visible(item_text(special_text)))
        .done(),
        scenario("unicode-text", "adding", "Unicode content renders without corruption")
            .add_enter(unicode_text)
            .expect(visible(item_text(unicode_text)))
            .done(),
    ]
}

fn toggling() -> Vec<Scenario> {
    vec![
        scenario(
            "toggle-roundtrip",
            "toggling",
            "Checking then unchecking returns the item to its original state",
        )
        .add_enter("Toggle Task")
        .expect(Check::Checked { nth: 0, expected: false })
        .step(Step::Check { target: Element::Checkbox { nth: 0 } })
        .expect(Check::Checked { nth: 0, expected: true })
        .step(Step::Uncheck { target: Element::Checkbox { nth: 0 } })
        .expect(Check::Checked { nth: 0, expected: false })
        .done(),
        scenario(
            "completed-strikethrough",
            "toggling",
            "A completed item's text is struck through",
        )
        .add_enter("Complete me")
        .expect(Check::StruckThrough { matcher: exact("Complete me"), expected: false })
        .step(Step::Check { target: Element::Checkbox { nth: 0 } })
        .expect(Check::StruckThrough { matcher: exact("Complete me"), expected: true })
        .done(),
        scenario(
            "independent-toggles",
            "toggling",
            "Toggling one item never changes another",
        )
        .add_enter("Task 1")
        .add_enter("Task 2")
        .add_enter("Task 3")
        .step(Step::Check { target: Element::Checkbox { nth: 0 } })
        .step(Step::Check { target: Element::Checkbox { nth: 2 } })
        .expect(Check::Checked { nth: 0, expected: true })
        .expect(Check::Checked { nth: 1, expected: false })
        .expect(Check::Checked { nth: 2, expected: true })
        .done(),
    ]
}

fn deleting() -> Vec<Scenario> {
    vec![
        scenario(
            "delete-restores-empty-state",
            "deleting",
            "Deleting the only item brings back the empty-state message",
        )
        .add_enter("Todo to delete")
        .expect(visible(item_text("Todo to delete")))
        .step(Step::Click { target: Element::DeleteButton { nth: 0 } })
        .expect(absent(item_text("Todo to delete")))
        .expect(visible(Element::EmptyMessage))
        .done(),
        scenario(
            "delete-middle-item",
            "deleting",
            "Deleting removes exactly the targeted item",
        )
        .add_enter("Keep me 1")
        .add_enter("Delete me")
        .add_enter("Keep me 2")
        .step(Step::Click { target: Element::DeleteButton { nth: 1 } })
        .expect(absent(item_text("Delete me")))
        .expect(Check::ItemsInOrder {
            expected: vec!["Keep me 1".to_string(), "Keep me 2".to_string()],
        })
        .done(),
        scenario(
            "delete-until-empty",
            "deleting",
            "Deleting every item empties the list",
        )
        .add_enter("Todo 1")
        .add_enter("Todo 2")
        .add_enter("Todo 3")
        .step(Step::Click { target: Element::DeleteButton { nth: 0 } })
        .step(Step::Click { target: Element::DeleteButton { nth: 0 } })
        .step(Step::Click { target: Element::DeleteButton { nth: 0 } })
        .expect(item_count(0))
        .expect(visible(Element::EmptyMessage))
        .done(),
    ]
}

fn workflows() -> Vec<Scenario> {
    let mut scenarios = Vec::new();

    // Add three, toggle the middle, delete the first. The model replays the
    // same operations and supplies the expected end state.
    {
        let mut model = TodoModel::new();
        for text in ["Todo 1", "Todo 2", "Todo 3"] {
            model.submit(text);
        }
        model.toggle(1);
        model.delete(0);

        let mut build = scenario(
            "add-toggle-delete",
            "workflow",
            "A mixed workflow leaves exactly the cumulative state",
        )
        .add_enter("Todo 1")
        .add_enter("Todo 2")
        .add_enter("Todo 3")
        .step(Step::Check { target: Element::Checkbox { nth: 1 } })
        .expect(Check::Checked { nth: 1, expected: true })
        .step(Step::Click { target: Element::DeleteButton { nth: 0 } })
        .expect(absent(item_text("Todo 1")))
        .expect(Check::ItemsInOrder { expected: model.texts() });
        for (nth, item) in model.items().iter().enumerate() {
            build = build.expect(Check::Checked { nth, expected: item.completed });
        }
        scenarios.push(build.done());
    }

    // Interleaved add/toggle/add/delete/toggle.
    {
        let mut model = TodoModel::new();
        model.submit("Task A");
        model.toggle(0);
        model.submit("Task B");
        model.delete(0);
        model.toggle(0);

        let mut build = scenario(
            "interleaved-operations",
            "workflow",
            "Operations interleaved across items accumulate without side effects",
        )
        .add_enter("Task A")
        .step(Step::Check { target: Element::Checkbox { nth: 0 } })
        .add_enter("Task B")
        .step(Step::Click { target: Element::DeleteButton { nth: 0 } })
        .step(Step::Check { target: Element::Checkbox { nth: 0 } })
        .expect(Check::ItemsInOrder { expected: model.texts() });
        for (nth, item) in model.items().iter().enumerate() {
            build = build.expect(Check::Checked { nth, expected: item.completed });
        }
        scenarios.push(build.done());
    }

    // Back-to-back submits with no settling pauses in between.
    {
        let mut build = scenario(
            "rapid-adds",
            "workflow",
            "Back-to-back submissions are all accepted",
        );
        for i in 1..=5 {
            build = build.add(&format!("Quick todo {}", i));
        }
        for i in 1..=5 {
            build = build.expect(visible(item_text(&format!("Quick todo {}", i))));
        }
        build = build.expect(item_count(5));
        scenarios.push(build.done());
    }

    scenarios
}

fn edge_cases() -> Vec<Scenario> {
    let mut scenarios = vec![
        scenario(
            "newline-only-input",
            "edge",
            "Input that is only newlines creates nothing",
        )
        .add("\n\n")
        .expect(visible(Element::EmptyMessage))
        .expect(item_count(0))
        .done(),
        scenario(
            "duplicate-text",
            "edge",
            "Identical text twice yields two distinct items",
        )
        .add_enter("Duplicate")
        .add_enter("Duplicate")
        .expect(Check::Count {
            target: item_text("Duplicate"),
            expected: 2,
        })
        .done(),
        scenario(
            "input-clear-enables-next-add",
            "edge",
            "The cleared input accepts the next submission immediately",
        )
        .add("Test")
        .expect(input_empty())
        .add("Another")
        .expect(visible(item_text("Another")))
        .done(),
        scenario(
            "no-controls-when-empty",
            "edge",
            "An empty list renders no checkboxes and no delete controls",
        )
        .expect(Check::Count { target: Element::Checkbox { nth: 0 }, expected: 0 })
        .expect(Check::Count { target: Element::DeleteButton { nth: 0 }, expected: 0 })
        .done(),
        scenario(
            "state-survives-unrelated-keys",
            "edge",
            "Unrelated keyboard interaction does not disturb the list",
        )
        .add_enter("Persistent todo")
        .step(Step::Press { target: None, key: Key::Tab })
        .step(Step::Press { target: None, key: Key::Tab })
        .step(Step::Press { target: None, key: Key::Tab })
        .expect(visible(item_text("Persistent todo")))
        .done(),
    ];

    // Fifty items, sampled at the ends and the middle.
    {
        let mut build = scenario(
            "fifty-items",
            "edge",
            "Fifty concurrent items render without loss",
        );
        for i in 1..=50 {
            build = build.add_enter(&format!("Todo {}", i));
        }
        for i in [1, 25, 50] {
            build = build.expect(visible(item_text(&format!("Todo {}", i))));
        }
        build = build.expect(item_count(50));
        scenarios.push(build.done());
    }

    scenarios
}

fn accessibility() -> Vec<Scenario> {
    vec![
        scenario("input-focusable", "a11y", "The add-todo input takes keyboard focus")
            .step(Step::Focus { target: Element::Input })
            .expect(Check::Focused { target: Element::Input })
            .done(),
        scenario(
            "empty-state-returns",
            "a11y",
            "The empty-state message reappears after add then delete",
        )
        .expect(visible(Element::EmptyMessage))
        .add_enter("Temp")
        .step(Step::Click { target: Element::DeleteButton { nth: 0 } })
        .expect(visible(Element::EmptyMessage))
        .done(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ensure_unique_names;

    #[test]
    fn names_are_unique() {
        ensure_unique_names(&builtin()).unwrap();
    }

    #[test]
    fn every_scenario_starts_with_a_fresh_navigation() {
        for scenario in builtin() {
            assert_eq!(
                scenario.steps.first(),
                Some(&Step::Navigate),
                "{} must start from a fresh session",
                scenario.name
            );
        }
    }

    #[test]
    fn every_scenario_is_tagged_with_a_known_group() {
        for scenario in builtin() {
            assert!(
                scenario.tags.iter().any(|t| TAGS.contains(&t.as_str())),
                "{} carries no known tag",
                scenario.name
            );
        }
    }

    #[test]
    fn every_scenario_asserts_something() {
        for scenario in builtin() {
            assert!(
                scenario
                    .steps
                    .iter()
                    .any(|s| matches!(s, Step::Expect { .. })),
                "{} has no assertions",
                scenario.name
            );
        }
    }

    #[test]
    fn fifty_items_counts_the_full_list() {
        let scenarios = builtin();
        let fifty = scenarios.iter().find(|s| s.name == "fifty-items").unwrap();
        assert!(fifty.steps.contains(&Step::Expect {
            check: Check::Count { target: Element::Item { nth: 0 }, expected: 50 },
        }));
        // 50 adds at two steps each, plus navigation and four assertions.
        assert_eq!(fifty.steps.len(), 105);
    }

    #[test]
    fn workflow_expectations_come_from_the_model() {
        let scenarios = builtin();
        let workflow = scenarios
            .iter()
            .find(|s| s.name == "add-toggle-delete")
            .unwrap();
        assert!(workflow.steps.contains(&Step::Expect {
            check: Check::ItemsInOrder {
                expected: vec!["Todo 2".to_string(), "Todo 3".to_string()],
            },
        }));
        // "Todo 2" kept its completed flag through the delete of "Todo 1".
        assert!(workflow.steps.contains(&Step::Expect {
            check: Check::Checked { nth: 0, expected: true },
        }));
    }
}
