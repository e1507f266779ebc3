//! Scenario definitions and YAML loading

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ContractError, ContractResult};
use crate::step::Step;

/// One independent behavioral test: a named sequence of actions and
/// assertions against a fresh session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique name.
    pub name: String,

    /// Human-readable description.
    #[serde(default)]
    pub description: String,

    /// Tags for filtering.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Steps to execute in order.
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Parse a scenario from a YAML string.
    pub fn from_yaml(yaml: &str) -> ContractResult<Self> {
        let scenario: Scenario = serde_yaml::from_str(yaml)?;
        if scenario.steps.is_empty() {
            return Err(ContractError::ScenarioParse(format!(
                "scenario '{}' has no steps",
                scenario.name
            )));
        }
        Ok(scenario)
    }

    /// Parse a scenario from a YAML file.
    pub fn from_file(path: &Path) -> ContractResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load every `.yaml`/`.yml` scenario under a directory.
    pub fn load_all(dir: &Path) -> ContractResult<Vec<Self>> {
        let mut scenarios = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            scenarios.push(Self::from_file(entry.path())?);
        }

        Ok(scenarios)
    }
}

/// Reject duplicate names across a combined scenario set.
pub fn ensure_unique_names(scenarios: &[Scenario]) -> ContractResult<()> {
    let mut seen = std::collections::HashSet::new();
    for scenario in scenarios {
        if !seen.insert(scenario.name.as_str()) {
            return Err(ContractError::DuplicateScenario(scenario.name.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{Check, Key};
    use crate::surface::Element;

    #[test]
    fn parses_a_simple_scenario() {
        let yaml = r#"
name: add-one-item
description: Submitting text appends an item and clears the input
tags:
  - adding
  - smoke
steps:
  - action: navigate
  - action: fill
    target:
      element: input
    value: Test todo
  - action: press
    target:
      element: input
    key: enter
  - action: expect
    check:
      check: input_value
      expected: ""
"#;
        let scenario = Scenario::from_yaml(yaml).unwrap();
        assert_eq!(scenario.name, "add-one-item");
        assert_eq!(scenario.steps.len(), 4);
        assert!(scenario.has_tag("smoke"));
        assert_eq!(
            scenario.steps[2],
            Step::Press { target: Some(Element::Input), key: Key::Enter }
        );
        assert_eq!(
            scenario.steps[3],
            Step::Expect { check: Check::InputValue { expected: String::new() } }
        );
    }

    #[test]
    fn rejects_a_scenario_with_no_steps() {
        let yaml = "name: hollow\nsteps: []\n";
        let err = Scenario::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("no steps"));
    }

    #[test]
    fn load_all_reads_a_directory_tree() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            dir.path().join("a.yaml"),
            "name: a\nsteps:\n  - action: navigate\n",
        )
        .unwrap();
        std::fs::write(
            nested.join("b.yml"),
            "name: b\nsteps:\n  - action: navigate\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("ignored.txt"), "not yaml").unwrap();

        let scenarios = Scenario::load_all(dir.path()).unwrap();
        assert_eq!(scenarios.len(), 2);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let scenario = Scenario {
            name: "twice".to_string(),
            description: String::new(),
            tags: vec![],
            steps: vec![Step::Navigate],
        };
        let err = ensure_unique_names(&[scenario.clone(), scenario]).unwrap_err();
        assert!(matches!(err, ContractError::DuplicateScenario(_)));
    }
}
