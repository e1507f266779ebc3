//! Suite reporting: JSON for machines, colored lines and a table for people

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use tracing::info;

use todocheck_contract::Scenario;

use crate::config::ExecutionEnvironment;
use crate::error::HarnessResult;
use crate::runner::{Outcome, SuiteResult};

/// Everything a consumer needs to interpret one suite run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub started_at: DateTime<Utc>,
    pub base_url: String,
    pub driver: String,
    pub environment: ExecutionEnvironment,
    pub suite: SuiteResult,
}

impl Report {
    pub fn new(
        base_url: String,
        driver: String,
        environment: ExecutionEnvironment,
        suite: SuiteResult,
    ) -> Self {
        Report { started_at: Utc::now(), base_url, driver, environment, suite }
    }

    /// Write the machine-readable report file.
    pub fn write_json(&self, dir: &Path) -> HarnessResult<PathBuf> {
        std::fs::create_dir_all(dir)?;

        let path = dir.join("report.json");
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;

        info!("report written to: {}", path.display());
        Ok(path)
    }

    /// Emit the report on stdout as a single JSON document.
    pub fn print_json(&self) -> HarnessResult<()> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(())
    }

    /// Emit per-scenario lines and a summary table for a terminal.
    pub fn print_human(&self) {
        println!();
        for scenario in &self.suite.scenarios {
            let line = match scenario.outcome {
                Outcome::Passed => format!("✓ {} ({} ms)", scenario.name, scenario.duration_ms)
                    .green()
                    .to_string(),
                Outcome::Flaky => format!(
                    "~ {} (flaky: passed on attempt {})",
                    scenario.name,
                    scenario.attempts.len()
                )
                .yellow()
                .to_string(),
                Outcome::Failed | Outcome::TimedOut => {
                    let reason = scenario
                        .attempts
                        .last()
                        .and_then(|a| a.run.error.as_deref())
                        .unwrap_or("unknown error");
                    format!("✗ {} - {}", scenario.name, reason).red().to_string()
                }
            };
            println!("{}", line);

            for attempt in &scenario.attempts {
                for artifact in &attempt.artifacts {
                    println!("    artifact: {}", artifact.display());
                }
            }
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Total", "Passed", "Flaky", "Failed", "Duration"]);
        table.add_row(vec![
            self.suite.total.to_string(),
            self.suite.passed.to_string(),
            self.suite.flaky.to_string(),
            self.suite.failed.to_string(),
            format!("{} ms", self.suite.duration_ms),
        ]);

        println!();
        println!("{table}");
    }
}

/// Print the scenario set as a table, for `--list`.
pub fn print_scenario_list(scenarios: &[Scenario]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Tags", "Steps", "Description"]);

    for scenario in scenarios {
        table.add_row(vec![
            scenario.name.clone(),
            scenario.tags.join(", "),
            scenario.steps.len().to_string(),
            scenario.description.clone(),
        ]);
    }

    println!("{table}");
}
