//! Todocheck behavioral contract
//!
//! This crate defines what a conforming to-do list surface must do,
//! independent of any UI technology:
//! - A semantic vocabulary for the surface (elements found by accessible
//!   role, name, placeholder, or content)
//! - Steps and checks that scenarios are written in
//! - The [`Driver`] trait a backend implements to execute them
//! - A sequential executor with polled assertions
//! - The built-in scenario catalog, plus YAML loading for user scenarios
//! - A reference model of the list semantics and an in-memory simulated
//!   surface for hermetic runs
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Scenario (name, tags, steps)               │
//! │    steps: navigate | fill | click | press | check |         │
//! │           uncheck | focus | expect { check }                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  executor::run_scenario(driver, scenario, options)          │
//! │    ├── actions issued strictly in order                     │
//! │    ├── expect: poll driver.evaluate() until pass/timeout    │
//! │    └── first failure terminates the scenario                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Driver (trait)                                             │
//! │    ├── SimDriver        in-memory list, optional quirks     │
//! │    └── (backends)       real browser sessions               │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod driver;
pub mod error;
pub mod executor;
pub mod model;
pub mod scenario;
pub mod sim;
pub mod step;
pub mod surface;

pub use driver::{Driver, Verdict};
pub use error::{ContractError, ContractResult, DriverError, DriverResult};
pub use executor::{run_scenario, ExecOptions, ScenarioRun, StepReport};
pub use model::{TodoItem, TodoModel};
pub use scenario::Scenario;
pub use sim::{SimDriver, SimQuirks};
pub use step::{Check, Key, Step};
pub use surface::{Element, TextMatch};
