//! Scenario orchestration
//!
//! Loads YAML scenario files, runs each one through the provisioning
//! lifecycle with guaranteed teardown, and records pass/fail outcomes.

pub mod config;
pub mod report;
pub mod runner;
pub mod teardown;

pub use config::{load_scenario, ScenarioSpec};
pub use report::ScenarioOutcome;
pub use runner::run_scenario;
pub use teardown::{TeardownGuard, TeardownRegistry};
