//! Assertions and per-scenario reporting

use colored::Colorize;
use serde::Serialize;
use std::fmt::Debug;

use crate::common::{Error, ErrorKind, Result};
use crate::exec::CommandResult;

/// Recorded result of one scenario run
#[derive(Debug, Serialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub passed: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Assert two values are equal, failing with an assertion error
pub fn expect_equal<T: PartialEq + Debug>(actual: &T, expected: &T, what: &str) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(Error::Assertion(format!(
            "{}: expected {:?}, got {:?}",
            what, expected, actual
        )))
    }
}

/// True iff the operation failed with exactly the expected error kind
///
/// Used by negative scenarios: a success, or a failure of a different
/// kind, both count as the expectation not being met.
pub fn expect_failure<T>(result: &Result<T>, kind: ErrorKind) -> bool {
    matches!(result, Err(e) if e.kind() == kind)
}

pub fn scenario_header(name: &str, description: Option<&str>) {
    println!("\n{} {}", "Running Scenario:".blue().bold(), name.white().bold());
    if let Some(desc) = description {
        println!("  {}", desc.dimmed());
    }
}

pub fn step_pass(msg: &str) {
    println!("  {} {}", "✓".green(), msg.dimmed());
}

pub fn step_fail(msg: &str) {
    println!("  {} {}", "✗".red(), msg);
}

/// Per-step diagnostic dump of a captured command result
pub fn step_result(verbose: bool, result: &CommandResult) {
    if !verbose {
        return;
    }
    println!("    exit: {}", result.exit_status.to_string().dimmed());
    for line in result.stdout.lines() {
        println!("    stdout: {}", line.dimmed());
    }
    for line in result.stderr.lines() {
        println!("    stderr: {}", line.dimmed());
    }
}

pub fn scenario_footer(outcome: &ScenarioOutcome) {
    if outcome.passed {
        println!(
            "{} {} ({} ms)",
            "✓".green().bold(),
            "Scenario Passed".green().bold(),
            outcome.duration_ms
        );
    } else {
        println!(
            "{} {}: {} ({} ms)",
            "✗".red().bold(),
            "Scenario Failed".red().bold(),
            outcome.error.as_deref().unwrap_or("unknown error"),
            outcome.duration_ms
        );
    }
}

/// Print the end-of-run summary; returns true iff every scenario passed
pub fn summary(outcomes: &[ScenarioOutcome]) -> bool {
    let failed: Vec<&ScenarioOutcome> = outcomes.iter().filter(|o| !o.passed).collect();

    println!();
    if failed.is_empty() {
        println!(
            "{} {} scenario(s) passed",
            "✓".green().bold(),
            outcomes.len()
        );
        true
    } else {
        println!(
            "{} {} of {} scenario(s) failed:",
            "✗".red().bold(),
            failed.len(),
            outcomes.len()
        );
        for outcome in &failed {
            println!(
                "  {} {}: {}",
                "✗".red(),
                outcome.name,
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
        false
    }
}

/// Print outcomes as a JSON array on stdout
pub fn print_json(outcomes: &[ScenarioOutcome]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(outcomes)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expect_equal_reports_both_values() {
        let err = expect_equal(&"world", &"hello", "stdout").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("hello"));
        assert!(msg.contains("world"));
    }

    #[test]
    fn expect_failure_matches_kind_only() {
        let failed: Result<()> = Err(Error::InvalidConfiguration("bad".into()));
        assert!(expect_failure(&failed, ErrorKind::InvalidConfiguration));
        assert!(!expect_failure(&failed, ErrorKind::Provisioning));

        let succeeded: Result<u32> = Ok(7);
        assert!(!expect_failure(&succeeded, ErrorKind::InvalidConfiguration));
    }

    #[test]
    fn summary_counts_failures() {
        let outcomes = vec![
            ScenarioOutcome {
                name: "a".into(),
                passed: true,
                error: None,
                duration_ms: 1,
            },
            ScenarioOutcome {
                name: "b".into(),
                passed: false,
                error: Some("boom".into()),
                duration_ms: 2,
            },
        ];
        assert!(!summary(&outcomes));
        assert!(summary(&outcomes[..1]));
    }
}
