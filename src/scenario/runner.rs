//! Scenario runner
//!
//! Drives one scenario through its lifecycle:
//! `Built → Provisioning → Ready → Executing → Verifying → Teardown`,
//! with `Failed` absorbing from any non-terminal state. Teardown is a
//! finally-style terminal step: the runner destroys the scenario's group on
//! every exit path, normal or not, and records the result as a
//! [`ScenarioOutcome`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::common::config::Timeouts;
use crate::common::{naming, Config, Error, Result};
use crate::exec::{connect_with_retry, CommandResult, Executor};
use crate::provider::{NodeStatus, ProvisionRequest, Provisioner};

use super::config::{ScenarioSpec, VerifyStep};
use super::report::{self, expect_equal, expect_failure, ScenarioOutcome};
use super::teardown::{TeardownGuard, TeardownRegistry};

/// Lifecycle states of one scenario run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioState {
    Built,
    Provisioning,
    Ready,
    Executing,
    Verifying,
    Teardown,
    Failed,
}

/// Run one scenario to completion, always tearing its group down
pub async fn run_scenario(
    provider: Arc<dyn Provisioner>,
    executor: Arc<dyn Executor>,
    registry: Arc<TeardownRegistry>,
    config: &Config,
    spec: &ScenarioSpec,
    verbose: bool,
) -> ScenarioOutcome {
    let started = Instant::now();
    report::scenario_header(&spec.name, spec.description.as_deref());

    let suffix = naming::random_suffix();
    let user = naming::user_name();
    let group = naming::group_name(&user, suffix);
    let node_names = naming::node_names(&user, suffix, spec.request.count);
    tracing::debug!(scenario = %spec.name, group = %group, "assigned group");

    let request = match spec.to_request(&config.defaults, &group, &node_names) {
        Ok(request) => request,
        Err(e) => {
            // Nothing acquired yet, so no teardown obligation
            report::step_fail(&e.to_string());
            let outcome = outcome(spec, started, Some(e));
            report::scenario_footer(&outcome);
            return outcome;
        }
    };

    // Register before provisioning so a shutdown signal mid-create still
    // sweeps the group. Destroy is idempotent either way.
    let mut guard = TeardownGuard::new(&group, Arc::clone(&provider), registry);

    let result = execute(
        provider.as_ref(),
        executor.as_ref(),
        &config.timeouts,
        spec,
        &request,
        verbose,
    )
    .await;

    transition(&spec.name, ScenarioState::Teardown);
    guard.teardown().await;
    report::step_pass(&format!("teardown of group '{}'", group));

    let outcome = outcome(spec, started, result.err());
    report::scenario_footer(&outcome);
    outcome
}

fn outcome(spec: &ScenarioSpec, started: Instant, error: Option<Error>) -> ScenarioOutcome {
    ScenarioOutcome {
        name: spec.name.clone(),
        passed: error.is_none(),
        error: error.map(|e| format!("[{}] {}", e.kind(), e)),
        duration_ms: started.elapsed().as_millis() as u64,
    }
}

fn transition(scenario: &str, state: ScenarioState) {
    tracing::debug!(scenario = %scenario, state = ?state, "state transition");
}

/// Everything between `run()` and teardown. Any error returned here puts
/// the scenario in `Failed`; the caller still tears down.
async fn execute(
    provider: &dyn Provisioner,
    executor: &dyn Executor,
    timeouts: &Timeouts,
    spec: &ScenarioSpec,
    request: &ProvisionRequest,
    verbose: bool,
) -> Result<()> {
    transition(&spec.name, ScenarioState::Provisioning);
    let created = create_bounded(provider, request, timeouts.provision_secs).await;

    // Negative scenarios assert on the provisioning result itself and skip
    // straight to verification.
    if let Some(kind) = spec.expect_failure {
        transition(&spec.name, ScenarioState::Verifying);
        if expect_failure(&created, kind) {
            report::step_pass(&format!("provisioning rejected with {}", kind));
            return Ok(());
        }
        transition(&spec.name, ScenarioState::Failed);
        return match created {
            // Provisioning was supposed to be rejected; a created group is
            // a failure (and gets torn down by the caller).
            Ok(nodes) => Err(Error::Assertion(format!(
                "expected provisioning to fail with {}, but {} node(s) were created",
                kind,
                nodes.len()
            ))),
            Err(e) => Err(Error::Assertion(format!(
                "expected provisioning to fail with {}, got [{}] {}",
                kind,
                e.kind(),
                e
            ))),
        };
    }

    let nodes = match created {
        Ok(nodes) => nodes,
        Err(e) => {
            transition(&spec.name, ScenarioState::Failed);
            return Err(e);
        }
    };
    expect_equal(&(nodes.len() as u32), &request.count, "created node count")?;
    for node in &nodes {
        expect_equal(&node.status, &NodeStatus::Running, "node status")?;
    }
    transition(&spec.name, ScenarioState::Ready);
    report::step_pass(&format!("provisioned {} node(s)", nodes.len()));

    if spec.verify.is_empty() {
        transition(&spec.name, ScenarioState::Verifying);
        return Ok(());
    }

    transition(&spec.name, ScenarioState::Executing);
    for node in &nodes {
        let mut session = connect_with_retry(
            executor,
            node,
            Duration::from_secs(timeouts.connect_secs),
            Duration::from_millis(timeouts.connect_retry_millis),
        )
        .await?;
        report::step_pass(&format!("connected to {} ({})", node.id, node.address));

        for step in &spec.verify {
            let result = session.exec(&step.exec).await?;
            report::step_result(verbose, &result);

            transition(&spec.name, ScenarioState::Verifying);
            check_step(step, &result)?;
            report::step_pass(&format!("{} on {}", step.exec, node.id));
        }
    }

    Ok(())
}

/// Bound the create call so a hung provider cannot stall the run
async fn create_bounded(
    provider: &dyn Provisioner,
    request: &ProvisionRequest,
    secs: u64,
) -> Result<Vec<crate::provider::ProvisionedNode>> {
    match tokio::time::timeout(Duration::from_secs(secs), provider.create_nodes(request)).await {
        Ok(result) => result,
        Err(_) => Err(Error::Provisioning(format!(
            "create_nodes did not finish within {} seconds",
            secs
        ))),
    }
}

/// Check one verify step against a captured command result
fn check_step(step: &VerifyStep, result: &CommandResult) -> Result<()> {
    let Some(expect) = &step.expect else {
        // No explicit expectation: the command must simply succeed
        if !result.success() {
            return Err(Error::Assertion(format!(
                "'{}' exited with status {}",
                step.exec, result.exit_status
            )));
        }
        return Ok(());
    };

    let expected_status = expect.exit_status.unwrap_or(0);
    expect_equal(
        &result.exit_status,
        &expected_status,
        &format!("exit status of '{}'", step.exec),
    )?;

    if let Some(equals) = &expect.equals {
        expect_equal(
            &result.stdout.trim(),
            &equals.trim(),
            &format!("stdout of '{}'", step.exec),
        )?;
    }
    if let Some(contains) = &expect.contains {
        if !result.stdout.contains(contains) {
            return Err(Error::Assertion(format!(
                "stdout of '{}' does not contain '{}': got '{}'",
                step.exec, contains, result.stdout
            )));
        }
    }
    Ok(())
}
