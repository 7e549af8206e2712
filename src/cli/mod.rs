//! CLI command handling
//!
//! Dispatches CLI commands: loads configuration, builds the provider
//! backend, runs scenarios, and reports results.

use colored::Colorize;
use futures_util::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::commands::Commands;
use crate::common::{naming, Config, Error, Result};
use crate::exec::Executor;
use crate::provider::sim::SimProvider;
use crate::provider::Provisioner;
use crate::scenario::{self, report, ScenarioOutcome, ScenarioSpec, TeardownRegistry};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            scenarios,
            parallel,
            verbose,
            json,
        } => run(scenarios, parallel, verbose, json).await,

        Commands::Check { scenario } => check(&scenario),
    }
}

/// Build the provider backend named in the configuration
///
/// The sim backend serves both capability traits; a real provider would
/// plug in here behind the same pair.
fn build_backend(config: &Config) -> Result<(Arc<dyn Provisioner>, Arc<dyn Executor>)> {
    match config.provider.kind.as_str() {
        "sim" => {
            let provider = Arc::new(SimProvider::from_config(config));
            Ok((provider.clone(), provider))
        }
        other => Err(Error::Config(format!(
            "unknown provider kind '{}' (built-in: sim)",
            other
        ))),
    }
}

async fn run(paths: Vec<PathBuf>, parallel: bool, verbose: bool, json: bool) -> Result<()> {
    let config = Config::load()?;
    let (provider, executor) = build_backend(&config)?;
    let registry = Arc::new(TeardownRegistry::new());

    // Fail fast on unparseable files before provisioning anything
    let specs: Vec<ScenarioSpec> = paths
        .iter()
        .map(|path| scenario::load_scenario(path))
        .collect::<Result<_>>()?;

    // A shutdown signal mid-run still sweeps every group that has been
    // registered as provisioned, then exits non-zero.
    {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted, attempting best-effort teardown");
                registry.teardown_all().await;
                std::process::exit(130);
            }
        });
    }

    let outcomes: Vec<ScenarioOutcome> = if parallel {
        join_all(specs.iter().map(|spec| {
            scenario::run_scenario(
                Arc::clone(&provider),
                Arc::clone(&executor),
                Arc::clone(&registry),
                &config,
                spec,
                verbose,
            )
        }))
        .await
    } else {
        let mut outcomes = Vec::with_capacity(specs.len());
        for spec in &specs {
            outcomes.push(
                scenario::run_scenario(
                    Arc::clone(&provider),
                    Arc::clone(&executor),
                    Arc::clone(&registry),
                    &config,
                    spec,
                    verbose,
                )
                .await,
            );
        }
        outcomes
    };

    if json {
        report::print_json(&outcomes)?;
    }

    let failed = outcomes.iter().filter(|o| !o.passed).count();
    if !json {
        report::summary(&outcomes);
    }
    if failed > 0 {
        return Err(Error::Assertion(format!(
            "{} of {} scenario(s) failed",
            failed,
            outcomes.len()
        )));
    }
    Ok(())
}

fn check(path: &Path) -> Result<()> {
    let config = Config::load()?;
    let spec = scenario::load_scenario(path)?;

    // Dry-run the request build against a throwaway group name so naming
    // and request invariants are checked too
    let suffix = naming::random_suffix();
    let user = naming::user_name();
    let group = naming::group_name(&user, suffix);
    let node_names = naming::node_names(&user, suffix, spec.request.count);
    let request = spec.to_request(&config.defaults, &group, &node_names)?;

    println!(
        "{} {} ({} node(s), image {}, hardware {})",
        "✓".green(),
        spec.name.bold(),
        request.count,
        request.image_id,
        request.hardware_id
    );
    if let Some(kind) = spec.expect_failure {
        println!("  expects provisioning to fail with {}", kind);
    } else {
        println!("  {} verify step(s)", spec.verify.len());
    }
    Ok(())
}
