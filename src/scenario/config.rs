//! Scenario file types
//!
//! Defines the data structures for deserializing YAML scenarios and the
//! mapping from a scenario's request section to a validated
//! `ProvisionRequest`.

use serde::Deserialize;
use std::path::Path;

use crate::common::config::RequestDefaults;
use crate::common::{Error, ErrorKind, Result};
use crate::provider::ProvisionRequest;

/// A complete scenario loaded from a YAML file
#[derive(Deserialize, Debug)]
pub struct ScenarioSpec {
    /// Name of the scenario
    pub name: String,
    /// Optional description of what the scenario verifies
    pub description: Option<String>,
    /// The provision request to issue
    pub request: RequestSpec,
    /// Remote commands to run against every node in the group
    #[serde(default)]
    pub verify: Vec<VerifyStep>,
    /// If set, provisioning itself must fail with this error kind;
    /// `verify` must be empty.
    pub expect_failure: Option<ErrorKind>,
}

/// The request section of a scenario
///
/// Image, hardware, and location fall back to the harness config defaults
/// when omitted.
#[derive(Deserialize, Debug)]
pub struct RequestSpec {
    pub image: Option<String>,
    pub hardware: Option<String>,
    pub location: Option<String>,
    #[serde(default = "default_count")]
    pub count: u32,
    pub inbound_ports: Option<Vec<u16>>,
    pub network: Option<String>,
    #[serde(default)]
    pub subnets: Vec<String>,
    pub storage_account: Option<String>,
}

fn default_count() -> u32 {
    1
}

/// One remote command with its expectations
#[derive(Deserialize, Debug)]
pub struct VerifyStep {
    /// The command to run on each node
    pub exec: String,
    /// Expectations on the command result
    pub expect: Option<ExecExpectation>,
}

/// Expectations for a command result
#[derive(Deserialize, Debug)]
pub struct ExecExpectation {
    /// Expected stdout, compared after trimming
    pub equals: Option<String>,
    /// Substring that should be in stdout
    pub contains: Option<String>,
    /// Expected exit status (default 0 when no other expectation is set)
    pub exit_status: Option<i32>,
}

/// Load a scenario from a YAML file
pub fn load_scenario(path: &Path) -> Result<ScenarioSpec> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read scenario '{}': {}",
            path.display(),
            e
        ))
    })?;
    let spec: ScenarioSpec = serde_yaml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse scenario: {}", e)))?;
    spec.validate()?;
    Ok(spec)
}

impl ScenarioSpec {
    /// Structural checks that don't need a provider
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Config("scenario name must not be empty".to_string()));
        }
        if self.expect_failure.is_some() && !self.verify.is_empty() {
            return Err(Error::Config(
                "a scenario with expect_failure cannot also have verify steps".to_string(),
            ));
        }
        if self.request.count < 1 {
            return Err(Error::Config("request count must be at least 1".to_string()));
        }
        for step in &self.verify {
            if step.exec.trim().is_empty() {
                return Err(Error::Config("verify exec must not be empty".to_string()));
            }
        }
        Ok(())
    }

    /// Build the provision request for this scenario, filling omitted
    /// fields from the harness defaults.
    pub fn to_request(
        &self,
        defaults: &RequestDefaults,
        group_name: &str,
        node_names: &[String],
    ) -> Result<ProvisionRequest> {
        let mut builder = ProvisionRequest::builder(group_name)
            .image(self.request.image.as_deref().unwrap_or(&defaults.image))
            .hardware(
                self.request
                    .hardware
                    .as_deref()
                    .unwrap_or(&defaults.hardware),
            )
            .location(
                self.request
                    .location
                    .as_deref()
                    .unwrap_or(&defaults.location),
            )
            .count(self.request.count)
            .node_names(node_names.iter().cloned())
            .subnets(self.request.subnets.iter().cloned());

        if let Some(ports) = &self.request.inbound_ports {
            for port in ports {
                builder = builder.inbound_port(*port);
            }
        }
        if let Some(network) = &self.request.network {
            builder = builder.network(network);
        }
        if let Some(account) = &self.request.storage_account {
            builder = builder.storage_account(account);
        }

        builder.build()
    }
}
