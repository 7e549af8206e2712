//! Simulated compute provider
//!
//! An in-process provider backend with a catalog of known upstream
//! resources and failure-injection knobs, so the harness can be exercised
//! without a cloud account. It also implements the executor side: sessions
//! against sim nodes answer a small set of shell commands.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::io;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::common::config::SimConfig;
use crate::common::{Config, Error, Result};
use crate::exec::{CommandResult, Executor, Session};
use crate::provider::types::{NodeStatus, ProvisionRequest, ProvisionedNode};
use crate::provider::Provisioner;

/// Upstream resources the simulated provider knows about
#[derive(Debug, Clone, Default)]
pub struct SimCatalog {
    pub storage_accounts: HashSet<String>,
    /// Virtual networks mapped to their subnets
    pub networks: HashMap<String, HashSet<String>>,
}

impl From<&SimConfig> for SimCatalog {
    fn from(config: &SimConfig) -> Self {
        Self {
            storage_accounts: config.storage_accounts.iter().cloned().collect(),
            networks: config
                .networks
                .iter()
                .map(|(name, subnets)| (name.clone(), subnets.iter().cloned().collect()))
                .collect(),
        }
    }
}

/// Failure-injection knobs for exercising the harness error paths
#[derive(Debug, Clone, Default)]
pub struct SimFaults {
    /// Fail every create call with a transient provisioning error
    pub fail_create: Option<String>,
    /// Refuse every connection attempt
    pub unreachable: bool,
    /// Delay every command by this long before it completes
    pub exec_delay: Option<Duration>,
}

#[derive(Default)]
struct SimState {
    groups: HashMap<String, Vec<ProvisionedNode>>,
    destroy_calls: HashMap<String, usize>,
    created_names: HashMap<String, Vec<String>>,
    next_group_net: u8,
}

/// In-process provider + executor backend
pub struct SimProvider {
    catalog: SimCatalog,
    faults: SimFaults,
    exec_timeout: Duration,
    state: Mutex<SimState>,
}

impl SimProvider {
    pub fn new(catalog: SimCatalog) -> Self {
        Self {
            catalog,
            faults: SimFaults::default(),
            exec_timeout: Duration::from_secs(30),
            state: Mutex::new(SimState::default()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut provider = Self::new(SimCatalog::from(&config.sim));
        provider.exec_timeout = Duration::from_secs(config.timeouts.exec_secs);
        provider
    }

    pub fn with_faults(mut self, faults: SimFaults) -> Self {
        self.faults = faults;
        self
    }

    pub fn with_exec_timeout(mut self, timeout: Duration) -> Self {
        self.exec_timeout = timeout;
        self
    }

    /// Number of nodes currently Running in a group (test observability)
    pub async fn running_count(&self, group_name: &str) -> usize {
        let state = self.state.lock().await;
        state
            .groups
            .get(group_name)
            .map(|nodes| {
                nodes
                    .iter()
                    .filter(|n| n.status == NodeStatus::Running)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Number of nodes Running across all groups (test observability)
    pub async fn total_running(&self) -> usize {
        let state = self.state.lock().await;
        state
            .groups
            .values()
            .flatten()
            .filter(|n| n.status == NodeStatus::Running)
            .count()
    }

    /// How many times `destroy_nodes` has been called for a group
    pub async fn destroy_calls(&self, group_name: &str) -> usize {
        let state = self.state.lock().await;
        state.destroy_calls.get(group_name).copied().unwrap_or(0)
    }

    /// Node names a group was created with, retained past destroy
    /// (test observability)
    pub async fn created_names(&self, group_name: &str) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .created_names
            .get(group_name)
            .cloned()
            .unwrap_or_default()
    }

    fn validate(&self, req: &ProvisionRequest) -> Result<()> {
        if let Some(account) = &req.storage_account_name {
            if !self.catalog.storage_accounts.contains(account) {
                return Err(Error::InvalidConfiguration(format!(
                    "storage account '{}' does not exist",
                    account
                )));
            }
        }
        if let Some(network) = &req.network_name {
            let subnets = self.catalog.networks.get(network).ok_or_else(|| {
                Error::InvalidConfiguration(format!(
                    "virtual network '{}' does not exist",
                    network
                ))
            })?;
            for subnet in &req.subnet_names {
                if !subnets.contains(subnet) {
                    return Err(Error::InvalidConfiguration(format!(
                        "subnet '{}' does not exist in network '{}'",
                        subnet, network
                    )));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Provisioner for SimProvider {
    async fn create_nodes(&self, req: &ProvisionRequest) -> Result<Vec<ProvisionedNode>> {
        self.validate(req)?;

        if let Some(reason) = &self.faults.fail_create {
            return Err(Error::Provisioning(reason.clone()));
        }

        let mut state = self.state.lock().await;
        if state.groups.contains_key(&req.group_name) {
            return Err(Error::Provisioning(format!(
                "group '{}' already exists",
                req.group_name
            )));
        }

        // Build the whole batch before it becomes visible, so the caller
        // sees count nodes or none.
        state.next_group_net = state.next_group_net.wrapping_add(1);
        let net = state.next_group_net;
        let nodes: Vec<ProvisionedNode> = (0..req.count)
            .map(|i| {
                let name = req
                    .node_names
                    .get(i as usize)
                    .cloned()
                    .unwrap_or_else(|| format!("node-{}", i));
                ProvisionedNode {
                    id: format!("sim/{}/{}", req.group_name, name),
                    name,
                    group_name: req.group_name.clone(),
                    address: format!("10.{}.0.{}", net, i + 4),
                    status: NodeStatus::Running,
                }
            })
            .collect();

        state.created_names.insert(
            req.group_name.clone(),
            nodes.iter().map(|n| n.name.clone()).collect(),
        );
        state.groups.insert(req.group_name.clone(), nodes.clone());
        tracing::info!(
            group = %req.group_name,
            count = req.count,
            "created simulated nodes"
        );
        Ok(nodes)
    }

    async fn destroy_nodes(&self, group_name: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        *state
            .destroy_calls
            .entry(group_name.to_string())
            .or_insert(0) += 1;

        match state.groups.remove(group_name) {
            Some(nodes) => {
                tracing::info!(group = %group_name, count = nodes.len(), "destroyed group");
            }
            None => {
                tracing::debug!(group = %group_name, "destroy of unknown group ignored");
            }
        }
        Ok(())
    }

    async fn destroy_node(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        for nodes in state.groups.values_mut() {
            if let Some(pos) = nodes.iter().position(|n| n.id == id) {
                nodes.remove(pos);
                tracing::info!(node = %id, "destroyed node");
                return Ok(());
            }
        }
        tracing::debug!(node = %id, "destroy of unknown node ignored");
        Ok(())
    }
}

#[async_trait]
impl Executor for SimProvider {
    async fn connect(&self, node: &ProvisionedNode) -> Result<Box<dyn Session>> {
        if self.faults.unreachable {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("{}: connection refused", node.address),
            )));
        }

        let state = self.state.lock().await;
        let live = state
            .groups
            .get(&node.group_name)
            .map(|nodes| {
                nodes
                    .iter()
                    .any(|n| n.id == node.id && n.status == NodeStatus::Running)
            })
            .unwrap_or(false);
        if !live {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("{}: no route to host", node.address),
            )));
        }

        Ok(Box::new(SimSession {
            delay: self.faults.exec_delay,
            timeout: self.exec_timeout,
        }))
    }
}

/// A command channel to one simulated node
struct SimSession {
    delay: Option<Duration>,
    timeout: Duration,
}

#[async_trait]
impl Session for SimSession {
    async fn exec(&mut self, command: &str) -> Result<CommandResult> {
        let delay = self.delay;
        let run = async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            interpret(command)
        };

        match tokio::time::timeout(self.timeout, run).await {
            Ok(result) => Ok(result),
            Err(_) => Err(Error::exec_timeout(command, self.timeout.as_secs())),
        }
    }
}

/// Minimal shell for sim sessions: echo, true, false
fn interpret(command: &str) -> CommandResult {
    let trimmed = command.trim();
    if let Some(rest) = trimmed.strip_prefix("echo ") {
        return CommandResult {
            exit_status: 0,
            stdout: format!("{}\n", rest.trim_matches('"')),
            stderr: String::new(),
        };
    }
    match trimmed {
        "true" => CommandResult {
            exit_status: 0,
            stdout: String::new(),
            stderr: String::new(),
        },
        "false" => CommandResult {
            exit_status: 1,
            stdout: String::new(),
            stderr: String::new(),
        },
        other => CommandResult {
            exit_status: 127,
            stdout: String::new(),
            stderr: format!("sh: {}: command not found\n", other),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorKind;
    use crate::exec::connect_with_retry;
    use std::sync::Arc;

    fn catalog() -> SimCatalog {
        SimCatalog {
            storage_accounts: ["provcheckstore".to_string()].into_iter().collect(),
            networks: [(
                "jclouds-vnet".to_string(),
                ["jclouds-1".to_string()].into_iter().collect(),
            )]
            .into_iter()
            .collect(),
        }
    }

    fn request(group: &str, count: u32) -> ProvisionRequest {
        ProvisionRequest::builder(group)
            .image("ubuntu-14_04-lts")
            .hardware("BASIC_A0")
            .location("West Europe")
            .count(count)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn creates_exactly_n_running_nodes_with_unique_ids() {
        let provider = SimProvider::new(catalog());
        let nodes = provider.create_nodes(&request("g1", 3)).await.unwrap();

        assert_eq!(nodes.len(), 3);
        let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids.len(), 3);
        assert!(nodes.iter().all(|n| n.status == NodeStatus::Running));
        assert_eq!(provider.running_count("g1").await, 3);
    }

    #[tokio::test]
    async fn requested_node_names_become_hostnames() {
        let provider = SimProvider::new(catalog());
        let req = ProvisionRequest::builder("alice7-group-pvck")
            .image("ubuntu-14_04-lts")
            .hardware("BASIC_A0")
            .location("West Europe")
            .count(2)
            .node_names(["alice7pvck", "alice7pvck-1"])
            .build()
            .unwrap();

        let nodes = provider.create_nodes(&req).await.unwrap();
        assert_eq!(nodes[0].name, "alice7pvck");
        assert_eq!(nodes[1].name, "alice7pvck-1");
        assert_eq!(nodes[0].id, "sim/alice7-group-pvck/alice7pvck");
    }

    #[tokio::test]
    async fn unknown_storage_account_is_invalid_configuration() {
        let provider = SimProvider::new(catalog());
        let req = ProvisionRequest::builder("g1")
            .image("ubuntu-14_04-lts")
            .hardware("BASIC_A0")
            .location("West Europe")
            .storage_account("not3x1st1ng")
            .build()
            .unwrap();

        let err = provider.create_nodes(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
        // All-or-nothing: nothing is left Running
        assert_eq!(provider.running_count("g1").await, 0);
    }

    #[tokio::test]
    async fn unknown_network_and_subnet_are_rejected() {
        let provider = SimProvider::new(catalog());

        let req = ProvisionRequest::builder("g1")
            .image("i")
            .hardware("h")
            .location("l")
            .network("no-such-net")
            .build()
            .unwrap();
        let err = provider.create_nodes(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);

        let req = ProvisionRequest::builder("g2")
            .image("i")
            .hardware("h")
            .location("l")
            .network("jclouds-vnet")
            .subnets(["jclouds-9"])
            .build()
            .unwrap();
        let err = provider.create_nodes(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }

    #[tokio::test]
    async fn destroy_nodes_is_idempotent() {
        let provider = SimProvider::new(catalog());
        provider.create_nodes(&request("g1", 1)).await.unwrap();

        provider.destroy_nodes("g1").await.unwrap();
        provider.destroy_nodes("g1").await.unwrap();
        provider.destroy_nodes("never-existed").await.unwrap();
        assert_eq!(provider.running_count("g1").await, 0);
        assert_eq!(provider.destroy_calls("g1").await, 2);
    }

    #[tokio::test]
    async fn destroy_node_removes_only_that_node() {
        let provider = SimProvider::new(catalog());
        let nodes = provider.create_nodes(&request("g1", 2)).await.unwrap();

        provider.destroy_node(&nodes[0].id).await.unwrap();
        assert_eq!(provider.running_count("g1").await, 1);
        // Repeat destroy is a no-op
        provider.destroy_node(&nodes[0].id).await.unwrap();
        provider.destroy_node("sim/ghost/0").await.unwrap();
    }

    #[tokio::test]
    async fn transient_create_fault_is_provisioning_error() {
        let provider = SimProvider::new(catalog()).with_faults(SimFaults {
            fail_create: Some("rate limited".to_string()),
            ..Default::default()
        });
        let err = provider.create_nodes(&request("g1", 1)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Provisioning);
    }

    #[tokio::test]
    async fn session_answers_echo() {
        let provider = SimProvider::new(catalog());
        let nodes = provider.create_nodes(&request("g1", 1)).await.unwrap();

        let mut session = provider.connect(&nodes[0]).await.unwrap();
        let result = session.exec("echo hello").await.unwrap();
        assert_eq!(result.exit_status, 0);
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn slow_command_hits_exec_timeout() {
        let provider = SimProvider::new(catalog())
            .with_exec_timeout(Duration::from_millis(10))
            .with_faults(SimFaults {
                exec_delay: Some(Duration::from_secs(5)),
                ..Default::default()
            });
        let nodes = provider.create_nodes(&request("g1", 1)).await.unwrap();

        let mut session = provider.connect(&nodes[0]).await.unwrap();
        let err = session.exec("echo hello").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExecTimeout);
    }

    #[tokio::test]
    async fn unreachable_node_exhausts_retry_window() {
        let provider = Arc::new(SimProvider::new(catalog()).with_faults(SimFaults {
            unreachable: true,
            ..Default::default()
        }));
        let nodes = provider.create_nodes(&request("g1", 1)).await.unwrap();

        let err = connect_with_retry(
            provider.as_ref(),
            &nodes[0],
            Duration::from_millis(20),
            Duration::from_millis(5),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectTimeout);
    }

    #[tokio::test]
    async fn connect_to_destroyed_node_is_refused() {
        let provider = SimProvider::new(catalog());
        let nodes = provider.create_nodes(&request("g1", 1)).await.unwrap();
        provider.destroy_nodes("g1").await.unwrap();

        assert!(provider.connect(&nodes[0]).await.is_err());
    }
}
