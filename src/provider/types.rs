//! Provision request and node types

use serde::Serialize;
use std::collections::BTreeSet;

use crate::common::{Error, Result};

/// Lifecycle status of a provisioned node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Pending,
    Running,
    Failed,
    Destroyed,
}

/// A node created by a provider, tracked by id and group
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionedNode {
    pub id: String,
    pub name: String,
    pub group_name: String,
    pub address: String,
    pub status: NodeStatus,
}

/// A validated request for a batch of nodes
#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    pub image_id: String,
    pub hardware_id: String,
    pub location_id: String,
    pub group_name: String,
    pub count: u32,
    /// One name per requested node; providers use these as hostnames
    pub node_names: Vec<String>,
    pub inbound_ports: BTreeSet<u16>,
    pub network_name: Option<String>,
    pub subnet_names: Vec<String>,
    pub storage_account_name: Option<String>,
}

impl ProvisionRequest {
    /// Start building a request for the given group
    pub fn builder(group_name: &str) -> ProvisionRequestBuilder {
        ProvisionRequestBuilder {
            image_id: None,
            hardware_id: None,
            location_id: None,
            group_name: group_name.to_string(),
            count: 1,
            node_names: Vec::new(),
            inbound_ports: BTreeSet::new(),
            network_name: None,
            subnet_names: Vec::new(),
            storage_account_name: None,
        }
    }
}

/// Builder for [`ProvisionRequest`]
///
/// `build` enforces the request invariants: count >= 1 and a non-empty
/// image, hardware, location, and group name.
#[derive(Debug)]
pub struct ProvisionRequestBuilder {
    image_id: Option<String>,
    hardware_id: Option<String>,
    location_id: Option<String>,
    group_name: String,
    count: u32,
    node_names: Vec<String>,
    inbound_ports: BTreeSet<u16>,
    network_name: Option<String>,
    subnet_names: Vec<String>,
    storage_account_name: Option<String>,
}

impl ProvisionRequestBuilder {
    pub fn image(mut self, id: &str) -> Self {
        self.image_id = Some(id.to_string());
        self
    }

    pub fn hardware(mut self, id: &str) -> Self {
        self.hardware_id = Some(id.to_string());
        self
    }

    pub fn location(mut self, id: &str) -> Self {
        self.location_id = Some(id.to_string());
        self
    }

    pub fn count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn node_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.node_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn inbound_port(mut self, port: u16) -> Self {
        self.inbound_ports.insert(port);
        self
    }

    pub fn network(mut self, name: &str) -> Self {
        self.network_name = Some(name.to_string());
        self
    }

    pub fn subnets<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subnet_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn storage_account(mut self, name: &str) -> Self {
        self.storage_account_name = Some(name.to_string());
        self
    }

    pub fn build(self) -> Result<ProvisionRequest> {
        if self.count < 1 {
            return Err(Error::InvalidConfiguration(
                "node count must be at least 1".to_string(),
            ));
        }
        if self.group_name.is_empty() {
            return Err(Error::InvalidConfiguration(
                "group name must not be empty".to_string(),
            ));
        }

        let image_id = required("image", self.image_id)?;
        let hardware_id = required("hardware", self.hardware_id)?;
        let location_id = required("location", self.location_id)?;

        if !self.node_names.is_empty() && self.node_names.len() != self.count as usize {
            return Err(Error::InvalidConfiguration(format!(
                "{} node name(s) given for {} node(s)",
                self.node_names.len(),
                self.count
            )));
        }

        if !self.subnet_names.is_empty() && self.network_name.is_none() {
            return Err(Error::InvalidConfiguration(
                "subnets require a network name".to_string(),
            ));
        }

        // SSH is always reachable on harness-created nodes
        let mut inbound_ports = self.inbound_ports;
        if inbound_ports.is_empty() {
            inbound_ports.insert(22);
        }

        Ok(ProvisionRequest {
            image_id,
            hardware_id,
            location_id,
            group_name: self.group_name,
            count: self.count,
            node_names: self.node_names,
            inbound_ports,
            network_name: self.network_name,
            subnet_names: self.subnet_names,
            storage_account_name: self.storage_account_name,
        })
    }
}

fn required(what: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::InvalidConfiguration(format!(
            "{} id must be set",
            what
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorKind;

    fn base() -> ProvisionRequestBuilder {
        ProvisionRequest::builder("alice1-group-pvck")
            .image("ubuntu-14_04-lts")
            .hardware("BASIC_A0")
            .location("West Europe")
    }

    #[test]
    fn builds_with_defaults() {
        let req = base().build().unwrap();
        assert_eq!(req.count, 1);
        assert!(req.inbound_ports.contains(&22));
        assert!(req.network_name.is_none());
    }

    #[test]
    fn zero_count_is_rejected() {
        let err = base().count(0).build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn missing_image_is_rejected() {
        let err = ProvisionRequest::builder("g")
            .hardware("BASIC_A0")
            .location("West Europe")
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn subnets_without_network_are_rejected() {
        let err = base().subnets(["jclouds-1"]).build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn node_name_count_must_match() {
        let err = base()
            .count(2)
            .node_names(["alice1pvck"])
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);

        let req = base()
            .count(2)
            .node_names(["alice1pvck", "alice1pvck-1"])
            .build()
            .unwrap();
        assert_eq!(req.node_names.len(), 2);
    }

    #[test]
    fn explicit_ports_are_kept() {
        let req = base().inbound_port(22).inbound_port(8080).build().unwrap();
        assert_eq!(req.inbound_ports.len(), 2);
    }
}
