//! Provisioning client abstraction
//!
//! The compute provider is an external collaborator; the harness depends
//! only on the capability trait below. The built-in `sim` backend stands in
//! for a real provider so the harness is testable offline.

pub mod sim;
pub mod types;

use async_trait::async_trait;

use crate::common::Result;
pub use types::{NodeStatus, ProvisionRequest, ProvisionedNode};

/// Create/destroy node operations against a compute provider
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Create exactly `req.count` nodes in `req.group_name`, or fail with
    /// no nodes visible to the caller.
    ///
    /// Fails with an invalid-configuration error when a referenced storage
    /// account, network, or subnet does not exist upstream, and with a
    /// provisioning error on transient upstream failure.
    async fn create_nodes(&self, req: &ProvisionRequest) -> Result<Vec<ProvisionedNode>>;

    /// Destroy every node in a group. Idempotent: destroying an
    /// already-destroyed or unknown group is a no-op.
    async fn destroy_nodes(&self, group_name: &str) -> Result<()>;

    /// Destroy a single node by id, with the same idempotence guarantee.
    async fn destroy_node(&self, id: &str) -> Result<()>;
}
