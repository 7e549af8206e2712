//! provcheck - a compute-provisioning verification harness
//!
//! Runs named scenarios against a compute provider: provision a group of
//! nodes, optionally run a remote command on each and assert the output,
//! and tear the group down on every exit path.

pub mod cli;
pub mod commands;
pub mod common;
pub mod exec;
pub mod provider;
pub mod scenario;

// Re-export commonly used types for tests
pub use common::{Error, ErrorKind, Result};
pub use provider::{ProvisionRequest, ProvisionedNode, Provisioner};
