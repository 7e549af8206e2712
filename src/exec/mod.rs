//! Remote command execution abstraction
//!
//! The remote-shell transport is an external collaborator; the harness
//! depends on the `Executor`/`Session` traits and a bounded-retry connect
//! helper. No call here waits indefinitely.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::common::{Error, Result};
use crate::provider::ProvisionedNode;

/// Output of one remote command. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResult {
    pub exit_status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

/// An open command channel to one node
#[async_trait]
pub trait Session: Send {
    /// Run a command, blocking until the remote process exits or the
    /// transport's configured timeout elapses (exec-timeout error).
    async fn exec(&mut self, command: &str) -> Result<CommandResult>;
}

impl std::fmt::Debug for dyn Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Session")
    }
}

/// Opens command channels to provisioned nodes
#[async_trait]
pub trait Executor: Send + Sync {
    /// A single connection attempt. The node may still be booting; callers
    /// wanting a bounded retry window use [`connect_with_retry`].
    async fn connect(&self, node: &ProvisionedNode) -> Result<Box<dyn Session>>;
}

/// Retry `connect` with a fixed backoff until it succeeds or `window`
/// elapses, then fail with a connect-timeout error.
///
/// The window bounds the whole call, including a single attempt that
/// hangs: an in-flight `connect` is cancelled when the window closes.
pub async fn connect_with_retry(
    executor: &dyn Executor,
    node: &ProvisionedNode,
    window: Duration,
    backoff: Duration,
) -> Result<Box<dyn Session>> {
    let attempts = async {
        loop {
            match executor.connect(node).await {
                Ok(session) => return session,
                Err(e) => {
                    tracing::trace!(node = %node.id, error = %e, "connect failed, retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    };

    match tokio::time::timeout(window, attempts).await {
        Ok(session) => Ok(session),
        Err(_) => {
            tracing::debug!(node = %node.id, "giving up on connect");
            Err(Error::connect_timeout(&node.address, window.as_secs()))
        }
    }
}
