//! Scoped teardown with guaranteed release
//!
//! A scenario acquires its nodes through a [`TeardownGuard`], which
//! registers the group in a process-wide [`TeardownRegistry`]. The runner
//! destroys the group on every exit path; the registry exists so a shutdown
//! signal mid-scenario can still sweep groups that were already
//! provisioned. Registration is keyed per group, so concurrent scenarios
//! never touch each other's nodes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::provider::Provisioner;

/// Process-wide record of groups that currently own provider resources
#[derive(Default)]
pub struct TeardownRegistry {
    groups: Mutex<HashMap<String, Arc<dyn Provisioner>>>,
}

impl TeardownRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, group: &str, provider: Arc<dyn Provisioner>) {
        let mut groups = self.groups.lock().expect("teardown registry poisoned");
        groups.insert(group.to_string(), provider);
    }

    fn release(&self, group: &str) {
        let mut groups = self.groups.lock().expect("teardown registry poisoned");
        groups.remove(group);
    }

    /// Best-effort destroy of every registered group. Used on shutdown
    /// signals; failures are logged and never escalated.
    pub async fn teardown_all(&self) {
        let drained: Vec<(String, Arc<dyn Provisioner>)> = {
            let mut groups = self.groups.lock().expect("teardown registry poisoned");
            groups.drain().collect()
        };

        for (group, provider) in drained {
            tracing::warn!(group = %group, "sweeping group on shutdown");
            if let Err(e) = provider.destroy_nodes(&group).await {
                tracing::warn!(group = %group, error = %e, "shutdown teardown failed");
            }
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.groups.lock().expect("teardown registry poisoned").len()
    }
}

/// Owns one group's teardown obligation for the duration of a scenario
///
/// `teardown` destroys the group exactly once and unregisters it. Teardown
/// errors are logged, never returned: they must not mask the scenario's
/// primary result.
pub struct TeardownGuard {
    group: String,
    provider: Arc<dyn Provisioner>,
    registry: Arc<TeardownRegistry>,
    done: bool,
}

impl TeardownGuard {
    pub fn new(
        group: &str,
        provider: Arc<dyn Provisioner>,
        registry: Arc<TeardownRegistry>,
    ) -> Self {
        registry.register(group, Arc::clone(&provider));
        Self {
            group: group.to_string(),
            provider,
            registry,
            done: false,
        }
    }

    pub async fn teardown(&mut self) {
        if self.done {
            return;
        }
        self.done = true;

        if let Err(e) = self.provider.destroy_nodes(&self.group).await {
            tracing::warn!(group = %self.group, error = %e, "teardown failed");
        }
        self.registry.release(&self.group);
    }
}
