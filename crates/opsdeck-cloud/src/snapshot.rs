//! Instance snapshot workflow
//!
//! Two phases: ask the compute service for an image of the instance, then
//! wait for that image to settle.
//!
//! ```text
//! None ──create──▶ Requested ──wait──▶ Active | Error | Timeout
//! ```
//!
//! A failed or timed-out snapshot is reported together with the image as
//! last seen. The image is left in place for the operator and the request is
//! never retried here.

use crate::error::{CloudError, IncompleteReason, Result};
use crate::model::{Image, Instance};
use crate::provider::{ComputeApi, ResourceProvider};
use crate::resolve::{Outcome, Resolution, resolve_instance};
use crate::waiter::{WaitConfig, WaitOutcome, wait_for_image};
use std::sync::Arc;

/// Workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotState {
    None,
    Requested,
    Active,
    Error,
    Timeout,
}

impl SnapshotState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SnapshotState::Active | SnapshotState::Error | SnapshotState::Timeout
        )
    }
}

impl std::fmt::Display for SnapshotState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotState::None => write!(f, "none"),
            SnapshotState::Requested => write!(f, "requested"),
            SnapshotState::Active => write!(f, "active"),
            SnapshotState::Error => write!(f, "error"),
            SnapshotState::Timeout => write!(f, "timeout"),
        }
    }
}

/// Snapshot name used when the caller does not pick one
pub fn default_snapshot_name(instance: &Instance) -> String {
    format!("snap_{}", instance.name)
}

pub struct SnapshotEngine {
    provider: Arc<dyn ResourceProvider>,
    wait: WaitConfig,
}

impl SnapshotEngine {
    pub fn new(provider: Arc<dyn ResourceProvider>, wait: WaitConfig) -> Self {
        Self { provider, wait }
    }

    pub fn wait_config(&self) -> &WaitConfig {
        &self.wait
    }

    /// Create an image of `instance_id` named `snapshot_name` and wait for it
    ///
    /// - instance missing: `Ok(Outcome::NotFound)`, nothing is created
    /// - no image handle returned: `Err(CreationFailed)`
    /// - image failed or wait timed out: `Err(WorkflowIncomplete)` with the image
    pub async fn create_snapshot(
        &self,
        instance_id: &str,
        snapshot_name: &str,
    ) -> Result<Outcome<Image>> {
        match resolve_instance(self.provider.as_ref(), "create_snapshot", instance_id).await? {
            Resolution::Found(instance) => self.run(&instance, snapshot_name).await,
            Resolution::NotFound(target) => Ok(Outcome::NotFound(target)),
        }
    }

    /// [`create_snapshot`](Self::create_snapshot) with `snap_<instance name>`
    pub async fn create_default_snapshot(&self, instance_id: &str) -> Result<Outcome<Image>> {
        match resolve_instance(self.provider.as_ref(), "create_snapshot", instance_id).await? {
            Resolution::Found(instance) => {
                let name = default_snapshot_name(&instance);
                self.run(&instance, &name).await
            }
            Resolution::NotFound(target) => Ok(Outcome::NotFound(target)),
        }
    }

    async fn run(&self, instance: &Instance, snapshot_name: &str) -> Result<Outcome<Image>> {
        let mut state = SnapshotState::None;

        tracing::info!(
            "Creating snapshot {} of {} ({})",
            snapshot_name,
            instance.name,
            instance.id
        );
        let requested = self
            .provider
            .create_server_image(&instance.id, snapshot_name)
            .await
            .map_err(|e| CloudError::upstream("create_server_image", &instance.id, e))?;

        let Some(image) = requested else {
            tracing::warn!("No image returned for snapshot of {}", instance.id);
            return Err(CloudError::CreationFailed {
                operation: "create_server_image",
                resource_id: instance.id.clone(),
            });
        };

        state = transition(state, SnapshotState::Requested, &image);

        let outcome = wait_for_image(self.provider.as_ref(), &image.id, &self.wait).await?;
        match outcome {
            WaitOutcome::Ready(ready) => {
                transition(state, SnapshotState::Active, &ready);
                Ok(Outcome::Done(ready))
            }
            WaitOutcome::Failed(failed) => {
                transition(state, SnapshotState::Error, &failed);
                Err(CloudError::WorkflowIncomplete {
                    image: Box::new(failed),
                    reason: IncompleteReason::Failed,
                })
            }
            WaitOutcome::TimedOut(last_seen) => {
                let image = last_seen.unwrap_or(image);
                transition(state, SnapshotState::Timeout, &image);
                Err(CloudError::WorkflowIncomplete {
                    image: Box::new(image),
                    reason: IncompleteReason::TimedOut,
                })
            }
        }
    }
}

fn transition(from: SnapshotState, to: SnapshotState, image: &Image) -> SnapshotState {
    tracing::debug!(
        "Snapshot {} ({}): {} -> {} [image status {}]",
        image.name,
        image.id,
        from,
        to,
        image.status
    );
    to
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FlavorRef, InstanceStatus};
    use std::collections::BTreeMap;

    #[test]
    fn test_default_snapshot_name() {
        let instance = Instance {
            id: "i-1".to_string(),
            name: "web-01".to_string(),
            status: InstanceStatus::Active,
            flavor: FlavorRef::default(),
            created: None,
            updated: None,
            addresses: BTreeMap::new(),
        };

        assert_eq!(default_snapshot_name(&instance), "snap_web-01");
    }

    #[test]
    fn test_only_requested_is_non_terminal() {
        assert!(!SnapshotState::Requested.is_terminal());
        assert!(!SnapshotState::None.is_terminal());
        assert!(SnapshotState::Active.is_terminal());
        assert!(SnapshotState::Error.is_terminal());
        assert!(SnapshotState::Timeout.is_terminal());
    }
}
