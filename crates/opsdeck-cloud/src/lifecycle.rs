//! Instance lifecycle controller
//!
//! start / stop / reboot / delete on a single instance. Each operation
//! resolves the instance first and only then issues the request. None of
//! them wait for the instance to reach the requested status; convergence is
//! the provider's job.

use crate::action::{BatchReport, LifecycleAction};
use crate::error::{CloudError, Result};
use crate::provider::{ComputeApi, ResourceProvider};
use crate::resolve::{Outcome, ResourceRef, Resolution, resolve_instance};
use std::sync::Arc;

pub struct LifecycleController {
    provider: Arc<dyn ResourceProvider>,
}

impl LifecycleController {
    pub fn new(provider: Arc<dyn ResourceProvider>) -> Self {
        Self { provider }
    }

    pub async fn start(&self, instance_id: &str) -> Result<Outcome<()>> {
        self.apply(LifecycleAction::Start, instance_id).await
    }

    pub async fn stop(&self, instance_id: &str) -> Result<Outcome<()>> {
        self.apply(LifecycleAction::Stop, instance_id).await
    }

    /// Soft reboot
    pub async fn reboot(&self, instance_id: &str) -> Result<Outcome<()>> {
        self.apply(LifecycleAction::Reboot, instance_id).await
    }

    /// Delete the instance. Deleting one that is already gone is the
    /// `NotFound` outcome, not an error.
    pub async fn delete(&self, instance_id: &str) -> Result<Outcome<()>> {
        self.apply(LifecycleAction::Delete, instance_id).await
    }

    pub async fn apply(&self, action: LifecycleAction, instance_id: &str) -> Result<Outcome<()>> {
        let operation = operation_name(action);
        let resolution = resolve_instance(self.provider.as_ref(), operation, instance_id).await?;
        let instance = match resolution {
            Resolution::Found(instance) => instance,
            Resolution::NotFound(target) => return Ok(Outcome::NotFound(target)),
        };

        tracing::info!(
            "Requesting {} of {} ({}, currently {})",
            action,
            instance.name,
            instance.id,
            instance.status
        );

        let result = match action {
            LifecycleAction::Start => self.provider.start_server(&instance.id).await,
            LifecycleAction::Stop => self.provider.stop_server(&instance.id).await,
            LifecycleAction::Reboot => self.provider.soft_reboot_server(&instance.id).await,
            LifecycleAction::Delete => self.provider.delete_server(&instance.id).await,
        };

        match result {
            Ok(()) => Ok(Outcome::Done(())),
            // Gone between resolve and request
            Err(e) if e.is_not_found() => {
                tracing::warn!("Instance {} disappeared before {}", instance.id, action);
                Ok(Outcome::NotFound(ResourceRef::instance(instance.id)))
            }
            Err(e) => Err(CloudError::upstream(operation, instance.id, e)),
        }
    }

    /// Apply `action` to every id in order, never stopping early
    pub async fn apply_all<I, S>(&self, action: LifecycleAction, instance_ids: I) -> BatchReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = BatchReport::new(action);
        let start = std::time::Instant::now();

        for id in instance_ids {
            let id = id.as_ref();
            match self.apply(action, id).await {
                Ok(Outcome::Done(())) => {
                    report.add_success(id.to_string(), format!("{} requested", action));
                }
                Ok(other) => {
                    report.add_skipped(id.to_string(), describe_skip(&other));
                }
                Err(e) => {
                    tracing::warn!("{} of {} failed: {}", action, id, e);
                    report.add_failure(id.to_string(), e.to_string());
                }
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!("{} batch finished: {}", action, report.summary());
        report
    }
}

fn operation_name(action: LifecycleAction) -> &'static str {
    match action {
        LifecycleAction::Start => "start_server",
        LifecycleAction::Stop => "stop_server",
        LifecycleAction::Reboot => "reboot_server",
        LifecycleAction::Delete => "delete_server",
    }
}

fn describe_skip(outcome: &Outcome<()>) -> String {
    match outcome {
        Outcome::NotFound(target) => format!("{} not found", target),
        Outcome::NotAttached {
            instance_id,
            volume_id,
        } => format!("volume {} not attached to {}", volume_id, instance_id),
        Outcome::Done(()) => String::new(),
    }
}
