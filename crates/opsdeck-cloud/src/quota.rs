//! Quota usage reader

use crate::error::{CloudError, Result};
use crate::model::QuotaUsage;
use crate::provider::{IdentityApi, ResourceProvider};
use std::sync::Arc;

pub struct QuotaReader {
    provider: Arc<dyn ResourceProvider>,
}

impl QuotaReader {
    pub fn new(provider: Arc<dyn ResourceProvider>) -> Self {
        Self { provider }
    }

    /// Quota usage of `project_id`, or of the authenticated project
    ///
    /// Single read, no retry. Provider failures come back as
    /// [`CloudError::Upstream`] with the original cause.
    pub async fn quota_usage(&self, project_id: Option<&str>) -> Result<QuotaUsage> {
        let target = project_id.unwrap_or("<current project>");
        tracing::debug!("Reading quota usage for {}", target);

        self.provider
            .quota_usage(project_id)
            .await
            .map_err(|e| CloudError::upstream("quota_usage", target, e))
    }
}
