//! Volume attachment reconciler
//!
//! Volumes attach to one instance at a time. Detach requests are keyed by
//! the attachment, not the volume, so detaching starts by finding the
//! instance's attachment for the volume.

use crate::error::{CloudError, Result};
use crate::model::Attachment;
use crate::provider::{ComputeApi, ResourceProvider};
use crate::resolve::{Outcome, Resolution, resolve_instance, resolve_volume};
use std::sync::Arc;

pub struct AttachmentReconciler {
    provider: Arc<dyn ResourceProvider>,
}

impl AttachmentReconciler {
    pub fn new(provider: Arc<dyn ResourceProvider>) -> Self {
        Self { provider }
    }

    /// Attach `volume_id` to `instance_id`
    ///
    /// Both resources are resolved before anything is sent. A volume that
    /// is already in use, or mid-attach, is refused; it has to be detached
    /// explicitly first.
    pub async fn attach(&self, instance_id: &str, volume_id: &str) -> Result<Outcome<Attachment>> {
        const OPERATION: &str = "attach_volume";

        let instance =
            match resolve_instance(self.provider.as_ref(), OPERATION, instance_id).await? {
                Resolution::Found(instance) => instance,
                Resolution::NotFound(target) => return Ok(Outcome::NotFound(target)),
            };
        let volume = match resolve_volume(self.provider.as_ref(), OPERATION, volume_id).await? {
            Resolution::Found(volume) => volume,
            Resolution::NotFound(target) => return Ok(Outcome::NotFound(target)),
        };

        if volume.is_attached_or_attaching() {
            tracing::warn!("Volume {} is {}, refusing to attach", volume.id, volume.status);
            return Err(CloudError::VolumeInUse {
                volume_id: volume.id,
            });
        }

        // The volume status can lag behind; the instance's own view wins.
        let existing = self.list_attachments(OPERATION, &instance.id).await?;
        if find_attachment(&existing, &volume.id).is_some() {
            tracing::warn!(
                "Volume {} is already attached to {}",
                volume.id,
                instance.id
            );
            return Err(CloudError::VolumeInUse {
                volume_id: volume.id,
            });
        }

        tracing::info!(
            "Attaching volume {} ({} GB) to {} ({})",
            volume.name,
            volume.size_gb,
            instance.name,
            instance.id
        );

        let attachment = self
            .provider
            .create_volume_attachment(&instance.id, &volume.id)
            .await
            .map_err(|e| CloudError::upstream(OPERATION, &volume.id, e))?;

        tracing::debug!("Created attachment {}", attachment.id);
        Ok(Outcome::Done(attachment))
    }

    /// Detach `volume_id` from `instance_id`
    ///
    /// Returns [`Outcome::NotAttached`] when the instance exists but has no
    /// attachment for the volume, which is also what a repeated detach sees.
    pub async fn detach(&self, instance_id: &str, volume_id: &str) -> Result<Outcome<()>> {
        const OPERATION: &str = "detach_volume";

        let instance =
            match resolve_instance(self.provider.as_ref(), OPERATION, instance_id).await? {
                Resolution::Found(instance) => instance,
                Resolution::NotFound(target) => return Ok(Outcome::NotFound(target)),
            };

        let attachments = self.list_attachments(OPERATION, &instance.id).await?;
        let matching = attachments
            .iter()
            .filter(|a| a.volume_id == volume_id)
            .count();
        if matching > 1 {
            tracing::warn!(
                "Volume {} has {} attachments on {}; detaching the first",
                volume_id,
                matching,
                instance.id
            );
        }

        let Some(attachment) = find_attachment(&attachments, volume_id) else {
            tracing::warn!("Volume {} is not attached to {}", volume_id, instance.id);
            return Ok(Outcome::NotAttached {
                instance_id: instance.id,
                volume_id: volume_id.to_string(),
            });
        };

        tracing::info!(
            "Detaching volume {} from {} (attachment {})",
            volume_id,
            instance.id,
            attachment.id
        );

        match self
            .provider
            .delete_volume_attachment(&instance.id, attachment)
            .await
        {
            Ok(()) => Ok(Outcome::Done(())),
            Err(e) if e.is_not_found() => Ok(Outcome::NotAttached {
                instance_id: instance.id,
                volume_id: volume_id.to_string(),
            }),
            Err(e) => Err(CloudError::upstream(OPERATION, &attachment.id, e)),
        }
    }

    /// Current attachments of an instance
    pub async fn attachments(&self, instance_id: &str) -> Result<Outcome<Vec<Attachment>>> {
        const OPERATION: &str = "list_volume_attachments";

        match resolve_instance(self.provider.as_ref(), OPERATION, instance_id).await? {
            Resolution::Found(instance) => {
                let attachments = self.list_attachments(OPERATION, &instance.id).await?;
                Ok(Outcome::Done(attachments))
            }
            Resolution::NotFound(target) => Ok(Outcome::NotFound(target)),
        }
    }

    async fn list_attachments(
        &self,
        operation: &'static str,
        instance_id: &str,
    ) -> Result<Vec<Attachment>> {
        tracing::debug!("Listing volume attachments of {}", instance_id);
        self.provider
            .list_volume_attachments(instance_id)
            .await
            .map_err(|e| CloudError::upstream(operation, instance_id, e))
    }
}

/// First attachment referencing `volume_id`
pub fn find_attachment<'a>(attachments: &'a [Attachment], volume_id: &str) -> Option<&'a Attachment> {
    attachments.iter().find(|a| a.volume_id == volume_id)
}
