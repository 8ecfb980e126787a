//! Resolve-by-id helper and the outcome type for expected failures

use crate::error::{CloudError, ProviderResult, Result};
use crate::model::{Image, Instance, Volume};
use crate::provider::{ComputeApi, ImageApi, ResourceProvider, StorageApi};
use serde::{Deserialize, Serialize};

/// Kind of resource an id refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Instance,
    Volume,
    Image,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Instance => write!(f, "instance"),
            ResourceKind::Volume => write!(f, "volume"),
            ResourceKind::Image => write!(f, "image"),
        }
    }
}

/// Typed resource identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub id: String,
}

impl ResourceRef {
    pub fn new(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn instance(id: impl Into<String>) -> Self {
        Self::new(ResourceKind::Instance, id)
    }

    pub fn volume(id: impl Into<String>) -> Self {
        Self::new(ResourceKind::Volume, id)
    }

    pub fn image(id: impl Into<String>) -> Self {
        Self::new(ResourceKind::Image, id)
    }
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// Result of looking a resource up by id
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    Found(T),
    NotFound(ResourceRef),
}

/// Result of an operation whose expected failures are plain values
///
/// Callers looping over many resources match on this and keep going;
/// only [`CloudError`] values are real failures.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Done(T),
    NotFound(ResourceRef),
    /// The instance exists but has no attachment for the volume
    NotAttached {
        instance_id: String,
        volume_id: String,
    },
}

impl<T> Outcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }

    pub fn done(self) -> Option<T> {
        match self {
            Outcome::Done(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Done(value) => Outcome::Done(f(value)),
            Outcome::NotFound(target) => Outcome::NotFound(target),
            Outcome::NotAttached {
                instance_id,
                volume_id,
            } => Outcome::NotAttached {
                instance_id,
                volume_id,
            },
        }
    }
}

impl<T> From<ResourceRef> for Outcome<T> {
    fn from(target: ResourceRef) -> Self {
        Outcome::NotFound(target)
    }
}

/// Folds a provider lookup into a [`Resolution`]
///
/// `Ok(None)` and `ProviderError::NotFound` both mean "absent"; anything
/// else is an upstream failure of `operation`.
fn settle<T>(
    operation: &'static str,
    target: ResourceRef,
    result: ProviderResult<Option<T>>,
) -> Result<Resolution<T>> {
    match result {
        Ok(Some(resource)) => Ok(Resolution::Found(resource)),
        Ok(None) => {
            tracing::warn!("{} not found during {}", target, operation);
            Ok(Resolution::NotFound(target))
        }
        Err(e) if e.is_not_found() => {
            tracing::warn!("{} not found during {}: {}", target, operation, e);
            Ok(Resolution::NotFound(target))
        }
        Err(e) => Err(CloudError::upstream(operation, target.id, e)),
    }
}

pub async fn resolve_instance(
    provider: &dyn ResourceProvider,
    operation: &'static str,
    instance_id: &str,
) -> Result<Resolution<Instance>> {
    tracing::debug!("Resolving instance {} for {}", instance_id, operation);
    let result = provider.get_server(instance_id).await;
    settle(operation, ResourceRef::instance(instance_id), result)
}

pub async fn resolve_volume(
    provider: &dyn ResourceProvider,
    operation: &'static str,
    volume_id: &str,
) -> Result<Resolution<Volume>> {
    tracing::debug!("Resolving volume {} for {}", volume_id, operation);
    let result = provider.get_volume(volume_id).await;
    settle(operation, ResourceRef::volume(volume_id), result)
}

pub async fn resolve_image(
    provider: &dyn ResourceProvider,
    operation: &'static str,
    image_id: &str,
) -> Result<Resolution<Image>> {
    tracing::debug!("Resolving image {} for {}", image_id, operation);
    let result = provider.get_image(image_id).await;
    settle(operation, ResourceRef::image(image_id), result)
}
