//! Resource provider traits
//!
//! The cloud API surface opsdeck orchestrates against, grouped by
//! capability. Implementations are expected to be connected and
//! authenticated already; the orchestration layer receives one as an
//! `Arc<dyn ResourceProvider>` and never builds its own.
//!
//! `get_*` methods return `Ok(None)` for a resource that does not exist.
//! Returning [`ProviderError::NotFound`] is accepted as well.

use crate::error::ProviderResult;
use crate::model::{
    Attachment, Flavor, Image, Instance, Network, Project, QuotaUsage, SecurityGroup, Subnet,
    Volume,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Compute service (instances, flavors, volume attachments)
#[async_trait]
pub trait ComputeApi: Send + Sync {
    async fn list_servers(&self) -> ProviderResult<Vec<Instance>>;

    async fn get_server(&self, server_id: &str) -> ProviderResult<Option<Instance>>;

    /// Ask for an image of the server. `None` means the request was accepted
    /// but no image handle came back.
    async fn create_server_image(&self, server_id: &str, name: &str)
    -> ProviderResult<Option<Image>>;

    async fn start_server(&self, server_id: &str) -> ProviderResult<()>;

    async fn stop_server(&self, server_id: &str) -> ProviderResult<()>;

    /// Graceful OS-level restart
    async fn soft_reboot_server(&self, server_id: &str) -> ProviderResult<()>;

    async fn delete_server(&self, server_id: &str) -> ProviderResult<()>;

    async fn list_flavors(&self) -> ProviderResult<Vec<Flavor>>;

    async fn get_flavor(&self, flavor_id: &str) -> ProviderResult<Option<Flavor>>;

    async fn list_volume_attachments(&self, server_id: &str) -> ProviderResult<Vec<Attachment>>;

    async fn create_volume_attachment(
        &self,
        server_id: &str,
        volume_id: &str,
    ) -> ProviderResult<Attachment>;

    async fn delete_volume_attachment(
        &self,
        server_id: &str,
        attachment: &Attachment,
    ) -> ProviderResult<()>;
}

/// Block storage service
#[async_trait]
pub trait StorageApi: Send + Sync {
    async fn list_volumes(&self) -> ProviderResult<Vec<Volume>>;

    async fn get_volume(&self, volume_id: &str) -> ProviderResult<Option<Volume>>;
}

/// Network service
#[async_trait]
pub trait NetworkApi: Send + Sync {
    async fn list_networks(&self) -> ProviderResult<Vec<Network>>;

    async fn list_subnets(&self) -> ProviderResult<Vec<Subnet>>;

    /// Security groups with their rules populated
    async fn list_security_groups(&self) -> ProviderResult<Vec<SecurityGroup>>;
}

/// Image service
#[async_trait]
pub trait ImageApi: Send + Sync {
    async fn list_images(&self) -> ProviderResult<Vec<Image>>;

    async fn get_image(&self, image_id: &str) -> ProviderResult<Option<Image>>;
}

/// Identity service
#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// Check that the provider is configured and the credentials work
    async fn check_auth(&self) -> ProviderResult<AuthStatus>;

    async fn list_projects(&self) -> ProviderResult<Vec<Project>>;

    /// Quota usage for `project_id`, or for the authenticated project when
    /// `None`
    async fn quota_usage(&self, project_id: Option<&str>) -> ProviderResult<QuotaUsage>;
}

/// Full provider surface
pub trait ResourceProvider: ComputeApi + StorageApi + NetworkApi + ImageApi + IdentityApi {
    /// Provider name used in logs (e.g. "openstack")
    fn name(&self) -> &str;
}

/// Authentication status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    /// Whether authentication is valid
    pub authenticated: bool,

    /// Project the credentials are scoped to
    pub project_id: Option<String>,

    /// Error message if not authenticated
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn ok(project_id: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            project_id: Some(project_id.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            project_id: None,
            error: Some(error.into()),
        }
    }
}
