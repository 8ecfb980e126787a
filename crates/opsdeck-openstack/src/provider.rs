//! OpenStack provider implementation

use crate::cli::OpenStackCli;
use crate::error::OpenStackError;
use crate::wire::quota_from_limits;
use async_trait::async_trait;
use opsdeck_cloud::{
    Attachment, AuthStatus, ComputeApi, Flavor, IdentityApi, Image, ImageApi, Instance, Network,
    NetworkApi, Project, ProviderError, ProviderResult, QuotaUsage, ResourceProvider,
    SecurityGroup, SecurityGroupRule, StorageApi, Subnet, Volume,
};
use opsdeck_config::OpenStackSettings;
use std::collections::HashMap;

/// OpenStack provider backed by the `openstack` CLI
pub struct OpenStackProvider {
    cli: OpenStackCli,
}

impl OpenStackProvider {
    pub fn new(cli: OpenStackCli) -> Self {
        Self { cli }
    }

    pub fn from_settings(settings: &OpenStackSettings) -> Self {
        Self::new(OpenStackCli::from_settings(settings))
    }

    pub fn cli(&self) -> &OpenStackCli {
        &self.cli
    }

    /// Project the current credentials are scoped to
    async fn current_project(&self) -> ProviderResult<String> {
        let token = self.cli.issue_token().await?;
        token.project_id.ok_or_else(|| {
            ProviderError::AuthenticationFailed("token is not scoped to a project".to_string())
        })
    }
}

/// `Ok(None)` for a not-found lookup
fn optional<T>(result: crate::Result<T>) -> ProviderResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn server_op(result: crate::Result<()>, server_id: &str) -> ProviderResult<()> {
    result.map_err(|e| e.for_resource("server", server_id))
}

#[async_trait]
impl ComputeApi for OpenStackProvider {
    async fn list_servers(&self) -> ProviderResult<Vec<Instance>> {
        let rows = self.cli.list_servers().await?;
        let mut servers: Vec<Instance> = rows.into_iter().map(Instance::from).collect();

        // The list only names the flavor; fill sizes from one flavor listing
        if servers.iter().any(|s| s.flavor.vcpus == 0) {
            let flavors = self.list_flavors().await?;
            for server in &mut servers {
                let flavor = flavors.iter().find(|f| {
                    server.flavor.id.as_deref() == Some(f.id.as_str())
                        || server.flavor.name.as_deref() == Some(f.name.as_str())
                });
                if let Some(flavor) = flavor {
                    server.flavor.id = Some(flavor.id.clone());
                    server.flavor.name = Some(flavor.name.clone());
                    server.flavor.vcpus = flavor.vcpus;
                    server.flavor.ram_mb = flavor.ram_mb;
                    server.flavor.disk_gb = flavor.disk_gb;
                }
            }
        }

        Ok(servers)
    }

    async fn get_server(&self, server_id: &str) -> ProviderResult<Option<Instance>> {
        Ok(optional(self.cli.show_server(server_id).await)?.map(Instance::from))
    }

    async fn create_server_image(
        &self,
        server_id: &str,
        name: &str,
    ) -> ProviderResult<Option<Image>> {
        let row = self
            .cli
            .create_server_image(server_id, name)
            .await
            .map_err(|e| e.for_resource("server", server_id))?;
        Ok(row.map(Image::from))
    }

    async fn start_server(&self, server_id: &str) -> ProviderResult<()> {
        server_op(self.cli.start_server(server_id).await, server_id)
    }

    async fn stop_server(&self, server_id: &str) -> ProviderResult<()> {
        server_op(self.cli.stop_server(server_id).await, server_id)
    }

    async fn soft_reboot_server(&self, server_id: &str) -> ProviderResult<()> {
        server_op(self.cli.soft_reboot_server(server_id).await, server_id)
    }

    async fn delete_server(&self, server_id: &str) -> ProviderResult<()> {
        server_op(self.cli.delete_server(server_id).await, server_id)
    }

    async fn list_flavors(&self) -> ProviderResult<Vec<Flavor>> {
        let rows = self.cli.list_flavors().await?;
        Ok(rows.into_iter().map(Flavor::from).collect())
    }

    async fn get_flavor(&self, flavor_id: &str) -> ProviderResult<Option<Flavor>> {
        Ok(optional(self.cli.show_flavor(flavor_id).await)?.map(Flavor::from))
    }

    async fn list_volume_attachments(&self, server_id: &str) -> ProviderResult<Vec<Attachment>> {
        let rows = self
            .cli
            .list_server_volumes(server_id)
            .await
            .map_err(|e| e.for_resource("server", server_id))?;
        Ok(rows.into_iter().map(Attachment::from).collect())
    }

    async fn create_volume_attachment(
        &self,
        server_id: &str,
        volume_id: &str,
    ) -> ProviderResult<Attachment> {
        self.cli
            .add_server_volume(server_id, volume_id)
            .await
            .map_err(|e| e.for_resource("volume", volume_id))?;

        // `server add volume` prints nothing on older clients; read it back
        let attachments = self.list_volume_attachments(server_id).await?;
        attachments
            .into_iter()
            .find(|a| a.volume_id == volume_id)
            .ok_or_else(|| {
                OpenStackError::UnexpectedOutput(format!(
                    "volume {} not listed on {} after attach",
                    volume_id, server_id
                ))
                .into()
            })
    }

    async fn delete_volume_attachment(
        &self,
        server_id: &str,
        attachment: &Attachment,
    ) -> ProviderResult<()> {
        self.cli
            .remove_server_volume(server_id, &attachment.volume_id)
            .await
            .map_err(|e| e.for_resource("attachment", &attachment.id))
    }
}

#[async_trait]
impl StorageApi for OpenStackProvider {
    async fn list_volumes(&self) -> ProviderResult<Vec<Volume>> {
        let rows = self.cli.list_volumes().await?;
        Ok(rows.into_iter().map(Volume::from).collect())
    }

    async fn get_volume(&self, volume_id: &str) -> ProviderResult<Option<Volume>> {
        Ok(optional(self.cli.show_volume(volume_id).await)?.map(Volume::from))
    }
}

#[async_trait]
impl NetworkApi for OpenStackProvider {
    async fn list_networks(&self) -> ProviderResult<Vec<Network>> {
        let rows = self.cli.list_networks().await?;
        Ok(rows.into_iter().map(Network::from).collect())
    }

    async fn list_subnets(&self) -> ProviderResult<Vec<Subnet>> {
        let rows = self.cli.list_subnets().await?;
        Ok(rows.into_iter().map(Subnet::from).collect())
    }

    async fn list_security_groups(&self) -> ProviderResult<Vec<SecurityGroup>> {
        let groups = self.cli.list_security_groups().await?;
        let rules = self.cli.list_security_group_rules().await?;

        let mut by_group: HashMap<String, Vec<SecurityGroupRule>> = HashMap::new();
        for rule in rules {
            by_group
                .entry(rule.security_group.clone())
                .or_default()
                .push(SecurityGroupRule::from(rule));
        }

        Ok(groups
            .into_iter()
            .map(|group| SecurityGroup {
                rules: by_group.remove(&group.id).unwrap_or_default(),
                id: group.id,
                name: group.name,
                description: group.description.unwrap_or_default(),
            })
            .collect())
    }
}

#[async_trait]
impl ImageApi for OpenStackProvider {
    async fn list_images(&self) -> ProviderResult<Vec<Image>> {
        let rows = self.cli.list_images().await?;
        Ok(rows.into_iter().map(Image::from).collect())
    }

    async fn get_image(&self, image_id: &str) -> ProviderResult<Option<Image>> {
        Ok(optional(self.cli.show_image(image_id).await)?.map(Image::from))
    }
}

#[async_trait]
impl IdentityApi for OpenStackProvider {
    async fn check_auth(&self) -> ProviderResult<AuthStatus> {
        match self.cli.issue_token().await {
            Ok(token) => Ok(AuthStatus::ok(
                token.project_id.unwrap_or_else(|| "unscoped".to_string()),
            )),
            Err(OpenStackError::CliNotFound(binary)) => Ok(AuthStatus::failed(format!(
                "{} is not installed",
                binary
            ))),
            Err(e) => Ok(AuthStatus::failed(e.to_string())),
        }
    }

    async fn list_projects(&self) -> ProviderResult<Vec<Project>> {
        let rows = self.cli.list_projects().await?;
        Ok(rows.into_iter().map(Project::from).collect())
    }

    async fn quota_usage(&self, project_id: Option<&str>) -> ProviderResult<QuotaUsage> {
        let project_id = match project_id {
            Some(id) => id.to_string(),
            None => self.current_project().await?,
        };

        let limits = self
            .cli
            .absolute_limits(Some(&project_id))
            .await
            .map_err(|e| e.for_resource("project", &project_id))?;
        Ok(quota_from_limits(project_id, &limits))
    }
}

impl ResourceProvider for OpenStackProvider {
    fn name(&self) -> &str {
        "openstack"
    }
}
