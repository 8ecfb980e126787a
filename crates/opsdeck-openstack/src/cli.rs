//! openstack CLI wrapper
//!
//! Runs `openstack [--os-cloud X] [--os-region-name Y] <args>` and parses
//! `-f json` output. Credentials come from clouds.yaml or `OS_*`
//! environment variables, exactly as for an interactive shell.

use crate::error::{OpenStackError, Result, classify_failure};
use crate::wire::{
    AttachmentRow, FlavorRow, ImageRow, LimitRow, NetworkRow, ProjectRow, SecurityGroupRow,
    SecurityGroupRuleRow, ServerRow, SubnetRow, TokenInfo, VolumeRow,
};
use opsdeck_config::OpenStackSettings;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::process::Command;

/// openstack CLI wrapper
#[derive(Debug, Clone)]
pub struct OpenStackCli {
    binary: String,
    cloud: Option<String>,
    region: Option<String>,
}

impl OpenStackCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            cloud: None,
            region: None,
        }
    }

    pub fn from_settings(settings: &OpenStackSettings) -> Self {
        Self {
            binary: settings.binary.clone(),
            cloud: settings.cloud.clone(),
            region: settings.region.clone(),
        }
    }

    /// Use a clouds.yaml entry (`--os-cloud`)
    pub fn with_cloud(mut self, cloud: impl Into<String>) -> Self {
        self.cloud = Some(cloud.into());
        self
    }

    /// Override the region (`--os-region-name`)
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Global options placed before the subcommand
    fn global_args(&self) -> Vec<&str> {
        let mut args = Vec::new();
        if let Some(ref cloud) = self.cloud {
            args.push("--os-cloud");
            args.push(cloud.as_str());
        }
        if let Some(ref region) = self.region {
            args.push("--os-region-name");
            args.push(region.as_str());
        }
        args
    }

    /// Run a command and return stdout
    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let global = self.global_args();

        let mut cmd = Command::new(&self.binary);
        cmd.args(&global);
        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!(
            "Running: {} {}",
            self.binary,
            global.iter().chain(args).copied().collect::<Vec<_>>().join(" ")
        );

        let output = match cmd.output().await {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(OpenStackError::CliNotFound(self.binary.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(&stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Run a command with `-f json` and parse its output
    async fn run_json<T: DeserializeOwned>(&self, args: &[&str]) -> Result<T> {
        let mut args = args.to_vec();
        args.extend(["-f", "json"]);
        let output = self.run_command(&args).await?;
        Ok(serde_json::from_str(&output)?)
    }

    /// Like [`run_json`](Self::run_json) for list commands, where empty
    /// output means no rows
    async fn run_list<T: DeserializeOwned>(&self, args: &[&str]) -> Result<Vec<T>> {
        let mut args = args.to_vec();
        args.extend(["-f", "json"]);
        let output = self.run_command(&args).await?;

        if output.trim().is_empty() || output.trim() == "[]" {
            return Ok(Vec::new());
        }

        Ok(serde_json::from_str(&output)?)
    }

    // Compute

    pub async fn list_servers(&self) -> Result<Vec<ServerRow>> {
        self.run_list(&["server", "list", "--long"]).await
    }

    pub async fn show_server(&self, id: &str) -> Result<ServerRow> {
        self.run_json(&["server", "show", id]).await
    }

    pub async fn start_server(&self, id: &str) -> Result<()> {
        self.run_command(&["server", "start", id]).await?;
        Ok(())
    }

    pub async fn stop_server(&self, id: &str) -> Result<()> {
        self.run_command(&["server", "stop", id]).await?;
        Ok(())
    }

    pub async fn soft_reboot_server(&self, id: &str) -> Result<()> {
        self.run_command(&["server", "reboot", "--soft", id]).await?;
        Ok(())
    }

    pub async fn delete_server(&self, id: &str) -> Result<()> {
        self.run_command(&["server", "delete", id]).await?;
        Ok(())
    }

    /// Request an image of the server; `None` when the CLI printed nothing
    pub async fn create_server_image(&self, id: &str, name: &str) -> Result<Option<ImageRow>> {
        let output = self
            .run_command(&["server", "image", "create", "--name", name, id, "-f", "json"])
            .await?;

        let trimmed = output.trim();
        if trimmed.is_empty() || trimmed == "{}" {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(trimmed)?))
    }

    pub async fn list_flavors(&self) -> Result<Vec<FlavorRow>> {
        self.run_list(&["flavor", "list", "--all"]).await
    }

    pub async fn show_flavor(&self, id: &str) -> Result<FlavorRow> {
        self.run_json(&["flavor", "show", id]).await
    }

    pub async fn list_server_volumes(&self, server_id: &str) -> Result<Vec<AttachmentRow>> {
        self.run_list(&["server", "volume", "list", server_id]).await
    }

    pub async fn add_server_volume(&self, server_id: &str, volume_id: &str) -> Result<()> {
        self.run_command(&["server", "add", "volume", server_id, volume_id])
            .await?;
        Ok(())
    }

    pub async fn remove_server_volume(&self, server_id: &str, volume_id: &str) -> Result<()> {
        self.run_command(&["server", "remove", "volume", server_id, volume_id])
            .await?;
        Ok(())
    }

    // Block storage

    pub async fn list_volumes(&self) -> Result<Vec<VolumeRow>> {
        self.run_list(&["volume", "list"]).await
    }

    pub async fn show_volume(&self, id: &str) -> Result<VolumeRow> {
        self.run_json(&["volume", "show", id]).await
    }

    // Network

    pub async fn list_networks(&self) -> Result<Vec<NetworkRow>> {
        self.run_list(&["network", "list"]).await
    }

    pub async fn list_subnets(&self) -> Result<Vec<SubnetRow>> {
        self.run_list(&["subnet", "list"]).await
    }

    pub async fn list_security_groups(&self) -> Result<Vec<SecurityGroupRow>> {
        self.run_list(&["security", "group", "list"]).await
    }

    pub async fn list_security_group_rules(&self) -> Result<Vec<SecurityGroupRuleRow>> {
        self.run_list(&["security", "group", "rule", "list", "--long"])
            .await
    }

    // Image

    pub async fn list_images(&self) -> Result<Vec<ImageRow>> {
        self.run_list(&["image", "list"]).await
    }

    pub async fn show_image(&self, id: &str) -> Result<ImageRow> {
        self.run_json(&["image", "show", id]).await
    }

    // Identity

    pub async fn issue_token(&self) -> Result<TokenInfo> {
        self.run_json(&["token", "issue"]).await
    }

    pub async fn list_projects(&self) -> Result<Vec<ProjectRow>> {
        self.run_list(&["project", "list", "--long"]).await
    }

    pub async fn absolute_limits(&self, project_id: Option<&str>) -> Result<Vec<LimitRow>> {
        let mut args = vec!["limits", "show", "--absolute"];
        if let Some(project_id) = project_id {
            args.push("--project");
            args.push(project_id);
        }
        self.run_list(&args).await
    }
}
