#![allow(dead_code)]

use async_trait::async_trait;
use opsdeck_cloud::{
    Attachment, AuthStatus, ComputeApi, Flavor, FlavorRef, IdentityApi, Image, ImageApi,
    ImageStatus, Instance, InstanceStatus, Network, NetworkApi, Project, ProviderError,
    ProviderResult, QuotaUsage, ResourceProvider, SecurityGroup, StorageApi, Subnet, Volume,
    VolumeStatus,
};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct State {
    servers: Vec<Instance>,
    volumes: Vec<Volume>,
    attachments: Vec<Attachment>,
    flavors: Vec<Flavor>,
    networks: Vec<Network>,
    subnets: Vec<Subnet>,
    security_groups: Vec<SecurityGroup>,
    images: Vec<Image>,
    projects: Vec<Project>,
    quotas: HashMap<String, QuotaUsage>,
    current_project: String,
    /// Statuses handed out by successive get_image calls, per image id
    image_script: HashMap<String, VecDeque<ImageStatus>>,
    /// Script applied to the next image created
    next_image_script: VecDeque<ImageStatus>,
    create_image_returns_none: bool,
    /// Successful get_image polls before images disappear, and how
    vanish: Option<(u32, Gone)>,
    image_polls: HashMap<String, u32>,
    /// Operation name -> how it fails
    failures: HashMap<String, Failure>,
    calls: Vec<String>,
    next_id: u32,
}

#[derive(Clone)]
enum Failure {
    Api(String),
    NotFound(String),
}

impl Failure {
    fn to_error(&self, target: &str) -> ProviderError {
        match self {
            Failure::Api(message) => ProviderError::Api(message.clone()),
            Failure::NotFound(kind) => ProviderError::not_found(kind.clone(), target),
        }
    }
}

/// How a vanished image shows up on the next poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gone {
    /// `get_image` returns `Ok(None)`
    Absent,
    /// `get_image` fails with `ProviderError::NotFound`
    NotFoundError,
}

/// In-memory provider that records every call it receives
#[derive(Default)]
pub struct FakeProvider {
    state: Mutex<State>,
}

impl FakeProvider {
    pub fn new() -> Self {
        let provider = Self::default();
        provider.state.lock().unwrap().current_project = "p-current".to_string();
        provider
    }

    pub fn into_arc(self) -> Arc<dyn ResourceProvider> {
        Arc::new(self)
    }

    pub fn with_server(self, id: &str, name: &str, status: InstanceStatus) -> Self {
        self.state.lock().unwrap().servers.push(instance(id, name, status));
        self
    }

    pub fn with_instance(self, instance: Instance) -> Self {
        self.state.lock().unwrap().servers.push(instance);
        self
    }

    pub fn with_volume(self, id: &str, size_gb: u64) -> Self {
        self.state.lock().unwrap().volumes.push(Volume {
            id: id.to_string(),
            name: format!("{}-data", id),
            status: VolumeStatus::Available,
            size_gb,
        });
        self
    }

    pub fn with_volume_status(self, id: &str, status: VolumeStatus) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            if let Some(v) = state.volumes.iter_mut().find(|v| v.id == id) {
                v.status = status;
            }
        }
        self
    }

    pub fn with_flavor(self, flavor: Flavor) -> Self {
        self.state.lock().unwrap().flavors.push(flavor);
        self
    }

    pub fn with_network(self, network: Network) -> Self {
        self.state.lock().unwrap().networks.push(network);
        self
    }

    pub fn with_subnet(self, subnet: Subnet) -> Self {
        self.state.lock().unwrap().subnets.push(subnet);
        self
    }

    pub fn with_security_group(self, group: SecurityGroup) -> Self {
        self.state.lock().unwrap().security_groups.push(group);
        self
    }

    pub fn with_image(self, image: Image) -> Self {
        self.state.lock().unwrap().images.push(image);
        self
    }

    pub fn with_project(self, project: Project) -> Self {
        self.state.lock().unwrap().projects.push(project);
        self
    }

    pub fn with_quota(self, quota: QuotaUsage) -> Self {
        self.state
            .lock()
            .unwrap()
            .quotas
            .insert(quota.project_id.clone(), quota);
        self
    }

    /// Statuses the next created image reports on successive polls; the
    /// last one sticks
    pub fn with_image_progress(self, statuses: Vec<ImageStatus>) -> Self {
        self.state.lock().unwrap().next_image_script = statuses.into();
        self
    }

    pub fn with_create_image_returning_none(self) -> Self {
        self.state.lock().unwrap().create_image_returns_none = true;
        self
    }

    /// Images are deleted after `polls` successful `get_image` calls
    pub fn with_image_vanishing_after(self, polls: u32, gone: Gone) -> Self {
        self.state.lock().unwrap().vanish = Some((polls, gone));
        self
    }

    /// An existing attachment; the volume is marked in-use
    pub fn with_attachment(self, id: &str, server_id: &str, volume_id: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.attachments.push(Attachment {
                id: id.to_string(),
                server_id: server_id.to_string(),
                volume_id: volume_id.to_string(),
                device: Some("/dev/vdb".to_string()),
            });
            if let Some(v) = state.volumes.iter_mut().find(|v| v.id == volume_id) {
                v.status = VolumeStatus::InUse;
            }
        }
        self
    }

    /// Make `operation` fail with an API error
    pub fn failing(self, operation: &str, message: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(operation.to_string(), Failure::Api(message.to_string()));
        self
    }

    /// Make `operation` report its target as a missing `kind`
    pub fn failing_not_found(self, operation: &str, kind: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(operation.to_string(), Failure::NotFound(kind.to_string()));
        self
    }

    /// Recorded calls, e.g. `stop_server:i-1`
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Recorded calls to `operation`
    pub fn calls_to(&self, operation: &str) -> Vec<String> {
        let prefix = format!("{}:", operation);
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(&prefix) || c == operation)
            .collect()
    }

    pub fn attachments(&self) -> Vec<Attachment> {
        self.state.lock().unwrap().attachments.clone()
    }

    pub fn server_exists(&self, id: &str) -> bool {
        self.state.lock().unwrap().servers.iter().any(|s| s.id == id)
    }

    fn record(&self, operation: &str, target: &str) -> ProviderResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("{}:{}", operation, target));
        match state.failures.get(operation) {
            Some(failure) => Err(failure.to_error(target)),
            None => Ok(()),
        }
    }

    /// Like `record` but for reads, which are not logged as calls
    fn check(&self, operation: &str, target: &str) -> ProviderResult<()> {
        let state = self.state.lock().unwrap();
        match state.failures.get(operation) {
            Some(failure) => Err(failure.to_error(target)),
            None => Ok(()),
        }
    }

    fn set_server_status(&self, id: &str, status: InstanceStatus) -> ProviderResult<()> {
        let mut state = self.state.lock().unwrap();
        let server = state
            .servers
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| ProviderError::not_found("server", id))?;
        server.status = status;
        Ok(())
    }
}

pub fn instance(id: &str, name: &str, status: InstanceStatus) -> Instance {
    Instance {
        id: id.to_string(),
        name: name.to_string(),
        status,
        flavor: FlavorRef {
            id: Some("f-small".to_string()),
            name: Some("m1.small".to_string()),
            vcpus: 1,
            ram_mb: 2048,
            disk_gb: 20,
        },
        created: None,
        updated: None,
        addresses: BTreeMap::new(),
    }
}

#[async_trait]
impl ComputeApi for FakeProvider {
    async fn list_servers(&self) -> ProviderResult<Vec<Instance>> {
        self.check("list_servers", "")?;
        Ok(self.state.lock().unwrap().servers.clone())
    }

    async fn get_server(&self, server_id: &str) -> ProviderResult<Option<Instance>> {
        self.check("get_server", server_id)?;
        let state = self.state.lock().unwrap();
        Ok(state.servers.iter().find(|s| s.id == server_id).cloned())
    }

    async fn create_server_image(
        &self,
        server_id: &str,
        name: &str,
    ) -> ProviderResult<Option<Image>> {
        self.record("create_server_image", server_id)?;
        let mut state = self.state.lock().unwrap();
        if state.create_image_returns_none {
            return Ok(None);
        }

        state.next_id += 1;
        let image = Image {
            id: format!("img-{}", state.next_id),
            name: name.to_string(),
            status: ImageStatus::Queued,
        };
        let script = std::mem::take(&mut state.next_image_script);
        state.image_script.insert(image.id.clone(), script);
        state.images.push(image.clone());
        Ok(Some(image))
    }

    async fn start_server(&self, server_id: &str) -> ProviderResult<()> {
        self.record("start_server", server_id)?;
        self.set_server_status(server_id, InstanceStatus::Active)
    }

    async fn stop_server(&self, server_id: &str) -> ProviderResult<()> {
        self.record("stop_server", server_id)?;
        self.set_server_status(server_id, InstanceStatus::Shutoff)
    }

    async fn soft_reboot_server(&self, server_id: &str) -> ProviderResult<()> {
        self.record("soft_reboot_server", server_id)?;
        self.set_server_status(server_id, InstanceStatus::Reboot)
    }

    async fn delete_server(&self, server_id: &str) -> ProviderResult<()> {
        self.record("delete_server", server_id)?;
        let mut state = self.state.lock().unwrap();
        let before = state.servers.len();
        state.servers.retain(|s| s.id != server_id);
        if state.servers.len() == before {
            return Err(ProviderError::not_found("server", server_id));
        }
        Ok(())
    }

    async fn list_flavors(&self) -> ProviderResult<Vec<Flavor>> {
        self.check("list_flavors", "")?;
        Ok(self.state.lock().unwrap().flavors.clone())
    }

    async fn get_flavor(&self, flavor_id: &str) -> ProviderResult<Option<Flavor>> {
        self.check("get_flavor", flavor_id)?;
        let state = self.state.lock().unwrap();
        Ok(state.flavors.iter().find(|f| f.id == flavor_id).cloned())
    }

    async fn list_volume_attachments(&self, server_id: &str) -> ProviderResult<Vec<Attachment>> {
        self.check("list_volume_attachments", server_id)?;
        let state = self.state.lock().unwrap();
        Ok(state
            .attachments
            .iter()
            .filter(|a| a.server_id == server_id)
            .cloned()
            .collect())
    }

    async fn create_volume_attachment(
        &self,
        server_id: &str,
        volume_id: &str,
    ) -> ProviderResult<Attachment> {
        self.record("create_volume_attachment", &format!("{}/{}", server_id, volume_id))?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let attachment = Attachment {
            id: format!("att-{}", state.next_id),
            server_id: server_id.to_string(),
            volume_id: volume_id.to_string(),
            device: Some("/dev/vdb".to_string()),
        };
        state.attachments.push(attachment.clone());
        if let Some(v) = state.volumes.iter_mut().find(|v| v.id == volume_id) {
            v.status = VolumeStatus::InUse;
        }
        Ok(attachment)
    }

    async fn delete_volume_attachment(
        &self,
        server_id: &str,
        attachment: &Attachment,
    ) -> ProviderResult<()> {
        self.record("delete_volume_attachment", &format!("{}/{}", server_id, attachment.id))?;
        let mut state = self.state.lock().unwrap();
        let before = state.attachments.len();
        state.attachments.retain(|a| a.id != attachment.id);
        if state.attachments.len() == before {
            return Err(ProviderError::not_found("attachment", &attachment.id));
        }
        if let Some(v) = state
            .volumes
            .iter_mut()
            .find(|v| v.id == attachment.volume_id)
        {
            v.status = VolumeStatus::Available;
        }
        Ok(())
    }
}

#[async_trait]
impl StorageApi for FakeProvider {
    async fn list_volumes(&self) -> ProviderResult<Vec<Volume>> {
        self.check("list_volumes", "")?;
        Ok(self.state.lock().unwrap().volumes.clone())
    }

    async fn get_volume(&self, volume_id: &str) -> ProviderResult<Option<Volume>> {
        self.check("get_volume", volume_id)?;
        let state = self.state.lock().unwrap();
        Ok(state.volumes.iter().find(|v| v.id == volume_id).cloned())
    }
}

#[async_trait]
impl NetworkApi for FakeProvider {
    async fn list_networks(&self) -> ProviderResult<Vec<Network>> {
        self.check("list_networks", "")?;
        Ok(self.state.lock().unwrap().networks.clone())
    }

    async fn list_subnets(&self) -> ProviderResult<Vec<Subnet>> {
        self.check("list_subnets", "")?;
        Ok(self.state.lock().unwrap().subnets.clone())
    }

    async fn list_security_groups(&self) -> ProviderResult<Vec<SecurityGroup>> {
        self.check("list_security_groups", "")?;
        Ok(self.state.lock().unwrap().security_groups.clone())
    }
}

#[async_trait]
impl ImageApi for FakeProvider {
    async fn list_images(&self) -> ProviderResult<Vec<Image>> {
        self.check("list_images", "")?;
        Ok(self.state.lock().unwrap().images.clone())
    }

    async fn get_image(&self, image_id: &str) -> ProviderResult<Option<Image>> {
        self.check("get_image", image_id)?;
        let mut state = self.state.lock().unwrap();

        if let Some((polls, gone)) = state.vanish {
            let seen = state.image_polls.get(image_id).copied().unwrap_or(0);
            if seen >= polls {
                state.images.retain(|i| i.id != image_id);
                return match gone {
                    Gone::Absent => Ok(None),
                    Gone::NotFoundError => Err(ProviderError::not_found("image", image_id)),
                };
            }
            state.image_polls.insert(image_id.to_string(), seen + 1);
        }

        let next = match state.image_script.get_mut(image_id) {
            Some(script) if script.len() > 1 => script.pop_front(),
            Some(script) => script.front().cloned(),
            None => None,
        };

        let Some(image) = state.images.iter_mut().find(|i| i.id == image_id) else {
            return Ok(None);
        };
        if let Some(status) = next {
            image.status = status;
        }
        Ok(Some(image.clone()))
    }
}

#[async_trait]
impl IdentityApi for FakeProvider {
    async fn check_auth(&self) -> ProviderResult<AuthStatus> {
        let state = self.state.lock().unwrap();
        Ok(AuthStatus::ok(state.current_project.clone()))
    }

    async fn list_projects(&self) -> ProviderResult<Vec<Project>> {
        self.check("list_projects", "")?;
        Ok(self.state.lock().unwrap().projects.clone())
    }

    async fn quota_usage(&self, project_id: Option<&str>) -> ProviderResult<QuotaUsage> {
        self.check("quota_usage", project_id.unwrap_or(""))?;
        let state = self.state.lock().unwrap();
        let project_id = project_id.unwrap_or(&state.current_project).to_string();
        state
            .quotas
            .get(&project_id)
            .cloned()
            .ok_or_else(|| ProviderError::not_found("project", project_id))
    }
}

impl ResourceProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }
}
