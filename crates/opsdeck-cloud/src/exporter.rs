//! Catalog exporter
//!
//! Queries the provider for one kind of resource, normalizes every record
//! and writes the full listing as one artifact. The listing is collected
//! completely before anything is written; a failed query leaves the
//! previous artifact untouched.

use crate::artifact::{ArtifactStore, names};
use crate::catalog::{
    CatalogKind, CatalogSnapshot, FlavorRecord, ImageRecord, InstanceDetail, InstanceRecord,
    InstanceUsage, NetworkRecord, ProjectRecord, SubnetRecord, VolumeRecord,
    flatten_security_groups,
};
use crate::cost::{VolumeCostCalculator, VolumeCostReport};
use crate::error::{CloudError, ProviderResult, Result};
use crate::model::{Instance, QuotaUsage};
use crate::provider::{
    ComputeApi, IdentityApi, ImageApi, NetworkApi, ResourceProvider, StorageApi,
};
use crate::quota::QuotaReader;
use crate::resolve::{Outcome, Resolution, resolve_instance};
use opsdeck_config::Settings;
use std::sync::Arc;

pub struct CatalogExporter {
    provider: Arc<dyn ResourceProvider>,
    store: ArtifactStore,
}

impl CatalogExporter {
    pub fn new(provider: Arc<dyn ResourceProvider>, store: ArtifactStore) -> Self {
        Self { provider, store }
    }

    pub fn from_settings(provider: Arc<dyn ResourceProvider>, settings: &Settings) -> Self {
        Self::new(provider, ArtifactStore::new(&settings.artifact_dir))
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Query and normalize one kind without writing anything
    pub async fn collect(&self, kind: CatalogKind) -> Result<CatalogSnapshot> {
        tracing::debug!("Listing {} from {}", kind, self.provider.name());
        let provider = self.provider.as_ref();

        let snapshot = match kind {
            CatalogKind::Instances => {
                let servers = listed(kind, provider.list_servers().await)?;
                CatalogSnapshot::Instances(servers.iter().map(InstanceRecord::from).collect())
            }
            CatalogKind::Volumes => {
                let volumes = listed(kind, provider.list_volumes().await)?;
                CatalogSnapshot::Volumes(volumes.iter().map(VolumeRecord::from).collect())
            }
            CatalogKind::Flavors => {
                let flavors = listed(kind, provider.list_flavors().await)?;
                CatalogSnapshot::Flavors(flavors.iter().map(FlavorRecord::from).collect())
            }
            CatalogKind::Networks => {
                let networks = listed(kind, provider.list_networks().await)?;
                CatalogSnapshot::Networks(networks.iter().map(NetworkRecord::from).collect())
            }
            CatalogKind::Subnets => {
                let subnets = listed(kind, provider.list_subnets().await)?;
                CatalogSnapshot::Subnets(subnets.iter().map(SubnetRecord::from).collect())
            }
            CatalogKind::SecurityGroups => {
                let groups = listed(kind, provider.list_security_groups().await)?;
                CatalogSnapshot::SecurityGroups(flatten_security_groups(&groups))
            }
            CatalogKind::Images => {
                let images = listed(kind, provider.list_images().await)?;
                CatalogSnapshot::Images(images.iter().map(ImageRecord::from).collect())
            }
            CatalogKind::Projects => {
                let projects = listed(kind, provider.list_projects().await)?;
                CatalogSnapshot::Projects(projects.iter().map(ProjectRecord::from).collect())
            }
        };

        Ok(snapshot)
    }

    /// Query one kind and replace its artifact
    pub async fn export(&self, kind: CatalogKind) -> Result<CatalogSnapshot> {
        let snapshot = self.collect(kind).await?;
        let path = self.store.write(&names::catalog(kind), &snapshot).await?;
        tracing::info!("Exported {} {} to {}", snapshot.len(), kind, path.display());
        Ok(snapshot)
    }

    /// Read a previously exported artifact
    pub async fn read(&self, kind: CatalogKind) -> Result<CatalogSnapshot> {
        let content = self.store.read_raw(&names::catalog(kind)).await?;
        Ok(CatalogSnapshot::from_json(kind, &content)?)
    }

    /// Export every kind in [`CatalogKind::ALL`] order, stopping at the
    /// first failure
    pub async fn export_all(&self) -> Result<Vec<(CatalogKind, usize)>> {
        let mut exported = Vec::with_capacity(CatalogKind::ALL.len());
        for kind in CatalogKind::ALL {
            let snapshot = self.export(kind).await?;
            exported.push((kind, snapshot.len()));
        }
        Ok(exported)
    }

    /// Write `instance_<id>.json`: the instance and its attachments
    pub async fn export_instance_detail(
        &self,
        instance_id: &str,
    ) -> Result<Outcome<InstanceDetail>> {
        const OPERATION: &str = "export_instance_detail";

        let resolution = resolve_instance(self.provider.as_ref(), OPERATION, instance_id).await?;
        let instance = match resolution {
            Resolution::Found(instance) => self.hydrate_flavor(instance).await?,
            Resolution::NotFound(target) => return Ok(Outcome::NotFound(target)),
        };

        let attachments = self
            .provider
            .list_volume_attachments(&instance.id)
            .await
            .map_err(|e| CloudError::upstream(OPERATION, &instance.id, e))?;

        let detail = InstanceDetail {
            instance: InstanceRecord::from(&instance),
            flavor_name: instance.flavor.name.clone(),
            attachments,
        };
        self.store
            .write(&names::instance_detail(&instance.id), &detail)
            .await?;
        Ok(Outcome::Done(detail))
    }

    /// Write `usage_<id>.json`: vCPUs, RAM and disk of the instance's flavor
    pub async fn export_instance_usage(
        &self,
        instance_id: &str,
    ) -> Result<Outcome<InstanceUsage>> {
        const OPERATION: &str = "export_instance_usage";

        let resolution = resolve_instance(self.provider.as_ref(), OPERATION, instance_id).await?;
        let instance = match resolution {
            Resolution::Found(instance) => self.hydrate_flavor(instance).await?,
            Resolution::NotFound(target) => return Ok(Outcome::NotFound(target)),
        };

        let usage = InstanceUsage::from(&instance);
        self.store
            .write(&names::instance_usage(&instance.id), &usage)
            .await?;
        Ok(Outcome::Done(usage))
    }

    /// Write `quota_<project>.json`, keyed by the project the provider
    /// reports (the authenticated one when `project_id` is `None`)
    pub async fn export_quota(&self, project_id: Option<&str>) -> Result<QuotaUsage> {
        let usage = QuotaReader::new(self.provider.clone())
            .quota_usage(project_id)
            .await?;
        self.store
            .write(&names::quota(&usage.project_id), &usage)
            .await?;
        Ok(usage)
    }

    /// Price every volume and write `volume_cost.json`
    pub async fn export_volume_cost(
        &self,
        calculator: &VolumeCostCalculator,
    ) -> Result<VolumeCostReport> {
        let volumes = listed(CatalogKind::Volumes, self.provider.list_volumes().await)?;
        let report = calculator.report(&volumes);
        self.store.write(names::VOLUME_COST, &report).await?;
        tracing::info!(
            "Volume cost: {} GB over {} volumes = {}",
            report.total_gb,
            report.items.len(),
            report.total_display()
        );
        Ok(report)
    }

    /// Fill in flavor sizes when the instance only carries a flavor id
    async fn hydrate_flavor(&self, mut instance: Instance) -> Result<Instance> {
        let flavor = &instance.flavor;
        if flavor.vcpus > 0 || flavor.ram_mb > 0 {
            return Ok(instance);
        }
        let Some(flavor_id) = flavor.id.clone() else {
            return Ok(instance);
        };

        match self.provider.get_flavor(&flavor_id).await {
            Ok(Some(full)) => {
                instance.flavor.name = Some(full.name);
                instance.flavor.vcpus = full.vcpus;
                instance.flavor.ram_mb = full.ram_mb;
                instance.flavor.disk_gb = full.disk_gb;
            }
            Ok(None) => {
                tracing::warn!("Flavor {} of {} no longer exists", flavor_id, instance.id);
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!("Flavor {} of {} no longer exists", flavor_id, instance.id);
            }
            Err(e) => return Err(CloudError::upstream("get_flavor", flavor_id, e)),
        }
        Ok(instance)
    }
}

fn listed<T>(kind: CatalogKind, result: ProviderResult<Vec<T>>) -> Result<Vec<T>> {
    result.map_err(|e| CloudError::upstream("list", kind.as_str(), e))
}
