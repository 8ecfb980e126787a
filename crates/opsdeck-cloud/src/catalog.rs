//! Normalized catalog records
//!
//! One fixed record shape per resource kind. These are what end up in the
//! artifact files, so field names and order are part of the file format.

use crate::model::{
    Address, Attachment, Flavor, Image, Instance, Network, Project, SecurityGroup, Subnet, Volume,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Resource kinds that can be exported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    Instances,
    Volumes,
    Flavors,
    Networks,
    Subnets,
    SecurityGroups,
    Images,
    Projects,
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 8] = [
        CatalogKind::Instances,
        CatalogKind::Volumes,
        CatalogKind::Flavors,
        CatalogKind::Networks,
        CatalogKind::Subnets,
        CatalogKind::SecurityGroups,
        CatalogKind::Images,
        CatalogKind::Projects,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogKind::Instances => "instances",
            CatalogKind::Volumes => "volumes",
            CatalogKind::Flavors => "flavors",
            CatalogKind::Networks => "networks",
            CatalogKind::Subnets => "subnets",
            CatalogKind::SecurityGroups => "security_groups",
            CatalogKind::Images => "images",
            CatalogKind::Projects => "projects",
        }
    }

    /// Artifact file name for this kind
    pub fn file_name(&self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatalogKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase().replace('-', "_");
        CatalogKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("unknown catalog kind: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub id: String,
    pub name: String,
    pub status: String,
    pub vcpus: u32,
    pub ram_mb: u64,
    pub disk_gb: u64,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub addresses: BTreeMap<String, Vec<Address>>,
}

impl From<&Instance> for InstanceRecord {
    fn from(instance: &Instance) -> Self {
        Self {
            id: instance.id.clone(),
            name: instance.name.clone(),
            status: instance.status.to_string(),
            vcpus: instance.flavor.vcpus,
            ram_mb: instance.flavor.ram_mb,
            disk_gb: instance.flavor.disk_gb,
            created: instance.created,
            updated: instance.updated,
            addresses: instance.addresses.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeRecord {
    pub id: String,
    pub name: String,
    pub status: String,
    pub size_gb: u64,
}

impl From<&Volume> for VolumeRecord {
    fn from(volume: &Volume) -> Self {
        Self {
            id: volume.id.clone(),
            name: volume.name.clone(),
            status: volume.status.to_string(),
            size_gb: volume.size_gb,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorRecord {
    pub id: String,
    pub name: String,
    pub vcpus: u32,
    pub ram_mb: u64,
    pub disk_gb: u64,
}

impl From<&Flavor> for FlavorRecord {
    fn from(flavor: &Flavor) -> Self {
        Self {
            id: flavor.id.clone(),
            name: flavor.name.clone(),
            vcpus: flavor.vcpus,
            ram_mb: flavor.ram_mb,
            disk_gb: flavor.disk_gb,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRecord {
    pub id: String,
    pub name: String,
    pub subnets: Vec<String>,
}

impl From<&Network> for NetworkRecord {
    fn from(network: &Network) -> Self {
        Self {
            id: network.id.clone(),
            name: network.name.clone(),
            subnets: network.subnets.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetRecord {
    pub id: String,
    pub name: String,
    pub network_id: String,
    pub cidr: String,
}

impl From<&Subnet> for SubnetRecord {
    fn from(subnet: &Subnet) -> Self {
        Self {
            id: subnet.id.clone(),
            name: subnet.name.clone(),
            network_id: subnet.network_id.clone(),
            cidr: subnet.cidr.clone(),
        }
    }
}

/// One security group rule, flattened out of its group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroupRuleRecord {
    pub group_id: String,
    pub group_name: String,
    pub rule_id: String,
    pub direction: String,
    pub protocol: Option<String>,
    pub ethertype: Option<String>,
    /// `"<min>-<max>"` or `"Any"`
    pub port_range: String,
    pub remote_ip_prefix: Option<String>,
}

/// Display form of a rule's port range
///
/// `"Any"` when there is no minimum port; a missing maximum repeats the
/// minimum.
pub fn port_range(min: Option<u16>, max: Option<u16>) -> String {
    match min {
        Some(min) => format!("{}-{}", min, max.unwrap_or(min)),
        None => "Any".to_string(),
    }
}

/// Flatten groups into per-rule records, keeping group then rule order
pub fn flatten_security_groups(groups: &[SecurityGroup]) -> Vec<SecurityGroupRuleRecord> {
    groups
        .iter()
        .flat_map(|group| {
            group.rules.iter().map(move |rule| SecurityGroupRuleRecord {
                group_id: group.id.clone(),
                group_name: group.name.clone(),
                rule_id: rule.id.clone(),
                direction: rule.direction.clone(),
                protocol: rule.protocol.clone(),
                ethertype: rule.ethertype.clone(),
                port_range: port_range(rule.port_range_min, rule.port_range_max),
                remote_ip_prefix: rule.remote_ip_prefix.clone(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    pub name: String,
    pub status: String,
}

impl From<&Image> for ImageRecord {
    fn from(image: &Image) -> Self {
        Self {
            id: image.id.clone(),
            name: image.name.clone(),
            status: image.status.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
}

impl From<&Project> for ProjectRecord {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.clone(),
            name: project.name.clone(),
            description: project.description.clone(),
            enabled: project.enabled,
        }
    }
}

/// Ordered records for one kind
///
/// Serializes as a bare JSON array; the kind comes from the file name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CatalogSnapshot {
    Instances(Vec<InstanceRecord>),
    Volumes(Vec<VolumeRecord>),
    Flavors(Vec<FlavorRecord>),
    Networks(Vec<NetworkRecord>),
    Subnets(Vec<SubnetRecord>),
    SecurityGroups(Vec<SecurityGroupRuleRecord>),
    Images(Vec<ImageRecord>),
    Projects(Vec<ProjectRecord>),
}

impl CatalogSnapshot {
    pub fn kind(&self) -> CatalogKind {
        match self {
            CatalogSnapshot::Instances(_) => CatalogKind::Instances,
            CatalogSnapshot::Volumes(_) => CatalogKind::Volumes,
            CatalogSnapshot::Flavors(_) => CatalogKind::Flavors,
            CatalogSnapshot::Networks(_) => CatalogKind::Networks,
            CatalogSnapshot::Subnets(_) => CatalogKind::Subnets,
            CatalogSnapshot::SecurityGroups(_) => CatalogKind::SecurityGroups,
            CatalogSnapshot::Images(_) => CatalogKind::Images,
            CatalogSnapshot::Projects(_) => CatalogKind::Projects,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CatalogSnapshot::Instances(r) => r.len(),
            CatalogSnapshot::Volumes(r) => r.len(),
            CatalogSnapshot::Flavors(r) => r.len(),
            CatalogSnapshot::Networks(r) => r.len(),
            CatalogSnapshot::Subnets(r) => r.len(),
            CatalogSnapshot::SecurityGroups(r) => r.len(),
            CatalogSnapshot::Images(r) => r.len(),
            CatalogSnapshot::Projects(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parse an artifact body of the given kind
    pub fn from_json(kind: CatalogKind, json: &str) -> serde_json::Result<Self> {
        Ok(match kind {
            CatalogKind::Instances => CatalogSnapshot::Instances(serde_json::from_str(json)?),
            CatalogKind::Volumes => CatalogSnapshot::Volumes(serde_json::from_str(json)?),
            CatalogKind::Flavors => CatalogSnapshot::Flavors(serde_json::from_str(json)?),
            CatalogKind::Networks => CatalogSnapshot::Networks(serde_json::from_str(json)?),
            CatalogKind::Subnets => CatalogSnapshot::Subnets(serde_json::from_str(json)?),
            CatalogKind::SecurityGroups => {
                CatalogSnapshot::SecurityGroups(serde_json::from_str(json)?)
            }
            CatalogKind::Images => CatalogSnapshot::Images(serde_json::from_str(json)?),
            CatalogKind::Projects => CatalogSnapshot::Projects(serde_json::from_str(json)?),
        })
    }
}

/// Instance plus its volume attachments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceDetail {
    #[serde(flatten)]
    pub instance: InstanceRecord,
    pub flavor_name: Option<String>,
    pub attachments: Vec<Attachment>,
}

/// Resources an instance consumes, taken from its flavor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceUsage {
    pub id: String,
    pub name: String,
    pub vcpus: u32,
    pub ram_mb: u64,
    pub disk_gb: u64,
}

impl From<&Instance> for InstanceUsage {
    fn from(instance: &Instance) -> Self {
        Self {
            id: instance.id.clone(),
            name: instance.name.clone(),
            vcpus: instance.flavor.vcpus,
            ram_mb: instance.flavor.ram_mb,
            disk_gb: instance.flavor.disk_gb,
        }
    }
}
