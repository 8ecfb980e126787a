//! `openstack -f json` output shapes
//!
//! List commands print title-case columns (`"ID"`, `"Name"`) while show
//! commands print snake-case fields (`"id"`, `"name"`); rows accept both
//! where the same struct serves list and show.

use chrono::{DateTime, Utc};
use opsdeck_cloud::model::Address;
use opsdeck_cloud::{
    Attachment, Flavor, FlavorRef, Image, Instance, Network, Project, QuotaUsage,
    SecurityGroupRule, Subnet, Volume,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// `server list --long` row or `server show` output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerRow {
    #[serde(rename = "ID", alias = "id")]
    pub id: String,

    #[serde(rename = "Name", alias = "name")]
    pub name: String,

    #[serde(rename = "Status", alias = "status")]
    pub status: String,

    /// `{"net": ["10.0.0.5"]}` or `"net=10.0.0.5, 172.24.4.10"`
    #[serde(rename = "Networks", alias = "addresses", default)]
    pub networks: Value,

    /// Flavor name, `"m1.small (f-id)"`, or an embedded flavor object
    #[serde(rename = "Flavor Name", alias = "Flavor", alias = "flavor", default)]
    pub flavor: Value,

    #[serde(rename = "Flavor ID", default)]
    pub flavor_id: Option<String>,

    #[serde(default)]
    pub created: Option<String>,

    #[serde(default)]
    pub updated: Option<String>,
}

impl From<ServerRow> for Instance {
    fn from(row: ServerRow) -> Self {
        let mut flavor = parse_flavor(&row.flavor);
        if flavor.id.is_none() {
            flavor.id = row.flavor_id;
        }

        Instance {
            id: row.id,
            name: row.name,
            status: row.status.into(),
            flavor,
            created: row.created.as_deref().and_then(parse_timestamp),
            updated: row.updated.as_deref().and_then(parse_timestamp),
            addresses: parse_addresses(&row.networks),
        }
    }
}

/// `volume list` row or `volume show` output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeRow {
    #[serde(rename = "ID", alias = "id")]
    pub id: String,

    #[serde(rename = "Name", alias = "name", default)]
    pub name: Option<String>,

    #[serde(rename = "Status", alias = "status")]
    pub status: String,

    #[serde(rename = "Size", alias = "size", default)]
    pub size: u64,
}

impl From<VolumeRow> for Volume {
    fn from(row: VolumeRow) -> Self {
        Volume {
            id: row.id,
            name: row.name.unwrap_or_default(),
            status: row.status.into(),
            size_gb: row.size,
        }
    }
}

/// `server volume list` row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentRow {
    #[serde(rename = "ID")]
    pub id: String,

    #[serde(rename = "Device", default)]
    pub device: Option<String>,

    #[serde(rename = "Server ID")]
    pub server_id: String,

    #[serde(rename = "Volume ID")]
    pub volume_id: String,
}

impl From<AttachmentRow> for Attachment {
    fn from(row: AttachmentRow) -> Self {
        Attachment {
            id: row.id,
            server_id: row.server_id,
            volume_id: row.volume_id,
            device: row.device.filter(|d| !d.is_empty()),
        }
    }
}

/// `flavor list` row or `flavor show` output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlavorRow {
    #[serde(rename = "ID", alias = "id")]
    pub id: String,

    #[serde(rename = "Name", alias = "name")]
    pub name: String,

    #[serde(rename = "VCPUs", alias = "vcpus", default)]
    pub vcpus: u32,

    #[serde(rename = "RAM", alias = "ram", default)]
    pub ram: u64,

    #[serde(rename = "Disk", alias = "disk", default)]
    pub disk: u64,
}

impl From<FlavorRow> for Flavor {
    fn from(row: FlavorRow) -> Self {
        Flavor {
            id: row.id,
            name: row.name,
            vcpus: row.vcpus,
            ram_mb: row.ram,
            disk_gb: row.disk,
        }
    }
}

/// `network list` row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkRow {
    #[serde(rename = "ID")]
    pub id: String,

    #[serde(rename = "Name", default)]
    pub name: String,

    /// Array of ids, or a comma separated string on older clients
    #[serde(rename = "Subnets", default)]
    pub subnets: Value,
}

impl From<NetworkRow> for Network {
    fn from(row: NetworkRow) -> Self {
        Network {
            id: row.id,
            name: row.name,
            subnets: string_list(&row.subnets),
        }
    }
}

/// `subnet list` row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubnetRow {
    #[serde(rename = "ID")]
    pub id: String,

    #[serde(rename = "Name", default)]
    pub name: String,

    #[serde(rename = "Network")]
    pub network: String,

    #[serde(rename = "Subnet")]
    pub cidr: String,
}

impl From<SubnetRow> for Subnet {
    fn from(row: SubnetRow) -> Self {
        Subnet {
            id: row.id,
            name: row.name,
            network_id: row.network,
            cidr: row.cidr,
        }
    }
}

/// `security group list` row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityGroupRow {
    #[serde(rename = "ID")]
    pub id: String,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Description", default)]
    pub description: Option<String>,
}

/// `security group rule list --long` row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityGroupRuleRow {
    #[serde(rename = "ID")]
    pub id: String,

    #[serde(rename = "IP Protocol", default)]
    pub protocol: Option<String>,

    #[serde(rename = "Ethertype", default)]
    pub ethertype: Option<String>,

    #[serde(rename = "IP Range", default)]
    pub ip_range: Option<String>,

    /// `"80:443"`, `"22:22"` or empty
    #[serde(rename = "Port Range", default)]
    pub port_range: Option<String>,

    #[serde(rename = "Direction", default)]
    pub direction: Option<String>,

    #[serde(rename = "Security Group")]
    pub security_group: String,
}

impl From<SecurityGroupRuleRow> for SecurityGroupRule {
    fn from(row: SecurityGroupRuleRow) -> Self {
        let (port_range_min, port_range_max) = parse_port_range(row.port_range.as_deref());
        SecurityGroupRule {
            id: row.id,
            direction: row.direction.unwrap_or_else(|| "ingress".to_string()),
            protocol: row.protocol.filter(|p| !p.is_empty()),
            ethertype: row.ethertype,
            port_range_min,
            port_range_max,
            remote_ip_prefix: row.ip_range.filter(|r| !r.is_empty()),
        }
    }
}

/// `image list` row or `image show` / `server image create` output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRow {
    #[serde(rename = "ID", alias = "id")]
    pub id: String,

    #[serde(rename = "Name", alias = "name", default)]
    pub name: Option<String>,

    #[serde(rename = "Status", alias = "status")]
    pub status: String,
}

impl From<ImageRow> for Image {
    fn from(row: ImageRow) -> Self {
        Image {
            id: row.id,
            name: row.name.unwrap_or_default(),
            status: row.status.into(),
        }
    }
}

/// `project list --long` row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRow {
    #[serde(rename = "ID")]
    pub id: String,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Description", default)]
    pub description: Option<String>,

    #[serde(rename = "Enabled", default = "enabled_default")]
    pub enabled: bool,
}

fn enabled_default() -> bool {
    true
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            id: row.id,
            name: row.name,
            description: row.description.filter(|d| !d.is_empty()),
            enabled: row.enabled,
        }
    }
}

/// `limits show --absolute` row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitRow {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Value")]
    pub value: i64,
}

/// Fold absolute limits into a [`QuotaUsage`]; a missing limit reads as
/// unlimited (-1), a missing counter as 0
pub fn quota_from_limits(project_id: String, limits: &[LimitRow]) -> QuotaUsage {
    let get = |name: &str| limits.iter().find(|l| l.name == name).map(|l| l.value);

    QuotaUsage {
        project_id,
        instances_quota: get("maxTotalInstances").unwrap_or(-1),
        instances_used: get("totalInstancesUsed").unwrap_or(0),
        vcpus_quota: get("maxTotalCores").unwrap_or(-1),
        vcpus_used: get("totalCoresUsed").unwrap_or(0),
        ram_mb_quota: get("maxTotalRAMSize").unwrap_or(-1),
        ram_mb_used: get("totalRAMUsed").unwrap_or(0),
    }
}

/// `token issue` output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    pub id: String,

    #[serde(default)]
    pub project_id: Option<String>,

    #[serde(default)]
    pub expires: Option<String>,
}

/// Split `"80:443"` into `(80, 443)`
///
/// A single port repeats itself; empty or unparseable text means any port.
pub fn parse_port_range(text: Option<&str>) -> (Option<u16>, Option<u16>) {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return (None, None);
    };

    match text.split_once(':') {
        Some((min, max)) => {
            let min = min.trim().parse().ok();
            let max = max.trim().parse().ok();
            match min {
                Some(_) => (min, max.or(min)),
                None => (None, None),
            }
        }
        None => match text.parse() {
            Ok(port) => (Some(port), Some(port)),
            Err(_) => (None, None),
        },
    }
}

/// Flavor reference from `server show` / `server list` output
fn parse_flavor(value: &Value) -> FlavorRef {
    match value {
        Value::String(text) => {
            // "m1.small (3f1c...)" or just "m1.small"
            match text.rsplit_once(" (") {
                Some((name, rest)) if rest.ends_with(')') => FlavorRef {
                    id: Some(rest.trim_end_matches(')').to_string()),
                    name: Some(name.to_string()),
                    ..FlavorRef::default()
                },
                _ if text.is_empty() => FlavorRef::default(),
                _ => FlavorRef {
                    name: Some(text.clone()),
                    ..FlavorRef::default()
                },
            }
        }
        Value::Object(map) => {
            let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
            let number = |key: &str| map.get(key).and_then(Value::as_u64).unwrap_or(0);
            FlavorRef {
                id: text("id"),
                name: text("original_name").or_else(|| text("name")),
                vcpus: number("vcpus") as u32,
                ram_mb: number("ram"),
                disk_gb: number("disk"),
            }
        }
        _ => FlavorRef::default(),
    }
}

/// Address map from either the dict or the `net=a, b; net2=c` form
fn parse_addresses(value: &Value) -> BTreeMap<String, Vec<Address>> {
    let mut addresses = BTreeMap::new();

    match value {
        Value::Object(map) => {
            for (network, entries) in map {
                let list = match entries {
                    Value::Array(items) => items.iter().filter_map(address_entry).collect(),
                    _ => Vec::new(),
                };
                addresses.insert(network.clone(), list);
            }
        }
        Value::String(text) => {
            for part in text.split(';').map(str::trim).filter(|p| !p.is_empty()) {
                let Some((network, ips)) = part.split_once('=') else {
                    continue;
                };
                let list = ips
                    .split(',')
                    .map(str::trim)
                    .filter(|ip| !ip.is_empty())
                    .map(address)
                    .collect();
                addresses.insert(network.trim().to_string(), list);
            }
        }
        _ => {}
    }

    addresses
}

fn address_entry(entry: &Value) -> Option<Address> {
    match entry {
        Value::String(ip) => Some(address(ip)),
        Value::Object(map) => {
            let ip = map.get("addr").and_then(Value::as_str)?;
            let mut parsed = address(ip);
            parsed.kind = map
                .get("OS-EXT-IPS:type")
                .and_then(Value::as_str)
                .map(str::to_string);
            Some(parsed)
        }
        _ => None,
    }
}

fn address(ip: &str) -> Address {
    Address {
        addr: ip.to_string(),
        version: if ip.contains(':') { 6 } else { 4 },
        kind: None,
    }
}

fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Value::String(text) => text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
