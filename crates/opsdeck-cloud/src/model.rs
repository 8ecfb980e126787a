//! Resource data model
//!
//! Plain data returned by providers. Nothing here is owned by opsdeck; the
//! provider is always the source of truth and every value is a point-in-time
//! read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Generates a status enum that round-trips through the provider's string
/// token and keeps unknown tokens instead of rejecting them.
macro_rules! status_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $token:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            /// Provider-defined status not known to opsdeck
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $token,)+
                    $name::Other(s) => s.as_str(),
                }
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $(if s.eq_ignore_ascii_case($token) {
                    return $name::$variant;
                })+
                $name::Other(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name::from(s.as_str())
            }
        }

        impl From<$name> for String {
            fn from(status: $name) -> Self {
                status.as_str().to_string()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

status_enum! {
    /// Compute instance status
    InstanceStatus {
        Active => "ACTIVE",
        Shutoff => "SHUTOFF",
        Build => "BUILD",
        Reboot => "REBOOT",
        Error => "ERROR",
        Deleted => "DELETED",
    }
}

status_enum! {
    /// Block volume status
    VolumeStatus {
        Available => "available",
        InUse => "in-use",
        Attaching => "attaching",
        Detaching => "detaching",
        Error => "error",
    }
}

status_enum! {
    /// Image status
    ImageStatus {
        Queued => "queued",
        Saving => "saving",
        Active => "active",
        Killed => "killed",
        Error => "error",
        Deleted => "deleted",
    }
}

impl ImageStatus {
    /// Whether the image will not transition further without operator action
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ImageStatus::Active | ImageStatus::Killed | ImageStatus::Error | ImageStatus::Deleted
        )
    }
}

/// Flavor as seen from an instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorRef {
    pub id: Option<String>,
    pub name: Option<String>,
    pub vcpus: u32,
    pub ram_mb: u64,
    pub disk_gb: u64,
}

/// One address on one network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub addr: String,
    pub version: u8,
    /// `fixed` or `floating` when the provider reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Virtual machine instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,
    pub name: String,
    pub status: InstanceStatus,
    pub flavor: FlavorRef,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    /// Network name -> addresses on that network
    pub addresses: BTreeMap<String, Vec<Address>>,
}

impl Instance {
    pub fn is_active(&self) -> bool {
        self.status == InstanceStatus::Active
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub id: String,
    pub name: String,
    pub status: VolumeStatus,
    pub size_gb: u64,
}

impl Volume {
    /// Attached, or an attach to some instance is in flight
    pub fn is_attached_or_attaching(&self) -> bool {
        matches!(self.status, VolumeStatus::InUse | VolumeStatus::Attaching)
    }
}

/// Relationship between one volume and one instance
///
/// `id` identifies the attachment itself and is not the volume id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub server_id: String,
    pub volume_id: String,
    pub device: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flavor {
    pub id: String,
    pub name: String,
    pub vcpus: u32,
    pub ram_mb: u64,
    pub disk_gb: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub id: String,
    pub name: String,
    /// Subnet ids
    pub subnets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    pub id: String,
    pub name: String,
    pub network_id: String,
    pub cidr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroup {
    pub id: String,
    pub name: String,
    pub description: String,
    pub rules: Vec<SecurityGroupRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroupRule {
    pub id: String,
    /// `ingress` or `egress`
    pub direction: String,
    pub protocol: Option<String>,
    pub ethertype: Option<String>,
    pub port_range_min: Option<u16>,
    pub port_range_max: Option<u16>,
    pub remote_ip_prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    pub name: String,
    pub status: ImageStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
}

/// Per-project compute quota and current usage
///
/// A negative quota means unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaUsage {
    pub project_id: String,
    pub instances_quota: i64,
    pub instances_used: i64,
    pub vcpus_quota: i64,
    pub vcpus_used: i64,
    pub ram_mb_quota: i64,
    pub ram_mb_used: i64,
}

impl QuotaUsage {
    pub fn instances_remaining(&self) -> Option<i64> {
        remaining(self.instances_quota, self.instances_used)
    }

    pub fn vcpus_remaining(&self) -> Option<i64> {
        remaining(self.vcpus_quota, self.vcpus_used)
    }

    pub fn ram_mb_remaining(&self) -> Option<i64> {
        remaining(self.ram_mb_quota, self.ram_mb_used)
    }
}

fn remaining(quota: i64, used: i64) -> Option<i64> {
    if quota < 0 {
        None
    } else {
        Some((quota - used).max(0))
    }
}
