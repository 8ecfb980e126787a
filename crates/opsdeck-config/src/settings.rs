//! Settings file schema
//!
//! Every field has a default so a partial file (or no file at all) still
//! yields a usable configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory that receives catalog artifacts
    pub artifact_dir: PathBuf,

    /// How to reach the OpenStack control plane
    pub openstack: OpenStackSettings,

    /// Image snapshot polling
    pub snapshot: SnapshotSettings,

    /// Block storage pricing
    pub volume_cost: VolumeCostSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from(".opsdeck").join("artifacts"),
            openstack: OpenStackSettings::default(),
            snapshot: SnapshotSettings::default(),
            volume_cost: VolumeCostSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenStackSettings {
    /// Entry name in clouds.yaml (`--os-cloud`)
    pub cloud: Option<String>,

    /// Region override (`--os-region-name`)
    pub region: Option<String>,

    /// Path or name of the openstack CLI
    pub binary: String,
}

impl Default for OpenStackSettings {
    fn default() -> Self {
        Self {
            cloud: None,
            region: None,
            binary: "openstack".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotSettings {
    /// Give up waiting for the image after this many seconds
    pub timeout_secs: u64,

    /// First delay between image status polls (ms)
    pub initial_delay_ms: u64,

    /// Upper bound for the delay between polls (ms)
    pub max_delay_ms: u64,

    /// Exponential backoff multiplier
    pub multiplier: f64,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 1800,
            initial_delay_ms: 2000,
            max_delay_ms: 30000,
            multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeCostSettings {
    /// Price per GB of provisioned volume size
    pub rate_per_gb: f64,

    pub currency: String,
}

impl Default for VolumeCostSettings {
    fn default() -> Self {
        Self {
            rate_per_gb: 0.10,
            currency: "USD".to_string(),
        }
    }
}
