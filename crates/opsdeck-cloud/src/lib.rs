//! opsdeck cloud orchestration
//!
//! Lifecycle, attachment, snapshot and catalog operations over a cloud
//! provider (compute, block storage, network, image, identity).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │            adapters (CLI / dashboard)            │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                 opsdeck-cloud                    │
//! │  ┌────────────┐ ┌────────────┐ ┌─────────────┐  │
//! │  │ Lifecycle  │ │ Attachment │ │  Snapshot   │  │
//! │  │ Controller │ │ Reconciler │ │   Engine    │  │
//! │  └────────────┘ └────────────┘ └─────────────┘  │
//! │  ┌────────────┐ ┌────────────┐ ┌─────────────┐  │
//! │  │  Catalog   │ │   Quota    │ │  Artifact   │  │
//! │  │  Exporter  │ │   Reader   │ │   Store     │  │
//! │  └────────────┘ └────────────┘ └─────────────┘  │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │   trait ResourceProvider { ... }          │   │
//! │  └──────────────────────────────────────────┘   │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//!           ┌───────▼───────┐
//!           │   openstack   │
//!           │   provider    │
//!           └───────────────┘
//! ```
//!
//! Nothing is cached between calls: every operation resolves its resources
//! from the provider again.

pub mod action;
pub mod artifact;
pub mod attachment;
pub mod catalog;
pub mod cost;
pub mod error;
pub mod exporter;
pub mod lifecycle;
pub mod model;
pub mod provider;
pub mod quota;
pub mod resolve;
pub mod snapshot;
pub mod waiter;

// Re-exports
pub use action::{ActionResult, BatchReport, BatchSummary, LifecycleAction};
pub use artifact::ArtifactStore;
pub use attachment::AttachmentReconciler;
pub use catalog::{CatalogKind, CatalogSnapshot, InstanceDetail, InstanceUsage, port_range};
pub use cost::{VolumeCostCalculator, VolumeCostReport};
pub use error::{CloudError, IncompleteReason, ProviderError, ProviderResult, Result};
pub use exporter::CatalogExporter;
pub use lifecycle::LifecycleController;
pub use model::{
    Attachment, Flavor, FlavorRef, Image, ImageStatus, Instance, InstanceStatus, Network,
    Project, QuotaUsage, SecurityGroup, SecurityGroupRule, Subnet, Volume, VolumeStatus,
};
pub use provider::{
    AuthStatus, ComputeApi, IdentityApi, ImageApi, NetworkApi, ResourceProvider, StorageApi,
};
pub use quota::QuotaReader;
pub use resolve::{Outcome, Resolution, ResourceKind, ResourceRef};
pub use snapshot::{SnapshotEngine, SnapshotState};
pub use waiter::{WaitConfig, WaitOutcome};
