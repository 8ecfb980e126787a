//! Error types
//!
//! `ProviderError` is raised by [`crate::provider`] implementations,
//! `CloudError` by the orchestration layer. A missing resource is not a
//! `CloudError`; it comes back as [`crate::Outcome::NotFound`].

use crate::model::Image;
use thiserror::Error;

/// Errors raised by a resource provider
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProviderError {
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Why an asynchronous workflow stopped short of success
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncompleteReason {
    /// The resource reached a failed terminal status
    Failed,
    /// The wait gave up before a terminal status was observed
    TimedOut,
}

impl std::fmt::Display for IncompleteReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IncompleteReason::Failed => write!(f, "failed"),
            IncompleteReason::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Errors raised by the orchestration layer
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("{operation} on {resource_id} returned no resource")]
    CreationFailed {
        operation: &'static str,
        resource_id: String,
    },

    #[error("Image {} ({}) {} before becoming active", .image.id, .image.status, .reason)]
    WorkflowIncomplete {
        image: Box<Image>,
        reason: IncompleteReason,
    },

    #[error("Volume {volume_id} is already in use; detach it first")]
    VolumeInUse { volume_id: String },

    #[error("{operation} on {resource_id} failed: {source}")]
    Upstream {
        operation: &'static str,
        resource_id: String,
        #[source]
        source: ProviderError,
    },

    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    pub(crate) fn upstream(
        operation: &'static str,
        resource_id: impl Into<String>,
        source: ProviderError,
    ) -> Self {
        Self::Upstream {
            operation,
            resource_id: resource_id.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;

/// Result alias for provider implementations
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
