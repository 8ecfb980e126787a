//! OpenStack provider error types

use opsdeck_cloud::ProviderError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpenStackError {
    #[error("openstack CLI not found ({0}). Please install: pip install python-openstackclient")]
    CliNotFound(String),

    #[error("openstack authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("openstack command failed: {0}")]
    CommandFailed(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Unexpected openstack output: {0}")]
    UnexpectedOutput(String),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl OpenStackError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, OpenStackError::NotFound(_))
    }

    /// Convert, naming the resource a not-found refers to
    pub fn for_resource(self, kind: &str, id: &str) -> ProviderError {
        match self {
            OpenStackError::NotFound(_) => ProviderError::not_found(kind, id),
            other => other.into(),
        }
    }
}

impl From<OpenStackError> for ProviderError {
    fn from(e: OpenStackError) -> Self {
        match e {
            OpenStackError::NotFound(message) => ProviderError::not_found("resource", message),
            OpenStackError::AuthenticationFailed(message) => {
                ProviderError::AuthenticationFailed(message)
            }
            OpenStackError::CliNotFound(_) => ProviderError::Transport(e.to_string()),
            OpenStackError::CommandFailed(message) => ProviderError::Api(message),
            OpenStackError::UnexpectedOutput(message) => ProviderError::Api(message),
            OpenStackError::JsonError(e) => ProviderError::Json(e),
            OpenStackError::IoError(e) => ProviderError::Io(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, OpenStackError>;

/// Classify a failed command by its stderr
pub(crate) fn classify_failure(stderr: &str) -> OpenStackError {
    let message = stderr.trim().to_string();
    let lower = message.to_lowercase();

    if lower.contains("(http 404)")
        || lower.contains("with a name or id")
        || lower.contains("could not find resource")
    {
        OpenStackError::NotFound(message)
    } else if lower.contains("(http 401)")
        || lower.contains("requires authentication")
        || lower.contains("missing value auth-url")
        || (lower.contains("cloud") && lower.contains("was not found"))
    {
        OpenStackError::AuthenticationFailed(message)
    } else {
        OpenStackError::CommandFailed(message)
    }
}
