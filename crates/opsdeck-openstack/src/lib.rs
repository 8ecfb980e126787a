//! OpenStack provider for opsdeck
//!
//! Implements the `opsdeck-cloud` provider traits on top of the
//! `openstack` command line client.
//!
//! # Requirements
//!
//! - `python-openstackclient` must be installed
//! - Credentials come from `clouds.yaml` (select one with `--os-cloud` via
//!   settings) or the usual `OS_*` environment variables
//!
//! # Example
//!
//! ```ignore
//! use opsdeck_cloud::{IdentityApi, LifecycleController};
//! use opsdeck_openstack::OpenStackProvider;
//! use std::sync::Arc;
//!
//! let settings = opsdeck_config::load_or_default()?;
//! let provider = Arc::new(OpenStackProvider::from_settings(&settings.openstack));
//!
//! let auth = provider.check_auth().await?;
//! if !auth.authenticated {
//!     panic!("Not authenticated: {:?}", auth.error);
//! }
//!
//! LifecycleController::new(provider).stop("8d2c...").await?;
//! ```

pub mod cli;
pub mod error;
pub mod provider;
pub mod wire;

pub use cli::OpenStackCli;
pub use error::{OpenStackError, Result};
pub use provider::OpenStackProvider;
pub use wire::parse_port_range;
