//! Shared types for fleetdeploy.
//!
//! This crate holds the data model exchanged between the inventory builder,
//! the copy orchestrator, the shortcut publisher and the host scanner:
//! application executable specs, discovered build variants, deployment
//! selections, host statuses, progress events and the versioned config
//! file schema. It has no I/O beyond config loading and no async
//! dependencies.

pub mod config;
pub mod events;
pub mod types;

pub use config::{CONFIG_VERSION, ConfigError, ConfigFile, HostEntry};
pub use events::{ProgressEvent, ProgressKind};
pub use types::{
    AppBuildGroup, AppExecutableSpec, BuildVariant, DeploymentSelection, HostStatus, SpecSet,
    parse_selections,
};
