//! Staging repository layout rules and the deployable build inventory.
//!
//! The same path construction is used twice: once by the inventory builder
//! to discover which (app, build, environment) combinations exist, and
//! again by the copy orchestrator to resolve the source of a job. Keeping
//! both in this crate means they cannot drift apart.
//!
//! Every inventory request walks the staging tree fresh; nothing is cached
//! across requests.

pub mod builder;
pub mod layout;

pub use builder::{MAX_VARIANTS, build_inventory};
pub use layout::{StagingLayout, TargetLayout, UncTargetLayout, dest_dir};
