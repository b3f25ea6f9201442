//! Helpers for the HyperCore REST API
//!
//! - [`hypercore`] - the API client: sessions, queries, tags, snapshots, tasks
//! - [`report`] - CSV inventory and performance sampling built on the client
//! - [`config`] - persisted CLI configuration

pub mod config;
pub mod hypercore;
pub mod report;

/// Version injected at compile time via HCCTL_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("HCCTL_VERSION") {
    Some(v) => v,
    None => "dev",
};
