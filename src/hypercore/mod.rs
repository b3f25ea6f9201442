//! HyperCore API interaction module
//!
//! This module provides the core functionality for talking to a HyperCore
//! cluster's REST API: sessions, resource listing, identifier resolution,
//! tagging, snapshots and task polling.
//!
//! # Module Structure
//!
//! - [`client`] - Client configuration and the main client type
//! - [`http`] - HTTP utilities for REST API calls
//! - [`session`] - Login and logout
//! - [`selector`] - Typed selectors for VMs, resource kinds and tag methods
//! - [`vms`] / [`nodes`] / [`stats`] - Resource queries
//! - [`tags`] - Tag-based grouping
//! - [`snapshot`] - Snapshot creation
//! - [`task`] - Waiting for asynchronous tasks
//!
//! # Example
//!
//! ```ignore
//! use hcctl::hypercore::{client::{ClientConfig, HyperCoreClient}, session::Credentials, vms};
//!
//! async fn example() -> hcctl::hypercore::Result<()> {
//!     let client = HyperCoreClient::new(ClientConfig::new("192.168.0.11"))?;
//!     let session = client.login(&Credentials::new("admin", "admin")).await?;
//!     let listed = vms::list_vms(&client, &session).await;
//!     client.logout(&session).await?;
//!     println!("{} VMs", listed?.len());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod http;
pub mod nodes;
pub mod selector;
pub mod session;
pub mod snapshot;
pub mod stats;
pub mod tags;
pub mod task;
pub mod vms;

pub use client::{ClientConfig, HyperCoreClient};
pub use error::{Error, Result};
pub use selector::{ResourceKind, SnapshotTarget, TagMethod, VmSelector};
pub use session::{Credentials, Session};
pub use task::{Clock, TaskState, TaskTag, TokioClock};
