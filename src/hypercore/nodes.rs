//! Cluster nodes

use super::client::HyperCoreClient;
use super::error::{Error, Result};
use super::selector::ResourceKind;
use super::session::Session;
use super::http::decode_list;
use super::vms::{find_vm_uuid, list_vms};
use serde::{Deserialize, Serialize};

/// A physical node (`Node`) record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Node {
    pub uuid: String,
    #[serde(rename = "lanIP")]
    pub lan_ip: String,
    #[serde(rename = "backplaneIP")]
    pub backplane_ip: String,
    /// Storage capacity in bytes
    pub capacity: u64,
    pub mem_size: u64,
    pub total_mem_usage_bytes: u64,
    pub mem_usage_percentage: f64,
    pub cpu_usage: f64,
    #[serde(rename = "CPUhz")]
    pub cpu_hz: u64,
    pub num_sockets: u32,
    pub num_cores: u32,
    pub num_threads: u32,
    pub drives: Vec<Drive>,
}

/// A physical drive in a node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Drive {
    pub uuid: String,
    pub disks: DriveDisks,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveDisks {
    pub scribe: DriveUsage,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DriveUsage {
    pub capacity_bytes: u64,
    pub used_bytes: u64,
}

impl Drive {
    pub fn capacity_bytes(&self) -> u64 {
        self.disks.scribe.capacity_bytes
    }

    /// Used share of capacity, in percent
    pub fn used_pct(&self) -> f64 {
        let usage = &self.disks.scribe;
        if usage.capacity_bytes == 0 {
            return 0.0;
        }
        usage.used_bytes as f64 / usage.capacity_bytes as f64 * 100.0
    }
}

/// List every node in the cluster
pub async fn list_nodes(client: &HyperCoreClient, session: &Session) -> Result<Vec<Node>> {
    let response = client.http.get("Node", session).await?;
    let nodes: Vec<Node> = decode_list(response)?;
    tracing::debug!("Listed {} nodes", nodes.len());
    Ok(nodes)
}

/// Exact LAN IP match over an already-fetched listing
pub fn find_node_uuid<'a>(nodes: &'a [Node], lan_ip: &str) -> Option<&'a str> {
    nodes
        .iter()
        .find(|node| node.lan_ip == lan_ip)
        .map(|node| node.uuid.as_str())
}

/// Resolve a human identifier (VM name or node LAN IP) to a uuid
pub async fn resolve_uuid(
    client: &HyperCoreClient,
    session: &Session,
    kind: ResourceKind,
    identifier: &str,
) -> Result<String> {
    let found = match kind {
        ResourceKind::Vm => {
            let vms = list_vms(client, session).await?;
            find_vm_uuid(&vms, identifier).map(str::to_string)
        }
        ResourceKind::Node => {
            let nodes = list_nodes(client, session).await?;
            find_node_uuid(&nodes, identifier).map(str::to_string)
        }
    };

    found.ok_or_else(|| {
        let what = match kind {
            ResourceKind::Vm => "virtual machine named",
            ResourceKind::Node => "node with LAN IP",
        };
        Error::NotFound(format!("{} '{}'", what, identifier))
    })
}
