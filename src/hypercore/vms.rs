//! Virtual machines
//!
//! Listing, lookup and name-to-uuid resolution for `VirDomain` records.

use super::client::HyperCoreClient;
use super::error::{Error, Result};
use super::http::{decode_list, segment};
use super::selector::VmSelector;
use super::session::Session;
use serde::{Deserialize, Serialize};

/// Block device types that count as disks in reports
pub const DISK_TYPES: &[&str] = &["VIRTIO_DISK", "IDE_DISK"];

/// A virtual machine (`VirDomain`) record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachine {
    pub uuid: String,
    pub name: String,
    pub description: String,
    /// Operational state, e.g. RUNNING, SHUTOFF
    pub state: String,
    #[serde(rename = "numVCPU")]
    pub num_vcpu: u32,
    /// Memory in bytes
    pub mem: u64,
    /// Comma-joined tag list
    pub tags: String,
    pub block_devs: Vec<BlockDevice>,
    #[serde(rename = "snapUUIDs")]
    pub snap_uuids: Vec<String>,
    pub machine_type: String,
    /// Non-empty when this VM is a replication target
    #[serde(rename = "sourceVirDomainUUID")]
    pub source_vir_domain_uuid: String,
    #[serde(rename = "nodeUUID")]
    pub node_uuid: String,
}

impl VirtualMachine {
    /// Tag list as individual elements
    pub fn tag_list(&self) -> Vec<String> {
        super::tags::split_tags(&self.tags)
    }

    /// Whether this VM is a replica of a VM on another cluster
    pub fn is_replica(&self) -> bool {
        !self.source_vir_domain_uuid.is_empty()
    }

    /// Block devices that are disks (VIRTIO or IDE)
    pub fn disks(&self) -> impl Iterator<Item = &BlockDevice> {
        self.block_devs
            .iter()
            .filter(|dev| DISK_TYPES.contains(&dev.kind.as_str()))
    }
}

/// A block device attached to a VM
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockDevice {
    pub uuid: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Capacity in bytes
    pub capacity: u64,
    /// Allocated bytes
    pub allocation: u64,
}

impl BlockDevice {
    /// Allocated share of capacity, in percent
    pub fn allocated_pct(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.allocation as f64 / self.capacity as f64 * 100.0
    }
}

/// List every virtual machine on the cluster
pub async fn list_vms(client: &HyperCoreClient, session: &Session) -> Result<Vec<VirtualMachine>> {
    let response = client.http.get("VirDomain", session).await?;
    let vms: Vec<VirtualMachine> = decode_list(response)?;
    tracing::debug!("Listed {} virtual machines", vms.len());
    Ok(vms)
}

/// Case-insensitive exact name match over an already-fetched listing
pub fn find_vm_uuid<'a>(vms: &'a [VirtualMachine], name: &str) -> Option<&'a str> {
    let wanted = name.to_lowercase();
    vms.iter()
        .find(|vm| vm.name.to_lowercase() == wanted)
        .map(|vm| vm.uuid.as_str())
}

/// Resolve a VM name to its uuid
pub async fn resolve_vm_uuid(
    client: &HyperCoreClient,
    session: &Session,
    name: &str,
) -> Result<String> {
    let vms = list_vms(client, session).await?;
    find_vm_uuid(&vms, name)
        .map(|uuid| uuid.to_string())
        .ok_or_else(|| Error::NotFound(format!("virtual machine named '{}'", name)))
}

/// Resolve a selector to a uuid, listing VMs only when given a name
pub async fn selector_uuid(
    client: &HyperCoreClient,
    session: &Session,
    selector: &VmSelector,
) -> Result<String> {
    match selector {
        VmSelector::Uuid(uuid) => Ok(uuid.clone()),
        VmSelector::Name(name) => resolve_vm_uuid(client, session, name).await,
    }
}

/// Fetch a single virtual machine
pub async fn get_vm(
    client: &HyperCoreClient,
    session: &Session,
    selector: &VmSelector,
) -> Result<VirtualMachine> {
    let uuid = selector_uuid(client, session, selector).await?;
    let response = client
        .http
        .get(&format!("VirDomain/{}", segment(&uuid)), session)
        .await?;

    decode_list::<VirtualMachine>(response)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::NotFound(format!("virtual machine {}", selector)))
}
