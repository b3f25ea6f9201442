//! Inventory report
//!
//! One row per running or shut-off VM, and one row per node.

use super::{round, GB, GIB};
use crate::hypercore::nodes::{list_nodes, Node};
use crate::hypercore::vms::{list_vms, VirtualMachine};
use crate::hypercore::{HyperCoreClient, Session};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

pub const VM_OVERVIEW_FILE: &str = "vmOverview.csv";
pub const NODE_OVERVIEW_FILE: &str = "nodeOverview.csv";

pub const VM_OVERVIEW_HEADER: &[&str] = &[
    "vmname", "state", "VCPUs", "RAM", "Snapshots", "VMType", "Location",
    "DriveType1", "SizeGB1", "AllocatedPct1", "DriveType2", "SizeGB2", "AllocatedPct2",
];

pub const NODE_OVERVIEW_HEADER: &[&str] = &[
    "lanIP", "backplaneIP", "NodeCapacity", "RAMsize", "RAMusage", "CPUspeed",
    "Sockets", "Cores", "Threads", "NumDrives", "DriveSize", "DriveUsedPct",
];

/// States included in the VM overview
const LISTED_STATES: &[&str] = &["RUNNING", "SHUTOFF"];

const NO_DISK: [&str; 3] = ["NO_DISK", "0", "0"];

fn vm_row(vm: &VirtualMachine) -> Vec<String> {
    let mut row = vec![
        vm.name.clone(),
        vm.state.clone(),
        vm.num_vcpu.to_string(),
        round(vm.mem as f64 / GIB, 2),
        vm.snap_uuids.len().to_string(),
        vm.machine_type.clone(),
    ];

    if vm.is_replica() {
        row.push("REPLICA".to_string());
        row.extend(NO_DISK.iter().chain(NO_DISK.iter()).map(|s| s.to_string()));
        return row;
    }

    row.push("LOCAL".to_string());
    let mut disks = 0;
    for disk in vm.disks() {
        row.push(disk.kind.clone());
        row.push(round(disk.capacity as f64 / GB, 2));
        row.push(round(disk.allocated_pct(), 2));
        disks += 1;
    }
    if disks == 1 {
        row.extend(NO_DISK.iter().map(|s| s.to_string()));
    }
    row
}

fn node_row(node: &Node) -> Vec<String> {
    let mut row = vec![
        node.lan_ip.clone(),
        node.backplane_ip.clone(),
        round(node.capacity as f64 / GB, 2),
        round(node.mem_size as f64 / GIB, 2),
        round(node.total_mem_usage_bytes as f64 / GIB, 2),
        round(node.cpu_hz as f64 / GB, 2),
        node.num_sockets.to_string(),
        node.num_cores.to_string(),
        node.num_threads.to_string(),
        node.drives.len().to_string(),
    ];
    for drive in &node.drives {
        row.push(round(drive.capacity_bytes() as f64 / GB, 2));
        row.push(round(drive.used_pct(), 2));
    }
    row
}

/// Write the VM overview; returns the number of VMs listed
pub fn write_vm_overview<W: Write>(writer: W, vms: &[VirtualMachine]) -> Result<usize> {
    let mut csv = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    csv.write_record(VM_OVERVIEW_HEADER)?;

    let mut written = 0;
    for vm in vms.iter().filter(|vm| LISTED_STATES.contains(&vm.state.as_str())) {
        csv.write_record(vm_row(vm))?;
        written += 1;
    }
    csv.flush()?;
    Ok(written)
}

/// Write the node overview
pub fn write_node_overview<W: Write>(writer: W, nodes: &[Node]) -> Result<()> {
    let mut csv = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    csv.write_record(NODE_OVERVIEW_HEADER)?;
    for node in nodes {
        csv.write_record(node_row(node))?;
    }
    csv.flush()?;
    Ok(())
}

/// Fetch VMs and nodes and write both overview files into `out_dir`
pub async fn write_inventory(
    client: &HyperCoreClient,
    session: &Session,
    out_dir: &Path,
) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let vms = list_vms(client, session).await?;
    let vm_path = out_dir.join(VM_OVERVIEW_FILE);
    let file = std::fs::File::create(&vm_path)
        .with_context(|| format!("Failed to create {}", vm_path.display()))?;
    let listed = write_vm_overview(file, &vms)?;
    tracing::info!("Wrote {} VMs to {}", listed, vm_path.display());

    let nodes = list_nodes(client, session).await?;
    let node_path = out_dir.join(NODE_OVERVIEW_FILE);
    let file = std::fs::File::create(&node_path)
        .with_context(|| format!("Failed to create {}", node_path.display()))?;
    write_node_overview(file, &nodes)?;
    tracing::info!("Wrote {} nodes to {}", nodes.len(), node_path.display());

    Ok(())
}
