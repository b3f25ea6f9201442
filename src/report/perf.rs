//! Performance sampling
//!
//! Samples VM and node counters at a fixed interval for a fixed duration.
//! Cluster statistics refresh every 10 seconds, so sampling faster only adds
//! load on the API.

use super::{round, GB, GIB};
use crate::hypercore::nodes::{list_nodes, Node};
use crate::hypercore::stats::{get_vm_stats, VmStats};
use crate::hypercore::vms::{list_vms, VirtualMachine};
use crate::hypercore::{Clock, HyperCoreClient, Session};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

pub const VM_PERF_FILE: &str = "vmPerf.csv";
pub const NODE_PERF_FILE: &str = "nodePerf.csv";

/// Default interval between samples
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(10);

pub const VM_PERF_HEADER: &[&str] = &[
    "epoch", "name", "numVCPU", "cpuPct", "cpuGhz", "vmGhz", "rxBit", "txBit",
    "DiskType1", "IOPsread1", "IOPswrite1", "latencyReadUs1", "latencyWriteUs1",
    "DiskType2", "IOPsread2", "IOPswrite2", "latencyReadUs2", "latencyWriteUs2",
];

pub const NODE_PERF_HEADER: &[&str] = &[
    "lanIP", "memSize", "totalMemUsageBytes", "memUsagePercentage", "cpuUsagePct",
];

fn vm_perf_row(epoch: i64, vm: &VirtualMachine, stats: &VmStats, nodes: &[Node]) -> Vec<String> {
    let mut row = vec![
        epoch.to_string(),
        vm.name.clone(),
        vm.num_vcpu.to_string(),
        round(stats.cpu_usage, 4),
    ];

    match nodes.iter().find(|node| node.uuid == vm.node_uuid) {
        Some(node) => {
            let hz = node.cpu_hz as f64;
            row.push(round(hz / GB, 2));
            row.push(round(hz * (stats.cpu_usage / 100.0) / GB, 2));
        }
        None => {
            row.push(String::new());
            row.push(String::new());
        }
    }

    row.push(round(stats.rx_bit_rate, 4));
    row.push(round(stats.tx_bit_rate, 4));

    let mut disks = 0;
    for disk in vm.disks() {
        row.push(disk.kind.clone());
        match stats.disk_rates(&disk.uuid) {
            Some(rates) => {
                row.push((rates.millireads_per_second as f64 / 1000.0).to_string());
                row.push((rates.milliwrites_per_second as f64 / 1000.0).to_string());
                row.push(rates.mean_read_latency_microseconds.to_string());
                row.push(rates.mean_write_latency_microseconds.to_string());
            }
            // No counters yet for this disk; keep its four columns
            None => row.extend(std::iter::repeat(String::new()).take(4)),
        }
        disks += 1;
    }
    if disks == 1 {
        row.extend(["NO_DISK", "0", "0", "0", "0"].iter().map(|s| s.to_string()));
    }
    row
}

fn node_perf_row(node: &Node) -> Vec<String> {
    vec![
        node.lan_ip.clone(),
        round(node.mem_size as f64 / GIB, 2),
        round(node.total_mem_usage_bytes as f64 / GIB, 2),
        round(node.mem_usage_percentage, 2),
        round(node.cpu_usage, 2),
    ]
}

/// Appends one sample per call to the VM and node performance writers
pub struct PerfSampler<V: Write, N: Write> {
    vms: Vec<VirtualMachine>,
    vm_out: csv::Writer<V>,
    node_out: csv::Writer<N>,
}

impl<V: Write, N: Write> PerfSampler<V, N> {
    /// Create a sampler over a fixed VM listing and write both headers
    pub fn new(vms: Vec<VirtualMachine>, vm_out: V, node_out: N) -> Result<Self> {
        let mut vm_out = csv::WriterBuilder::new().flexible(true).from_writer(vm_out);
        let mut node_out = csv::WriterBuilder::new().flexible(true).from_writer(node_out);
        vm_out.write_record(VM_PERF_HEADER)?;
        node_out.write_record(NODE_PERF_HEADER)?;
        vm_out.flush()?;
        node_out.flush()?;

        Ok(Self {
            vms,
            vm_out,
            node_out,
        })
    }

    /// Fetch current counters and append one row per VM and per node
    pub async fn sample(
        &mut self,
        client: &HyperCoreClient,
        session: &Session,
        epoch: i64,
    ) -> Result<()> {
        let nodes = list_nodes(client, session).await?;

        for vm in &self.vms {
            let stats = get_vm_stats(client, session, &vm.uuid)
                .await
                .with_context(|| format!("Failed to read stats of {}", vm.name))?;
            self.vm_out.write_record(vm_perf_row(epoch, vm, &stats, &nodes))?;
        }
        self.vm_out.flush()?;

        for node in &nodes {
            self.node_out.write_record(node_perf_row(node))?;
        }
        self.node_out.flush()?;

        Ok(())
    }

    /// Sample every `interval` until `duration` has elapsed; returns the sample count
    pub async fn run<C: Clock>(
        &mut self,
        client: &HyperCoreClient,
        session: &Session,
        duration: Duration,
        interval: Duration,
        clock: &C,
    ) -> Result<u32> {
        let until = clock.now() + duration;
        let mut samples = 0;

        while clock.now() < until {
            let epoch = chrono::Utc::now().timestamp();
            self.sample(client, session, epoch).await?;
            samples += 1;
            tracing::debug!("Recorded performance sample {}", samples);
            clock.sleep(interval).await;
        }

        Ok(samples)
    }
}

/// Record performance samples into `out_dir` for `duration`
pub async fn record_performance<C: Clock>(
    client: &HyperCoreClient,
    session: &Session,
    out_dir: &Path,
    duration: Duration,
    interval: Duration,
    clock: &C,
) -> Result<u32> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let vms = list_vms(client, session).await?;
    let vm_file = std::fs::File::create(out_dir.join(VM_PERF_FILE))
        .with_context(|| format!("Failed to create {}", VM_PERF_FILE))?;
    let node_file = std::fs::File::create(out_dir.join(NODE_PERF_FILE))
        .with_context(|| format!("Failed to create {}", NODE_PERF_FILE))?;

    tracing::info!(
        "Sampling {} VMs every {}s for {}s",
        vms.len(),
        interval.as_secs(),
        duration.as_secs()
    );

    let mut sampler = PerfSampler::new(vms, vm_file, node_file)?;
    sampler.run(client, session, duration, interval, clock).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hypercore::stats::{VsdRates, VsdStats};
    use crate::hypercore::vms::BlockDevice;

    #[test]
    fn test_vm_perf_row() {
        let vm = VirtualMachine {
            name: "web".to_string(),
            uuid: "u-web".to_string(),
            num_vcpu: 4,
            node_uuid: "n-1".to_string(),
            block_devs: vec![BlockDevice {
                uuid: "d-1".to_string(),
                kind: "VIRTIO_DISK".to_string(),
                capacity: 10,
                allocation: 5,
            }],
            ..Default::default()
        };
        let stats = VmStats {
            uuid: "u-web".to_string(),
            cpu_usage: 50.0,
            rx_bit_rate: 1000.0,
            tx_bit_rate: 500.0,
            vsd_stats: vec![VsdStats {
                uuid: "d-1".to_string(),
                rates: vec![VsdRates {
                    millireads_per_second: 2500,
                    milliwrites_per_second: 1000,
                    mean_read_latency_microseconds: 120.0,
                    mean_write_latency_microseconds: 300.5,
                }],
            }],
        };
        let nodes = vec![Node {
            uuid: "n-1".to_string(),
            cpu_hz: 2_000_000_000,
            ..Default::default()
        }];

        let row = vm_perf_row(1_700_000_000, &vm, &stats, &nodes);
        assert_eq!(
            row.join(","),
            "1700000000,web,4,50,2,1,1000,500,VIRTIO_DISK,2.5,1,120,300.5,NO_DISK,0,0,0,0"
        );
    }

    #[test]
    fn test_vm_perf_row_without_disk_counters() {
        let disk = |uuid: &str| BlockDevice {
            uuid: uuid.to_string(),
            kind: "VIRTIO_DISK".to_string(),
            ..Default::default()
        };
        let vm = VirtualMachine {
            name: "web".to_string(),
            block_devs: vec![disk("d-1"), disk("d-2")],
            ..Default::default()
        };

        let row = vm_perf_row(1, &vm, &VmStats::default(), &[]);
        assert_eq!(row.len(), VM_PERF_HEADER.len());
        assert_eq!(
            row.join(","),
            "1,web,0,0,,,0,0,VIRTIO_DISK,,,,,VIRTIO_DISK,,,,"
        );
    }

    #[test]
    fn test_node_perf_row() {
        let node = Node {
            lan_ip: "10.0.0.1".to_string(),
            mem_size: 32 * 1_073_741_824,
            total_mem_usage_bytes: 8 * 1_073_741_824,
            mem_usage_percentage: 25.0,
            cpu_usage: 7.456,
            ..Default::default()
        };
        assert_eq!(node_perf_row(&node).join(","), "10.0.0.1,32,8,25,7.46");
    }
}
