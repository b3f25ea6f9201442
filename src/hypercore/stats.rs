//! VM performance counters (`VirDomainStats`)

use super::client::HyperCoreClient;
use super::error::{Error, Result};
use super::http::{decode_list, segment};
use super::session::Session;
use serde::{Deserialize, Serialize};

/// Point-in-time counters for one VM
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VmStats {
    pub uuid: String,
    /// CPU usage in percent of the VM's allocation
    pub cpu_usage: f64,
    pub rx_bit_rate: f64,
    pub tx_bit_rate: f64,
    pub vsd_stats: Vec<VsdStats>,
}

/// Counters for one virtual storage device
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VsdStats {
    pub uuid: String,
    pub rates: Vec<VsdRates>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VsdRates {
    pub millireads_per_second: u64,
    pub milliwrites_per_second: u64,
    pub mean_read_latency_microseconds: f64,
    pub mean_write_latency_microseconds: f64,
}

impl VmStats {
    /// Current rates for the block device with `uuid`
    pub fn disk_rates(&self, uuid: &str) -> Option<&VsdRates> {
        self.vsd_stats
            .iter()
            .find(|vsd| vsd.uuid == uuid)
            .and_then(|vsd| vsd.rates.first())
    }
}

/// Fetch current counters for a VM
pub async fn get_vm_stats(
    client: &HyperCoreClient,
    session: &Session,
    uuid: &str,
) -> Result<VmStats> {
    let response = client
        .http
        .get(&format!("VirDomainStats/{}", segment(uuid)), session)
        .await?;

    decode_list::<VmStats>(response)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::NotFound(format!("stats for {}", uuid)))
}
