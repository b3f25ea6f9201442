//! CSV reports
//!
//! Inventory snapshots and periodic performance samples of a cluster,
//! written as comma-separated files for spreadsheets or dashboards.
//!
//! - [`inventory`] - `vmOverview.csv` and `nodeOverview.csv`
//! - [`perf`] - `vmPerf.csv` and `nodePerf.csv`, appended every sample interval

pub mod inventory;
pub mod perf;

pub use inventory::write_inventory;
pub use perf::{record_performance, PerfSampler};

/// Bytes per decimal gigabyte (disk sizes, CPU GHz)
pub(crate) const GB: f64 = 1_000_000_000.0;

/// Bytes per binary gigabyte (memory)
pub(crate) const GIB: f64 = 1_073_741_824.0;

/// Round to `places` decimals and render without trailing noise
pub(crate) fn round(value: f64, places: i32) -> String {
    let factor = 10f64.powi(places);
    format!("{}", (value * factor).round() / factor)
}
