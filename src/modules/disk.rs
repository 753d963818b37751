//! Disk capacity monitoring module

use crate::core::{MonitorModule, Reading, Sampler};
use anyhow::Result;
use serde_json::Value;
use std::time::Duration;
use sysinfo::Disks;

/// Capacity changes slowly; no point hammering statfs every second.
pub const DISK_INTERVAL: Duration = Duration::from_secs(10);

pub struct DiskSampler {
    disks: Disks,
}

impl DiskSampler {
    pub fn new() -> Self {
        Self {
            disks: Disks::new_with_refreshed_list(),
        }
    }
}

impl Default for DiskSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for DiskSampler {
    fn is_available(&self) -> bool {
        !self.disks.list().is_empty()
    }

    fn sample(&mut self) -> Result<Reading> {
        self.disks.refresh();

        let mut reading = Reading::new();
        reading.insert("caption".to_string(), Value::from("Disk"));

        let mut total: u64 = 0;
        let mut available: u64 = 0;
        for disk in self.disks.list() {
            total += disk.total_space();
            available += disk.available_space();

            let mount = disk.mount_point().to_string_lossy().to_string();
            reading.insert(
                format!("disk:{mount}:total_bytes"),
                Value::from(disk.total_space()),
            );
            reading.insert(
                format!("disk:{mount}:available_bytes"),
                Value::from(disk.available_space()),
            );
        }

        let used_pct = if total > 0 {
            (total - available) as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        reading.insert("usage".to_string(), Value::from(used_pct));
        reading.insert("unit".to_string(), Value::from("%"));
        reading.insert("total_bytes".to_string(), Value::from(total));
        reading.insert("available_bytes".to_string(), Value::from(available));
        Ok(reading)
    }
}

pub fn module() -> MonitorModule {
    MonitorModule::new("Disk", DISK_INTERVAL, Box::new(DiskSampler::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_aggregates_capacity() {
        let mut sampler = DiskSampler::new();
        if !sampler.is_available() {
            return; // containerized CI may expose no disks
        }
        let reading = sampler.sample().unwrap();
        let usage = reading.get("usage").and_then(|v| v.as_f64()).unwrap();
        assert!((0.0..=100.0).contains(&usage));
    }
}
