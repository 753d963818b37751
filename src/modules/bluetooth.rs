//! Bluetooth adapter monitoring module
//!
//! Enumerates adapters via sysfs. Purely informational: adapter presence
//! and names, refreshed rarely. Machines without bluetooth mount as failed.

use crate::core::{MonitorModule, Reading, Sampler};
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

pub const BLUETOOTH_INTERVAL: Duration = Duration::from_secs(30);

const SYSFS_BLUETOOTH: &str = "/sys/class/bluetooth";

pub struct BluetoothSampler {
    sysfs: PathBuf,
}

impl BluetoothSampler {
    pub fn new() -> Self {
        Self {
            sysfs: PathBuf::from(SYSFS_BLUETOOTH),
        }
    }

    #[cfg(test)]
    fn with_root(sysfs: PathBuf) -> Self {
        Self { sysfs }
    }
}

impl Default for BluetoothSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for BluetoothSampler {
    fn is_available(&self) -> bool {
        self.sysfs.is_dir()
    }

    fn sample(&mut self) -> Result<Reading> {
        let entries = std::fs::read_dir(&self.sysfs)
            .with_context(|| format!("failed to read {:?}", self.sysfs))?;

        let mut adapters = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            // hciN entries are adapters; colon-separated ones are devices.
            if name.starts_with("hci") && !name.contains(':') {
                adapters.push(name);
            }
        }
        adapters.sort();

        let mut reading = Reading::new();
        reading.insert("caption".to_string(), Value::from("Bluetooth"));
        reading.insert("adapter_count".to_string(), Value::from(adapters.len()));
        reading.insert(
            "adapters".to_string(),
            Value::from(adapters),
        );
        Ok(reading)
    }
}

pub fn module() -> MonitorModule {
    MonitorModule::new(
        "Bluetooth",
        BLUETOOTH_INTERVAL,
        Box::new(BluetoothSampler::new()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_counts_adapters() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("hci0")).unwrap();
        std::fs::create_dir(dir.path().join("hci1")).unwrap();
        // Paired device node, not an adapter.
        std::fs::create_dir(dir.path().join("hci0:11:22:33:44:55:66")).unwrap();

        let mut sampler = BluetoothSampler::with_root(dir.path().to_path_buf());
        assert!(sampler.is_available());
        let reading = sampler.sample().unwrap();
        assert_eq!(reading.get("adapter_count"), Some(&Value::from(2)));
    }

    #[test]
    fn test_unavailable_without_sysfs() {
        let sampler = BluetoothSampler::with_root(PathBuf::from("/definitely/not/here"));
        assert!(!sampler.is_available());
    }
}
