//! Memory monitoring module

use crate::core::{MonitorModule, Reading, Sampler};
use anyhow::Result;
use serde_json::Value;
use std::time::Duration;
use sysinfo::{MemoryRefreshKind, RefreshKind, System};

pub const RAM_INTERVAL: Duration = Duration::from_millis(1000);

pub struct MemorySampler {
    system: System,
}

impl MemorySampler {
    pub fn new() -> Self {
        Self {
            system: System::new_with_specifics(
                RefreshKind::new().with_memory(MemoryRefreshKind::everything()),
            ),
        }
    }
}

impl Default for MemorySampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for MemorySampler {
    fn sample(&mut self) -> Result<Reading> {
        self.system.refresh_memory();

        let total = self.system.total_memory();
        let used = self.system.used_memory();
        let pressure = if total > 0 {
            used as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        let mut reading = Reading::new();
        reading.insert("caption".to_string(), Value::from("RAM"));
        reading.insert("usage".to_string(), Value::from(pressure));
        reading.insert("unit".to_string(), Value::from("%"));
        reading.insert("total_bytes".to_string(), Value::from(total));
        reading.insert("used_bytes".to_string(), Value::from(used));
        reading.insert(
            "swap_used_bytes".to_string(),
            Value::from(self.system.used_swap()),
        );
        reading.insert(
            "swap_total_bytes".to_string(),
            Value::from(self.system.total_swap()),
        );
        Ok(reading)
    }
}

pub fn module() -> MonitorModule {
    MonitorModule::new("RAM", RAM_INTERVAL, Box::new(MemorySampler::new()))
}
