//! CPU monitoring module
//!
//! Reads overall and per-core usage plus frequency through sysinfo.

use crate::core::{MonitorModule, Reading, Sampler};
use anyhow::Result;
use serde_json::Value;
use std::time::Duration;
use sysinfo::{CpuRefreshKind, RefreshKind, System};

pub const CPU_INTERVAL: Duration = Duration::from_millis(1000);

pub struct CpuSampler {
    system: System,
}

impl CpuSampler {
    pub fn new() -> Self {
        Self {
            system: System::new_with_specifics(
                RefreshKind::new().with_cpu(CpuRefreshKind::everything()),
            ),
        }
    }
}

impl Default for CpuSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for CpuSampler {
    fn sample(&mut self) -> Result<Reading> {
        self.system.refresh_cpu_all();

        let mut reading = Reading::new();
        reading.insert("caption".to_string(), Value::from("CPU"));
        reading.insert(
            "usage".to_string(),
            Value::from(self.system.global_cpu_usage()),
        );
        reading.insert("unit".to_string(), Value::from("%"));

        if let Some(cpu) = self.system.cpus().first() {
            reading.insert("frequency_mhz".to_string(), Value::from(cpu.frequency()));
        }

        for (i, cpu) in self.system.cpus().iter().enumerate() {
            reading.insert(format!("core{i}_usage"), Value::from(cpu.cpu_usage()));
        }

        Ok(reading)
    }
}

/// Build the CPU module at its default cadence.
pub fn module() -> MonitorModule {
    MonitorModule::new("CPU", CPU_INTERVAL, Box::new(CpuSampler::new()))
}
