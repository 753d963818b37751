//! GPU monitoring module
//!
//! NVIDIA only, through NVML, behind the `nvidia` feature. Without the
//! feature (or without a device) the module mounts as failed and stays
//! inert.

use crate::core::{MonitorModule, Reading, Sampler};
use anyhow::Result;
use serde_json::Value;
use std::time::Duration;

#[cfg(feature = "nvidia")]
use nvml_wrapper::{enum_wrappers::device::TemperatureSensor, Nvml};

pub const GPU_INTERVAL: Duration = Duration::from_millis(1000);

pub struct GpuSampler {
    #[cfg(feature = "nvidia")]
    nvml: Option<Nvml>,
    device_index: u32,
}

impl GpuSampler {
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "nvidia")]
            nvml: None,
            device_index: 0,
        }
    }
}

impl Default for GpuSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "nvidia")]
impl Sampler for GpuSampler {
    fn setup(&mut self) -> Result<()> {
        let nvml = Nvml::init().map_err(|e| anyhow::anyhow!("NVML init failed: {e}"))?;
        nvml.device_by_index(self.device_index)
            .map_err(|e| anyhow::anyhow!("no NVIDIA GPU at index {}: {e}", self.device_index))?;
        self.nvml = Some(nvml);
        Ok(())
    }

    fn sample(&mut self) -> Result<Reading> {
        let nvml = self
            .nvml
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("GPU sampler not set up"))?;
        let device = nvml
            .device_by_index(self.device_index)
            .map_err(|e| anyhow::anyhow!("failed to get NVIDIA GPU device: {e}"))?;

        let mut reading = Reading::new();
        reading.insert("caption".to_string(), Value::from("GPU"));
        if let Ok(name) = device.name() {
            reading.insert("name".to_string(), Value::from(name));
        }
        if let Ok(util) = device.utilization_rates() {
            reading.insert("usage".to_string(), Value::from(util.gpu));
            reading.insert("unit".to_string(), Value::from("%"));
        }
        if let Ok(temp) = device.temperature(TemperatureSensor::Gpu) {
            reading.insert("temperature".to_string(), Value::from(temp));
            reading.insert("temp_unit".to_string(), Value::from("°C"));
        }
        if let Ok(mem) = device.memory_info() {
            reading.insert("memory_used_bytes".to_string(), Value::from(mem.used));
            reading.insert("memory_total_bytes".to_string(), Value::from(mem.total));
        }
        if let Ok(power) = device.power_usage() {
            // mW to W
            reading.insert("power_w".to_string(), Value::from(power as f64 / 1000.0));
        }
        Ok(reading)
    }
}

#[cfg(not(feature = "nvidia"))]
impl Sampler for GpuSampler {
    fn setup(&mut self) -> Result<()> {
        anyhow::bail!("GPU support not enabled at compile time")
    }

    fn sample(&mut self) -> Result<Reading> {
        anyhow::bail!("GPU support not enabled at compile time")
    }
}

pub fn module() -> MonitorModule {
    MonitorModule::new("GPU", GPU_INTERVAL, Box::new(GpuSampler::new()))
}
