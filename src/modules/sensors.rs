//! Temperature sensor monitoring module
//!
//! Surfaces every hardware component temperature sysinfo can see. Sensor
//! access needs no privileges on Linux hwmon, but a machine (or container)
//! can legitimately expose nothing; the module then mounts as failed and
//! stays inert.

use crate::core::{MonitorModule, Reading, Sampler};
use anyhow::Result;
use serde_json::Value;
use std::time::Duration;
use sysinfo::Components;

pub const SENSORS_INTERVAL: Duration = Duration::from_millis(1500);

pub struct SensorSampler {
    components: Components,
}

impl SensorSampler {
    pub fn new() -> Self {
        Self {
            components: Components::new_with_refreshed_list(),
        }
    }
}

impl Default for SensorSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for SensorSampler {
    fn is_available(&self) -> bool {
        !self.components.is_empty()
    }

    fn sample(&mut self) -> Result<Reading> {
        self.components.refresh();

        let mut reading = Reading::new();
        reading.insert("caption".to_string(), Value::from("Sensors"));

        let mut hottest: f32 = 0.0;
        for component in &self.components {
            let temp = component.temperature();
            hottest = hottest.max(temp);
            reading.insert(
                format!("sensor:{}", component.label()),
                Value::from(temp),
            );
        }
        reading.insert("max_temperature".to_string(), Value::from(hottest));
        reading.insert("temp_unit".to_string(), Value::from("°C"));
        Ok(reading)
    }
}

pub fn module() -> MonitorModule {
    MonitorModule::new("Sensors", SENSORS_INTERVAL, Box::new(SensorSampler::new()))
}
