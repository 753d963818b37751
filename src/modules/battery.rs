//! Battery monitoring module
//!
//! Uses the battery crate; desktops without a battery mount as failed and
//! stay inert, which is the expected steady state on most workstations.

use crate::core::{MonitorModule, Reading, Sampler};
use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;

pub const BATTERY_INTERVAL: Duration = Duration::from_secs(10);

pub struct BatterySampler {
    manager: Option<battery::Manager>,
    battery: Option<battery::Battery>,
}

impl BatterySampler {
    pub fn new() -> Self {
        Self {
            manager: None,
            battery: None,
        }
    }
}

impl Default for BatterySampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for BatterySampler {
    fn setup(&mut self) -> Result<()> {
        let manager = battery::Manager::new().context("battery manager init failed")?;
        let battery = manager
            .batteries()
            .context("battery enumeration failed")?
            .next()
            .context("no battery present")?
            .context("battery probe failed")?;

        self.manager = Some(manager);
        self.battery = Some(battery);
        Ok(())
    }

    fn sample(&mut self) -> Result<Reading> {
        let (manager, battery) = match (&self.manager, &mut self.battery) {
            (Some(m), Some(b)) => (m, b),
            _ => anyhow::bail!("battery sampler not set up"),
        };
        manager.refresh(battery).context("battery refresh failed")?;

        let charge = battery
            .state_of_charge()
            .get::<battery::units::ratio::percent>();

        let mut reading = Reading::new();
        reading.insert("caption".to_string(), Value::from("Battery"));
        reading.insert("usage".to_string(), Value::from(charge));
        reading.insert("unit".to_string(), Value::from("%"));
        reading.insert(
            "state".to_string(),
            Value::from(battery.state().to_string()),
        );
        if let Some(time) = battery.time_to_empty() {
            reading.insert(
                "time_to_empty_s".to_string(),
                Value::from(time.get::<battery::units::time::second>()),
            );
        }
        if let Some(time) = battery.time_to_full() {
            reading.insert(
                "time_to_full_s".to_string(),
                Value::from(time.get::<battery::units::time::second>()),
            );
        }
        Ok(reading)
    }
}

pub fn module() -> MonitorModule {
    MonitorModule::new("Battery", BATTERY_INTERVAL, Box::new(BatterySampler::new()))
}
