//! Network throughput monitoring module

use crate::core::{MonitorModule, Reading, Sampler};
use anyhow::Result;
use serde_json::Value;
use std::time::Duration;
use sysinfo::Networks;

pub const NET_INTERVAL: Duration = Duration::from_millis(1000);

pub struct NetworkSampler {
    networks: Networks,
}

impl NetworkSampler {
    pub fn new() -> Self {
        Self {
            networks: Networks::new_with_refreshed_list(),
        }
    }
}

impl Default for NetworkSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for NetworkSampler {
    fn sample(&mut self) -> Result<Reading> {
        self.networks.refresh();

        let mut reading = Reading::new();
        reading.insert("caption".to_string(), Value::from("Network"));

        // received()/transmitted() are deltas since the previous refresh,
        // which at a fixed cadence is bytes per interval.
        let mut down: u64 = 0;
        let mut up: u64 = 0;
        for (name, data) in &self.networks {
            down += data.received();
            up += data.transmitted();
            reading.insert(format!("if:{name}:rx_bytes"), Value::from(data.received()));
            reading.insert(
                format!("if:{name}:tx_bytes"),
                Value::from(data.transmitted()),
            );
        }

        reading.insert("download_bytes".to_string(), Value::from(down));
        reading.insert("upload_bytes".to_string(), Value::from(up));
        Ok(reading)
    }
}

pub fn module() -> MonitorModule {
    MonitorModule::new("Network", NET_INTERVAL, Box::new(NetworkSampler::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_reports_totals() {
        let mut sampler = NetworkSampler::new();
        let reading = sampler.sample().unwrap();
        assert!(reading.contains_key("download_bytes"));
        assert!(reading.contains_key("upload_bytes"));
    }
}
