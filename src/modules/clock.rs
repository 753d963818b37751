//! Clock module

use crate::core::{MonitorModule, Reading, Sampler};
use anyhow::Result;
use chrono::Local;
use serde_json::Value;
use std::time::Duration;

pub const CLOCK_INTERVAL: Duration = Duration::from_millis(1000);

pub struct ClockSampler;

impl Sampler for ClockSampler {
    fn sample(&mut self) -> Result<Reading> {
        let now = Local::now();

        let mut reading = Reading::new();
        reading.insert("caption".to_string(), Value::from("Clock"));
        reading.insert(
            "time".to_string(),
            Value::from(now.format("%H:%M:%S").to_string()),
        );
        reading.insert(
            "date".to_string(),
            Value::from(now.format("%Y-%m-%d").to_string()),
        );
        reading.insert("unix".to_string(), Value::from(now.timestamp()));
        Ok(reading)
    }
}

pub fn module() -> MonitorModule {
    MonitorModule::new("Clock", CLOCK_INTERVAL, Box::new(ClockSampler))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_formats_time() {
        let mut sampler = ClockSampler;
        let reading = sampler.sample().unwrap();
        let time = reading.get("time").and_then(|v| v.as_str()).unwrap();
        assert_eq!(time.len(), 8);
        assert!(reading.get("unix").and_then(|v| v.as_i64()).unwrap() > 0);
    }
}
