//! Monitor configuration.
//!
//! Every value defaults to the board's compile-time constants. A JSON file may
//! override any subset of them; missing fields keep their defaults.

use crate::scheduler::PeriodicTask;
use core::time::Duration;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

// Critical limits
pub const TEMP_MIN_C: f32 = 15.0;
pub const TEMP_MAX_C: f32 = 35.0;
pub const HUMIDITY_MAX_PCT: f32 = 80.0;
pub const LUX_MIN: f32 = 50.0;

// Task periods
pub const SENSE_PERIOD_MS: u64 = 2_000;
pub const RENDER_PERIOD_MS: u64 = 200;
pub const REPORT_PERIOD_MS: u64 = 5_000;
pub const PUBLISH_DATA_PERIOD_MS: u64 = 10_000;
pub const PUBLISH_ALERTS_PERIOD_MS: u64 = 30_000;

pub const DATA_TOPIC: &str = "pico_w/sensors/data";
pub const ALERTS_TOPIC: &str = "pico_w/sensors/alerts";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(alloc::string::String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub temp_min_c: f32,
    pub temp_max_c: f32,
    pub humidity_max_pct: f32,
    pub lux_min: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temp_min_c: TEMP_MIN_C,
            temp_max_c: TEMP_MAX_C,
            humidity_max_pct: HUMIDITY_MAX_PCT,
            lux_min: LUX_MIN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskPeriods {
    pub sense_ms: u64,
    pub render_ms: u64,
    pub report_ms: u64,
    pub publish_data_ms: u64,
    pub publish_alerts_ms: u64,
}

impl Default for TaskPeriods {
    fn default() -> Self {
        Self {
            sense_ms: SENSE_PERIOD_MS,
            render_ms: RENDER_PERIOD_MS,
            report_ms: REPORT_PERIOD_MS,
            publish_data_ms: PUBLISH_DATA_PERIOD_MS,
            publish_alerts_ms: PUBLISH_ALERTS_PERIOD_MS,
        }
    }
}

impl TaskPeriods {
    pub fn period_ms(&self, task: PeriodicTask) -> u64 {
        match task {
            PeriodicTask::Sense => self.sense_ms,
            PeriodicTask::Render => self.render_ms,
            PeriodicTask::Report => self.report_ms,
            PeriodicTask::PublishData => self.publish_data_ms,
            PeriodicTask::PublishAlerts => self.publish_alerts_ms,
        }
    }

    pub fn period(&self, task: PeriodicTask) -> Duration {
        Duration::from_millis(self.period_ms(task))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Topics {
    pub data: alloc::string::String,
    pub alerts: alloc::string::String,
}

impl Default for Topics {
    fn default() -> Self {
        Self {
            data: DATA_TOPIC.into(),
            alerts: ALERTS_TOPIC.into(),
        }
    }
}

/// Labels shown on the network and broker screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkLabels {
    pub ssid: alloc::string::String,
    pub broker: alloc::string::String,
}

impl Default for NetworkLabels {
    fn default() -> Self {
        Self {
            ssid: "envmon".into(),
            broker: "test.mosquitto.org".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: alloc::string::String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".into() }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub thresholds: Thresholds,
    pub periods: TaskPeriods,
    pub topics: Topics,
    pub network: NetworkLabels,
    pub logging: LoggingConfig,
}

impl MonitorConfig {
    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: MonitorConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for task in PeriodicTask::ALL {
            if self.periods.period_ms(task) == 0 {
                return Err(ConfigError::Invalid(alloc::format!(
                    "{} period must be non-zero",
                    task.name()
                )));
            }
        }

        let t = &self.thresholds;
        if t.temp_min_c.is_nan() || t.temp_max_c.is_nan() || t.temp_min_c >= t.temp_max_c {
            return Err(ConfigError::Invalid(alloc::format!(
                "temperature range {}..{} is empty",
                t.temp_min_c, t.temp_max_c
            )));
        }
        if t.humidity_max_pct.is_nan() || t.lux_min.is_nan() {
            return Err(ConfigError::Invalid("thresholds must be numbers".into()));
        }

        if self.topics.data.is_empty() || self.topics.alerts.is_empty() {
            return Err(ConfigError::Invalid("topics must not be empty".into()));
        }

        Ok(())
    }
}
