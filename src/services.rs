//! Capability interfaces the control loop consumes.
//!
//! Sensor drivers, the display, the MQTT client, the Wi-Fi stack and the
//! button pins all live behind these traits. The orchestrator never sees
//! their internals and they never see more of the application state than
//! what is passed to them for the duration of a call.

use crate::state::{AppState, Menu};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorId {
    Temperature,
    Humidity,
    /// Barometric pressure, raw pascals.
    Pressure,
    Light,
}

impl SensorId {
    pub const COUNT: usize = 4;

    pub const ALL: [SensorId; Self::COUNT] = [
        SensorId::Temperature,
        SensorId::Humidity,
        SensorId::Pressure,
        SensorId::Light,
    ];

    pub const fn index(self) -> usize {
        match self {
            SensorId::Temperature => 0,
            SensorId::Humidity => 1,
            SensorId::Pressure => 2,
            SensorId::Light => 3,
        }
    }

    pub const fn unit(self) -> &'static str {
        match self {
            SensorId::Temperature => "°C",
            SensorId::Humidity => "%RH",
            SensorId::Pressure => "Pa",
            SensorId::Light => "lux",
        }
    }
}

/// Physical buttons, active low with pull-ups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonId {
    Previous,
    Next,
    Reconnect,
}

impl ButtonId {
    pub const COUNT: usize = 3;

    pub const ALL: [ButtonId; Self::COUNT] = [ButtonId::Previous, ButtonId::Next, ButtonId::Reconnect];

    pub const fn index(self) -> usize {
        match self {
            ButtonId::Previous => 0,
            ButtonId::Next => 1,
            ButtonId::Reconnect => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SensorError {
    #[error("sensor bus timed out")]
    Timeout,
    #[error("sensor did not acknowledge")]
    NoAck,
    #[error("sensor reports it is not calibrated")]
    NotCalibrated,
    #[error("sensor not present")]
    NotPresent,
}

/// A publish the lower layer did not accept. The payload is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("broker session is down")]
    BrokerDown,
    #[error("publish rejected by client: {0}")]
    Rejected(alloc::string::String),
    #[error("payload of {len} bytes exceeds limit of {max}")]
    PayloadTooLarge { len: usize, max: usize },
}

pub trait SensorService {
    /// Acquire one value. Must return within a bounded, sensor-specific time.
    fn read(&mut self, sensor: SensorId) -> Result<f32, SensorError>;
}

pub trait DisplayService {
    /// Draw `screen` from the given state. Must not retain `state`.
    fn render(&mut self, screen: Menu, state: &AppState);

    /// Drive the front-panel alert LED. Must not block.
    fn set_alert_indicator(&mut self, on: bool);
}

pub trait PublishService {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError>;
}

pub trait ConnectivityService {
    fn network_up(&mut self) -> bool;
    fn broker_up(&mut self) -> bool;
    /// Start a connection attempt and return immediately. The outcome is
    /// observed later through [`network_up`](Self::network_up) and
    /// [`broker_up`](Self::broker_up).
    fn reconnect(&mut self);
}

pub trait InputService {
    /// Raw pin level: `true` released, `false` pressed.
    fn raw_level(&mut self, button: ButtonId) -> bool;
}

/// The set of external services one orchestrator drives.
#[derive(Debug)]
pub struct Services<S, D, P, N, I> {
    pub sensors: S,
    pub display: D,
    pub publisher: P,
    pub network: N,
    pub input: I,
}
