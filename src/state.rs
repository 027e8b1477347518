//! Aggregate application state owned by the orchestrator.

use crate::clock::Instant;
use crate::config::TaskPeriods;
use crate::scheduler::Schedule;
use crate::services::SensorId;
use serde::{Deserialize, Serialize};

/// Screens reachable with the previous/next buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Menu {
    #[default]
    Measurements,
    Network,
    Alerts,
    Broker,
}

impl Menu {
    pub const COUNT: usize = 4;

    pub const ALL: [Menu; Self::COUNT] = [Menu::Measurements, Menu::Network, Menu::Alerts, Menu::Broker];

    pub const fn index(self) -> usize {
        match self {
            Menu::Measurements => 0,
            Menu::Network => 1,
            Menu::Alerts => 2,
            Menu::Broker => 3,
        }
    }

    pub const fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::COUNT]
    }

    pub const fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub const fn previous(self) -> Self {
        Self::from_index(self.index() + Self::COUNT - 1)
    }

    pub const fn title(self) -> &'static str {
        match self {
            Menu::Measurements => "Medicoes",
            Menu::Network => "WiFi",
            Menu::Alerts => "Alertas",
            Menu::Broker => "MQTT",
        }
    }
}

/// Latest value of one sensor plus whether the last acquisition succeeded.
///
/// The value of a failed reading is kept but only reachable through
/// [`Reading::stale_value`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Reading {
    value: f32,
    valid: bool,
}

impl Reading {
    pub const UNAVAILABLE: Reading = Reading { value: 0.0, valid: false };

    pub const fn valid(value: f32) -> Self {
        Self { value, valid: true }
    }

    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn value(&self) -> Option<f32> {
        self.valid.then_some(self.value)
    }

    /// `NaN` for an invalid reading.
    pub fn value_or_nan(&self) -> f32 {
        self.value().unwrap_or(f32::NAN)
    }

    /// Last stored number, regardless of validity.
    pub const fn stale_value(&self) -> f32 {
        self.value
    }

    pub fn record_success(&mut self, value: f32) {
        self.value = value;
        self.valid = true;
    }

    pub fn record_failure(&mut self) {
        self.valid = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorReadings {
    pub temperature: Reading,
    pub humidity: Reading,
    pub pressure: Reading,
    pub light: Reading,
}

impl SensorReadings {
    pub fn get(&self, sensor: SensorId) -> Reading {
        match sensor {
            SensorId::Temperature => self.temperature,
            SensorId::Humidity => self.humidity,
            SensorId::Pressure => self.pressure,
            SensorId::Light => self.light,
        }
    }

    pub fn get_mut(&mut self, sensor: SensorId) -> &mut Reading {
        match sensor {
            SensorId::Temperature => &mut self.temperature,
            SensorId::Humidity => &mut self.humidity,
            SensorId::Pressure => &mut self.pressure,
            SensorId::Light => &mut self.light,
        }
    }
}

/// Network link and broker session flags.
///
/// A broker session without a network link is not representable: it is
/// cleared whenever the link is down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Connectivity {
    network: bool,
    broker: bool,
}

impl Connectivity {
    pub const fn new(network: bool, broker: bool) -> Self {
        Self {
            network,
            broker: network && broker,
        }
    }

    pub const fn network(&self) -> bool {
        self.network
    }

    pub const fn broker(&self) -> bool {
        self.broker
    }

    /// Returns true if either flag changed.
    pub fn update(&mut self, network: bool, broker: bool) -> bool {
        let next = Self::new(network, broker);
        let changed = next != *self;
        *self = next;
        changed
    }
}

/// Monitored parameters that can raise a critical alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertParameter {
    Temperature,
    Humidity,
    Light,
}

impl AlertParameter {
    pub const ALL: [AlertParameter; 3] = [
        AlertParameter::Temperature,
        AlertParameter::Humidity,
        AlertParameter::Light,
    ];

    /// Sensor whose reading drives this parameter.
    pub const fn sensor(self) -> SensorId {
        match self {
            AlertParameter::Temperature => SensorId::Temperature,
            AlertParameter::Humidity => SensorId::Humidity,
            AlertParameter::Light => SensorId::Light,
        }
    }
}

/// Per-parameter critical flags. The aggregate is always derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlertVerdict {
    temperature: bool,
    humidity: bool,
    light: bool,
}

impl AlertVerdict {
    pub const NONE: AlertVerdict = AlertVerdict {
        temperature: false,
        humidity: false,
        light: false,
    };

    pub const fn new(temperature: bool, humidity: bool, light: bool) -> Self {
        Self {
            temperature,
            humidity,
            light,
        }
    }

    pub const fn is_critical(&self, parameter: AlertParameter) -> bool {
        match parameter {
            AlertParameter::Temperature => self.temperature,
            AlertParameter::Humidity => self.humidity,
            AlertParameter::Light => self.light,
        }
    }

    pub const fn temperature_critical(&self) -> bool {
        self.temperature
    }

    pub const fn humidity_critical(&self) -> bool {
        self.humidity
    }

    pub const fn light_critical(&self) -> bool {
        self.light
    }

    pub const fn any_critical(&self) -> bool {
        self.temperature || self.humidity || self.light
    }

    pub fn critical_parameters(&self) -> impl Iterator<Item = AlertParameter> + '_ {
        AlertParameter::ALL
            .into_iter()
            .filter(move |p| self.is_critical(*p))
    }
}

/// Everything the control loop knows. Created once before the loop starts
/// and mutated only by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub menu: Menu,
    pub readings: SensorReadings,
    pub connectivity: Connectivity,
    pub alerts: AlertVerdict,
    pub schedule: Schedule,
}

impl AppState {
    pub fn new(start: Instant, periods: &TaskPeriods) -> Self {
        Self {
            menu: Menu::default(),
            readings: SensorReadings::default(),
            connectivity: Connectivity::default(),
            alerts: AlertVerdict::NONE,
            schedule: Schedule::new(start, periods),
        }
    }
}
