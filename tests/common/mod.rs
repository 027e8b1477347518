#![allow(dead_code)]

use envmon::clock::ManualClock;
use envmon::config::MonitorConfig;
use envmon::orchestrator::Orchestrator;
use envmon::services::{
    ButtonId, ConnectivityService, DisplayService, InputService, PublishError, PublishService,
    SensorError, SensorId, SensorService, Services,
};
use envmon::state::{AppState, Menu};

pub const RELEASED: bool = true;
pub const PRESSED: bool = false;

/// Sensors returning fixed per-sensor results.
#[derive(Debug)]
pub struct ScriptedSensors {
    pub results: [Result<f32, SensorError>; SensorId::COUNT],
    pub reads: usize,
}

impl ScriptedSensors {
    pub fn new(temperature: f32, humidity: f32, light: f32) -> Self {
        Self {
            results: [
                Ok(temperature),
                Ok(humidity),
                Err(SensorError::NotPresent),
                Ok(light),
            ],
            reads: 0,
        }
    }

    pub fn set(&mut self, sensor: SensorId, result: Result<f32, SensorError>) {
        self.results[sensor.index()] = result;
    }
}

impl SensorService for ScriptedSensors {
    fn read(&mut self, sensor: SensorId) -> Result<f32, SensorError> {
        self.reads += 1;
        self.results[sensor.index()]
    }
}

#[derive(Debug, Default)]
pub struct RecordingDisplay {
    pub renders: Vec<Menu>,
    pub indicator: Vec<bool>,
}

impl DisplayService for RecordingDisplay {
    fn render(&mut self, screen: Menu, _state: &AppState) {
        self.renders.push(screen);
    }

    fn set_alert_indicator(&mut self, on: bool) {
        self.indicator.push(on);
    }
}

#[derive(Debug, Default)]
pub struct RecordingPublisher {
    pub sent: Vec<(String, String)>,
    pub attempts: usize,
    pub fail_with: Option<PublishError>,
}

impl RecordingPublisher {
    pub fn topics(&self) -> Vec<&str> {
        self.sent.iter().map(|(topic, _)| topic.as_str()).collect()
    }
}

impl PublishService for RecordingPublisher {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        self.attempts += 1;
        if let Some(e) = &self.fail_with {
            return Err(e.clone());
        }
        self.sent
            .push((topic.to_string(), String::from_utf8_lossy(payload).into_owned()));
        Ok(())
    }
}

#[derive(Debug)]
pub struct MockNetwork {
    pub network: bool,
    pub broker: bool,
    pub reconnects: usize,
}

impl MockNetwork {
    pub fn up() -> Self {
        Self {
            network: true,
            broker: true,
            reconnects: 0,
        }
    }

    pub fn down() -> Self {
        Self {
            network: false,
            broker: false,
            reconnects: 0,
        }
    }
}

impl ConnectivityService for MockNetwork {
    fn network_up(&mut self) -> bool {
        self.network
    }

    fn broker_up(&mut self) -> bool {
        self.broker
    }

    fn reconnect(&mut self) {
        self.reconnects += 1;
    }
}

/// Pins held at whatever level the test sets.
#[derive(Debug)]
pub struct HeldInput {
    pub levels: [bool; ButtonId::COUNT],
}

impl HeldInput {
    pub fn released() -> Self {
        Self {
            levels: [RELEASED; ButtonId::COUNT],
        }
    }

    pub fn set(&mut self, button: ButtonId, level: bool) {
        self.levels[button.index()] = level;
    }
}

impl InputService for HeldInput {
    fn raw_level(&mut self, button: ButtonId) -> bool {
        self.levels[button.index()]
    }
}

pub type TestMonitor =
    Orchestrator<ScriptedSensors, RecordingDisplay, RecordingPublisher, MockNetwork, HeldInput, ManualClock>;

pub fn monitor_with(sensors: ScriptedSensors, network: MockNetwork) -> (TestMonitor, ManualClock) {
    let clock = ManualClock::new();
    let services = Services {
        sensors,
        display: RecordingDisplay::default(),
        publisher: RecordingPublisher::default(),
        network,
        input: HeldInput::released(),
    };
    let monitor = Orchestrator::new(services, clock.clone(), MonitorConfig::default());
    (monitor, clock)
}

pub fn nominal_monitor() -> (TestMonitor, ManualClock) {
    monitor_with(ScriptedSensors::new(20.0, 50.0, 100.0), MockNetwork::up())
}
