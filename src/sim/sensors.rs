//! Deterministic stand-in for the sensor bus.

use crate::services::{SensorError, SensorId, SensorService};
use tracing::debug;

/// Slow sine drift around a base value, one step per acquisition.
#[derive(Debug, Clone, Copy)]
struct Profile {
    base: f32,
    amplitude: f32,
    step: f32,
}

impl Profile {
    fn sample(&self, n: u32) -> f32 {
        self.base + self.amplitude * (n as f32 * self.step).sin()
    }
}

const PROFILES: [Profile; SensorId::COUNT] = [
    // temperature, °C
    Profile { base: 24.0, amplitude: 4.0, step: 0.05 },
    // humidity, %RH
    Profile { base: 60.0, amplitude: 15.0, step: 0.03 },
    // pressure, Pa
    Profile { base: 101_325.0, amplitude: 150.0, step: 0.01 },
    // light, lux
    Profile { base: 300.0, amplitude: 280.0, step: 0.07 },
];

#[derive(Debug, Clone)]
pub struct SimSensors {
    samples: [u32; SensorId::COUNT],
    faults: [Option<SensorError>; SensorId::COUNT],
    overrides: [Option<f32>; SensorId::COUNT],
}

impl SimSensors {
    /// Board layout without a barometer: pressure reads as not present.
    pub fn new() -> Self {
        let mut sensors = Self::with_barometer();
        sensors.faults[SensorId::Pressure.index()] = Some(SensorError::NotPresent);
        sensors
    }

    pub fn with_barometer() -> Self {
        Self {
            samples: [0; SensorId::COUNT],
            faults: [None; SensorId::COUNT],
            overrides: [None; SensorId::COUNT],
        }
    }

    /// Make every read of `sensor` fail with `fault`, or clear it with `None`.
    pub fn set_fault(&mut self, sensor: SensorId, fault: Option<SensorError>) {
        self.faults[sensor.index()] = fault;
    }

    /// Shorthand for a sensor that stops acknowledging on the bus.
    pub fn set_failed(&mut self, sensor: SensorId, failed: bool) {
        self.set_fault(sensor, failed.then_some(SensorError::NoAck));
    }

    /// Pin `sensor` to a fixed value instead of the simulated profile.
    pub fn set_override(&mut self, sensor: SensorId, value: Option<f32>) {
        self.overrides[sensor.index()] = value;
    }

    pub fn samples(&self, sensor: SensorId) -> u32 {
        self.samples[sensor.index()]
    }
}

impl Default for SimSensors {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorService for SimSensors {
    fn read(&mut self, sensor: SensorId) -> Result<f32, SensorError> {
        let i = sensor.index();
        if let Some(fault) = self.faults[i] {
            return Err(fault);
        }

        let n = self.samples[i];
        self.samples[i] = n.wrapping_add(1);

        let value = self.overrides[i].unwrap_or_else(|| PROFILES[i].sample(n));
        debug!("[SIM SENSOR] {:?} sample {} = {:.2}", sensor, n, value);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pressure_absent_by_default() {
        let mut sensors = SimSensors::new();
        assert_eq!(sensors.read(SensorId::Pressure), Err(SensorError::NotPresent));
        assert!(sensors.read(SensorId::Temperature).is_ok());
    }

    #[test]
    fn test_profiles_stay_in_band() {
        let mut sensors = SimSensors::with_barometer();
        for _ in 0..500 {
            let t = sensors.read(SensorId::Temperature).unwrap();
            assert!((20.0..=28.0).contains(&t));
            let p = sensors.read(SensorId::Pressure).unwrap();
            assert!((101_175.0..=101_475.0).contains(&p));
        }
    }

    #[test]
    fn test_fault_and_override() {
        let mut sensors = SimSensors::new();
        sensors.set_failed(SensorId::Light, true);
        assert_eq!(sensors.read(SensorId::Light), Err(SensorError::NoAck));
        assert_eq!(sensors.samples(SensorId::Light), 0);

        sensors.set_failed(SensorId::Light, false);
        sensors.set_override(SensorId::Light, Some(10.0));
        assert_eq!(sensors.read(SensorId::Light), Ok(10.0));
    }
}
