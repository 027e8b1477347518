//! Critical-condition evaluation.
//!
//! [`evaluate`] is pure: no I/O, no hidden state, defined for every input.
//! A parameter whose sensor reading is invalid is never critical, whatever
//! stale number the reading still holds.

use crate::config::Thresholds;
use crate::state::{AlertParameter, AlertVerdict, SensorReadings};
use core::fmt;

pub fn evaluate(readings: &SensorReadings, thresholds: &Thresholds) -> AlertVerdict {
    let flag = |parameter: AlertParameter| {
        readings
            .get(parameter.sensor())
            .value()
            .is_some_and(|value| is_critical(parameter, value, thresholds))
    };

    AlertVerdict::new(
        flag(AlertParameter::Temperature),
        flag(AlertParameter::Humidity),
        flag(AlertParameter::Light),
    )
}

/// Rule for one parameter applied to a trusted value.
///
/// NaN compares false on every side and is therefore never critical.
pub fn is_critical(parameter: AlertParameter, value: f32, thresholds: &Thresholds) -> bool {
    match parameter {
        AlertParameter::Temperature => value < thresholds.temp_min_c || value > thresholds.temp_max_c,
        AlertParameter::Humidity => value > thresholds.humidity_max_pct,
        AlertParameter::Light => value < thresholds.lux_min,
    }
}

/// Human-readable limit for log lines, e.g. `outside 15.0..35.0 °C`.
pub fn limit_description(parameter: AlertParameter, thresholds: &Thresholds) -> LimitDescription<'_> {
    LimitDescription {
        parameter,
        thresholds,
    }
}

/// Formats lazily so a critical sense never allocates.
#[derive(Debug, Clone, Copy)]
pub struct LimitDescription<'a> {
    parameter: AlertParameter,
    thresholds: &'a Thresholds,
}

impl fmt::Display for LimitDescription<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.thresholds;
        match self.parameter {
            AlertParameter::Temperature => {
                write!(f, "outside {:.1}..{:.1} °C", t.temp_min_c, t.temp_max_c)
            }
            AlertParameter::Humidity => write!(f, "above {:.1} %RH", t.humidity_max_pct),
            AlertParameter::Light => write!(f, "below {:.1} lux", t.lux_min),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Reading;

    fn readings(temperature: Reading, humidity: Reading, light: Reading) -> SensorReadings {
        SensorReadings {
            temperature,
            humidity,
            pressure: Reading::UNAVAILABLE,
            light,
        }
    }

    #[test]
    fn test_nominal_values_not_critical() {
        let verdict = evaluate(
            &readings(Reading::valid(20.0), Reading::valid(50.0), Reading::valid(100.0)),
            &Thresholds::default(),
        );
        assert_eq!(verdict, AlertVerdict::NONE);
    }

    #[test]
    fn test_temperature_is_two_sided() {
        let t = Thresholds::default();
        assert!(is_critical(AlertParameter::Temperature, 14.9, &t));
        assert!(!is_critical(AlertParameter::Temperature, 15.0, &t));
        assert!(!is_critical(AlertParameter::Temperature, 35.0, &t));
        assert!(is_critical(AlertParameter::Temperature, 35.1, &t));
    }

    #[test]
    fn test_humidity_and_light_are_one_sided() {
        let t = Thresholds::default();
        assert!(!is_critical(AlertParameter::Humidity, 0.0, &t));
        assert!(!is_critical(AlertParameter::Humidity, 80.0, &t));
        assert!(is_critical(AlertParameter::Humidity, 80.5, &t));

        assert!(is_critical(AlertParameter::Light, 49.9, &t));
        assert!(!is_critical(AlertParameter::Light, 50.0, &t));
        assert!(!is_critical(AlertParameter::Light, 100_000.0, &t));
    }

    #[test]
    fn test_nan_value_never_critical() {
        let t = Thresholds::default();
        for parameter in AlertParameter::ALL {
            assert!(!is_critical(parameter, f32::NAN, &t));
        }
    }

    #[test]
    fn test_limit_description() {
        let t = Thresholds::default();
        assert_eq!(
            limit_description(AlertParameter::Temperature, &t).to_string(),
            "outside 15.0..35.0 °C"
        );
        assert_eq!(limit_description(AlertParameter::Humidity, &t).to_string(), "above 80.0 %RH");
        assert_eq!(limit_description(AlertParameter::Light, &t).to_string(), "below 50.0 lux");
    }
}
