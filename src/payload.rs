//! Published payload formats.
//!
//! The data and alert payloads are consumed by existing dashboards. Field
//! names, order and separators match what the deployed board sends. An
//! unavailable value is written as Rust formats a NaN float (`NaN`), where the
//! board's C formatter writes `nan`. Both payloads are written into
//! fixed-capacity buffers so steady-state publishing never allocates.

use crate::state::{AlertVerdict, SensorReadings};
use arrayvec::ArrayString;
use core::fmt::Write;
use serde::Serialize;
use thiserror::Error;

pub const MAX_PAYLOAD_SIZE: usize = 256;

pub type PayloadBuffer = ArrayString<MAX_PAYLOAD_SIZE>;

const PASCALS_PER_HECTOPASCAL: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("payload exceeds buffer capacity")]
    Overflow,
}

impl From<core::fmt::Error> for PayloadError {
    fn from(_: core::fmt::Error) -> Self {
        PayloadError::Overflow
    }
}

/// `{"temperatura":<2dp>, "umidade":<2dp>, "pressao":<2dp>, "luminosidade":<1dp>}`
///
/// Unavailable values are written as `NaN`. Pressure is in hectopascals.
pub fn sensor_data_payload(readings: &SensorReadings) -> Result<PayloadBuffer, PayloadError> {
    let mut buffer = PayloadBuffer::new();
    write!(
        buffer,
        "{{\"temperatura\":{:.2}, \"umidade\":{:.2}, \"pressao\":{:.2}, \"luminosidade\":{:.1}}}",
        readings.temperature.value_or_nan(),
        readings.humidity.value_or_nan(),
        readings.pressure.value_or_nan() / PASCALS_PER_HECTOPASCAL,
        readings.light.value_or_nan(),
    )?;
    Ok(buffer)
}

/// `{"alerta":"critico", "temperatura_critica":<bool>, "umidade_critica":<bool>, "luz_critica":<bool>}`
pub fn alert_payload(verdict: &AlertVerdict) -> Result<PayloadBuffer, PayloadError> {
    let mut buffer = PayloadBuffer::new();
    write!(
        buffer,
        "{{\"alerta\":\"critico\", \"temperatura_critica\":{}, \"umidade_critica\":{}, \"luz_critica\":{}}}",
        verdict.temperature_critical(),
        verdict.humidity_critical(),
        verdict.light_critical(),
    )?;
    Ok(buffer)
}

/// Diagnostic status line logged by the report task.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub temperatura: Option<f32>,
    pub umidade: Option<f32>,
    pub luminosidade: Option<f32>,
    pub alertas: AlertFlags,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct AlertFlags {
    pub temperatura: bool,
    pub umidade: bool,
    pub luminosidade: bool,
}

impl StatusReport {
    pub fn new(readings: &SensorReadings, verdict: &AlertVerdict) -> Self {
        Self {
            temperatura: readings.temperature.value(),
            umidade: readings.humidity.value(),
            luminosidade: readings.light.value(),
            alertas: AlertFlags {
                temperatura: verdict.temperature_critical(),
                umidade: verdict.humidity_critical(),
                luminosidade: verdict.light_critical(),
            },
        }
    }

    pub fn to_json(&self) -> Result<alloc::string::String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Reading;

    fn full_readings() -> SensorReadings {
        SensorReadings {
            temperature: Reading::valid(21.5),
            humidity: Reading::valid(55.25),
            pressure: Reading::valid(101_325.0),
            light: Reading::valid(120.0),
        }
    }

    #[test]
    fn test_sensor_data_payload_format() {
        let payload = sensor_data_payload(&full_readings()).unwrap();
        assert_eq!(
            payload.as_str(),
            r#"{"temperatura":21.50, "umidade":55.25, "pressao":1013.25, "luminosidade":120.0}"#
        );
    }

    #[test]
    fn test_unavailable_values_are_nan() {
        let readings = SensorReadings {
            temperature: Reading::valid(20.0),
            humidity: Reading::valid(50.0),
            pressure: Reading::UNAVAILABLE,
            light: Reading::UNAVAILABLE,
        };
        let payload = sensor_data_payload(&readings).unwrap();
        assert_eq!(
            payload.as_str(),
            r#"{"temperatura":20.00, "umidade":50.00, "pressao":NaN, "luminosidade":NaN}"#
        );
    }

    #[test]
    fn test_failed_reading_does_not_leak_stale_value() {
        let mut readings = full_readings();
        readings.temperature.record_failure();
        let payload = sensor_data_payload(&readings).unwrap();
        assert!(payload.starts_with(r#"{"temperatura":NaN, "#));
    }

    #[test]
    fn test_alert_payload_format() {
        let payload = alert_payload(&AlertVerdict::new(true, false, true)).unwrap();
        assert_eq!(
            payload.as_str(),
            r#"{"alerta":"critico", "temperatura_critica":true, "umidade_critica":false, "luz_critica":true}"#
        );
    }

    #[test]
    fn test_status_report_uses_null_for_unavailable() {
        let mut readings = full_readings();
        readings.light.record_failure();
        let json = StatusReport::new(&readings, &AlertVerdict::new(false, false, false))
            .to_json()
            .unwrap();
        assert_eq!(
            json,
            r#"{"temperatura":21.5,"umidade":55.25,"luminosidade":null,"alertas":{"temperatura":false,"umidade":false,"luminosidade":false}}"#
        );
    }
}
