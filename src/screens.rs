//! Text projection of the application state for a 128x64 OLED.
//!
//! Pure: builds at most [`MAX_LINES`] lines of at most [`LINE_WIDTH`] bytes
//! from the state it is given. Never triggers an acquisition.

use crate::config::NetworkLabels;
use crate::state::{AlertParameter, AppState, Menu};
use arrayvec::ArrayString;
use core::fmt::{self, Write};
use heapless::Vec;

pub const LINE_WIDTH: usize = 20;
pub const MAX_LINES: usize = 4;

pub type ScreenLine = ArrayString<LINE_WIDTH>;
pub type Frame = Vec<ScreenLine, MAX_LINES>;

pub fn project(screen: Menu, state: &AppState, labels: &NetworkLabels) -> Frame {
    let mut frame = Frame::new();

    match screen {
        Menu::Measurements => {
            let r = &state.readings;
            let lines = [
                r.temperature
                    .value()
                    .map_or_else(|| failed("Temp"), |v| line(format_args!("Temp: {v:.1} C"))),
                r.humidity
                    .value()
                    .map_or_else(|| failed("Umid"), |v| line(format_args!("Umid: {v:.0} %RH"))),
                r.pressure
                    .value()
                    .map_or_else(|| failed("Pres"), |v| line(format_args!("Pres: {:.0} hPa", v / 100.0))),
                r.light
                    .value()
                    .map_or_else(|| failed("Luz"), |v| line(format_args!("Luz: {v:.0} lux"))),
            ];
            for l in lines {
                let _ = frame.push(l);
            }
        }
        Menu::Network => {
            let _ = frame.push(line(format_args!("WiFi: {}", labels.ssid)));
            let _ = frame.push(line(format_args!("Status: {}", link_status(state.connectivity.network()))));
        }
        Menu::Alerts => {
            for parameter in AlertParameter::ALL {
                let label = match parameter {
                    AlertParameter::Temperature => "Temp",
                    AlertParameter::Humidity => "Umid",
                    AlertParameter::Light => "Luz",
                };
                let status = if state.alerts.is_critical(parameter) { "CRITICO" } else { "OK" };
                let _ = frame.push(line(format_args!("{label}: {status}")));
            }
        }
        Menu::Broker => {
            let _ = frame.push(line(format_args!("MQTT: {}", labels.broker)));
            let _ = frame.push(line(format_args!("Status: {}", link_status(state.connectivity.broker()))));
        }
    }

    frame
}

fn failed(label: &str) -> ScreenLine {
    line(format_args!("{label}: Falha"))
}

fn link_status(up: bool) -> &'static str {
    if up {
        "Conectado"
    } else {
        "Desconectado"
    }
}

/// Formats `args` and cuts it to the display width.
fn line(args: fmt::Arguments<'_>) -> ScreenLine {
    let mut out = Truncating(ScreenLine::new());
    let _ = out.write_fmt(args);
    out.0
}

/// Keeps every character that still fits. The first one that does not
/// ends formatting.
struct Truncating(ScreenLine);

impl Write for Truncating {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            self.0.try_push(c).map_err(|_| fmt::Error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Instant;
    use crate::config::TaskPeriods;
    use crate::state::{AlertVerdict, Connectivity, Reading};

    fn state() -> AppState {
        let mut state = AppState::new(Instant::ZERO, &TaskPeriods::default());
        state.readings.temperature = Reading::valid(21.34);
        state.readings.humidity = Reading::valid(50.0);
        state.readings.light = Reading::valid(120.0);
        state
    }

    fn text(frame: &Frame) -> std::vec::Vec<&str> {
        frame.iter().map(|l| l.as_str()).collect()
    }

    #[test]
    fn test_measurements_screen() {
        let frame = project(Menu::Measurements, &state(), &NetworkLabels::default());
        assert_eq!(
            text(&frame),
            vec!["Temp: 21.3 C", "Umid: 50 %RH", "Pres: Falha", "Luz: 120 lux"]
        );
    }

    #[test]
    fn test_failed_sensor_shows_failure() {
        let mut state = state();
        state.readings.temperature.record_failure();
        let frame = project(Menu::Measurements, &state, &NetworkLabels::default());
        assert_eq!(frame[0].as_str(), "Temp: Falha");
    }

    #[test]
    fn test_alerts_screen() {
        let mut state = state();
        state.alerts = AlertVerdict::new(true, false, true);
        let frame = project(Menu::Alerts, &state, &NetworkLabels::default());
        assert_eq!(text(&frame), vec!["Temp: CRITICO", "Umid: OK", "Luz: CRITICO"]);
    }

    #[test]
    fn test_network_and_broker_screens() {
        let mut state = state();
        state.connectivity = Connectivity::new(true, false);
        let labels = NetworkLabels {
            ssid: "lab".into(),
            broker: "broker.local".into(),
        };

        let frame = project(Menu::Network, &state, &labels);
        assert_eq!(text(&frame), vec!["WiFi: lab", "Status: Conectado"]);

        let frame = project(Menu::Broker, &state, &labels);
        assert_eq!(text(&frame), vec!["MQTT: broker.local", "Status: Desconectado"]);
    }

    #[test]
    fn test_long_labels_are_truncated() {
        let labels = NetworkLabels {
            ssid: "a-very-long-network-name".into(),
            ..NetworkLabels::default()
        };
        let frame = project(Menu::Network, &state(), &labels);
        assert_eq!(frame[0].len(), LINE_WIDTH);
        assert_eq!(frame[0].as_str(), "WiFi: a-very-long-ne");
    }

    #[test]
    fn test_label_longer_than_format_buffer_keeps_prefix() {
        let labels = NetworkLabels {
            ssid: "x".repeat(60),
            broker: "b".repeat(80),
        };

        let frame = project(Menu::Network, &state(), &labels);
        assert_eq!(frame[0].as_str(), "WiFi: xxxxxxxxxxxxxx");

        let frame = project(Menu::Broker, &state(), &labels);
        assert_eq!(frame[0].as_str(), "MQTT: bbbbbbbbbbbbbb");
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let labels = NetworkLabels {
            ssid: "redeé".repeat(10),
            ..NetworkLabels::default()
        };
        let frame = project(Menu::Network, &state(), &labels);
        assert!(frame[0].len() <= LINE_WIDTH);
        assert!(frame[0].starts_with("WiFi: redeéredeé"));
    }
}
