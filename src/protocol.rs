//! Line-delimited JSON protocol spoken by the simulator's control port.
//!
//! Clients send one [`ControlCommand`] per line. The server answers each with
//! a [`ServerMessage::Response`] and streams every accepted publish as a
//! [`ServerMessage::Published`] line.

use crate::clock::duration_to_millis;
use crate::orchestrator::LoopStats;
use crate::services::{ButtonId, SensorId};
use crate::state::{AlertVerdict, AppState, Menu};
use alloc::string::String;
use alloc::vec::Vec;
use core::time::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_COMMAND_SIZE: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ControlCommand {
    /// Press and release one button.
    PressButton { button: ButtonId },
    /// Bring the simulated Wi-Fi link up or down.
    SetLink { up: bool },
    /// Make the broker reachable or not while the link is up.
    SetBroker { available: bool },
    SetSensorFault { sensor: SensorId, failed: bool },
    Status,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusSnapshot>,
}

impl ControlResponse {
    pub fn ok() -> Self {
        Self {
            ok: true,
            message: None,
            status: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_status(mut self, status: StatusSnapshot) -> Self {
        self.status = Some(status);
        self
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: Some(message.into()),
            status: None,
        }
    }
}

/// Point-in-time view of a running monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub uptime_ms: u64,
    pub menu: Menu,
    pub temperature_c: Option<f32>,
    pub humidity_pct: Option<f32>,
    pub pressure_hpa: Option<f32>,
    pub light_lux: Option<f32>,
    pub network: bool,
    pub broker: bool,
    pub alerts: AlertVerdict,
    pub any_critical: bool,
    pub next_deadline_ms: u64,
    pub stats: LoopStats,
    #[serde(default)]
    pub screen: Vec<String>,
}

impl StatusSnapshot {
    pub fn new(state: &AppState, stats: &LoopStats, uptime: Duration) -> Self {
        let readings = &state.readings;
        Self {
            uptime_ms: duration_to_millis(uptime),
            menu: state.menu,
            temperature_c: readings.temperature.value(),
            humidity_pct: readings.humidity.value(),
            pressure_hpa: readings.pressure.value().map(|pa| pa / 100.0),
            light_lux: readings.light.value(),
            network: state.connectivity.network(),
            broker: state.connectivity.broker(),
            alerts: state.alerts,
            any_critical: state.alerts.any_critical(),
            next_deadline_ms: state.schedule.next_due().as_millis(),
            stats: *stats,
            screen: Vec::new(),
        }
    }
}

/// A publish accepted by the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Response(ControlResponse),
    Published(PublishedMessage),
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("command of {0} bytes exceeds the size limit")]
    CommandTooLarge(usize),
    #[error("empty command")]
    Empty,
    #[error("invalid message: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn parse_command(line: &str) -> Result<ControlCommand, ProtocolError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(ProtocolError::Empty);
    }
    if trimmed.len() > MAX_COMMAND_SIZE {
        return Err(ProtocolError::CommandTooLarge(trimmed.len()));
    }
    Ok(serde_json::from_str(trimmed)?)
}

/// One JSON line, without the trailing newline.
pub fn encode(message: &ServerMessage) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(message)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_press_button() {
        let command = parse_command(r#"{"command":"press_button","button":"next"}"#).unwrap();
        assert_eq!(command, ControlCommand::PressButton { button: ButtonId::Next });
    }

    #[test]
    fn test_parse_rejects_empty_and_oversized() {
        assert!(matches!(parse_command("   \n"), Err(ProtocolError::Empty)));

        let long = alloc::format!(r#"{{"command":"status","pad":"{}"}}"#, "x".repeat(MAX_COMMAND_SIZE));
        assert!(matches!(parse_command(&long), Err(ProtocolError::CommandTooLarge(_))));
    }

    #[test]
    fn test_parse_unknown_command() {
        assert!(matches!(
            parse_command(r#"{"command":"self_destruct"}"#),
            Err(ProtocolError::Json(_))
        ));
    }

    #[test]
    fn test_response_omits_empty_fields() {
        let json = encode(&ServerMessage::Response(ControlResponse::ok())).unwrap();
        assert_eq!(json, r#"{"type":"response","ok":true}"#);
    }

    #[test]
    fn test_published_message_encoding() {
        let json = encode(&ServerMessage::Published(PublishedMessage {
            topic: "a/b".into(),
            payload: "{}".into(),
        }))
        .unwrap();
        assert_eq!(json, r#"{"type":"published","topic":"a/b","payload":"{}"}"#);
    }
}
