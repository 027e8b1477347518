//! In-process stand-ins for the board's peripherals.
//!
//! Used by the hosted simulator binary and by the integration tests. The
//! link and broker share one [`SimLink`] so that tests and the control port
//! can force outages from outside the control loop.

pub mod display;
pub mod input;
pub mod network;
pub mod sensors;

pub use display::TextDisplay;
pub use input::SimInput;
pub use network::{SimBroker, SimLink, SimNetwork};
pub use sensors::SimSensors;

use crate::clock::Clock;
use crate::config::MonitorConfig;
use crate::orchestrator::Orchestrator;
use crate::protocol::{ControlCommand, ControlResponse};
use crate::services::Services;
use tracing::info;

pub type SimMonitor<C> = Orchestrator<SimSensors, TextDisplay, SimBroker, SimNetwork, SimInput, C>;

/// Build a fully simulated monitor. The returned link handle controls the
/// simulated network and collects what the broker accepted.
pub fn build<C: Clock>(config: MonitorConfig, clock: C, link: SimLink) -> SimMonitor<C> {
    let services = Services {
        sensors: SimSensors::new(),
        display: TextDisplay::new(config.network.clone()),
        publisher: link.broker(),
        network: link.network(),
        input: SimInput::new(),
    };
    Orchestrator::new(services, clock, config)
}

/// Apply one control-port command to a running simulated monitor.
pub fn apply_control<C: Clock>(
    monitor: &mut SimMonitor<C>,
    link: &SimLink,
    command: ControlCommand,
) -> ControlResponse {
    info!("control command: {:?}", command);

    match command {
        ControlCommand::PressButton { button } => {
            monitor.services_mut().input.press(button);
            ControlResponse::ok().with_message(format!("{:?} pressed", button))
        }
        ControlCommand::SetLink { up } => {
            link.set_link(up);
            ControlResponse::ok()
        }
        ControlCommand::SetBroker { available } => {
            link.set_broker(available);
            ControlResponse::ok()
        }
        ControlCommand::SetSensorFault { sensor, failed } => {
            monitor.services_mut().sensors.set_failed(sensor, failed);
            ControlResponse::ok()
        }
        ControlCommand::Status => {
            let mut status = monitor.snapshot();
            status.screen = monitor.services().display.lines();
            ControlResponse::ok().with_status(status)
        }
    }
}
