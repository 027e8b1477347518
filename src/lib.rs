//! # Environmental Monitor
//!
//! Control core of a small environmental monitoring station: temperature,
//! humidity, pressure and light sensors, a four-screen text display, three
//! push buttons and an MQTT uplink, all driven by one cooperative loop.
//!
//! ## Quick Start
//!
//! ```rust
//! use envmon::clock::ManualClock;
//! use envmon::config::MonitorConfig;
//! use envmon::sim::{self, SimLink};
//!
//! let clock = ManualClock::new();
//! let link = SimLink::connected();
//! let mut monitor = sim::build(MonitorConfig::default(), clock.clone(), link.clone());
//!
//! clock.advance_ms(10_000);
//! monitor.tick();
//!
//! for message in link.drain() {
//!     println!("{}: {}", message.topic, message.payload);
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`orchestrator`] - The control loop: button polling, connectivity and periodic tasks
//! - [`scheduler`] - Per-task deadlines with drift-free rescheduling
//! - [`alerts`] - Pure critical-condition evaluation
//! - [`payload`] - Byte-stable published payloads
//! - [`screens`] - Text projection of the state for each menu
//! - [`services`] - Capability traits for sensors, display, publisher, network and buttons
//! - [`sim`] - Simulated peripherals for the hosted simulator and tests
//! - [`protocol`] - JSON control protocol of the simulator

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

extern crate alloc;

pub mod alerts;
pub mod clock;
pub mod config;
pub mod debounce;
pub mod orchestrator;
pub mod payload;
pub mod protocol;
pub mod scheduler;
pub mod screens;
pub mod services;
pub mod sim;
pub mod state;

pub use clock::{Clock, Instant, ManualClock, SystemClock};
pub use config::MonitorConfig;
pub use orchestrator::{LoopStats, Orchestrator, TickReport};
pub use scheduler::PeriodicTask;
pub use services::{ButtonId, SensorId, Services};
pub use state::{AlertVerdict, AppState, Menu};
