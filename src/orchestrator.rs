use crate::alerts;
use crate::clock::{duration_to_millis, Clock, Instant};
use crate::config::{MonitorConfig, Thresholds, Topics};
use crate::debounce::ButtonTracker;
use crate::payload::{self, StatusReport};
use crate::protocol::StatusSnapshot;
use crate::scheduler::PeriodicTask;
use crate::services::{
    ButtonId, ConnectivityService, DisplayService, InputService, PublishService, SensorError,
    SensorId, SensorService, Services,
};
use crate::state::{AppState, Menu};
use core::time::Duration;
use heapless::Vec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Counters kept across the lifetime of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoopStats {
    pub iterations: u64,
    pub task_runs: [u64; PeriodicTask::COUNT],
    /// Failed reads of fitted sensors. An absent sensor is not a failure.
    pub sensor_failures: u64,
    pub publishes_sent: u64,
    pub publishes_dropped: u64,
    pub reconnect_requests: u64,
    pub max_lateness_ms: u64,
}

impl LoopStats {
    pub fn runs(&self, task: PeriodicTask) -> u64 {
        self.task_runs[task.index()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputEvent {
    MenuChanged(Menu),
    ReconnectRequested,
}

/// What one iteration did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub now: Instant,
    pub events: Vec<InputEvent, { ButtonId::COUNT }>,
    pub tasks_run: Vec<PeriodicTask, { PeriodicTask::COUNT }>,
}

impl TickReport {
    pub fn ran(&self, task: PeriodicTask) -> bool {
        self.tasks_run.contains(&task)
    }
}

/// Single-threaded cooperative control loop.
///
/// Owns the application state, the button trackers and the loop counters.
/// Each call to [`tick`](Self::tick) polls the buttons, refreshes the
/// connectivity flags and runs every periodic task whose deadline has been
/// reached, in [`PeriodicTask::ALL`] order. Nothing in an iteration blocks and
/// nothing in it can fail: sensor errors become invalid readings, missing
/// connectivity skips transmission, rejected publishes are dropped.
pub struct Orchestrator<S, D, P, N, I, C> {
    services: Services<S, D, P, N, I>,
    clock: C,
    started_at: Instant,
    config: MonitorConfig,
    state: AppState,
    buttons: [ButtonTracker; ButtonId::COUNT],
    stats: LoopStats,
}

impl<S, D, P, N, I, C> Orchestrator<S, D, P, N, I, C>
where
    S: SensorService,
    D: DisplayService,
    P: PublishService,
    N: ConnectivityService,
    I: InputService,
    C: Clock,
{
    pub fn new(mut services: Services<S, D, P, N, I>, clock: C, config: MonitorConfig) -> Self {
        let start = clock.now();
        let buttons = ButtonId::ALL.map(|button| ButtonTracker::new(button, &mut services.input));
        let state = AppState::new(start, &config.periods);

        info!(
            "monitor started: sense every {} ms, render every {} ms, publish every {} ms, alerts every {} ms",
            config.periods.sense_ms,
            config.periods.render_ms,
            config.periods.publish_data_ms,
            config.periods.publish_alerts_ms
        );

        Self {
            services,
            clock,
            started_at: start,
            config,
            state,
            buttons,
            stats: LoopStats::default(),
        }
    }

    /// Run one loop iteration.
    pub fn tick(&mut self) -> TickReport {
        let now = self.clock.now();
        let mut report = TickReport {
            now,
            ..TickReport::default()
        };
        self.stats.iterations = self.stats.iterations.saturating_add(1);

        self.poll_buttons(&mut report);
        refresh_connectivity(&mut self.state, &mut self.services.network);

        for task in PeriodicTask::ALL {
            if !self.state.schedule.is_due(task, now) {
                continue;
            }

            let lateness_ms = duration_to_millis(self.state.schedule.lateness(task, now));
            self.stats.max_lateness_ms = self.stats.max_lateness_ms.max(lateness_ms);

            self.run_task(task);
            self.state.schedule.advance(task);

            self.stats.task_runs[task.index()] += 1;
            let _ = report.tasks_run.push(task);
        }

        report
    }

    fn poll_buttons(&mut self, report: &mut TickReport) {
        for tracker in &mut self.buttons {
            if !tracker.check(&mut self.services.input) {
                continue;
            }

            let event = match tracker.button() {
                ButtonId::Previous => {
                    self.state.menu = self.state.menu.previous();
                    info!("menu changed to {:?}", self.state.menu);
                    InputEvent::MenuChanged(self.state.menu)
                }
                ButtonId::Next => {
                    self.state.menu = self.state.menu.next();
                    info!("menu changed to {:?}", self.state.menu);
                    InputEvent::MenuChanged(self.state.menu)
                }
                ButtonId::Reconnect => {
                    info!("reconnection requested");
                    self.services.network.reconnect();
                    self.stats.reconnect_requests = self.stats.reconnect_requests.saturating_add(1);
                    InputEvent::ReconnectRequested
                }
            };
            let _ = report.events.push(event);
        }
    }

    fn run_task(&mut self, task: PeriodicTask) {
        let Self {
            services,
            config,
            state,
            stats,
            ..
        } = self;

        match task {
            PeriodicTask::Sense => {
                sense(state, &mut services.sensors, &config.thresholds, stats);
                services.display.set_alert_indicator(state.alerts.any_critical());
            }
            PeriodicTask::Render => render(state, &mut services.display),
            PeriodicTask::Report => report_status(state),
            PeriodicTask::PublishData => publish_data(state, &mut services.publisher, &config.topics, stats),
            PeriodicTask::PublishAlerts => {
                publish_alerts(state, &mut services.publisher, &config.topics, stats);
            }
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    pub fn uptime(&self) -> Duration {
        self.clock.now().saturating_duration_since(self.started_at)
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot::new(&self.state, &self.stats, self.uptime())
    }

    /// Earliest instant at which some periodic task becomes due.
    pub fn next_deadline(&self) -> Instant {
        self.state.schedule.next_due()
    }

    pub fn services(&self) -> &Services<S, D, P, N, I> {
        &self.services
    }

    pub fn services_mut(&mut self) -> &mut Services<S, D, P, N, I> {
        &mut self.services
    }
}

/// Queries both connectivity facts. The broker flag is only kept while the
/// network link is up.
fn refresh_connectivity<N: ConnectivityService>(state: &mut AppState, network: &mut N) {
    let network_up = network.network_up();
    let broker_up = network_up && network.broker_up();

    if state.connectivity.update(network_up, broker_up) {
        info!(
            "connectivity changed: network {}, broker {}",
            if network_up { "up" } else { "down" },
            if state.connectivity.broker() { "up" } else { "down" }
        );
    }
}

/// Acquire every sensor, then evaluate alerts on the fresh readings.
fn sense<S: SensorService>(
    state: &mut AppState,
    sensors: &mut S,
    thresholds: &Thresholds,
    stats: &mut LoopStats,
) {
    for sensor in SensorId::ALL {
        let reading = state.readings.get_mut(sensor);
        match sensors.read(sensor) {
            Ok(value) => {
                reading.record_success(value);
                debug!("{:?}: {:.2} {}", sensor, value, sensor.unit());
            }
            Err(SensorError::NotPresent) => {
                reading.record_failure();
                debug!("{:?} not fitted", sensor);
            }
            Err(e) => {
                reading.record_failure();
                stats.sensor_failures = stats.sensor_failures.saturating_add(1);
                warn!("{:?} read failed: {}", sensor, e);
            }
        }
    }

    let previous = state.alerts;
    state.alerts = alerts::evaluate(&state.readings, thresholds);

    if state.alerts.any_critical() {
        for parameter in state.alerts.critical_parameters() {
            warn!(
                "critical {:?}: {}",
                parameter,
                alerts::limit_description(parameter, thresholds)
            );
        }
    } else if previous.any_critical() {
        info!("all parameters back within limits");
    }
}

/// Pure projection of the current state onto the selected screen.
fn render<D: DisplayService>(state: &AppState, display: &mut D) {
    display.render(state.menu, state);
}

fn report_status(state: &AppState) {
    if !state.connectivity.network() {
        return;
    }

    match StatusReport::new(&state.readings, &state.alerts).to_json() {
        Ok(json) => info!("status: {}", json),
        Err(e) => warn!("status report not serialized: {}", e),
    }
}

fn publish_data<P: PublishService>(
    state: &AppState,
    publisher: &mut P,
    topics: &Topics,
    stats: &mut LoopStats,
) {
    if !state.connectivity.network() {
        debug!("publish-data skipped: network down");
        return;
    }

    match payload::sensor_data_payload(&state.readings) {
        Ok(payload) => send(publisher, &topics.data, payload.as_bytes(), stats),
        Err(e) => warn!("sensor data payload not built: {}", e),
    }
}

fn publish_alerts<P: PublishService>(
    state: &AppState,
    publisher: &mut P,
    topics: &Topics,
    stats: &mut LoopStats,
) {
    if !state.connectivity.network() || !state.alerts.any_critical() {
        return;
    }

    match payload::alert_payload(&state.alerts) {
        Ok(payload) => send(publisher, &topics.alerts, payload.as_bytes(), stats),
        Err(e) => warn!("alert payload not built: {}", e),
    }
}

fn send<P: PublishService>(publisher: &mut P, topic: &str, payload: &[u8], stats: &mut LoopStats) {
    match publisher.publish(topic, payload) {
        Ok(()) => {
            stats.publishes_sent = stats.publishes_sent.saturating_add(1);
            info!("published {} bytes to {}", payload.len(), topic);
        }
        Err(e) => {
            stats.publishes_dropped = stats.publishes_dropped.saturating_add(1);
            warn!("publish to {} dropped: {}", topic, e);
        }
    }
}
