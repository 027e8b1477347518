use crate::clock::Instant;
use crate::config::TaskPeriods;
use core::time::Duration;
use serde::{Deserialize, Serialize};

/// Periodic activities multiplexed over the control loop.
///
/// [`PeriodicTask::ALL`] is the fixed priority order used within a single
/// loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodicTask {
    Sense,
    Render,
    Report,
    PublishData,
    PublishAlerts,
}

impl PeriodicTask {
    pub const COUNT: usize = 5;

    pub const ALL: [PeriodicTask; Self::COUNT] = [
        PeriodicTask::Sense,
        PeriodicTask::Render,
        PeriodicTask::Report,
        PeriodicTask::PublishData,
        PeriodicTask::PublishAlerts,
    ];

    pub const fn index(self) -> usize {
        match self {
            PeriodicTask::Sense => 0,
            PeriodicTask::Render => 1,
            PeriodicTask::Report => 2,
            PeriodicTask::PublishData => 3,
            PeriodicTask::PublishAlerts => 4,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            PeriodicTask::Sense => "sense",
            PeriodicTask::Render => "render",
            PeriodicTask::Report => "report",
            PeriodicTask::PublishData => "publish-data",
            PeriodicTask::PublishAlerts => "publish-alerts",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Deadline {
    due: Instant,
    period_ms: u64,
}

/// One deadline per periodic task.
///
/// A deadline that has passed is advanced from its own previous value, never
/// from the time the task actually ran, so a late iteration does not push
/// every later run back with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    deadlines: [Deadline; PeriodicTask::COUNT],
}

impl Schedule {
    /// First deadline of every task is one period after `start`.
    pub fn new(start: Instant, periods: &TaskPeriods) -> Self {
        let deadlines = PeriodicTask::ALL.map(|task| Deadline {
            due: start + periods.period(task),
            period_ms: periods.period_ms(task),
        });
        Self { deadlines }
    }

    pub fn deadline(&self, task: PeriodicTask) -> Instant {
        self.deadlines[task.index()].due
    }

    pub fn is_due(&self, task: PeriodicTask, now: Instant) -> bool {
        now >= self.deadline(task)
    }

    /// How far past its deadline `task` is at `now` (zero if not yet due).
    pub fn lateness(&self, task: PeriodicTask, now: Instant) -> Duration {
        now.saturating_duration_since(self.deadline(task))
    }

    /// Advances the deadline of `task` by exactly one period and returns it.
    pub fn advance(&mut self, task: PeriodicTask) -> Instant {
        let deadline = &mut self.deadlines[task.index()];
        deadline.due = deadline.due + Duration::from_millis(deadline.period_ms);
        deadline.due
    }

    /// Earliest pending deadline across all tasks.
    pub fn next_due(&self) -> Instant {
        self.deadlines
            .iter()
            .map(|d| d.due)
            .min()
            .unwrap_or(Instant::ZERO)
    }
}
