//! Edge detection for active-low push buttons.
//!
//! No time-based filtering: a press is the first high→low transition seen by
//! consecutive samples. The loop samples far faster than contacts bounce, and
//! only the first falling edge counts.

use crate::services::{ButtonId, InputService};

/// Previously observed raw level of one pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceState {
    last_level: bool,
}

impl DebounceState {
    pub const fn new(initial_level: bool) -> Self {
        Self {
            last_level: initial_level,
        }
    }

    /// Feed one raw sample. True only on a released→pressed transition.
    pub fn check(&mut self, level: bool) -> bool {
        let pressed = self.last_level && !level;
        self.last_level = level;
        pressed
    }

    pub const fn last_level(&self) -> bool {
        self.last_level
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ButtonTracker {
    button: ButtonId,
    state: DebounceState,
}

impl ButtonTracker {
    /// Seeds the tracker with the pin's current level so a button held
    /// during startup does not count as a press.
    pub fn new<I: InputService>(button: ButtonId, input: &mut I) -> Self {
        Self {
            button,
            state: DebounceState::new(input.raw_level(button)),
        }
    }

    pub fn button(&self) -> ButtonId {
        self.button
    }

    pub fn check<I: InputService>(&mut self, input: &mut I) -> bool {
        self.state.check(input.raw_level(self.button))
    }
}
