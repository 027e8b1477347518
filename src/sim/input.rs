use crate::services::{ButtonId, InputService};
use std::collections::VecDeque;

const RELEASED: bool = true;
const PRESSED: bool = false;

/// Button pins driven from a queue of scripted levels.
///
/// A queued press shows up as one low sample followed by a high one, so two
/// back-to-back presses are still two falling edges.
#[derive(Debug, Clone, Default)]
pub struct SimInput {
    pending: [VecDeque<bool>; ButtonId::COUNT],
}

impl SimInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, button: ButtonId) {
        let queue = &mut self.pending[button.index()];
        queue.push_back(PRESSED);
        queue.push_back(RELEASED);
    }

    /// Hold the button low for `samples` reads.
    pub fn hold(&mut self, button: ButtonId, samples: usize) {
        let queue = &mut self.pending[button.index()];
        queue.extend(core::iter::repeat(PRESSED).take(samples));
        queue.push_back(RELEASED);
    }

    pub fn is_idle(&self) -> bool {
        self.pending.iter().all(VecDeque::is_empty)
    }
}

impl InputService for SimInput {
    fn raw_level(&mut self, button: ButtonId) -> bool {
        self.pending[button.index()].pop_front().unwrap_or(RELEASED)
    }
}
