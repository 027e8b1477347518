use crate::config::NetworkLabels;
use crate::screens::{self, Frame};
use crate::services::DisplayService;
use crate::state::{AppState, Menu};
use tracing::debug;

/// Display that keeps the last rendered text frame in memory.
#[derive(Debug, Clone, Default)]
pub struct TextDisplay {
    labels: NetworkLabels,
    frame: Frame,
    renders: u64,
    alert_indicator: bool,
}

impl TextDisplay {
    pub fn new(labels: NetworkLabels) -> Self {
        Self {
            labels,
            frame: Frame::new(),
            renders: 0,
            alert_indicator: false,
        }
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn lines(&self) -> Vec<String> {
        self.frame.iter().map(|line| line.to_string()).collect()
    }

    pub fn renders(&self) -> u64 {
        self.renders
    }

    pub fn alert_indicator(&self) -> bool {
        self.alert_indicator
    }
}

impl DisplayService for TextDisplay {
    fn render(&mut self, screen: Menu, state: &AppState) {
        self.frame = screens::project(screen, state, &self.labels);
        self.renders += 1;
    }

    fn set_alert_indicator(&mut self, on: bool) {
        if on != self.alert_indicator {
            debug!("[SIM DISPLAY] alert LED {}", if on { "on" } else { "off" });
        }
        self.alert_indicator = on;
    }
}
