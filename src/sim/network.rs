//! Simulated Wi-Fi link and MQTT broker sharing one connection state.

use crate::payload::MAX_PAYLOAD_SIZE;
use crate::protocol::PublishedMessage;
use crate::services::{ConnectivityService, PublishError, PublishService};
use alloc::string::String;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{debug, info};

const DEFAULT_RECONNECT_POLLS: u32 = 3;
const MAX_OUTBOX: usize = 64;

#[derive(Debug)]
struct LinkState {
    link_up: bool,
    broker_available: bool,
    /// Polls left before a started reconnection completes.
    pending_reconnect: Option<u32>,
    reconnect_polls: u32,
    reconnect_attempts: u64,
    outbox: VecDeque<PublishedMessage>,
}

/// Handle to the shared simulated connection. Clones observe the same link.
#[derive(Debug, Clone)]
pub struct SimLink {
    inner: Rc<RefCell<LinkState>>,
}

impl SimLink {
    /// Link and broker up, as after a successful boot.
    pub fn connected() -> Self {
        Self::with_state(true, DEFAULT_RECONNECT_POLLS)
    }

    pub fn disconnected() -> Self {
        Self::with_state(false, DEFAULT_RECONNECT_POLLS)
    }

    /// Number of `network_up` polls a reconnection takes to complete.
    pub fn with_reconnect_polls(self, polls: u32) -> Self {
        self.inner.borrow_mut().reconnect_polls = polls;
        self
    }

    fn with_state(link_up: bool, reconnect_polls: u32) -> Self {
        Self {
            inner: Rc::new(RefCell::new(LinkState {
                link_up,
                broker_available: true,
                pending_reconnect: None,
                reconnect_polls,
                reconnect_attempts: 0,
                outbox: VecDeque::new(),
            })),
        }
    }

    pub fn network(&self) -> SimNetwork {
        SimNetwork { link: self.clone() }
    }

    pub fn broker(&self) -> SimBroker {
        SimBroker { link: self.clone() }
    }

    /// Force the link state. Dropping the link cancels a pending reconnection.
    pub fn set_link(&self, up: bool) {
        let mut state = self.inner.borrow_mut();
        state.link_up = up;
        if !up {
            state.pending_reconnect = None;
        }
        info!("[SIM LINK] link forced {}", if up { "up" } else { "down" });
    }

    pub fn set_broker(&self, available: bool) {
        self.inner.borrow_mut().broker_available = available;
        info!("[SIM LINK] broker {}", if available { "available" } else { "unavailable" });
    }

    pub fn broker_session_up(&self) -> bool {
        let state = self.inner.borrow();
        state.link_up && state.broker_available
    }

    pub fn reconnect_pending(&self) -> bool {
        self.inner.borrow().pending_reconnect.is_some()
    }

    pub fn reconnect_attempts(&self) -> u64 {
        self.inner.borrow().reconnect_attempts
    }

    /// Take every message the broker accepted since the last drain.
    pub fn drain(&self) -> Vec<PublishedMessage> {
        self.inner.borrow_mut().outbox.drain(..).collect()
    }
}

#[derive(Debug, Clone)]
pub struct SimNetwork {
    link: SimLink,
}

impl ConnectivityService for SimNetwork {
    fn network_up(&mut self) -> bool {
        let mut state = self.link.inner.borrow_mut();
        match state.pending_reconnect {
            Some(0) => {
                state.pending_reconnect = None;
                state.link_up = true;
                info!("[SIM LINK] reconnection complete");
            }
            Some(n) => state.pending_reconnect = Some(n - 1),
            None => {}
        }
        state.link_up
    }

    fn broker_up(&mut self) -> bool {
        self.link.broker_session_up()
    }

    fn reconnect(&mut self) {
        let mut state = self.link.inner.borrow_mut();
        state.reconnect_attempts += 1;
        if state.pending_reconnect.is_none() {
            state.pending_reconnect = Some(state.reconnect_polls);
            debug!("[SIM LINK] reconnection started");
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimBroker {
    link: SimLink,
}

impl PublishService for SimBroker {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(PublishError::PayloadTooLarge {
                len: payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }
        if !self.link.broker_session_up() {
            return Err(PublishError::BrokerDown);
        }

        let payload = String::from_utf8(payload.to_vec())
            .map_err(|_| PublishError::Rejected("payload is not UTF-8".into()))?;

        let mut state = self.link.inner.borrow_mut();
        if state.outbox.len() == MAX_OUTBOX {
            state.outbox.pop_front();
        }
        state.outbox.push_back(PublishedMessage {
            topic: topic.into(),
            payload,
        });
        Ok(())
    }
}
