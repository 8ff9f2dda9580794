//! Tracker state machine.
//!
//! # States
//! - Online: initial state, nothing known to be wrong
//! - Offline: the last classified failure was a connectivity failure
//!
//! # State Transitions
//! ```text
//! Online  → Offline: connectivity failure          (Offline(true))
//! Offline → Online:  success or response failure   (Offline(false))
//! Offline → Offline: connectivity failure          (countdown restarts)
//! ```
//!
//! # Design Decisions
//! - Every input returns a `Transition` (events + effect); no timers, no I/O
//! - The in-flight counter saturates at zero instead of going negative
//! - Countdown ticks carry an epoch so a superseded countdown is inert

use std::collections::VecDeque;

use crate::config::TrackerConfig;
use crate::tracker::classify::FailureClass;
use crate::tracker::events::TrackerEvent;
use crate::transport::RequestDescriptor;

/// Side effect the driver must perform after applying a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Cancel any live countdown and start a new one tagged `epoch`.
    RestartCountdown { epoch: u64 },
    /// The countdown expired: replay the deferred queue.
    Drain,
}

/// Outcome of feeding one input to the state.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Transition {
    pub events: Vec<TrackerEvent>,
    pub effect: Option<Effect>,
}

#[derive(Debug, Default)]
pub struct TrackerState {
    in_flight: usize,
    disconnected: bool,
    seconds_to_reconnect: u64,
    /// Epoch of the countdown that is allowed to tick.
    active_countdown: Option<u64>,
    next_epoch: u64,
    deferred: VecDeque<RequestDescriptor>,
}

impl TrackerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_offline(&self) -> bool {
        self.disconnected
    }

    pub fn seconds_to_reconnect(&self) -> u64 {
        self.seconds_to_reconnect
    }

    pub fn countdown_active(&self) -> bool {
        self.active_countdown.is_some()
    }

    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    pub fn request_started(&mut self) -> Transition {
        let mut transition = Transition::default();
        self.in_flight += 1;
        if self.in_flight == 1 {
            transition.events.push(TrackerEvent::Busy(true));
        }
        transition
    }

    pub fn response_succeeded(&mut self) -> Transition {
        let mut transition = Transition::default();
        self.reconnect(&mut transition);
        self.finish_request(&mut transition);
        transition
    }

    /// Record a failed request.
    ///
    /// `request` is queued for replay when `class` is `Connectivity`.
    pub fn request_failed(
        &mut self,
        class: FailureClass,
        request: Option<RequestDescriptor>,
        config: &TrackerConfig,
    ) -> Transition {
        let mut transition = Transition::default();
        self.finish_request(&mut transition);

        match class {
            FailureClass::Connectivity => {
                if !self.disconnected {
                    self.disconnected = true;
                    transition.events.push(TrackerEvent::Offline(true));
                }

                match request {
                    Some(request) => self.deferred.push_back(request),
                    None => tracing::warn!("Connectivity failure without a request to defer"),
                }

                if config.auto_retry {
                    self.seconds_to_reconnect = config.timeout_secs;
                    transition.events.push(TrackerEvent::Timer(self.seconds_to_reconnect));

                    let epoch = self.next_epoch;
                    self.next_epoch += 1;
                    self.active_countdown = Some(epoch);
                    transition.effect = Some(Effect::RestartCountdown { epoch });
                }
            }
            FailureClass::Response => self.reconnect(&mut transition),
        }
        transition
    }

    /// Advance the countdown tagged `epoch` by one second.
    ///
    /// Returns `None` when that countdown is no longer the live one.
    pub fn countdown_tick(&mut self, epoch: u64) -> Option<Transition> {
        if self.active_countdown != Some(epoch) {
            return None;
        }

        let mut transition = Transition::default();
        self.seconds_to_reconnect = self.seconds_to_reconnect.saturating_sub(1);
        if self.seconds_to_reconnect < 1 {
            self.active_countdown = None;
            transition.effect = Some(Effect::Drain);
        } else {
            transition.events.push(TrackerEvent::Timer(self.seconds_to_reconnect));
        }
        Some(transition)
    }

    /// Forget the live countdown without draining, e.g. when it could not be
    /// scheduled.
    pub fn abandon_countdown(&mut self) {
        self.active_countdown = None;
    }

    /// Take the oldest deferred request.
    pub fn next_deferred(&mut self) -> Option<RequestDescriptor> {
        self.deferred.pop_front()
    }

    fn reconnect(&mut self, transition: &mut Transition) {
        if self.disconnected {
            self.disconnected = false;
            transition.events.push(TrackerEvent::Offline(false));
        }
    }

    fn finish_request(&mut self, transition: &mut Transition) {
        match self.in_flight {
            0 => tracing::warn!("Request completion observed with nothing in flight"),
            n => {
                self.in_flight = n - 1;
                if self.in_flight == 0 {
                    transition.events.push(TrackerEvent::Busy(false));
                }
            }
        }
    }
}
