//! Metrics collection.
//!
//! # Metrics
//! - `tracker_in_flight_requests` (gauge): requests currently outstanding
//! - `tracker_deferred_requests` (gauge): requests waiting for replay
//! - `tracker_offline` (gauge): 1=offline, 0=online
//! - `tracker_failures_total` (counter): failures by class
//! - `tracker_replays_total` (counter): deferred requests re-submitted

use metrics::{counter, describe_counter, describe_gauge, gauge};

/// Register descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_gauge!("tracker_in_flight_requests", "Requests currently in flight");
    describe_gauge!("tracker_deferred_requests", "Requests queued for replay");
    describe_gauge!("tracker_offline", "1 while connectivity is presumed lost");
    describe_counter!("tracker_failures_total", "Failed requests by class");
    describe_counter!("tracker_replays_total", "Deferred requests re-submitted");
}

pub fn record_state(in_flight: usize, deferred: usize, offline: bool) {
    gauge!("tracker_in_flight_requests").set(in_flight as f64);
    gauge!("tracker_deferred_requests").set(deferred as f64);
    gauge!("tracker_offline").set(if offline { 1.0 } else { 0.0 });
}

pub fn record_failure(class: &'static str) {
    counter!("tracker_failures_total", "class" => class).increment(1);
}

pub fn record_replays(count: usize) {
    counter!("tracker_replays_total").increment(count as u64);
}
