//! Request lifecycle tracking subsystem.
//!
//! # Data Flow
//! ```text
//! InterceptingClient hooks
//!     → request_tracker.rs (driver, owns the lock)
//!     → classify.rs (connectivity vs. response failure)
//!     → state.rs (pure transition: events + effect)
//!     → events.rs (broadcast to subscribers)
//!     → countdown.rs (1 s ticks, restarted on every connectivity failure)
//!     → request_tracker.rs retry_drain (FIFO replay through the transport)
//! ```
//!
//! # Design Decisions
//! - Errors pass through the hooks unchanged; tracking never swallows them
//! - At most one countdown is alive; a new one always replaces the old
//! - The deferred queue is memory only

pub mod classify;
pub mod countdown;
pub mod events;
pub mod request_tracker;
pub mod state;

pub use classify::{classify, FailureClass};
pub use countdown::Countdown;
pub use events::{EventBus, TrackerEvent};
pub use request_tracker::RequestTracker;
pub use state::{Effect, TrackerState, Transition};
