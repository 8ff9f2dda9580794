//! Request lifecycle tracker for HTTP clients.
//!
//! Counts in-flight requests, tells connectivity loss apart from HTTP error
//! responses, and replays requests that failed while offline.
//!
//! ```text
//!   RequestDescriptor
//!          │
//!          ▼
//!   ┌────────────────────┐   request hooks    ┌──────────────────┐
//!   │ InterceptingClient │ ─────────────────▶ │  RequestTracker  │──▶ busy / offline / timer
//!   │   (transport)      │ ◀───────────────── │  state + events  │
//!   └─────────┬──────────┘   response hooks   └────────┬─────────┘
//!             │                                        │ countdown expired
//!             ▼                                        ▼
//!      ReqwestTransport  ◀──────────────────── retry_drain (FIFO)
//! ```

pub mod config;
pub mod observability;
pub mod tracker;
pub mod transport;

pub use config::{TrackerConfig, TrackerSettings};
pub use tracker::{RequestTracker, TrackerEvent};
pub use transport::{
    InterceptingClient, ReqwestTransport, RequestDescriptor, Response, Transport, TransportError,
    TransportResult,
};
