//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! RequestTracker transitions produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (gauges and counters via the `metrics` facade)
//!
//! Consumers:
//!     → Whatever subscriber / recorder the host application installs
//! ```
//!
//! # Design Decisions
//! - The library never installs a metrics exporter
//! - Metric updates are cheap enough to run under the tracker lock

pub mod logging;
pub mod metrics;
