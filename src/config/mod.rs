//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → TrackerSettings (validated, immutable)
//!     → TrackerConfig handed to RequestTracker
//!     → TransportConfig handed to ReqwestTransport
//! ```
//!
//! # Design Decisions
//! - Config is immutable once a tracker is constructed
//! - All fields have defaults to allow minimal (or empty) configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::ObservabilityConfig;
pub use schema::TrackerConfig;
pub use schema::TrackerSettings;
pub use schema::TransportConfig;
pub use validation::{validate_config, ValidationError};
