//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, channel capacity > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: TrackerSettings → Result<(), Vec<ValidationError>>

use thiserror::Error;

use crate::config::schema::TrackerSettings;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `tracker.timeout_secs`.
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Check every semantic constraint and collect all violations.
pub fn validate_config(settings: &TrackerSettings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.tracker.timeout_secs == 0 {
        errors.push(ValidationError::new(
            "tracker.timeout_secs",
            "countdown must last at least one second",
        ));
    }
    if settings.tracker.event_capacity == 0 {
        errors.push(ValidationError::new(
            "tracker.event_capacity",
            "event channel needs room for at least one event",
        ));
    }
    if settings.transport.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "transport.request_timeout_secs",
            "must be greater than zero",
        ));
    }
    if settings.transport.connect_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "transport.connect_timeout_secs",
            "must be greater than zero",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
