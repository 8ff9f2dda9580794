//! HTTP transport subsystem.
//!
//! # Data Flow
//! ```text
//! RequestDescriptor
//!     → interceptor.rs (request hooks, in registration order)
//!     → client.rs (reqwest dispatch, status check)
//!     → interceptor.rs (response / error hooks)
//!     → Result<Response, TransportError>
//! ```
//!
//! # Design Decisions
//! - The tracker only sees the `Transport` trait; reqwest is one implementation
//! - Error statuses are errors, matching what callers expect from a client
//! - `request` does its synchronous work before returning the future, so
//!   dispatch order equals call order

pub mod client;
pub mod interceptor;
pub mod types;

use futures_util::future::BoxFuture;

pub use client::ReqwestTransport;
pub use interceptor::{ErrorHook, InterceptingClient, RequestHook, ResponseHook};
pub use types::{Callbacks, RequestDescriptor, Response, TransportError, TransportResult};

/// Something that can send a request and produce a response.
pub trait Transport: Send + Sync {
    /// Start sending `request`.
    ///
    /// The returned future owns everything it needs and may outlive `self`.
    fn request(&self, request: RequestDescriptor) -> BoxFuture<'static, TransportResult<Response>>;
}
