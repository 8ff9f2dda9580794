//! Request/response types and transport error definitions.

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Called with the response when a request issued through
/// `RequestTracker::execute_request` succeeds.
pub type SuccessCallback = Arc<dyn Fn(&Response) + Send + Sync>;

/// Called with the error when a request issued through
/// `RequestTracker::execute_request` fails.
pub type ErrorCallback = Arc<dyn Fn(&TransportError) + Send + Sync>;

/// Completion callbacks carried along with a request.
#[derive(Clone, Default)]
pub struct Callbacks {
    pub success: Option<SuccessCallback>,
    pub error: Option<ErrorCallback>,
}

impl Callbacks {
    /// Invoke the callback matching `result`.
    ///
    /// Returns `false` when the result is an error and no error callback was
    /// supplied, meaning nobody has handled the failure yet.
    pub fn dispatch(&self, result: &TransportResult<Response>) -> bool {
        match result {
            Ok(response) => {
                if let Some(success) = &self.success {
                    success(response);
                }
                true
            }
            Err(error) => match &self.error {
                Some(handler) => {
                    handler(error);
                    true
                }
                None => false,
            },
        }
    }
}

/// Everything needed to issue (and later replay) one HTTP request.
#[derive(Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    /// Query string pairs appended to the URL.
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    /// JSON payload.
    pub body: Option<serde_json::Value>,
    pub callbacks: Callbacks,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            callbacks: Callbacks::default(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(&Response) + Send + Sync + 'static,
    {
        self.callbacks.success = Some(Arc::new(f));
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&TransportError) + Send + Sync + 'static,
    {
        self.callbacks.error = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("query", &self.query)
            .field("headers", &self.headers)
            .field("has_body", &self.body.is_some())
            .field("has_success", &self.callbacks.success.is_some())
            .field("has_error", &self.callbacks.error.is_some())
            .finish()
    }
}

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    /// Final URL after redirects.
    pub url: String,
}

impl Response {
    pub fn new(status: StatusCode, url: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
            url: url.into(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Errors surfaced by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request never reached a server.
    #[error("Network error requesting {}: {message}", .request.url)]
    Network {
        request: Box<RequestDescriptor>,
        message: String,
    },

    /// No response arrived before the transport deadline.
    #[error("Request to {} timed out", .request.url)]
    Timeout { request: Box<RequestDescriptor> },

    /// A response arrived carrying an error status.
    #[error("Request to {} failed with status {}", .request.url, .response.status)]
    Status {
        request: Box<RequestDescriptor>,
        response: Box<Response>,
    },

    /// The server answered, but the response body could not be read.
    #[error("Reading response body from {} (status {status}) failed: {message}", .request.url)]
    Body {
        request: Box<RequestDescriptor>,
        status: StatusCode,
        message: String,
    },

    /// The request could not be built and was never dispatched.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    pub fn network(request: RequestDescriptor, message: impl Into<String>) -> Self {
        Self::Network {
            request: Box::new(request),
            message: message.into(),
        }
    }

    pub fn status(request: RequestDescriptor, response: Response) -> Self {
        Self::Status {
            request: Box::new(request),
            response: Box::new(response),
        }
    }

    pub fn body(request: RequestDescriptor, status: StatusCode, message: impl Into<String>) -> Self {
        Self::Body {
            request: Box::new(request),
            status,
            message: message.into(),
        }
    }

    /// Status line of the response, if one arrived.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Status { response, .. } => Some(response.status),
            Self::Body { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The request that failed, when it is known.
    pub fn request(&self) -> Option<&RequestDescriptor> {
        match self {
            Self::Network { request, .. }
            | Self::Timeout { request }
            | Self::Status { request, .. }
            | Self::Body { request, .. } => Some(request.as_ref()),
            Self::InvalidRequest(_) => None,
        }
    }

    /// The response received, if the request got that far.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Status { response, .. } => Some(response.as_ref()),
            _ => None,
        }
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_builder() {
        let req = RequestDescriptor::post("http://localhost/items")
            .query("page", "2")
            .header("x-trace", "abc")
            .json(serde_json::json!({ "name": "widget" }));

        assert_eq!(req.method, Method::POST);
        assert_eq!(req.query, vec![("page".to_string(), "2".to_string())]);
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.body.unwrap()["name"], "widget");
    }

    #[test]
    fn test_error_accessors() {
        let req = RequestDescriptor::get("http://localhost/a");
        let err = TransportError::status(req.clone(), Response::new(StatusCode::NOT_FOUND, "http://localhost/a"));
        assert_eq!(err.response().unwrap().status, StatusCode::NOT_FOUND);
        assert_eq!(err.request().unwrap().url, "http://localhost/a");
        assert_eq!(err.to_string(), "Request to http://localhost/a failed with status 404 Not Found");

        let err = TransportError::network(req, "connection refused");
        assert!(err.response().is_none());
        assert!(err.to_string().contains("connection refused"));

        assert!(err.status_code().is_none());

        let err = TransportError::body(RequestDescriptor::get("http://localhost/b"), StatusCode::OK, "truncated");
        assert_eq!(err.status_code(), Some(StatusCode::OK));
        assert!(err.response().is_none());
        assert_eq!(err.request().unwrap().url, "http://localhost/b");

        assert!(TransportError::InvalidRequest("bad".into()).request().is_none());
    }

    #[test]
    fn test_callbacks_dispatch() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h1 = hits.clone();
        let h2 = hits.clone();
        let req = RequestDescriptor::get("http://localhost/")
            .on_success(move |_| {
                h1.fetch_add(1, Ordering::SeqCst);
            })
            .on_error(move |_| {
                h2.fetch_add(10, Ordering::SeqCst);
            });

        let ok: TransportResult<Response> = Ok(Response::new(StatusCode::OK, "http://localhost/"));
        assert!(req.callbacks.dispatch(&ok));
        let err: TransportResult<Response> = Err(TransportError::network(req.clone(), "down"));
        assert!(req.callbacks.dispatch(&err));
        assert_eq!(hits.load(Ordering::SeqCst), 11);

        // Without an error callback the failure is reported as unhandled.
        assert!(!Callbacks::default().dispatch(&err));
    }

    #[test]
    fn test_response_body_helpers() {
        let resp = Response::new(StatusCode::OK, "http://localhost/").with_body(r#"{"ok":true}"#);
        assert_eq!(resp.text(), r#"{"ok":true}"#);
        let value: serde_json::Value = resp.json().unwrap();
        assert_eq!(value["ok"], true);
    }
}
