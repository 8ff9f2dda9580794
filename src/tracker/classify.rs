//! Failure classification.
//!
//! Only failures where no response came back are worth replaying later;
//! anything that produced a response (or never left the process) is final.

use crate::transport::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// No response reached us: the network is presumed down.
    Connectivity,
    /// The server answered (with an error status or an unreadable body), or
    /// the request was rejected before dispatch.
    Response,
}

impl FailureClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureClass::Connectivity => "connectivity",
            FailureClass::Response => "response",
        }
    }
}

pub fn classify(error: &TransportError) -> FailureClass {
    match error {
        TransportError::Network { .. } | TransportError::Timeout { .. } => FailureClass::Connectivity,
        TransportError::Status { .. } | TransportError::Body { .. } | TransportError::InvalidRequest(_) => {
            FailureClass::Response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{RequestDescriptor, Response};
    use reqwest::StatusCode;

    #[test]
    fn test_classification() {
        let req = RequestDescriptor::get("http://localhost/");

        assert_eq!(
            classify(&TransportError::network(req.clone(), "refused")),
            FailureClass::Connectivity
        );
        assert_eq!(
            classify(&TransportError::Timeout { request: Box::new(req.clone()) }),
            FailureClass::Connectivity
        );
        for status in [StatusCode::BAD_REQUEST, StatusCode::SERVICE_UNAVAILABLE] {
            let err = TransportError::status(req.clone(), Response::new(status, "http://localhost/"));
            assert_eq!(classify(&err), FailureClass::Response);
        }
        assert_eq!(
            classify(&TransportError::body(req.clone(), StatusCode::OK, "connection reset")),
            FailureClass::Response
        );
        assert_eq!(
            classify(&TransportError::InvalidRequest("bad url".into())),
            FailureClass::Response
        );
    }
}
