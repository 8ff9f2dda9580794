//! Default transport backed by `reqwest`.
//!
//! # Responsibilities
//! - Turn a `RequestDescriptor` into a `reqwest::Request`
//! - Read the full response body
//! - Map reqwest failures onto `TransportError`
//!
//! # Design Decisions
//! - Non-2xx statuses are returned as `TransportError::Status`
//! - Timeouts are distinct from other network errors
//! - Once the status line is in, body failures are `Body`, never `Network`
//! - Requests that fail to build are never dispatched

use futures_util::future::BoxFuture;
use reqwest::Client;

use crate::config::TransportConfig;
use crate::transport::types::{RequestDescriptor, Response, TransportError, TransportResult};
use crate::transport::Transport;

/// HTTP transport over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport with the configured timeouts and user agent.
    pub fn new(config: &TransportConfig) -> TransportResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| TransportError::InvalidRequest(format!("Failed to build HTTP client: {}", e)))?;

        tracing::debug!(
            request_timeout_secs = config.request_timeout_secs,
            connect_timeout_secs = config.connect_timeout_secs,
            "HTTP transport initialized"
        );
        Ok(Self { client })
    }

    /// Wrap an already configured client. Its timeouts, if any, are used
    /// as is.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    fn build(&self, request: &RequestDescriptor) -> TransportResult<reqwest::Request> {
        let url = url::Url::parse(&request.url)
            .map_err(|e| TransportError::InvalidRequest(format!("Invalid URL '{}': {}", request.url, e)))?;

        let mut builder = self.client.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        builder
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))
    }
}

impl Transport for ReqwestTransport {
    fn request(&self, request: RequestDescriptor) -> BoxFuture<'static, TransportResult<Response>> {
        let built = self.build(&request);
        Box::pin(send(self.client.clone(), built, request))
    }
}

async fn send(
    client: Client,
    built: TransportResult<reqwest::Request>,
    request: RequestDescriptor,
) -> TransportResult<Response> {
    let http_request = built?;

    let response = match client.execute(http_request).await {
        Ok(response) => response,
        Err(e) => return Err(map_reqwest_error(e, request)),
    };

    let status = response.status();
    let headers = response.headers().clone();
    let url = response.url().to_string();
    let body = match response.bytes().await {
        Ok(bytes) => bytes.to_vec(),
        Err(e) => {
            tracing::debug!(url = %request.url, status = %status, error = %e, "Response body read failed");
            return Err(TransportError::body(request, status, e.to_string()));
        }
    };

    let response = Response {
        status,
        headers,
        body,
        url,
    };

    if status.is_success() {
        Ok(response)
    } else {
        tracing::debug!(url = %request.url, status = %status, "Request returned error status");
        Err(TransportError::status(request, response))
    }
}

fn map_reqwest_error(error: reqwest::Error, request: RequestDescriptor) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout {
            request: Box::new(request),
        }
    } else if error.is_builder() {
        TransportError::InvalidRequest(error.to_string())
    } else {
        tracing::debug!(url = %request.url, error = %error, "Request failed before a response arrived");
        TransportError::network(request, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_url_is_rejected_before_dispatch() {
        let transport = ReqwestTransport::from_client(Client::new());
        let err = transport
            .request(RequestDescriptor::get("not a url"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidRequest(ref msg) if msg.contains("not a url")));
    }

    #[tokio::test]
    async fn test_closed_port_is_network_error() {
        // Bind then drop so the port is known to be closed.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = ReqwestTransport::new(&TransportConfig::default()).unwrap();
        let err = transport
            .request(RequestDescriptor::get(format!("http://{}/", addr)))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Network { .. }));
        assert!(err.response().is_none());
    }

    #[test]
    fn test_build_applies_query_headers_and_body() {
        let transport = ReqwestTransport::from_client(Client::new());
        let req = RequestDescriptor::post("http://localhost:9/items")
            .query("page", "2")
            .header("x-trace", "abc")
            .json(serde_json::json!({ "id": 7 }));

        let built = transport.build(&req).unwrap();
        assert_eq!(built.url().as_str(), "http://localhost:9/items?page=2");
        assert_eq!(built.headers()["x-trace"], "abc");
        assert_eq!(built.headers()["content-type"], "application/json");
        assert!(built.body().is_some());
    }
}
