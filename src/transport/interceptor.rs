//! Client wrapper with request/response interception slots.
//!
//! # Responsibilities
//! - Hold (success, error) hook pairs for the request and response side
//! - Run request hooks before dispatch and response hooks after it
//! - Route failures through the error hooks of every later pair
//!
//! # Design Decisions
//! - Hooks are synchronous; only the inner dispatch is awaited
//! - A rejecting success hook hands its error to the *next* pair's error hook
//! - Hooks are snapshotted per request, so registering mid-flight is safe

use futures_util::future::{self, BoxFuture, FutureExt};
use std::sync::{Arc, PoisonError, RwLock};

use crate::transport::types::{RequestDescriptor, Response, TransportError, TransportResult};
use crate::transport::Transport;

/// Runs on a request before it is dispatched.
pub type RequestHook = Arc<dyn Fn(RequestDescriptor) -> TransportResult<RequestDescriptor> + Send + Sync>;

/// Runs on a successful response.
pub type ResponseHook = Arc<dyn Fn(Response) -> TransportResult<Response> + Send + Sync>;

/// Observes a failure and passes it on.
pub type ErrorHook = Arc<dyn Fn(TransportError) -> TransportError + Send + Sync>;

struct HookPair<T> {
    on_ok: T,
    on_error: ErrorHook,
}

impl<T: Clone> Clone for HookPair<T> {
    fn clone(&self) -> Self {
        Self {
            on_ok: self.on_ok.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

#[derive(Default)]
struct Interceptors {
    request: Vec<HookPair<RequestHook>>,
    response: Vec<HookPair<ResponseHook>>,
}

/// A transport whose requests and responses pass through registered hooks.
#[derive(Clone)]
pub struct InterceptingClient {
    inner: Arc<dyn Transport>,
    interceptors: Arc<RwLock<Interceptors>>,
}

impl InterceptingClient {
    /// Wrap `inner` with empty interception slots.
    pub fn new(inner: Arc<dyn Transport>) -> Self {
        Self {
            inner,
            interceptors: Arc::new(RwLock::new(Interceptors::default())),
        }
    }

    /// Attach a hook pair to the request side.
    pub fn use_request<F, E>(&self, on_request: F, on_error: E)
    where
        F: Fn(RequestDescriptor) -> TransportResult<RequestDescriptor> + Send + Sync + 'static,
        E: Fn(TransportError) -> TransportError + Send + Sync + 'static,
    {
        self.write().request.push(HookPair {
            on_ok: Arc::new(on_request),
            on_error: Arc::new(on_error),
        });
    }

    /// Attach a hook pair to the response side.
    pub fn use_response<F, E>(&self, on_response: F, on_error: E)
    where
        F: Fn(Response) -> TransportResult<Response> + Send + Sync + 'static,
        E: Fn(TransportError) -> TransportError + Send + Sync + 'static,
    {
        self.write().response.push(HookPair {
            on_ok: Arc::new(on_response),
            on_error: Arc::new(on_error),
        });
    }

    /// Number of (request, response) hook pairs attached.
    pub fn interceptor_count(&self) -> (usize, usize) {
        let interceptors = self.interceptors.read().unwrap_or_else(PoisonError::into_inner);
        (interceptors.request.len(), interceptors.response.len())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Interceptors> {
        self.interceptors.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> (Vec<HookPair<RequestHook>>, Vec<HookPair<ResponseHook>>) {
        let interceptors = self.interceptors.read().unwrap_or_else(PoisonError::into_inner);
        (interceptors.request.clone(), interceptors.response.clone())
    }
}

impl Transport for InterceptingClient {
    fn request(&self, request: RequestDescriptor) -> BoxFuture<'static, TransportResult<Response>> {
        let (request_hooks, response_hooks) = self.snapshot();

        let mut outcome = Ok(request);
        for hook in &request_hooks {
            outcome = match outcome {
                Ok(req) => (hook.on_ok)(req),
                Err(e) => Err((hook.on_error)(e)),
            };
        }

        let pending = match outcome {
            Ok(req) => self.inner.request(req),
            Err(e) => future::ready(Err(e)).boxed(),
        };

        async move {
            let mut result = pending.await;
            for hook in &response_hooks {
                result = match result {
                    Ok(resp) => (hook.on_ok)(resp),
                    Err(e) => Err((hook.on_error)(e)),
                };
            }
            result
        }
        .boxed()
    }
}

impl std::fmt::Debug for InterceptingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (request, response) = self.interceptor_count();
        f.debug_struct("InterceptingClient")
            .field("request_hooks", &request)
            .field("response_hooks", &response)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use std::sync::Mutex;

    /// Answers 200 for `/ok`, 500 for `/fail` and a network error otherwise.
    struct StubTransport;

    impl Transport for StubTransport {
        fn request(&self, request: RequestDescriptor) -> BoxFuture<'static, TransportResult<Response>> {
            let result = if request.url.ends_with("/ok") {
                Ok(Response::new(StatusCode::OK, request.url.clone()))
            } else if request.url.ends_with("/fail") {
                let response = Response::new(StatusCode::INTERNAL_SERVER_ERROR, request.url.clone());
                Err(TransportError::status(request, response))
            } else {
                Err(TransportError::network(request, "unreachable"))
            };
            future::ready(result).boxed()
        }
    }

    fn client_with_log() -> (InterceptingClient, Arc<Mutex<Vec<String>>>) {
        let client = InterceptingClient::new(Arc::new(StubTransport));
        let log = Arc::new(Mutex::new(Vec::new()));

        for name in ["first", "second"] {
            let (l1, l2, l3, l4) = (log.clone(), log.clone(), log.clone(), log.clone());
            client.use_request(
                move |req| {
                    l1.lock().unwrap().push(format!("{name}:request"));
                    Ok(req)
                },
                move |err| {
                    l2.lock().unwrap().push(format!("{name}:request_error"));
                    err
                },
            );
            client.use_response(
                move |resp| {
                    l3.lock().unwrap().push(format!("{name}:response"));
                    Ok(resp)
                },
                move |err| {
                    l4.lock().unwrap().push(format!("{name}:response_error"));
                    err
                },
            );
        }
        (client, log)
    }

    #[tokio::test]
    async fn test_success_runs_hooks_in_order() {
        let (client, log) = client_with_log();
        let resp = client.request(RequestDescriptor::get("http://stub/ok")).await.unwrap();
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["first:request", "second:request", "first:response", "second:response"]
        );
    }

    #[tokio::test]
    async fn test_failures_reach_response_error_hooks() {
        let (client, log) = client_with_log();
        let err = client.request(RequestDescriptor::get("http://stub/fail")).await.unwrap_err();
        assert_eq!(err.response().unwrap().status, StatusCode::INTERNAL_SERVER_ERROR);

        let err = client.request(RequestDescriptor::get("http://stub/down")).await.unwrap_err();
        assert!(matches!(err, TransportError::Network { .. }));

        let log = log.lock().unwrap();
        assert_eq!(log.iter().filter(|e| e.ends_with(":response_error")).count(), 4);
        assert!(!log.iter().any(|e| e.ends_with(":request_error")));
    }

    #[tokio::test]
    async fn test_rejecting_request_hook_skips_dispatch() {
        let client = InterceptingClient::new(Arc::new(StubTransport));
        let seen = Arc::new(Mutex::new(Vec::new()));
        client.use_request(
            |_req| Err(TransportError::InvalidRequest("blocked".into())),
            |err| err,
        );
        let s1 = seen.clone();
        let s2 = seen.clone();
        client.use_request(
            |req| Ok(req),
            move |err| {
                s1.lock().unwrap().push(format!("request_error: {err}"));
                err
            },
        );
        client.use_response(
            |resp| Ok(resp),
            move |err| {
                s2.lock().unwrap().push(format!("response_error: {err}"));
                err
            },
        );

        let err = client.request(RequestDescriptor::get("http://stub/ok")).await.unwrap_err();
        assert!(matches!(err, TransportError::InvalidRequest(_)));
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "request_error: Invalid request: blocked",
                "response_error: Invalid request: blocked"
            ]
        );
        assert_eq!(client.interceptor_count(), (2, 1));
    }
}
