//! Request tracker driver.
//!
//! # Responsibilities
//! - Feed hook invocations into `TrackerState`
//! - Publish the resulting events and apply countdown/drain effects
//! - Attach its hooks to intercepting clients
//! - Issue and replay requests through a transport

use std::future::Future;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::{TrackerConfig, TrackerSettings, TransportConfig};
use crate::observability::metrics;
use crate::tracker::classify::{classify, FailureClass};
use crate::tracker::countdown::Countdown;
use crate::tracker::events::{EventBus, TrackerEvent};
use crate::tracker::state::{Effect, TrackerState, Transition};
use crate::transport::{
    InterceptingClient, ReqwestTransport, RequestDescriptor, Response, Transport, TransportError,
    TransportResult,
};

const TICK_PERIOD: Duration = Duration::from_secs(1);

struct Inner {
    state: TrackerState,
    countdown: Option<Countdown>,
}

struct Shared {
    config: TrackerConfig,
    inner: Mutex<Inner>,
    events: EventBus,
    transport: Arc<dyn Transport>,
    registered: Mutex<Vec<InterceptingClient>>,
    record_metrics: bool,
}

/// Counts in-flight requests, tracks connectivity and replays requests that
/// failed while offline.
///
/// Cloning is cheap; clones share the same state.
#[derive(Clone)]
pub struct RequestTracker {
    shared: Arc<Shared>,
}

impl RequestTracker {
    /// Create a tracker that replays through a reqwest transport with the
    /// default request and connect timeouts.
    pub fn new(config: TrackerConfig) -> TransportResult<Self> {
        let transport = ReqwestTransport::new(&TransportConfig::default())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a tracker that issues and replays requests through `transport`.
    pub fn with_transport(config: TrackerConfig, transport: Arc<dyn Transport>) -> Self {
        Self::build(config, transport, true)
    }

    /// Create a tracker from a full settings tree.
    pub fn from_settings(settings: &TrackerSettings) -> TransportResult<Self> {
        let transport = ReqwestTransport::new(&settings.transport)?;
        if settings.observability.metrics_enabled {
            metrics::describe_metrics();
        }
        Ok(Self::build(
            settings.tracker.clone(),
            Arc::new(transport),
            settings.observability.metrics_enabled,
        ))
    }

    fn build(config: TrackerConfig, transport: Arc<dyn Transport>, record_metrics: bool) -> Self {
        tracing::debug!(
            timeout_secs = config.timeout_secs,
            auto_retry = config.auto_retry,
            "Request tracker created"
        );
        let events = EventBus::new(config.event_capacity);
        Self {
            shared: Arc::new(Shared {
                config,
                inner: Mutex::new(Inner {
                    state: TrackerState::new(),
                    countdown: None,
                }),
                events,
                transport,
                registered: Mutex::new(Vec::new()),
                record_metrics,
            }),
        }
    }

    // --- Hooks ---

    /// A request is about to be dispatched. Returns it unchanged.
    pub fn on_request_start(&self, request: RequestDescriptor) -> RequestDescriptor {
        self.apply(|state, _| state.request_started());
        request
    }

    /// A response arrived. Returns it unchanged.
    pub fn on_response_success(&self, response: Response) -> Response {
        self.apply(|state, _| state.response_succeeded());
        response
    }

    /// A request was rejected by an earlier request hook, so this tracker's
    /// start hook never saw it. The response error chain still settles it,
    /// so it is counted here to keep starts and completions paired. Returns
    /// the error unchanged.
    pub fn on_request_error(&self, error: TransportError) -> TransportError {
        tracing::debug!(error = %error, "Request rejected before reaching the tracker");
        self.apply(|state, _| state.request_started());
        error
    }

    /// A request failed. Records the failure and hands back the same error
    /// for the caller to propagate.
    pub fn on_response_error(&self, error: TransportError) -> TransportError {
        let class = classify(&error);
        let deferred = match class {
            FailureClass::Connectivity => error.request().cloned(),
            FailureClass::Response => None,
        };

        match class {
            FailureClass::Connectivity => tracing::debug!(error = %error, "Connectivity failure, request deferred"),
            FailureClass::Response => tracing::debug!(error = %error, "Request failed with a response"),
        }
        if self.shared.record_metrics {
            metrics::record_failure(class.as_str());
        }

        self.apply(|state, config| state.request_failed(class, deferred, config));
        error
    }

    /// Attach this tracker's hooks to `client` and remember it.
    ///
    /// Registering the same client twice attaches the hooks twice.
    pub fn register(&self, client: &InterceptingClient) {
        let weak = Arc::downgrade(&self.shared);

        let (start, request_error) = (weak.clone(), weak.clone());
        client.use_request(
            move |req| {
                Ok(match upgrade(&start) {
                    Some(tracker) => tracker.on_request_start(req),
                    None => req,
                })
            },
            move |err| match upgrade(&request_error) {
                Some(tracker) => tracker.on_request_error(err),
                None => err,
            },
        );

        let (success, response_error) = (weak.clone(), weak);
        client.use_response(
            move |resp| {
                Ok(match upgrade(&success) {
                    Some(tracker) => tracker.on_response_success(resp),
                    None => resp,
                })
            },
            move |err| match upgrade(&response_error) {
                Some(tracker) => tracker.on_response_error(err),
                None => err,
            },
        );

        let mut registered = self.shared.registered.lock().unwrap_or_else(PoisonError::into_inner);
        registered.push(client.clone());
        tracing::debug!(registered = registered.len(), "Client registered");
    }

    // --- Requests ---

    /// Send `request` through the tracker's transport, invoking its
    /// callbacks with the outcome.
    pub async fn execute_request(&self, request: RequestDescriptor) -> TransportResult<Response> {
        self.dispatch(self.shared.transport.as_ref(), request).await.0
    }

    /// Like `execute_request`, through an explicitly given transport.
    pub async fn execute_request_with(
        &self,
        transport: &dyn Transport,
        request: RequestDescriptor,
    ) -> TransportResult<Response> {
        self.dispatch(transport, request).await.0
    }

    /// Re-submit every deferred request, oldest first.
    ///
    /// Dispatch happens in queue order before this returns; the replays then
    /// complete concurrently on spawned tasks. Requests deferred while the
    /// drain runs wait for the next one. Must be called inside a Tokio
    /// runtime; outside one nothing is dequeued.
    pub fn retry_drain(&self) -> Vec<JoinHandle<TransportResult<Response>>> {
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!(deferred = self.deferred_len(), "Retry drain needs a Tokio runtime, queue kept");
            return Vec::new();
        };

        let pending = self.lock().state.deferred_len();
        let mut replays = Vec::with_capacity(pending);
        for _ in 0..pending {
            let next = self.lock().state.next_deferred();
            let Some(request) = next else { break };

            let url = request.url.clone();
            let replay = self.dispatch(self.shared.transport.as_ref(), request);
            replays.push(runtime.spawn(async move {
                let (result, handled) = replay.await;
                if let (Err(error), false) = (&result, handled) {
                    tracing::warn!(url = %url, error = %error, "Replayed request failed with no error callback");
                }
                result
            }));
        }

        if !replays.is_empty() {
            tracing::info!(count = replays.len(), "Replaying deferred requests");
            if self.shared.record_metrics {
                metrics::record_replays(replays.len());
            }
        }
        replays
    }

    fn dispatch(
        &self,
        transport: &dyn Transport,
        request: RequestDescriptor,
    ) -> impl Future<Output = (TransportResult<Response>, bool)> + Send + 'static {
        let callbacks = request.callbacks.clone();
        let pending = transport.request(request);
        async move {
            let result = pending.await;
            let handled = callbacks.dispatch(&result);
            (result, handled)
        }
    }

    // --- Observers ---

    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.shared.events.subscribe()
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.shared.config
    }

    pub fn in_flight(&self) -> usize {
        self.lock().state.in_flight()
    }

    pub fn is_offline(&self) -> bool {
        self.lock().state.is_offline()
    }

    pub fn seconds_to_reconnect(&self) -> u64 {
        self.lock().state.seconds_to_reconnect()
    }

    pub fn countdown_active(&self) -> bool {
        self.lock().state.countdown_active()
    }

    pub fn deferred_len(&self) -> usize {
        self.lock().state.deferred_len()
    }

    pub fn registered_clients(&self) -> usize {
        self.shared.registered.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    // --- Driver internals ---

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply<F>(&self, f: F)
    where
        F: FnOnce(&mut TrackerState, &TrackerConfig) -> Transition,
    {
        let mut inner = self.lock();
        let transition = f(&mut inner.state, &self.shared.config);
        self.commit(inner, transition);
    }

    fn countdown_tick(&self, epoch: u64) -> ControlFlow<()> {
        let mut inner = self.lock();
        let Some(transition) = inner.state.countdown_tick(epoch) else {
            return ControlFlow::Break(());
        };
        let expired = transition.effect == Some(Effect::Drain);
        self.commit(inner, transition);

        if expired {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }

    /// Publish `transition` and perform its effect. Events go out under the
    /// lock so subscribers see them in transition order.
    fn commit(&self, mut inner: MutexGuard<'_, Inner>, transition: Transition) {
        for event in &transition.events {
            match event {
                TrackerEvent::Offline(true) => tracing::info!("Connectivity lost"),
                TrackerEvent::Offline(false) => tracing::info!("Connectivity restored"),
                _ => {}
            }
            self.shared.events.emit(*event);
        }

        if self.shared.record_metrics {
            metrics::record_state(
                inner.state.in_flight(),
                inner.state.deferred_len(),
                inner.state.is_offline(),
            );
        }

        match transition.effect {
            Some(Effect::RestartCountdown { epoch }) => {
                if let Some(previous) = inner.countdown.take() {
                    previous.cancel();
                }
                let weak = Arc::downgrade(&self.shared);
                let started = Countdown::start(TICK_PERIOD, move || match upgrade(&weak) {
                    Some(tracker) => tracker.countdown_tick(epoch),
                    None => ControlFlow::Break(()),
                });
                match started {
                    Ok(countdown) => inner.countdown = Some(countdown),
                    Err(e) => {
                        tracing::warn!(error = %e, "Cannot start reconnect countdown outside a Tokio runtime");
                        inner.state.abandon_countdown();
                    }
                }
            }
            Some(Effect::Drain) => {
                // Expired naturally; the task ends once this tick returns.
                inner.countdown = None;
                drop(inner);
                self.retry_drain();
            }
            None => {}
        }
    }
}

fn upgrade(weak: &Weak<Shared>) -> Option<RequestTracker> {
    weak.upgrade().map(|shared| RequestTracker { shared })
}

impl std::fmt::Debug for RequestTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("RequestTracker")
            .field("config", &self.shared.config)
            .field("in_flight", &inner.state.in_flight())
            .field("offline", &inner.state.is_offline())
            .field("deferred", &inner.state.deferred_len())
            .finish()
    }
}
