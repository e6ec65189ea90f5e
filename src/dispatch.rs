//! Dispatch policy and per-call dispatch handles
//!
//! [`EventLogDispatcher`] decides whether an intercepted call auto-emits an
//! `entrypoint_fired` event and hands out [`BoundDispatcher`]s for manual
//! event emission.
//!
//! ```text
//! on_call_start ──► should_auto_dispatch ──► EnvelopeBuilder ──► Publisher
//!                                                  ▲
//! BoundDispatcher::dispatch ───────────────────────┘
//! ```
//!
//! The dispatcher is stateless after construction: every dispatch only reads
//! the shared immutable configuration and builds a fresh envelope, so one
//! instance serves any number of concurrent in-flight calls without locking.

use crate::clock::{Clock, SystemClock};
use crate::config::DispatcherConfig;
use crate::context::CallContext;
use crate::envelope::EnvelopeBuilder;
use crate::error::TransportError;
use crate::publish::Publisher;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::error;

/// Event type of automatically captured entrypoint invocations
pub const ENTRYPOINT_FIRED: &str = "entrypoint_fired";

/// Lifecycle hook the host invokes around its request-handling path
///
/// Explicit replacement for framework-managed worker hooks: the host calls
/// [`on_call_start`](CallInterceptor::on_call_start) once per intercepted
/// call before running the handler and
/// [`on_call_end`](CallInterceptor::on_call_end) after it returns. No
/// registration magic; the host owns the wiring.
#[async_trait]
pub trait CallInterceptor: Send + Sync {
    /// Invoked once when an intercepted call begins
    async fn on_call_start(&self, context: &CallContext);

    /// Invoked once when an intercepted call ends
    ///
    /// Default is a no-op; the event-log dispatcher only observes call
    /// starts.
    async fn on_call_end(&self, _context: &CallContext) {}
}

/// Shared innards: immutable after construction
struct Inner {
    config: DispatcherConfig,
    publisher: Arc<dyn Publisher>,
    builder: EnvelopeBuilder,
}

/// Dispatcher of event logs
///
/// When the auto capture feature is enabled, it dispatches an event each
/// time an eligible entrypoint is fired. Also hands out per-call
/// [`BoundDispatcher`]s so handler code can dispatch event logs manually,
/// optionally providing related event data. In both cases the call's
/// context is added to the event body.
///
/// # Example
///
/// ```
/// use kirjuri::{kinds, CallContext, CallInterceptor, DispatcherConfig, EventLogDispatcher, StdoutPublisher};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let config = DispatcherConfig::from_value(serde_json::json!({
///     "auto_capture": true,
/// })).unwrap();
/// let dispatcher = EventLogDispatcher::new(config, Arc::new(StdoutPublisher::new()));
///
/// let ctx = CallContext::new("orders", kinds::RPC, "create_order", "orders.create_order.1");
/// dispatcher.on_call_start(&ctx).await;
///
/// let handle = dispatcher.bind(ctx);
/// handle.dispatch("order_created", Some(serde_json::json!({"id": 1})), None)
///     .await
///     .unwrap();
/// # }
/// ```
#[derive(Clone)]
pub struct EventLogDispatcher {
    inner: Arc<Inner>,
}

impl EventLogDispatcher {
    /// Create a dispatcher using the system clock
    pub fn new(config: DispatcherConfig, publisher: Arc<dyn Publisher>) -> Self {
        Self::with_clock(config, publisher, Arc::new(SystemClock))
    }

    /// Create a dispatcher with an injected clock, for deterministic tests
    pub fn with_clock(
        config: DispatcherConfig,
        publisher: Arc<dyn Publisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                publisher,
                builder: EnvelopeBuilder::with_clock(clock),
            }),
        }
    }

    /// The immutable configuration this dispatcher was built with
    pub fn config(&self) -> &DispatcherConfig {
        &self.inner.config
    }

    /// Bind a manual dispatch handle to one call
    ///
    /// Called once per intercepted call, after the host has assembled the
    /// call's context. The handle shares the dispatcher's innards; binding
    /// is an `Arc` clone plus the context.
    pub fn bind(&self, context: CallContext) -> BoundDispatcher {
        BoundDispatcher {
            inner: Arc::clone(&self.inner),
            context,
        }
    }
}

#[async_trait]
impl CallInterceptor for EventLogDispatcher {
    async fn on_call_start(&self, context: &CallContext) {
        let inner = &self.inner;
        if !inner
            .config
            .should_auto_dispatch(&context.entrypoint_kind, &context.entrypoint_name)
        {
            return;
        }

        let envelope = inner.builder.build(context, ENTRYPOINT_FIRED, None, None);

        // Best-effort: a failed event log must never fail the intercepted call
        if let Err(e) = inner.publisher.publish(&envelope, ENTRYPOINT_FIRED).await {
            error!(
                publisher = inner.publisher.name(),
                call_id = %context.call_id,
                error = %e,
                "Auto-capture publish failed"
            );
        }
    }
}

/// Manual dispatch handle bound to one call
///
/// Holds the call's context plus the dispatcher's shared innards; cheap to
/// clone into spawned tasks that outlive the handler body.
#[derive(Clone)]
pub struct BoundDispatcher {
    inner: Arc<Inner>,
    context: CallContext,
}

impl BoundDispatcher {
    /// The context this handle is bound to
    pub fn context(&self) -> &CallContext {
        &self.context
    }

    /// Dispatch a named event enriched with this call's context
    ///
    /// The envelope travels under the configured generic routing key; the
    /// semantic event name only appears inside the body. `data` defaults to
    /// an empty object, `metadata` pairs are merged into the body's top
    /// level.
    ///
    /// # Errors
    ///
    /// Publisher failures propagate unchanged; recovery is the calling
    /// handler's responsibility.
    pub async fn dispatch(
        &self,
        event_type: &str,
        data: Option<Value>,
        metadata: Option<Map<String, Value>>,
    ) -> Result<(), TransportError> {
        let envelope = self
            .inner
            .builder
            .build(&self.context, event_type, data, metadata);
        self.inner
            .publisher
            .publish(&envelope, &self.inner.config.event_type)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::context::kinds;
    use crate::envelope::EventEnvelope;
    use std::sync::Mutex;

    struct CountingPublisher {
        published: Mutex<Vec<(EventEnvelope, String)>>,
    }

    impl CountingPublisher {
        fn new() -> Self {
            Self {
                published: Mutex::new(Vec::new()),
            }
        }

        fn count(&self) -> usize {
            self.published.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Publisher for CountingPublisher {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn publish(
            &self,
            envelope: &EventEnvelope,
            routing_key: &str,
        ) -> Result<(), TransportError> {
            self.published
                .lock()
                .unwrap()
                .push((envelope.clone(), routing_key.to_owned()));
            Ok(())
        }
    }

    fn rpc_context() -> CallContext {
        CallContext::new("svc", kinds::RPC, "rpc_entrypoint", "svc.rpc_entrypoint.1")
    }

    #[tokio::test]
    async fn test_on_call_start_noop_when_auto_capture_off() {
        let publisher = Arc::new(CountingPublisher::new());
        let dispatcher =
            EventLogDispatcher::new(DispatcherConfig::default(), publisher.clone());

        dispatcher.on_call_start(&rpc_context()).await;

        assert_eq!(publisher.count(), 0);
    }

    #[tokio::test]
    async fn test_on_call_start_publishes_when_eligible() {
        let publisher = Arc::new(CountingPublisher::new());
        let config = DispatcherConfig {
            auto_capture: true,
            ..DispatcherConfig::default()
        };
        let dispatcher = EventLogDispatcher::new(config, publisher.clone());

        dispatcher.on_call_start(&rpc_context()).await;

        let published = publisher.published.lock().unwrap();
        let (envelope, routing_key) = &published[0];
        assert_eq!(routing_key, ENTRYPOINT_FIRED);
        assert_eq!(envelope.event_type(), Some(ENTRYPOINT_FIRED));
    }

    #[tokio::test]
    async fn test_on_call_end_is_noop() {
        let publisher = Arc::new(CountingPublisher::new());
        let config = DispatcherConfig {
            auto_capture: true,
            ..DispatcherConfig::default()
        };
        let dispatcher = EventLogDispatcher::new(config, publisher.clone());

        dispatcher.on_call_end(&rpc_context()).await;

        assert_eq!(publisher.count(), 0);
    }

    #[tokio::test]
    async fn test_bound_dispatcher_keeps_context() {
        let publisher = Arc::new(CountingPublisher::new());
        let dispatcher =
            EventLogDispatcher::new(DispatcherConfig::default(), publisher.clone());

        let handle = dispatcher.bind(rpc_context());

        assert_eq!(handle.context().call_id, "svc.rpc_entrypoint.1");
    }

    #[tokio::test]
    async fn test_dispatcher_clones_share_innards() {
        let publisher = Arc::new(CountingPublisher::new());
        let dispatcher =
            EventLogDispatcher::new(DispatcherConfig::default(), publisher.clone());
        let clone = dispatcher.clone();

        let handle = clone.bind(rpc_context());
        handle.dispatch("my_event", None, None).await.unwrap();

        assert_eq!(publisher.count(), 1);
    }
}
