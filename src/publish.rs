//! Publisher boundary
//!
//! The [`Publisher`] trait is the transport-facing edge of the dispatcher:
//! it receives finished envelopes together with a wire-level routing key.
//! Delivery guarantees, broker topology and connection management all live
//! behind this trait, not in the dispatcher.

use crate::envelope::EventEnvelope;
use crate::error::TransportError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

/// Publisher trait - hands envelopes to the transport
///
/// # Implementation Requirements
///
/// - Publishers must be `Send + Sync`; one instance serves every in-flight
///   call in the host process
/// - `publish` must tolerate concurrent invocation, the dispatcher adds no
///   locking around it
///
/// # Routing
///
/// The routing key is the wire-level topic/label for the envelope. It is
/// distinct from the `event_type` field inside the body: auto-captured
/// events travel under `entrypoint_fired`, manual events under the single
/// configured generic key.
///
/// # Example
///
/// ```ignore
/// use kirjuri::{EventEnvelope, Publisher, TransportError};
/// use async_trait::async_trait;
///
/// struct AmqpPublisher {
///     channel: Channel,
///     exchange: String,
/// }
///
/// #[async_trait]
/// impl Publisher for AmqpPublisher {
///     fn name(&self) -> &'static str {
///         "amqp"
///     }
///
///     async fn publish(
///         &self,
///         envelope: &EventEnvelope,
///         routing_key: &str,
///     ) -> Result<(), TransportError> {
///         let body = serde_json::to_vec(envelope)
///             .map_err(|e| TransportError::Send(e.to_string()))?;
///
///         self.channel
///             .basic_publish(&self.exchange, routing_key, body)
///             .await
///             .map_err(|e| TransportError::Send(e.to_string()))
///     }
/// }
/// ```
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publisher name for identification and logging
    fn name(&self) -> &'static str;

    /// Publish one envelope under the given routing key
    ///
    /// # Errors
    ///
    /// [`TransportError`] when the envelope cannot be handed to the
    /// transport. The dispatcher decides per path whether that is fatal.
    async fn publish(
        &self,
        envelope: &EventEnvelope,
        routing_key: &str,
    ) -> Result<(), TransportError>;
}

/// Stdout publisher - prints envelopes for debugging
///
/// Writes one JSON line per envelope, tagged with the routing key.
/// Useful for development and for wiring a service up before the real
/// transport exists.
pub struct StdoutPublisher {
    /// Count of envelopes published
    published_count: AtomicU64,
}

impl StdoutPublisher {
    /// Create a new StdoutPublisher
    pub fn new() -> Self {
        Self {
            published_count: AtomicU64::new(0),
        }
    }

    /// Total envelopes published
    pub fn published_count(&self) -> u64 {
        self.published_count.load(Ordering::Relaxed)
    }
}

impl Default for StdoutPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Publisher for StdoutPublisher {
    fn name(&self) -> &'static str {
        "stdout"
    }

    async fn publish(
        &self,
        envelope: &EventEnvelope,
        routing_key: &str,
    ) -> Result<(), TransportError> {
        use std::io::Write;

        let line = serde_json::to_string(envelope)
            .map_err(|e| TransportError::Send(format!("envelope serialization failed: {}", e)))?;

        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "[{}] {}", routing_key, line)
            .map_err(|e| TransportError::Send(format!("stdout write failed: {}", e)))?;

        self.published_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
