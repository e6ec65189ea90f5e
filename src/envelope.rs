//! Event envelope and its builder
//!
//! The envelope is the structured body handed to the publish collaborator.
//! It is a JSON object rather than a fixed struct because caller-supplied
//! metadata shares the body's top level with the fixed fields.
//!
//! # Field ordering
//!
//! ```text
//! identity fields (copied from CallContext)
//!         │
//!         ▼
//! metadata merge (may overwrite identity keys)
//!         │
//!         ▼
//! timestamp / event_type / data (always written last)
//! ```
//!
//! Metadata is merged before the final three fields are set, so a caller can
//! relabel the call identity but can never clobber `timestamp`, `event_type`
//! or `data`.

use crate::clock::{Clock, SystemClock};
use crate::context::CallContext;
use crate::envelope_keys;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Structured event body produced per dispatch
///
/// Built fresh on every dispatch (auto or manual) and handed off to the
/// publisher immediately; the dispatcher holds no envelope state afterwards.
///
/// Serializes transparently as its body object:
///
/// ```
/// use kirjuri::{CallContext, EnvelopeBuilder, kinds};
///
/// let ctx = CallContext::new("orders", kinds::RPC, "create_order", "orders.create_order.1");
/// let envelope = EnvelopeBuilder::new().build(&ctx, "order_created", None, None);
///
/// assert_eq!(envelope.service_name(), Some("orders"));
/// assert_eq!(envelope.event_type(), Some("order_created"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EventEnvelope {
    body: Map<String, Value>,
}

impl EventEnvelope {
    fn str_field(&self, key: &str) -> Option<&str> {
        self.body.get(key).and_then(Value::as_str)
    }

    /// Owning service name, if still a string after metadata merge
    pub fn service_name(&self) -> Option<&str> {
        self.str_field(envelope_keys::SERVICE_NAME)
    }

    /// Entrypoint protocol tag
    pub fn entrypoint_protocol(&self) -> Option<&str> {
        self.str_field(envelope_keys::ENTRYPOINT_PROTOCOL)
    }

    /// Entrypoint method/handler name
    pub fn entrypoint_name(&self) -> Option<&str> {
        self.str_field(envelope_keys::ENTRYPOINT_NAME)
    }

    /// Unique invocation id
    pub fn call_id(&self) -> Option<&str> {
        self.str_field(envelope_keys::CALL_ID)
    }

    /// Ancestor call ids as stored in the body
    pub fn call_stack(&self) -> Option<&Vec<Value>> {
        self.body.get(envelope_keys::CALL_STACK).and_then(Value::as_array)
    }

    /// Event creation time, RFC 3339 with `+00:00` offset
    pub fn timestamp(&self) -> Option<&str> {
        self.str_field(envelope_keys::TIMESTAMP)
    }

    /// Logical event name
    pub fn event_type(&self) -> Option<&str> {
        self.str_field(envelope_keys::EVENT_TYPE)
    }

    /// Caller-supplied event payload
    pub fn data(&self) -> Option<&Value> {
        self.body.get(envelope_keys::DATA)
    }

    /// Look up any top-level key, fixed field or merged metadata
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    /// The full body object
    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    /// Consume the envelope into its body object
    pub fn into_body(self) -> Map<String, Value> {
        self.body
    }
}

/// Builds [`EventEnvelope`]s from call context
///
/// Pure data transformation aside from reading the injected [`Clock`]:
/// no I/O, no error paths. One builder serves any number of concurrent
/// calls.
#[derive(Clone)]
pub struct EnvelopeBuilder {
    clock: Arc<dyn Clock>,
}

impl EnvelopeBuilder {
    /// Create a builder using the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a builder with an injected clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Build the body for one dispatch
    ///
    /// `event_type` is trusted to be non-empty. `data` defaults to an empty
    /// object. `metadata` pairs are merged into the body's top level and may
    /// overwrite the identity fields, never the three fields written last.
    ///
    /// The call stack is copied into a fresh array: mutating the context's
    /// stack after construction does not reach the envelope.
    pub fn build(
        &self,
        context: &CallContext,
        event_type: &str,
        data: Option<Value>,
        metadata: Option<Map<String, Value>>,
    ) -> EventEnvelope {
        debug_assert!(!event_type.is_empty(), "event_type must be non-empty");

        let mut body = Map::new();
        body.insert(
            envelope_keys::SERVICE_NAME.to_owned(),
            Value::String(context.service_name.clone()),
        );
        body.insert(
            envelope_keys::ENTRYPOINT_PROTOCOL.to_owned(),
            Value::String(context.entrypoint_kind.clone()),
        );
        body.insert(
            envelope_keys::ENTRYPOINT_NAME.to_owned(),
            Value::String(context.entrypoint_name.clone()),
        );
        body.insert(
            envelope_keys::CALL_ID.to_owned(),
            Value::String(context.call_id.clone()),
        );
        body.insert(
            envelope_keys::CALL_STACK.to_owned(),
            Value::Array(
                context
                    .call_stack
                    .iter()
                    .map(|id| Value::String(id.clone()))
                    .collect(),
            ),
        );

        if let Some(metadata) = metadata {
            for (key, value) in metadata {
                body.insert(key, value);
            }
        }

        body.insert(
            envelope_keys::TIMESTAMP.to_owned(),
            Value::String(format_timestamp(self.clock.now_utc())),
        );
        body.insert(
            envelope_keys::EVENT_TYPE.to_owned(),
            Value::String(event_type.to_owned()),
        );
        body.insert(
            envelope_keys::DATA.to_owned(),
            data.unwrap_or_else(|| Value::Object(Map::new())),
        );

        EventEnvelope { body }
    }
}

impl Default for EnvelopeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// RFC 3339 with `+00:00` offset, sub-second precision discarded
fn format_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Secs, false)
}
