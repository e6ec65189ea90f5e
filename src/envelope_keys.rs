//! Reserved envelope body keys
//!
//! Fixed field names of the event body. Caller-supplied metadata shares the
//! body's top level with these, so the constants document which keys the
//! dispatcher itself writes.

/// Owning service name
pub const SERVICE_NAME: &str = "service_name";

/// Entrypoint protocol tag (e.g. "Rpc", "HttpRequestHandler")
pub const ENTRYPOINT_PROTOCOL: &str = "entrypoint_protocol";

/// Entrypoint method/handler name
pub const ENTRYPOINT_NAME: &str = "entrypoint_name";

/// Unique invocation id
pub const CALL_ID: &str = "call_id";

/// Ancestor call ids, outermost first
pub const CALL_STACK: &str = "call_stack";

/// Event creation time, RFC 3339 UTC, whole seconds
pub const TIMESTAMP: &str = "timestamp";

/// Logical event name carried inside the body
pub const EVENT_TYPE: &str = "event_type";

/// Caller-supplied event payload
pub const DATA: &str = "data";
