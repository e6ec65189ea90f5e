//! Call context supplied by the host framework
//!
//! A [`CallContext`] carries the identity of one intercepted entrypoint
//! invocation. The host creates it when a call begins and it stays immutable
//! for the call's duration; the dispatcher only reads it.

use smallvec::SmallVec;

/// Type alias for the causal call chain - inline up to 4 ancestor ids
pub type CallStack = SmallVec<[String; 4]>;

/// Well-known entrypoint kind tags
///
/// Kinds are open string tags, not a closed enum: hosts with their own
/// entrypoint flavors add tags via `capture_kinds` in the configuration.
/// These two are the default auto-capture set.
pub mod kinds {
    /// Remote-procedure entrypoints
    pub const RPC: &str = "Rpc";
    /// HTTP route handlers
    pub const HTTP_REQUEST_HANDLER: &str = "HttpRequestHandler";
}

/// Identity of one intercepted entrypoint invocation
///
/// # Example
///
/// ```
/// use kirjuri::{kinds, CallContext};
///
/// let ctx = CallContext::new("orders", kinds::RPC, "create_order", "orders.create_order.9f2c")
///     .with_call_stack(["orders.create_order.9f2c"]);
/// assert_eq!(ctx.entrypoint_name, "create_order");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    /// Owning service name (e.g. "orders")
    pub service_name: String,

    /// Protocol tag of the entrypoint (e.g. "Rpc", "HttpRequestHandler")
    pub entrypoint_kind: String,

    /// Method/handler name of the entrypoint
    pub entrypoint_name: String,

    /// Unique identifier of this invocation
    pub call_id: String,

    /// Ancestor call identifiers, outermost first; empty for root calls
    pub call_stack: CallStack,
}

impl CallContext {
    /// Create a context with an empty call stack
    pub fn new(
        service_name: impl Into<String>,
        entrypoint_kind: impl Into<String>,
        entrypoint_name: impl Into<String>,
        call_id: impl Into<String>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            entrypoint_kind: entrypoint_kind.into(),
            entrypoint_name: entrypoint_name.into(),
            call_id: call_id.into(),
            call_stack: SmallVec::new(),
        }
    }

    /// Set the causal call chain, outermost first
    pub fn with_call_stack<I, S>(mut self, stack: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.call_stack = stack.into_iter().map(Into::into).collect();
        self
    }
}
