//! Error types for kirjuri

use thiserror::Error;

/// Error raised when dispatcher configuration cannot be loaded
///
/// Surfaced once at setup time and fatal to startup: a service with a
/// malformed event-log section should not come up half-configured.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configuration key has the wrong type
    ///
    /// Examples: `entrypoints_to_exclude` is not a list, `auto_capture`
    /// is a string.
    #[error("invalid dispatcher configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration deserialized but carries an unusable value
    ///
    /// Example: `event_type` is an empty string (it is used as the wire
    /// routing key for manual events).
    #[error("invalid dispatcher configuration: {0}")]
    Invalid(String),
}

/// Error type for publish operations
///
/// Returned by [`Publisher`](crate::Publisher) implementations when an
/// envelope cannot be handed to the transport. During auto-capture the
/// dispatcher logs and swallows it; during manual dispatch it propagates
/// unchanged to the calling handler.
///
/// # Example
///
/// ```
/// use kirjuri::TransportError;
///
/// fn hand_off() -> Result<(), TransportError> {
///     Err(TransportError::Connection("refused".to_string()))
/// }
///
/// match hand_off() {
///     Ok(_) => println!("published"),
///     Err(TransportError::Connection(msg)) => println!("connection failed: {}", msg),
///     Err(e) => println!("other error: {}", e),
/// }
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Send failed
    ///
    /// Examples: network timeout, broker rejected the publish, payload
    /// serialization failed.
    #[error("send failed: {0}")]
    Send(String),

    /// Connection error
    ///
    /// Examples: DNS lookup failed, connection refused, TLS handshake error.
    #[error("connection error: {0}")]
    Connection(String),

    /// Transport not ready
    ///
    /// Transient state while the underlying channel is (re)connecting.
    #[error("transport not ready")]
    NotReady,
}
