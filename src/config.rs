//! Dispatcher configuration
//!
//! Loaded once at setup from an untyped mapping (the host's configuration
//! tree) and immutable afterwards. Absent keys, explicit `null` values and a
//! missing section all fall back to defaults; wrong-typed keys are fatal to
//! startup.

use crate::context::kinds;
use crate::error::ConfigError;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;

/// Routing key used for manually dispatched events when none is configured
pub const DEFAULT_EVENT_TYPE: &str = "log_event";

/// Immutable dispatcher configuration
///
/// # Example
///
/// ```
/// use kirjuri::DispatcherConfig;
/// use serde_json::json;
///
/// let config = DispatcherConfig::from_value(json!({
///     "auto_capture": true,
///     "entrypoints_to_exclude": ["health_check"],
/// })).unwrap();
///
/// assert!(config.should_auto_dispatch("Rpc", "create_order"));
/// assert!(!config.should_auto_dispatch("Rpc", "health_check"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Emit an event automatically for every eligible entrypoint invocation
    pub auto_capture: bool,

    /// Entrypoint names never auto-captured, even when `auto_capture` is on
    pub entrypoints_to_exclude: HashSet<String>,

    /// Routing key for manually dispatched events
    pub event_type: String,

    /// Entrypoint kind tags eligible for auto-capture
    pub capture_kinds: HashSet<String>,
}

/// Raw deserialization target: every key optional, explicit `null` allowed
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    auto_capture: Option<bool>,
    #[serde(default)]
    entrypoints_to_exclude: Option<Vec<String>>,
    #[serde(default)]
    event_type: Option<String>,
    #[serde(default)]
    capture_kinds: Option<Vec<String>>,
}

impl DispatcherConfig {
    /// Load from an untyped configuration mapping
    ///
    /// `null` stands in for a missing section and yields the defaults.
    /// Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] when a key has the wrong type (e.g.
    /// `entrypoints_to_exclude` is not a list), [`ConfigError::Invalid`]
    /// when `event_type` is empty.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        if value.is_null() {
            return Ok(Self::default());
        }

        let raw: RawConfig = serde_json::from_value(value)?;
        let config = Self {
            auto_capture: raw.auto_capture.unwrap_or(false),
            entrypoints_to_exclude: raw
                .entrypoints_to_exclude
                .map(|names| names.into_iter().collect())
                .unwrap_or_default(),
            event_type: raw
                .event_type
                .unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_owned()),
            capture_kinds: raw
                .capture_kinds
                .map(|tags| tags.into_iter().collect())
                .unwrap_or_else(default_capture_kinds),
        };

        if config.event_type.is_empty() {
            return Err(ConfigError::Invalid(
                "event_type must not be empty".to_owned(),
            ));
        }

        Ok(config)
    }

    /// True iff this invocation must auto-emit an `entrypoint_fired` event
    ///
    /// Pure predicate: capture enabled, kind recognized, name not excluded.
    pub fn should_auto_dispatch(&self, entrypoint_kind: &str, entrypoint_name: &str) -> bool {
        self.auto_capture
            && self.capture_kinds.contains(entrypoint_kind)
            && !self.entrypoints_to_exclude.contains(entrypoint_name)
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            auto_capture: false,
            entrypoints_to_exclude: HashSet::new(),
            event_type: DEFAULT_EVENT_TYPE.to_owned(),
            capture_kinds: default_capture_kinds(),
        }
    }
}

fn default_capture_kinds() -> HashSet<String> {
    [kinds::RPC, kinds::HTTP_REQUEST_HANDLER]
        .iter()
        .map(|tag| (*tag).to_owned())
        .collect()
}
