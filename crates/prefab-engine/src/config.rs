//! Build configuration.
//!
//! [`BuildConfig`] can be constructed in code or loaded from JSON; every
//! field has a default, so a partial document such as
//! `{"trace_enabled": true}` is valid.

use serde::{Deserialize, Serialize};

/// Knobs controlling how fixtures are built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Whether to record a [`BuildEvent`](crate::trace::BuildEvent) trace.
    pub trace_enabled: bool,
    /// Whether releasing a session puts static fields back to the values
    /// they held before building started. Default: true.
    pub restore_statics: bool,
    /// Reject user-supplied prefab pairs whose two values are equal.
    /// When false such pairs are accepted with a warning. Default: true.
    pub strict_prefabs: bool,
    /// Build the red copy as a distinct instance by copying every field of
    /// red. When false the red copy shares red's identity. Default: true.
    pub distinct_red_copy: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            trace_enabled: false,
            restore_statics: true,
            strict_prefabs: true,
            distinct_red_copy: true,
        }
    }
}

impl BuildConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_trace(mut self) -> Self {
        self.trace_enabled = true;
        self
    }
}
