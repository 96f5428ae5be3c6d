//! Runner configuration.

use serde::{Deserialize, Serialize};

/// Tunables for a [`Runner`](crate::runner::Runner).
///
/// Deserializes from partial documents; missing fields take their defaults.
///
/// ```rust
/// use gameflow::builder::RunnerConfig;
///
/// let config: RunnerConfig = serde_json::from_str(r#"{ "history_limit": 16 }"#).unwrap();
/// assert_eq!(config.history_limit, Some(16));
/// assert!(config.record_history);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Record transitions in the runner's history.
    pub record_history: bool,
    /// Keep at most this many transitions; `None` keeps all of them.
    pub history_limit: Option<usize>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            record_history: true,
            history_limit: Some(256),
        }
    }
}
