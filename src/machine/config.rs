//! Machine construction settings.

use serde::{Deserialize, Serialize};

/// Settings applied when a [`FiniteStateMachine`](super::FiniteStateMachine)
/// is created.
///
/// # Example
///
/// ```rust
/// use tempo_fsm::machine::MachineConfig;
///
/// let config: MachineConfig = serde_json::from_str(r#"{ "history_capacity": 16 }"#).unwrap();
/// assert!(config.reset_on_create);
/// assert_eq!(config.history_capacity, 16);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Reset to the initial state on creation. When `false` the machine
    /// starts `Uninitialized`.
    pub reset_on_create: bool,
    /// Number of state changes kept in the transition log; `0` disables it.
    pub history_capacity: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            reset_on_create: true,
            history_capacity: 0,
        }
    }
}

impl MachineConfig {
    pub fn with_history(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn without_reset(mut self) -> Self {
        self.reset_on_create = false;
        self
    }
}
