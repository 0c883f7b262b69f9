//! Transition history tracking.
//!
//! A bounded log of the applicative-state changes a machine went through,
//! kept only when the machine is configured with a non-zero capacity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Record of a single change of applicative state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    /// Name of the state being left
    pub from: String,
    /// Name of the state being entered
    pub to: String,
    /// Wall-clock time of the change
    pub timestamp: DateTime<Utc>,
    /// `true` for `transit_to` jumps, `false` for fired transitions
    pub forced: bool,
}

/// Bounded, ordered history of state changes.
///
/// Once `capacity` entries are held, recording a new one evicts the oldest.
///
/// # Example
///
/// ```rust
/// use chrono::Utc;
/// use tempo_fsm::core::{StateTransition, TransitionLog};
///
/// let mut log = TransitionLog::new(2);
/// for (from, to) in [("red", "green"), ("green", "yellow"), ("yellow", "red")] {
///     log.record(StateTransition {
///         from: from.into(),
///         to: to.into(),
///         timestamp: Utc::now(),
///         forced: false,
///     });
/// }
///
/// assert_eq!(log.len(), 2);
/// assert_eq!(log.get_path(), vec!["green", "yellow", "red"]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionLog {
    capacity: usize,
    transitions: VecDeque<StateTransition>,
}

impl TransitionLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            transitions: VecDeque::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn record(&mut self, transition: StateTransition) {
        if self.capacity == 0 {
            return;
        }
        while self.transitions.len() >= self.capacity {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    /// Names of the states traversed: the first `from`, then every `to`.
    pub fn get_path(&self) -> Vec<&str> {
        let mut path = Vec::with_capacity(self.transitions.len() + 1);
        if let Some(first) = self.transitions.front() {
            path.push(first.from.as_str());
        }
        path.extend(self.transitions.iter().map(|t| t.to.as_str()));
        path
    }

    /// Wall-clock span between the oldest and newest entries.
    pub fn duration(&self) -> Option<Duration> {
        let first = self.transitions.front()?;
        let last = self.transitions.back()?;
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StateTransition> {
        self.transitions.iter()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn clear(&mut self) {
        self.transitions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(from: &str, to: &str) -> StateTransition {
        StateTransition {
            from: from.to_string(),
            to: to.to_string(),
            timestamp: Utc::now(),
            forced: false,
        }
    }

    #[test]
    fn new_log_is_empty() {
        let log = TransitionLog::new(4);
        assert!(log.is_empty());
        assert!(log.get_path().is_empty());
        assert!(log.duration().is_none());
    }

    #[test]
    fn get_path_returns_state_sequence() {
        let mut log = TransitionLog::new(8);
        log.record(change("idle", "busy"));
        log.record(change("busy", "done"));

        assert_eq!(log.get_path(), vec!["idle", "busy", "done"]);
    }

    #[test]
    fn oldest_entries_are_evicted() {
        let mut log = TransitionLog::new(2);
        log.record(change("a", "b"));
        log.record(change("b", "c"));
        log.record(change("c", "d"));

        assert_eq!(log.len(), 2);
        assert_eq!(log.iter().next().map(|t| t.from.as_str()), Some("b"));
    }

    #[test]
    fn zero_capacity_records_nothing() {
        let mut log = TransitionLog::new(0);
        log.record(change("a", "b"));
        assert!(log.is_empty());
    }

    #[test]
    fn huge_capacity_grows_on_demand() {
        let mut log = TransitionLog::new(usize::MAX);
        log.record(change("a", "b"));
        log.record(change("b", "c"));

        assert_eq!(log.capacity(), usize::MAX);
        assert_eq!(log.get_path(), vec!["a", "b", "c"]);
    }

    #[test]
    fn single_transition_has_duration_zero() {
        let mut log = TransitionLog::new(1);
        log.record(change("a", "b"));
        assert_eq!(log.duration(), Some(Duration::ZERO));
    }

    #[test]
    fn log_serializes_correctly() {
        let mut log = TransitionLog::new(3);
        log.record(StateTransition {
            forced: true,
            ..change("off", "on")
        });

        let json = serde_json::to_string(&log).unwrap();
        let restored: TransitionLog = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.capacity(), 3);
        assert_eq!(restored.iter().collect::<Vec<_>>(), log.iter().collect::<Vec<_>>());
    }
}
