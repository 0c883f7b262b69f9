//! Errors raised while building and driving state machines.

use std::time::Duration;
use thiserror::Error;

use super::state::StateId;
use super::transition::TransitionId;

/// Problems found while validating a [`Layout`](crate::machine::Layout).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LayoutError {
    #[error("Initial state not specified. Call .set_initial_state(state) before building the machine")]
    MissingInitialState,

    #[error("Transition {transition} of state '{state}' has no next state")]
    MissingTarget {
        state: String,
        transition: TransitionId,
    },

    #[error("Transition {transition} targets {target}, which is not declared in this layout")]
    ForeignTarget {
        transition: TransitionId,
        target: StateId,
    },

    #[error("Transition {transition} of state '{state}' has a missing or invalid condition")]
    InvalidCondition {
        state: String,
        transition: TransitionId,
    },

    #[error("Condition of transition {transition} observes {observed}, which is not declared in this layout")]
    UnknownObservedState {
        transition: TransitionId,
        observed: StateId,
    },

    #[error("Condition of transition {transition} observes state '{state}', which is not monitored")]
    UnmonitoredObservedState {
        transition: TransitionId,
        state: String,
    },
}

/// Errors raised by the engine at setup or call time.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FsmError {
    #[error("The layout is not valid: {0}")]
    InvalidLayout(#[from] LayoutError),

    #[error("{0} is not part of this machine's layout")]
    UnknownState(StateId),

    #[error("{0} is not part of this machine's layout")]
    UnknownTransition(TransitionId),

    #[error("State '{0}' was built without action hooks")]
    HooksDisabled(String),

    #[error("Transition was built without action hooks")]
    TransitionHooksDisabled,

    #[error("State '{0}' is not monitored")]
    NotMonitored(String),

    #[error("Invalid duration {0:?}, expected a positive value")]
    NonPositiveDuration(Duration),

    #[error("Invalid time budget {0:?}, expected a positive value or none")]
    InvalidTimeBudget(Duration),
}
