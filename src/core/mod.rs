//! Core building blocks of a machine layout.
//!
//! This module contains everything a layout is made of:
//! - States and their action hooks
//! - Transitions and the conditions guarding them
//! - Monitoring data and the conditions derived from it
//! - Clocks and the transition history log

mod action;
mod clock;
mod condition;
mod error;
mod guard;
mod history;
mod monitor;
mod state;
mod transition;

pub use action::{Action, ActionList, StateHooks};
pub use clock::{Clock, ManualClock, SystemClock};
pub use condition::{
    AlwaysTrue, Condition, EvalContext, ManyConditions, Quantifier, SharedValue, TimedCondition,
    ValueCondition,
};
pub use error::{FsmError, LayoutError};
pub use guard::Guard;
pub use history::{StateTransition, TransitionLog};
pub use monitor::{
    StateEntryCountCondition, StateEntryDurationCondition, StateMonitor, StateValueCondition,
    TransitionMonitor,
};
pub use state::{State, StateId, StateParams};
pub use transition::{Transition, TransitionId};
