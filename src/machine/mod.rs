//! Layouts and the machine that drives them.
//!
//! A [`Layout`] is the static graph; a [`FiniteStateMachine`] validates it
//! once, then steps through it with [`track`](FiniteStateMachine::track)
//! or runs it with [`start`](FiniteStateMachine::start).

mod config;
mod fsm;
mod layout;

pub use config::MachineConfig;
pub use fsm::{FiniteStateMachine, OperationalState, RunOutcome, StopHandle};
pub use layout::Layout;
