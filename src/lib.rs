//! Tempo: a polled hierarchical state machine engine
//!
//! Tempo drives control logic from a single polling loop. Every "wait" is a
//! condition checked against a monotonic clock on each step, never a
//! suspend point, so machines compose by calling each other's `track()`.
//!
//! # Core Concepts
//!
//! - **Layout**: an arena of states and guarded transitions plus an initial state
//! - **Conditions**: invertible predicates, composable with all/any/none
//! - **Monitoring**: entry times, entry counts and custom values feeding
//!   duration, count and value conditions
//! - **Machine**: validates a layout once, then steps or runs it
//! - **Blinkers**: a ready-made machine offering five blink policies
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use tempo_fsm::core::{ManualClock, State, StateEntryDurationCondition, Transition};
//! use tempo_fsm::machine::{FiniteStateMachine, Layout};
//!
//! let mut layout: Layout = Layout::new();
//! let red = layout.add_state(State::monitored("red"));
//! let green = layout.add_state(State::monitored("green"));
//!
//! let red_for = StateEntryDurationCondition::new(Duration::from_secs(3), red);
//! let green_for = StateEntryDurationCondition::new(Duration::from_secs(2), green);
//! layout.add_transition(red, Transition::new(red_for).to(green)).unwrap();
//! layout.add_transition(green, Transition::new(green_for).to(red)).unwrap();
//! layout.set_initial_state(red).unwrap();
//!
//! let clock = ManualClock::new();
//! let mut lights = FiniteStateMachine::with_clock(layout, clock.clone()).unwrap();
//!
//! clock.advance(Duration::from_secs(3));
//! lights.track();
//! assert_eq!(lights.current_applicative_state(), green);
//! ```
//!
//! # Runnable programs
//!
//! Full programs live under `demos/` and are registered as cargo examples:
//!
//! ```text
//! cargo run --example traffic_light
//! RUST_LOG=tempo_fsm=debug cargo run --example side_blinkers
//! ```

pub mod blink;
pub mod core;
pub mod machine;

// Re-export commonly used types
pub use crate::blink::{BlinkError, BlinkRequest, Blinkers, Side, SideBlinkers};
pub use crate::core::{Condition, FsmError, LayoutError, State, StateId, Transition, TransitionId};
pub use crate::machine::{FiniteStateMachine, Layout, MachineConfig, OperationalState};
