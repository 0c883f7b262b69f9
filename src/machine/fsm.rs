//! The machine driver: operational lifecycle, stepping and the run loop.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use super::config::MachineConfig;
use super::layout::Layout;
use crate::core::{
    Clock, FsmError, LayoutError, State, StateId, StateTransition, SystemClock, Transition,
    TransitionId, TransitionLog,
};

/// Lifecycle of a machine, independent of its position in the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationalState {
    Uninitialized,
    Idle,
    Running,
    TerminalReached,
}

/// Why a call to [`FiniteStateMachine::start`] returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// A step landed on a terminal state.
    TerminalReached,
    /// `stop()` was requested.
    Stopped,
    /// The time budget ran out.
    BudgetExhausted,
}

/// Cloneable handle requesting a running machine to stop.
///
/// Hooks cannot borrow the machine that runs them; they capture a stop
/// handle instead. The request is honoured at the top of the next loop
/// iteration.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Rc<Cell<bool>>);

impl StopHandle {
    /// Ask the run loop to stop.
    ///
    /// A request made while no loop runs, e.g. from a hook during a manual
    /// `track()`, stays pending and ends the next `start` before its first
    /// step. Pending requests are discarded whenever a run ends.
    pub fn request_stop(&self) {
        self.0.set(true);
    }

    pub fn is_requested(&self) -> bool {
        self.0.get()
    }

    pub(crate) fn take(&self) -> bool {
        self.0.replace(false)
    }

    pub(crate) fn clear(&self) {
        self.0.set(false);
    }
}

/// A validated layout plus the current position and lifecycle state.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use tempo_fsm::core::{ManualClock, State, StateEntryDurationCondition, Transition};
/// use tempo_fsm::machine::{FiniteStateMachine, Layout, OperationalState};
///
/// let mut layout: Layout = Layout::new();
/// let warmup = layout.add_state(State::monitored("warmup"));
/// let ready = layout.add_state(State::new("ready").terminal());
/// let after = StateEntryDurationCondition::new(Duration::from_secs(2), warmup);
/// layout.add_transition(warmup, Transition::new(after).to(ready)).unwrap();
/// layout.set_initial_state(warmup).unwrap();
///
/// let clock = ManualClock::new();
/// let mut fsm = FiniteStateMachine::with_clock(layout, clock.clone()).unwrap();
/// fsm.transit_to(warmup).unwrap();
///
/// assert!(fsm.track());
/// clock.advance(Duration::from_secs(2));
/// assert!(!fsm.track());
/// assert_eq!(fsm.current_applicative_state(), ready);
/// assert_eq!(fsm.current_operational_state(), OperationalState::TerminalReached);
/// ```
pub struct FiniteStateMachine<V = ()> {
    layout: Layout<V>,
    initial: StateId,
    current: StateId,
    operational: OperationalState,
    clock: Box<dyn Clock>,
    stop: StopHandle,
    history: Option<TransitionLog>,
}

impl<V> FiniteStateMachine<V> {
    /// Build a machine on the system clock with the default configuration.
    pub fn new(layout: Layout<V>) -> Result<Self, FsmError> {
        Self::with_config(layout, MachineConfig::default(), SystemClock)
    }

    pub fn with_clock<C>(layout: Layout<V>, clock: C) -> Result<Self, FsmError>
    where
        C: Clock + 'static,
    {
        Self::with_config(layout, MachineConfig::default(), clock)
    }

    /// Validate `layout` and build a machine over it.
    ///
    /// Monitored states get their timestamps aligned with `clock`.
    pub fn with_config<C>(
        mut layout: Layout<V>,
        config: MachineConfig,
        clock: C,
    ) -> Result<Self, FsmError>
    where
        C: Clock + 'static,
    {
        if let Err(error) = layout.validate() {
            warn!(%error, "rejecting invalid layout");
            return Err(error.into());
        }
        let initial = layout
            .initial_state()
            .ok_or(LayoutError::MissingInitialState)?;

        layout.rebase_monitors(clock.now());

        let history = (config.history_capacity > 0)
            .then(|| TransitionLog::new(config.history_capacity));

        let mut machine = Self {
            layout,
            initial,
            current: initial,
            operational: OperationalState::Uninitialized,
            clock: Box::new(clock),
            stop: StopHandle::default(),
            history,
        };
        if config.reset_on_create {
            machine.reset();
        }
        Ok(machine)
    }

    pub fn current_operational_state(&self) -> OperationalState {
        self.operational
    }

    pub fn current_applicative_state(&self) -> StateId {
        self.current
    }

    /// The state the machine is positioned on.
    pub fn current_state(&self) -> Option<&State<V>> {
        self.layout.state(self.current)
    }

    pub fn initial_state(&self) -> StateId {
        self.initial
    }

    pub fn layout(&self) -> &Layout<V> {
        &self.layout
    }

    pub fn state(&self, id: StateId) -> Option<&State<V>> {
        self.layout.state(id)
    }

    pub fn transition(&self, id: TransitionId) -> Option<&Transition<V>> {
        self.layout.transition(id)
    }

    /// Mutable access for reconfiguring a state between steps.
    pub fn state_mut(&mut self, id: StateId) -> Result<&mut State<V>, FsmError> {
        self.layout.state_mut(id).ok_or(FsmError::UnknownState(id))
    }

    /// Mutable access for reconfiguring a transition between steps, e.g.
    /// swapping its condition before jumping to its source state.
    pub fn transition_mut(&mut self, id: TransitionId) -> Result<&mut Transition<V>, FsmError> {
        self.layout
            .transition_mut(id)
            .ok_or(FsmError::UnknownTransition(id))
    }

    pub fn history(&self) -> Option<&TransitionLog> {
        self.history.as_ref()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Rebase the condition of `id` on the machine clock, e.g. restart a
    /// timer before jumping to the transition's source state.
    pub fn rebase_condition(&mut self, id: TransitionId) -> Result<(), FsmError> {
        let now = self.clock.now();
        self.transition_mut(id)?.rebase_condition(now);
        Ok(())
    }

    /// Current instant of the machine clock.
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    pub fn is_terminal(&self) -> bool {
        self.current_state().is_some_and(|s| s.is_terminal())
    }

    /// Move back to the initial state and become `Idle`.
    ///
    /// A running machine runs the exiting hook of the state it abandons.
    /// The initial state's entering hook is not run.
    pub fn reset(&mut self) {
        if self.operational == OperationalState::Running {
            let now = self.clock.now();
            if let Some(state) = self.layout.state_mut(self.current) {
                state.exit(now);
            }
        }
        self.current = self.initial;
        self.operational = OperationalState::Idle;
        debug!(state = self.state_name(self.initial), "machine reset");
    }

    /// Jump to `target` regardless of conditions.
    ///
    /// Runs the exiting hook of the current state, then the entering hook
    /// of `target`, even when both are the same state.
    pub fn transit_to(&mut self, target: StateId) -> Result<(), FsmError> {
        if !self.layout.contains_state(target) {
            return Err(FsmError::UnknownState(target));
        }
        let now = self.clock.now();
        let from = self.current;
        self.change_state(from, target, now);
        debug!(
            from = self.state_name(from),
            to = self.state_name(target),
            "forced transition"
        );
        self.log_change(from, target, true);
        Ok(())
    }

    /// One step: fire the first firing transition of the current state, or
    /// run its in-state hook when none fires.
    ///
    /// Returns `false` when the machine now stands on a terminal state.
    pub fn track(&mut self) -> bool {
        let now = self.clock.now();
        let from = self.current;

        match self.layout.firing_transition(from, now) {
            Some(tid) => self.fire(tid, now),
            None => {
                trace!(state = self.state_name(from), "no transition fired");
                if let Some(state) = self.layout.state_mut(from) {
                    state.run_in_state();
                }
            }
        }

        let terminal = self.is_terminal();
        if terminal {
            self.operational = OperationalState::TerminalReached;
        }
        !terminal
    }

    /// Run the step loop until a terminal state, a stop request or the end
    /// of `time_budget`.
    ///
    /// The budget and stop requests are checked between steps, never during
    /// one.
    pub fn start(
        &mut self,
        reset: bool,
        time_budget: Option<Duration>,
    ) -> Result<RunOutcome, FsmError> {
        if let Some(budget) = time_budget {
            if budget.is_zero() {
                return Err(FsmError::InvalidTimeBudget(budget));
            }
        }
        if reset {
            self.reset();
        }

        self.operational = OperationalState::Running;
        let started = self.clock.now();
        info!(
            state = self.state_name(self.current),
            budget = ?time_budget,
            "machine run started"
        );

        let outcome = loop {
            if self.stop.take() {
                self.stop();
            }
            if self.operational != OperationalState::Running {
                break RunOutcome::Stopped;
            }
            if let Some(budget) = time_budget {
                if self.clock.now().saturating_duration_since(started) >= budget {
                    self.operational = OperationalState::Idle;
                    break RunOutcome::BudgetExhausted;
                }
            }
            if !self.track() {
                break RunOutcome::TerminalReached;
            }
        };
        self.stop.clear();

        info!(
            ?outcome,
            state = self.state_name(self.current),
            "machine run ended"
        );
        Ok(outcome)
    }

    /// Leave the run loop: `Running` becomes `Idle`.
    pub fn stop(&mut self) {
        if self.operational == OperationalState::Running {
            self.operational = OperationalState::Idle;
        }
    }

    fn fire(&mut self, tid: TransitionId, now: Instant) {
        let from = self.current;
        let Some(target) = self.layout.transition(tid).and_then(|t| t.target()) else {
            return;
        };

        if let Some(state) = self.layout.state_mut(from) {
            state.exit(now);
        }
        if let Some(transition) = self.layout.transition_mut(tid) {
            transition.transit(now);
        }
        self.current = target;
        if let Some(state) = self.layout.state_mut(target) {
            state.enter(now);
        }

        debug!(
            from = self.state_name(from),
            to = self.state_name(target),
            transition = tid.index(),
            "transition fired"
        );
        self.log_change(from, target, false);
    }

    fn change_state(&mut self, from: StateId, to: StateId, now: Instant) {
        if let Some(state) = self.layout.state_mut(from) {
            state.exit(now);
        }
        self.current = to;
        if let Some(state) = self.layout.state_mut(to) {
            state.enter(now);
        }
    }

    fn log_change(&mut self, from: StateId, to: StateId, forced: bool) {
        let Some(history) = self.history.as_mut() else {
            return;
        };
        let name = |id| {
            self.layout
                .state(id)
                .map(|s| s.name().to_string())
                .unwrap_or_default()
        };
        history.record(StateTransition {
            from: name(from),
            to: name(to),
            timestamp: Utc::now(),
            forced,
        });
    }

    fn state_name(&self, id: StateId) -> &str {
        self.layout.state(id).map_or("<unknown>", |s| s.name())
    }
}

impl<V> fmt::Debug for FiniteStateMachine<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FiniteStateMachine")
            .field("layout", &self.layout)
            .field("current", &self.state_name(self.current))
            .field("operational", &self.operational)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
