//! Guarded edges between states.

use std::fmt;
use std::time::Instant;

use super::action::ActionList;
use super::condition::{AlwaysTrue, Condition, EvalContext};
use super::error::FsmError;
use super::monitor::TransitionMonitor;
use super::state::StateId;

/// Handle to a transition declared in a [`Layout`](crate::machine::Layout).
///
/// Several states may list the same handle; they then share one
/// transition object, condition included.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TransitionId {
    layout: u32,
    index: usize,
}

impl TransitionId {
    pub(crate) fn new(layout: u32, index: usize) -> Self {
        Self { layout, index }
    }

    pub(crate) fn layout(&self) -> u32 {
        self.layout
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transition #{} (layout {})", self.index, self.layout)
    }
}

/// An edge to `target`, firing exactly when its condition evaluates true.
///
/// The source state is implicit: it is whichever state lists the
/// transition. A transition is valid once it has a target and a valid
/// condition.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use tempo_fsm::core::{State, StateEntryDurationCondition, Transition};
/// use tempo_fsm::machine::Layout;
///
/// let mut layout: Layout = Layout::new();
/// let red = layout.add_state(State::monitored("red"));
/// let green = layout.add_state(State::monitored("green"));
///
/// let after_five = StateEntryDurationCondition::new(Duration::from_secs(5), red);
/// layout.add_transition(red, Transition::new(after_five).to(green)).unwrap();
/// layout.set_initial_state(red).unwrap();
///
/// assert!(layout.is_valid());
/// ```
pub struct Transition<V = ()> {
    target: Option<StateId>,
    condition: Option<Box<dyn Condition<V>>>,
    actions: Option<ActionList>,
    monitor: Option<TransitionMonitor<V>>,
}

impl<V> Transition<V> {
    /// A conditional transition with no target yet.
    pub fn new<C>(condition: C) -> Self
    where
        C: Condition<V> + 'static,
    {
        Self {
            target: None,
            condition: Some(Box::new(condition)),
            actions: None,
            monitor: None,
        }
    }

    /// A transition that fires on every step.
    pub fn always() -> Self {
        Self::new(AlwaysTrue::new())
    }

    /// A transition without a condition; invalid until one is set.
    pub fn unguarded() -> Self {
        Self {
            target: None,
            condition: None,
            actions: None,
            monitor: None,
        }
    }

    pub fn to(mut self, target: StateId) -> Self {
        self.target = Some(target);
        self
    }

    /// Accept transiting actions.
    pub fn with_actions(mut self) -> Self {
        if self.actions.is_none() {
            self.actions = Some(ActionList::new());
        }
        self
    }

    /// Accept transiting actions and keep transit statistics.
    pub fn monitored(self) -> Self {
        let mut transition = self.with_actions();
        if transition.monitor.is_none() {
            transition.monitor = Some(TransitionMonitor::default());
        }
        transition
    }

    pub fn target(&self) -> Option<StateId> {
        self.target
    }

    pub fn set_target(&mut self, target: StateId) {
        self.target = Some(target);
    }

    pub fn has_condition(&self) -> bool {
        self.condition.is_some()
    }

    /// Replace the guard. The previous condition is dropped.
    pub fn set_condition<C>(&mut self, condition: C)
    where
        C: Condition<V> + 'static,
    {
        self.condition = Some(Box::new(condition));
    }

    pub fn set_boxed_condition(&mut self, condition: Box<dyn Condition<V>>) {
        self.condition = Some(condition);
    }

    pub fn is_valid(&self) -> bool {
        self.target.is_some() && self.condition.as_ref().is_some_and(|c| c.is_valid())
    }

    pub(crate) fn observed_states(&self, out: &mut Vec<StateId>) {
        if let Some(condition) = self.condition.as_ref() {
            condition.observed_states(out);
        }
    }

    /// Whether the transition fires at this step.
    pub fn is_firing(&mut self, ctx: &EvalContext<'_, V>) -> bool {
        self.condition
            .as_mut()
            .is_some_and(|condition| condition.evaluate(ctx))
    }

    /// Rebase the guard's internal reference (timer start, entry count)
    /// on `now`.
    pub fn rebase_condition(&mut self, now: Instant) {
        if let Some(condition) = self.condition.as_mut() {
            condition.rebase(now);
        }
    }

    pub fn add_transiting_action<F>(&mut self, action: F) -> Result<&mut Self, FsmError>
    where
        F: FnMut() + 'static,
    {
        self.actions
            .as_mut()
            .ok_or(FsmError::TransitionHooksDisabled)?
            .push(action);
        Ok(self)
    }

    pub fn monitor(&self) -> Option<&TransitionMonitor<V>> {
        self.monitor.as_ref()
    }

    pub fn monitor_mut(&mut self) -> Option<&mut TransitionMonitor<V>> {
        self.monitor.as_mut()
    }

    /// Transiting hook: monitoring first, then actions.
    pub(crate) fn transit(&mut self, now: Instant) {
        if let Some(monitor) = self.monitor.as_mut() {
            monitor.record_transit(now);
        }
        if let Some(actions) = self.actions.as_mut() {
            actions.run();
        }
    }
}

impl<V> fmt::Debug for Transition<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("target", &self.target)
            .field("has_condition", &self.condition.is_some())
            .field("actions", &self.actions)
            .field("transit_count", &self.monitor.as_ref().map(|m| m.transit_count()))
            .finish()
    }
}
