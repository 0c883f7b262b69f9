//! The static graph of a machine: states, transitions and an initial state.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use crate::core::{
    EvalContext, FsmError, LayoutError, State, StateId, Transition, TransitionId,
};

static NEXT_LAYOUT_ID: AtomicU32 = AtomicU32::new(0);

/// Arena of states and transitions addressed by handles.
///
/// States and transitions are owned by the layout; the graph edges are
/// `StateId`/`TransitionId` handles. A transition attached to several
/// states is shared between them.
///
/// # Example
///
/// ```rust
/// use tempo_fsm::core::{State, Transition};
/// use tempo_fsm::machine::Layout;
///
/// let mut layout: Layout = Layout::new();
/// let idle = layout.add_state(State::new("idle"));
/// let done = layout.add_state(State::new("done").terminal());
///
/// layout.add_transition(idle, Transition::always().to(done)).unwrap();
/// assert!(layout.validate().is_err());
///
/// layout.set_initial_state(idle).unwrap();
/// assert!(layout.validate().is_ok());
/// ```
pub struct Layout<V = ()> {
    id: u32,
    states: Vec<State<V>>,
    transitions: Vec<Transition<V>>,
    initial: Option<StateId>,
}

impl<V> Layout<V> {
    pub fn new() -> Self {
        Self {
            id: NEXT_LAYOUT_ID.fetch_add(1, Ordering::Relaxed),
            states: Vec::new(),
            transitions: Vec::new(),
            initial: None,
        }
    }

    /// Declare a state and return its handle.
    pub fn add_state(&mut self, state: State<V>) -> StateId {
        self.states.push(state);
        StateId::new(self.id, self.states.len() - 1)
    }

    pub fn add_states<I>(&mut self, states: I) -> Vec<StateId>
    where
        I: IntoIterator<Item = State<V>>,
    {
        states.into_iter().map(|s| self.add_state(s)).collect()
    }

    /// Declare a transition and append it to `from`'s transition list.
    pub fn add_transition(
        &mut self,
        from: StateId,
        transition: Transition<V>,
    ) -> Result<TransitionId, FsmError> {
        if !self.contains_state(from) {
            return Err(FsmError::UnknownState(from));
        }
        let id = self.declare_transition(transition);
        self.attach_transition(from, id)?;
        Ok(id)
    }

    /// Declare a transition without attaching it to any state.
    pub fn declare_transition(&mut self, transition: Transition<V>) -> TransitionId {
        self.transitions.push(transition);
        TransitionId::new(self.id, self.transitions.len() - 1)
    }

    /// Append an already declared transition to `from`'s transition list.
    ///
    /// Attaching one transition to several states shares it: its condition
    /// and monitoring data are the same object for all of them.
    pub fn attach_transition(
        &mut self,
        from: StateId,
        transition: TransitionId,
    ) -> Result<(), FsmError> {
        if !self.contains_transition(transition) {
            return Err(FsmError::UnknownTransition(transition));
        }
        let state = self.state_mut(from).ok_or(FsmError::UnknownState(from))?;
        state.push_transition(transition);
        Ok(())
    }

    pub fn set_initial_state(&mut self, state: StateId) -> Result<(), FsmError> {
        if !self.contains_state(state) {
            return Err(FsmError::UnknownState(state));
        }
        self.initial = Some(state);
        Ok(())
    }

    pub fn initial_state(&self) -> Option<StateId> {
        self.initial
    }

    pub fn contains_state(&self, id: StateId) -> bool {
        id.layout() == self.id && id.index() < self.states.len()
    }

    pub fn contains_transition(&self, id: TransitionId) -> bool {
        id.layout() == self.id && id.index() < self.transitions.len()
    }

    pub fn state(&self, id: StateId) -> Option<&State<V>> {
        if id.layout() != self.id {
            return None;
        }
        self.states.get(id.index())
    }

    pub fn state_mut(&mut self, id: StateId) -> Option<&mut State<V>> {
        if id.layout() != self.id {
            return None;
        }
        self.states.get_mut(id.index())
    }

    pub fn transition(&self, id: TransitionId) -> Option<&Transition<V>> {
        if id.layout() != self.id {
            return None;
        }
        self.transitions.get(id.index())
    }

    pub fn transition_mut(&mut self, id: TransitionId) -> Option<&mut Transition<V>> {
        if id.layout() != self.id {
            return None;
        }
        self.transitions.get_mut(id.index())
    }

    /// States with their handles, in declaration order.
    pub fn states(&self) -> impl Iterator<Item = (StateId, &State<V>)> {
        let layout = self.id;
        self.states
            .iter()
            .enumerate()
            .map(move |(index, state)| (StateId::new(layout, index), state))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Check that the layout can drive a machine.
    ///
    /// Requires an initial state, and for every transition attached to a
    /// state: a target declared in this layout, a valid condition, and
    /// observed states that are declared here and monitored.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.initial.is_none() {
            return Err(LayoutError::MissingInitialState);
        }

        let mut observed = Vec::new();
        for state in &self.states {
            for &tid in state.transitions() {
                let Some(transition) = self.transition(tid) else {
                    continue;
                };

                let target = transition.target().ok_or_else(|| LayoutError::MissingTarget {
                    state: state.name().to_string(),
                    transition: tid,
                })?;
                if !self.contains_state(target) {
                    return Err(LayoutError::ForeignTarget {
                        transition: tid,
                        target,
                    });
                }

                if !transition.is_valid() {
                    return Err(LayoutError::InvalidCondition {
                        state: state.name().to_string(),
                        transition: tid,
                    });
                }

                observed.clear();
                transition.observed_states(&mut observed);
                for &watched in &observed {
                    let watched_state =
                        self.state(watched)
                            .ok_or(LayoutError::UnknownObservedState {
                                transition: tid,
                                observed: watched,
                            })?;
                    if !watched_state.is_monitored() {
                        return Err(LayoutError::UnmonitoredObservedState {
                            transition: tid,
                            state: watched_state.name().to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Evaluation context over this layout's states at instant `now`.
    pub fn eval_context(&self, now: Instant) -> EvalContext<'_, V> {
        EvalContext::new(self.id, &self.states, now)
    }

    /// First transition of `from`, in attachment order, that fires at `now`.
    ///
    /// Transitions whose target is missing or foreign are skipped without
    /// being evaluated.
    pub(crate) fn firing_transition(&mut self, from: StateId, now: Instant) -> Option<TransitionId> {
        let Self {
            id,
            states,
            transitions,
            ..
        } = self;
        let layout = *id;
        if from.layout() != layout {
            return None;
        }

        let states: &[State<V>] = states;
        let ctx = EvalContext::new(layout, states, now);
        let source = states.get(from.index())?;

        for &tid in source.transitions() {
            let Some(transition) = transitions.get_mut(tid.index()) else {
                continue;
            };
            let reachable = transition
                .target()
                .is_some_and(|t| t.layout() == layout && t.index() < states.len());
            if reachable && transition.is_firing(&ctx) {
                return Some(tid);
            }
        }
        None
    }

    /// Align every monitored state's timestamps with `now`.
    pub(crate) fn rebase_monitors(&mut self, now: Instant) {
        for state in &mut self.states {
            if let Ok(monitor) = state.try_monitor_mut() {
                monitor.reset_last_times(now);
            }
        }
    }
}

impl<V> Default for Layout<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> std::fmt::Debug for Layout<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layout")
            .field("id", &self.id)
            .field(
                "states",
                &self.states.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("transitions", &self.transitions.len())
            .field("initial", &self.initial)
            .finish()
    }
}
