//! States of a machine layout.
//!
//! A single concrete `State` record covers the three flavours a layout
//! needs: a plain state, a state with action hooks, and a monitored state
//! (hooks plus entry/exit bookkeeping). The flavour is picked at
//! construction time so plain states carry no monitoring overhead.

use std::fmt;
use std::time::Instant;

use super::action::StateHooks;
use super::error::FsmError;
use super::monitor::StateMonitor;
use super::transition::TransitionId;

/// Handle to a state declared in a [`Layout`](crate::machine::Layout).
///
/// Handles remember which layout issued them, so a handle from another
/// layout is rejected instead of silently aliasing a local state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StateId {
    layout: u32,
    index: usize,
}

impl StateId {
    pub(crate) fn new(layout: u32, index: usize) -> Self {
        Self { layout, index }
    }

    pub(crate) fn layout(&self) -> u32 {
        self.layout
    }

    /// Position of the state in its layout, in declaration order.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state #{} (layout {})", self.index, self.layout)
    }
}

/// Behavioural flags of a state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StateParams {
    /// Reaching this state ends a run loop.
    pub terminal: bool,
    /// Also run the in-state hook right after the entering hook.
    pub in_state_on_entering: bool,
    /// Also run the in-state hook right before the exiting hook.
    pub in_state_on_exiting: bool,
}

impl StateParams {
    pub fn terminal() -> Self {
        Self {
            terminal: true,
            ..Self::default()
        }
    }
}

/// A node of the state graph.
///
/// `V` is the type of the custom value tag carried by monitored states and
/// read by [`StateValueCondition`](crate::core::StateValueCondition).
///
/// # Example
///
/// ```rust
/// use tempo_fsm::core::State;
///
/// let mut on: State<bool> = State::monitored("on");
/// on.add_entering_action(|| println!("lamp on")).unwrap();
///
/// assert!(on.is_monitored());
/// assert!(!on.is_terminal());
/// ```
pub struct State<V = ()> {
    name: String,
    params: StateParams,
    transitions: Vec<TransitionId>,
    hooks: Option<StateHooks>,
    monitor: Option<StateMonitor<V>>,
}

impl<V> State<V> {
    /// A plain state: no hooks, no monitoring.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: StateParams::default(),
            transitions: Vec::new(),
            hooks: None,
            monitor: None,
        }
    }

    /// A state accepting entering / in-state / exiting actions.
    pub fn with_actions(name: impl Into<String>) -> Self {
        Self::new(name).enable_actions()
    }

    /// A state with action hooks and entry/exit monitoring.
    pub fn monitored(name: impl Into<String>) -> Self {
        Self::new(name).enable_monitoring()
    }

    pub fn with_params(mut self, params: StateParams) -> Self {
        self.params = params;
        self
    }

    /// Mark the state terminal.
    pub fn terminal(mut self) -> Self {
        self.params.terminal = true;
        self
    }

    /// Add action hooks, keeping any that already exist.
    pub fn enable_actions(mut self) -> Self {
        if self.hooks.is_none() {
            self.hooks = Some(StateHooks::default());
        }
        self
    }

    /// Add action hooks and monitoring, keeping any that already exist.
    pub fn enable_monitoring(self) -> Self {
        let mut state = self.enable_actions();
        if state.monitor.is_none() {
            state.monitor = Some(StateMonitor::new(Instant::now()));
        }
        state
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn params(&self) -> StateParams {
        self.params
    }

    pub fn is_terminal(&self) -> bool {
        self.params.terminal
    }

    pub fn has_actions(&self) -> bool {
        self.hooks.is_some()
    }

    pub fn is_monitored(&self) -> bool {
        self.monitor.is_some()
    }

    /// Outgoing transitions in priority order.
    pub fn transitions(&self) -> &[TransitionId] {
        &self.transitions
    }

    pub(crate) fn push_transition(&mut self, transition: TransitionId) {
        self.transitions.push(transition);
    }

    pub fn add_entering_action<F>(&mut self, action: F) -> Result<&mut Self, FsmError>
    where
        F: FnMut() + 'static,
    {
        self.hooks_mut()?.entering.push(action);
        Ok(self)
    }

    pub fn add_in_state_action<F>(&mut self, action: F) -> Result<&mut Self, FsmError>
    where
        F: FnMut() + 'static,
    {
        self.hooks_mut()?.in_state.push(action);
        Ok(self)
    }

    pub fn add_exiting_action<F>(&mut self, action: F) -> Result<&mut Self, FsmError>
    where
        F: FnMut() + 'static,
    {
        self.hooks_mut()?.exiting.push(action);
        Ok(self)
    }

    fn hooks_mut(&mut self) -> Result<&mut StateHooks, FsmError> {
        let name = &self.name;
        self.hooks
            .as_mut()
            .ok_or_else(|| FsmError::HooksDisabled(name.clone()))
    }

    pub fn monitor(&self) -> Option<&StateMonitor<V>> {
        self.monitor.as_ref()
    }

    /// Monitoring data, or `NotMonitored` for plain and action states.
    pub fn try_monitor_mut(&mut self) -> Result<&mut StateMonitor<V>, FsmError> {
        let name = &self.name;
        self.monitor
            .as_mut()
            .ok_or_else(|| FsmError::NotMonitored(name.clone()))
    }

    pub fn custom_value(&self) -> Option<&V> {
        self.monitor.as_ref().and_then(|m| m.custom_value())
    }

    pub fn set_custom_value(&mut self, value: V) -> Result<(), FsmError> {
        self.try_monitor_mut()?.set_custom_value(value);
        Ok(())
    }

    /// Entering hook: monitoring first, then actions.
    pub(crate) fn enter(&mut self, now: Instant) {
        if let Some(monitor) = self.monitor.as_mut() {
            monitor.record_entry(now);
        }
        if let Some(hooks) = self.hooks.as_mut() {
            hooks.entering.run();
            if self.params.in_state_on_entering {
                hooks.in_state.run();
            }
        }
    }

    pub(crate) fn run_in_state(&mut self) {
        if let Some(hooks) = self.hooks.as_mut() {
            hooks.in_state.run();
        }
    }

    /// Exiting hook: actions first, then monitoring.
    pub(crate) fn exit(&mut self, now: Instant) {
        if let Some(hooks) = self.hooks.as_mut() {
            if self.params.in_state_on_exiting {
                hooks.in_state.run();
            }
            hooks.exiting.run();
        }
        if let Some(monitor) = self.monitor.as_mut() {
            monitor.record_exit(now);
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for State<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("transitions", &self.transitions)
            .field("hooks", &self.hooks)
            .field("monitor", &self.monitor)
            .finish()
    }
}
