//! A two-level output driven through five timed policies.
//!
//! The machine is assembled from eleven monitored states: four "on"
//! variants and four "off" variants built by caller generators, plus three
//! coordination states branching on their custom value.
//!
//! ```text
//!  off_duration ──(off for d)──▶ on          on_duration ──(on for d)──▶ off
//!
//!  blink_begin ──(true)──▶ blink_on ◀──(off part)── blink_off
//!             └─(false)─▶ blink_off ◀──(on part)─── blink_on
//!
//!  blink_stop_begin ──(true)──▶ blink_stop_on ⇄ blink_stop_off
//!                  └─(false)─▶ blink_stop_off
//!  blink_stop_on / blink_stop_off ──(total elapsed)──▶ blink_stop_end
//!  blink_stop_end ──(true)──▶ off
//!                └─(false)─▶ on
//! ```

use std::time::Duration;

use tracing::debug;

use super::error::BlinkError;
use super::request::{BlinkPlan, BlinkRequest, Level};
use crate::core::{
    Clock, FsmError, State, StateEntryDurationCondition, StateId, StateValueCondition,
    SystemClock, Transition, TransitionId,
};
use crate::machine::{FiniteStateMachine, Layout};

#[derive(Clone, Copy, Debug)]
struct BlinkStates {
    off: StateId,
    off_duration: StateId,
    blink_off: StateId,
    blink_stop_off: StateId,
    on: StateId,
    on_duration: StateId,
    blink_on: StateId,
    blink_stop_on: StateId,
    blink_begin: StateId,
    blink_stop_begin: StateId,
    blink_stop_end: StateId,
}

impl BlinkStates {
    fn on_states(&self) -> [StateId; 4] {
        [self.on, self.on_duration, self.blink_on, self.blink_stop_on]
    }

    fn off_states(&self) -> [StateId; 7] {
        [
            self.off,
            self.off_duration,
            self.blink_off,
            self.blink_stop_off,
            self.blink_begin,
            self.blink_stop_begin,
            self.blink_stop_end,
        ]
    }
}

/// Transitions whose duration is rewritten by each request.
#[derive(Clone, Copy, Debug)]
struct Knobs {
    on_duration: TransitionId,
    off_duration: TransitionId,
    blink_on: TransitionId,
    blink_off: TransitionId,
    blink_stop_on: TransitionId,
    blink_stop_off: TransitionId,
    blink_stop_total: TransitionId,
}

/// Blink pattern machine over caller-supplied "on" and "off" states.
///
/// Generators are called four times each; every generated state is made
/// monitored and renamed `role:name` so the layout stays readable in logs.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use tempo_fsm::blink::{BlinkRequest, Blinkers};
/// use tempo_fsm::core::{ManualClock, State};
///
/// let clock = ManualClock::new();
/// let mut lamp = Blinkers::with_clock(
///     || State::monitored("dark"),
///     || State::monitored("lit"),
///     clock.clone(),
/// )
/// .unwrap();
///
/// lamp.blink(BlinkRequest::Continuous {
///     cycle_duration: Duration::from_secs(1),
///     percent_on: 0.5,
///     begin_on: true,
/// })
/// .unwrap();
///
/// lamp.track();
/// assert!(lamp.is_on());
/// clock.advance(Duration::from_millis(500));
/// lamp.track();
/// assert!(lamp.is_off());
/// ```
pub struct Blinkers {
    fsm: FiniteStateMachine<bool>,
    states: BlinkStates,
    knobs: Knobs,
}

impl Blinkers {
    pub fn new<F, N>(off_generator: F, on_generator: N) -> Result<Self, FsmError>
    where
        F: FnMut() -> State<bool>,
        N: FnMut() -> State<bool>,
    {
        Self::with_clock(off_generator, on_generator, SystemClock)
    }

    pub fn with_clock<F, N, C>(
        mut off_generator: F,
        mut on_generator: N,
        clock: C,
    ) -> Result<Self, FsmError>
    where
        F: FnMut() -> State<bool>,
        N: FnMut() -> State<bool>,
        C: Clock + 'static,
    {
        let mut layout: Layout<bool> = Layout::new();
        let mut generated = |role: &str, state: State<bool>| {
            let mut state = state.enable_monitoring();
            let name = format!("{role}:{}", state.name());
            state.rename(name);
            layout.add_state(state)
        };

        let off = generated("off", off_generator());
        let off_duration = generated("off_duration", off_generator());
        let blink_off = generated("blink_off", off_generator());
        let blink_stop_off = generated("blink_stop_off", off_generator());
        let on = generated("on", on_generator());
        let on_duration = generated("on_duration", on_generator());
        let blink_on = generated("blink_on", on_generator());
        let blink_stop_on = generated("blink_stop_on", on_generator());

        let states = BlinkStates {
            off,
            off_duration,
            blink_off,
            blink_stop_off,
            on,
            on_duration,
            blink_on,
            blink_stop_on,
            blink_begin: layout.add_state(State::monitored("blink_begin")),
            blink_stop_begin: layout.add_state(State::monitored("blink_stop_begin")),
            blink_stop_end: layout.add_state(State::monitored("blink_stop_end")),
        };
        let knobs = wire(&mut layout, &states)?;
        layout.set_initial_state(states.off)?;

        let fsm = FiniteStateMachine::with_clock(layout, clock)?;
        Ok(Self { fsm, states, knobs })
    }

    /// `true` while standing on one of the four "on" states.
    pub fn is_on(&self) -> bool {
        self.states
            .on_states()
            .contains(&self.fsm.current_applicative_state())
    }

    /// `true` while standing on an "off" state or a coordination state.
    pub fn is_off(&self) -> bool {
        self.states
            .off_states()
            .contains(&self.fsm.current_applicative_state())
    }

    pub fn turn_on(&mut self) -> Result<(), BlinkError> {
        self.blink(BlinkRequest::Hold(Level::On))
    }

    /// Stay on for `duration`, then hold off.
    pub fn turn_on_for(&mut self, duration: Duration) -> Result<(), BlinkError> {
        self.blink(BlinkRequest::TimedHold {
            level: Level::On,
            duration,
        })
    }

    pub fn turn_off(&mut self) -> Result<(), BlinkError> {
        self.blink(BlinkRequest::Hold(Level::Off))
    }

    /// Stay off for `duration`, then hold on.
    pub fn turn_off_for(&mut self, duration: Duration) -> Result<(), BlinkError> {
        self.blink(BlinkRequest::TimedHold {
            level: Level::Off,
            duration,
        })
    }

    /// Switch to the policy described by `request`.
    ///
    /// The request is fully validated first; a rejected request leaves the
    /// machine untouched.
    pub fn blink(&mut self, request: BlinkRequest) -> Result<(), BlinkError> {
        let plan = request.plan()?;
        debug!(?request, "applying blink request");

        let s = self.states;
        let k = self.knobs;
        match plan {
            BlinkPlan::Hold(Level::On) => self.fsm.transit_to(s.on)?,
            BlinkPlan::Hold(Level::Off) => self.fsm.transit_to(s.off)?,
            BlinkPlan::TimedHold {
                level: Level::On,
                duration,
            } => {
                self.set_duration(k.on_duration, s.on_duration, duration)?;
                self.fsm.transit_to(s.on_duration)?;
            }
            BlinkPlan::TimedHold {
                level: Level::Off,
                duration,
            } => {
                self.set_duration(k.off_duration, s.off_duration, duration)?;
                self.fsm.transit_to(s.off_duration)?;
            }
            BlinkPlan::Continuous { on, off, begin_on } => {
                self.set_duration(k.blink_on, s.blink_on, on)?;
                self.set_duration(k.blink_off, s.blink_off, off)?;
                self.fsm.state_mut(s.blink_begin)?.set_custom_value(begin_on)?;
                self.fsm.transit_to(s.blink_begin)?;
            }
            BlinkPlan::Bounded {
                total,
                on,
                off,
                begin_on,
                end_off,
            } => {
                self.set_duration(k.blink_stop_total, s.blink_stop_begin, total)?;
                self.set_duration(k.blink_stop_on, s.blink_stop_on, on)?;
                self.set_duration(k.blink_stop_off, s.blink_stop_off, off)?;
                self.fsm
                    .state_mut(s.blink_stop_begin)?
                    .set_custom_value(begin_on)?;
                self.fsm
                    .state_mut(s.blink_stop_end)?
                    .set_custom_value(end_off)?;
                self.fsm.transit_to(s.blink_stop_begin)?;
            }
        }
        Ok(())
    }

    /// One step of the underlying machine.
    pub fn track(&mut self) -> bool {
        self.fsm.track()
    }

    /// Back to the initial "off" state without running any hook.
    pub fn reset(&mut self) {
        self.fsm.reset();
    }

    pub fn machine(&self) -> &FiniteStateMachine<bool> {
        &self.fsm
    }

    pub fn machine_mut(&mut self) -> &mut FiniteStateMachine<bool> {
        &mut self.fsm
    }

    /// Name of the state the blinker stands on.
    pub fn current_state_name(&self) -> &str {
        self.fsm.current_state().map_or("", |s| s.name())
    }

    fn set_duration(
        &mut self,
        transition: TransitionId,
        observed: StateId,
        duration: Duration,
    ) -> Result<(), FsmError> {
        self.fsm
            .transition_mut(transition)?
            .set_condition(StateEntryDurationCondition::new(duration, observed));
        Ok(())
    }
}

impl std::fmt::Debug for Blinkers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blinkers")
            .field("state", &self.current_state_name())
            .field("on", &self.is_on())
            .finish()
    }
}

fn after(seconds: u64, state: StateId) -> StateEntryDurationCondition {
    StateEntryDurationCondition::new(Duration::from_secs(seconds), state)
}

fn wire(layout: &mut Layout<bool>, s: &BlinkStates) -> Result<Knobs, FsmError> {
    let on_duration = layout.add_transition(
        s.on_duration,
        Transition::new(after(1, s.on_duration)).to(s.off),
    )?;
    let off_duration = layout.add_transition(
        s.off_duration,
        Transition::new(after(1, s.off_duration)).to(s.on),
    )?;

    layout.add_transition(
        s.blink_begin,
        Transition::new(StateValueCondition::new(true, s.blink_begin)).to(s.blink_on),
    )?;
    layout.add_transition(
        s.blink_begin,
        Transition::new(StateValueCondition::new(false, s.blink_begin)).to(s.blink_off),
    )?;
    let blink_off = layout.add_transition(
        s.blink_off,
        Transition::new(after(1, s.blink_off)).to(s.blink_on),
    )?;
    let blink_on = layout.add_transition(
        s.blink_on,
        Transition::new(after(1, s.blink_on)).to(s.blink_off),
    )?;

    layout.add_transition(
        s.blink_stop_begin,
        Transition::new(StateValueCondition::new(true, s.blink_stop_begin)).to(s.blink_stop_on),
    )?;
    layout.add_transition(
        s.blink_stop_begin,
        Transition::new(StateValueCondition::new(false, s.blink_stop_begin))
            .to(s.blink_stop_off),
    )?;

    // Shared by both sub-states and checked before their own duration.
    let blink_stop_total = layout.declare_transition(
        Transition::new(after(1, s.blink_stop_begin)).to(s.blink_stop_end),
    );
    layout.attach_transition(s.blink_stop_off, blink_stop_total)?;
    let blink_stop_off = layout.add_transition(
        s.blink_stop_off,
        Transition::new(after(1, s.blink_stop_off)).to(s.blink_stop_on),
    )?;
    layout.attach_transition(s.blink_stop_on, blink_stop_total)?;
    let blink_stop_on = layout.add_transition(
        s.blink_stop_on,
        Transition::new(after(1, s.blink_stop_on)).to(s.blink_stop_off),
    )?;

    layout.add_transition(
        s.blink_stop_end,
        Transition::new(StateValueCondition::new(true, s.blink_stop_end)).to(s.off),
    )?;
    layout.add_transition(
        s.blink_stop_end,
        Transition::new(StateValueCondition::new(false, s.blink_stop_end)).to(s.on),
    )?;

    Ok(Knobs {
        on_duration,
        off_duration,
        blink_on,
        blink_off,
        blink_stop_on,
        blink_stop_off,
        blink_stop_total,
    })
}
