//! Entry/exit bookkeeping for states and transitions, and the conditions
//! derived from it.

use std::time::{Duration, Instant};

use super::condition::{Condition, EvalContext};
use super::state::StateId;

/// Monitoring data of a state.
///
/// The entry time is recorded before the entering actions run and the entry
/// count is bumped at the same moment; the exit time is recorded after the
/// exiting actions.
#[derive(Clone, Debug)]
pub struct StateMonitor<V> {
    last_entry_time: Instant,
    last_exit_time: Instant,
    entry_count: u64,
    custom_value: Option<V>,
}

impl<V> StateMonitor<V> {
    pub(crate) fn new(now: Instant) -> Self {
        Self {
            last_entry_time: now,
            last_exit_time: now,
            entry_count: 0,
            custom_value: None,
        }
    }

    pub fn last_entry_time(&self) -> Instant {
        self.last_entry_time
    }

    pub fn last_exit_time(&self) -> Instant {
        self.last_exit_time
    }

    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    pub fn custom_value(&self) -> Option<&V> {
        self.custom_value.as_ref()
    }

    pub fn set_custom_value(&mut self, value: V) {
        self.custom_value = Some(value);
    }

    pub fn clear_custom_value(&mut self) {
        self.custom_value = None;
    }

    pub fn reset_entry_count(&mut self) {
        self.entry_count = 0;
    }

    /// Set both timestamps to `now`.
    pub fn reset_last_times(&mut self, now: Instant) {
        self.last_entry_time = now;
        self.last_exit_time = now;
    }

    pub(crate) fn record_entry(&mut self, now: Instant) {
        self.last_entry_time = now;
        self.entry_count += 1;
    }

    pub(crate) fn record_exit(&mut self, now: Instant) {
        self.last_exit_time = now;
    }
}

/// Monitoring data of a transition.
#[derive(Clone, Debug)]
pub struct TransitionMonitor<V> {
    transit_count: u64,
    last_transit_time: Option<Instant>,
    custom_value: Option<V>,
}

impl<V> Default for TransitionMonitor<V> {
    fn default() -> Self {
        Self {
            transit_count: 0,
            last_transit_time: None,
            custom_value: None,
        }
    }
}

impl<V> TransitionMonitor<V> {
    pub fn transit_count(&self) -> u64 {
        self.transit_count
    }

    /// `None` until the transition fires for the first time.
    pub fn last_transit_time(&self) -> Option<Instant> {
        self.last_transit_time
    }

    pub fn custom_value(&self) -> Option<&V> {
        self.custom_value.as_ref()
    }

    pub fn set_custom_value(&mut self, value: V) {
        self.custom_value = Some(value);
    }

    pub fn reset_transit_count(&mut self) {
        self.transit_count = 0;
    }

    pub fn reset_last_transit_time(&mut self, now: Instant) {
        self.last_transit_time = Some(now);
    }

    pub(crate) fn record_transit(&mut self, now: Instant) {
        self.last_transit_time = Some(now);
        self.transit_count += 1;
    }
}

/// True once `duration` has elapsed since the observed state was last
/// entered. Used for "stay in this state for T".
#[derive(Clone, Copy, Debug)]
pub struct StateEntryDurationCondition {
    duration: Duration,
    state: StateId,
    inverse: bool,
}

impl StateEntryDurationCondition {
    pub fn new(duration: Duration, state: StateId) -> Self {
        Self {
            duration,
            state,
            inverse: false,
        }
    }

    pub fn inverted(mut self) -> Self {
        self.inverse = !self.inverse;
        self
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    pub fn state(&self) -> StateId {
        self.state
    }

    pub fn set_state(&mut self, state: StateId) {
        self.state = state;
    }
}

impl<V> Condition<V> for StateEntryDurationCondition {
    fn compare(&mut self, ctx: &EvalContext<'_, V>) -> bool {
        ctx.monitor(self.state).is_some_and(|m| {
            ctx.now().saturating_duration_since(m.last_entry_time()) >= self.duration
        })
    }

    fn is_inverse(&self) -> bool {
        self.inverse
    }

    fn observed_states(&self, out: &mut Vec<StateId>) {
        out.push(self.state);
    }
}

/// True once the observed state has been entered `expected_count` times
/// since the reference count.
///
/// With `auto_reset`, every success moves the reference to the current
/// count, so the condition re-arms for the next window of entries.
/// Without it the condition stays true once the threshold is passed.
#[derive(Clone, Copy, Debug)]
pub struct StateEntryCountCondition {
    state: StateId,
    expected_count: u64,
    auto_reset: bool,
    reference: u64,
    inverse: bool,
}

impl StateEntryCountCondition {
    pub fn new(state: StateId, expected_count: u64, auto_reset: bool) -> Self {
        Self {
            state,
            expected_count,
            auto_reset,
            reference: 0,
            inverse: false,
        }
    }

    /// Count entries from `count` on instead of from zero.
    pub fn starting_from(mut self, count: u64) -> Self {
        self.reference = count;
        self
    }

    pub fn inverted(mut self) -> Self {
        self.inverse = !self.inverse;
        self
    }

    pub fn expected_count(&self) -> u64 {
        self.expected_count
    }

    pub fn set_expected_count(&mut self, expected_count: u64) {
        self.expected_count = expected_count;
    }

    pub fn auto_reset(&self) -> bool {
        self.auto_reset
    }

    pub fn reference_count(&self) -> u64 {
        self.reference
    }

    /// Rebase the reference count to zero.
    pub fn reset_count(&mut self) {
        self.reference = 0;
    }

    pub fn state(&self) -> StateId {
        self.state
    }
}

impl<V> Condition<V> for StateEntryCountCondition {
    fn compare(&mut self, ctx: &EvalContext<'_, V>) -> bool {
        let Some(monitor) = ctx.monitor(self.state) else {
            return false;
        };
        let count = monitor.entry_count();
        if count < self.reference.saturating_add(self.expected_count) {
            return false;
        }
        if self.auto_reset {
            self.reference = count;
        }
        true
    }

    fn is_inverse(&self) -> bool {
        self.inverse
    }

    fn observed_states(&self, out: &mut Vec<StateId>) {
        out.push(self.state);
    }

    fn rebase(&mut self, _now: Instant) {
        self.reset_count();
    }
}

/// True when the observed state's custom value equals `expected`.
///
/// The expected value shares the machine's tag type `V`, so mismatched tag
/// types are rejected by the compiler.
#[derive(Clone, Debug)]
pub struct StateValueCondition<V> {
    expected: V,
    state: StateId,
    inverse: bool,
}

impl<V: PartialEq> StateValueCondition<V> {
    pub fn new(expected: V, state: StateId) -> Self {
        Self {
            expected,
            state,
            inverse: false,
        }
    }

    pub fn inverted(mut self) -> Self {
        self.inverse = !self.inverse;
        self
    }

    pub fn expected_value(&self) -> &V {
        &self.expected
    }

    pub fn set_expected_value(&mut self, expected: V) {
        self.expected = expected;
    }

    pub fn state(&self) -> StateId {
        self.state
    }
}

impl<V: PartialEq> Condition<V> for StateValueCondition<V> {
    fn compare(&mut self, ctx: &EvalContext<'_, V>) -> bool {
        ctx.monitor(self.state)
            .and_then(|m| m.custom_value())
            .is_some_and(|value| *value == self.expected)
    }

    fn is_inverse(&self) -> bool {
        self.inverse
    }

    fn observed_states(&self, out: &mut Vec<StateId>) {
        out.push(self.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::State;
    use crate::machine::Layout;

    fn layout_with<V>(state: State<V>) -> (Layout<V>, StateId) {
        let mut layout = Layout::new();
        let id = layout.add_state(state);
        (layout, id)
    }

    fn enter<V>(layout: &mut Layout<V>, id: StateId, now: Instant) {
        layout.state_mut(id).unwrap().enter(now);
    }

    #[test]
    fn entry_duration_measures_from_last_entry() {
        let (mut layout, id) = layout_with::<()>(State::monitored("s"));
        let t0 = Instant::now();
        enter(&mut layout, id, t0);
        let mut cond = StateEntryDurationCondition::new(Duration::from_millis(100), id);

        assert!(!cond.evaluate(&layout.eval_context(t0 + Duration::from_millis(50))));
        assert!(cond.evaluate(&layout.eval_context(t0 + Duration::from_millis(100))));

        let t1 = t0 + Duration::from_millis(200);
        enter(&mut layout, id, t1);
        assert!(!cond.evaluate(&layout.eval_context(t1)));
    }

    #[test]
    fn entry_duration_is_false_for_foreign_state() {
        let (_, foreign) = layout_with::<()>(State::monitored("elsewhere"));
        let (layout, _) = layout_with::<()>(State::monitored("here"));
        let mut cond = StateEntryDurationCondition::new(Duration::ZERO, foreign);

        assert!(!cond.evaluate(&layout.eval_context(Instant::now())));
    }

    #[test]
    fn entry_count_with_auto_reset_rearms() {
        let (mut layout, id) = layout_with::<()>(State::monitored("s"));
        let now = Instant::now();
        let mut cond = StateEntryCountCondition::new(id, 5, true);

        for _ in 0..4 {
            enter(&mut layout, id, now);
            assert!(!cond.evaluate(&layout.eval_context(now)));
        }
        enter(&mut layout, id, now);
        assert!(cond.evaluate(&layout.eval_context(now)));
        assert!(!cond.evaluate(&layout.eval_context(now)));

        for _ in 0..4 {
            enter(&mut layout, id, now);
        }
        assert!(!cond.evaluate(&layout.eval_context(now)));
        enter(&mut layout, id, now);
        assert!(cond.evaluate(&layout.eval_context(now)));
    }

    #[test]
    fn entry_count_without_auto_reset_latches() {
        let (mut layout, id) = layout_with::<()>(State::monitored("s"));
        let now = Instant::now();
        let mut cond = StateEntryCountCondition::new(id, 2, false);

        enter(&mut layout, id, now);
        enter(&mut layout, id, now);

        assert!(cond.evaluate(&layout.eval_context(now)));
        assert!(cond.evaluate(&layout.eval_context(now)));
        assert_eq!(cond.reference_count(), 0);
    }

    #[test]
    fn entry_count_reset_and_starting_point() {
        let (mut layout, id) = layout_with::<()>(State::monitored("s"));
        let now = Instant::now();
        for _ in 0..3 {
            enter(&mut layout, id, now);
        }

        let mut cond = StateEntryCountCondition::new(id, 2, true).starting_from(3);
        assert!(!cond.evaluate(&layout.eval_context(now)));

        cond.reset_count();
        assert!(cond.evaluate(&layout.eval_context(now)));
        assert_eq!(cond.reference_count(), 3);
    }

    #[test]
    fn value_condition_reads_custom_value() {
        let (mut layout, id) = layout_with::<u8>(State::monitored("s"));
        let now = Instant::now();
        let mut cond = StateValueCondition::new(5u8, id);

        assert!(!cond.evaluate(&layout.eval_context(now)));

        layout.state_mut(id).unwrap().set_custom_value(5).unwrap();
        assert!(cond.evaluate(&layout.eval_context(now)));

        layout.state_mut(id).unwrap().set_custom_value(3).unwrap();
        assert!(!cond.evaluate(&layout.eval_context(now)));

        cond.set_expected_value(3);
        assert!(cond.evaluate(&layout.eval_context(now)));
    }

    #[test]
    fn inverted_value_condition() {
        let (mut layout, id) = layout_with::<bool>(State::monitored("s"));
        layout.state_mut(id).unwrap().set_custom_value(true).unwrap();
        let mut cond = StateValueCondition::new(true, id).inverted();

        assert!(!cond.evaluate(&layout.eval_context(Instant::now())));
    }

    #[test]
    fn transition_monitor_counts_transits() {
        let mut monitor: TransitionMonitor<()> = TransitionMonitor::default();
        assert_eq!(monitor.last_transit_time(), None);

        let now = Instant::now();
        monitor.record_transit(now);
        monitor.record_transit(now);

        assert_eq!(monitor.transit_count(), 2);
        assert_eq!(monitor.last_transit_time(), Some(now));

        monitor.reset_transit_count();
        assert_eq!(monitor.transit_count(), 0);
    }

    #[test]
    fn state_monitor_resets() {
        let t0 = Instant::now();
        let mut monitor: StateMonitor<()> = StateMonitor::new(t0);
        monitor.record_entry(t0);
        monitor.record_entry(t0);
        assert_eq!(monitor.entry_count(), 2);

        monitor.reset_entry_count();
        let t1 = t0 + Duration::from_secs(3);
        monitor.reset_last_times(t1);

        assert_eq!(monitor.entry_count(), 0);
        assert_eq!(monitor.last_entry_time(), t1);
        assert_eq!(monitor.last_exit_time(), t1);
    }
}
