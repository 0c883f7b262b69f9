//! Boolean condition algebra guarding transitions.
//!
//! Every condition carries an `inverse` flag: `evaluate()` returns
//! `inverse XOR compare()`, so "not X" never needs its own type.
//! Composite conditions combine children into arbitrarily deep guards.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use super::error::FsmError;
use super::monitor::StateMonitor;
use super::state::{State, StateId};

/// What a condition can see while being evaluated: the instant of the
/// current step and read access to the states of the layout.
pub struct EvalContext<'a, V = ()> {
    layout: Option<u32>,
    states: &'a [State<V>],
    now: Instant,
}

impl<'a, V> EvalContext<'a, V> {
    pub(crate) fn new(layout: u32, states: &'a [State<V>], now: Instant) -> Self {
        Self {
            layout: Some(layout),
            states,
            now,
        }
    }

    /// A context with no states, for conditions evaluated outside a machine.
    pub fn detached(now: Instant) -> Self {
        Self {
            layout: None,
            states: &[],
            now,
        }
    }

    pub fn now(&self) -> Instant {
        self.now
    }

    /// Look up a state of the evaluating layout.
    pub fn state(&self, id: StateId) -> Option<&'a State<V>> {
        if self.layout != Some(id.layout()) {
            return None;
        }
        self.states.get(id.index())
    }

    /// Monitoring data of a state, if it exists and is monitored.
    pub fn monitor(&self, id: StateId) -> Option<&'a StateMonitor<V>> {
        self.state(id).and_then(|s| s.monitor())
    }
}

/// A predicate guarding a transition.
///
/// Implementors provide `compare`; `evaluate` applies the inverse flag.
/// Conditions may keep internal bookkeeping (e.g. an auto-rearming
/// counter), hence `&mut self`.
pub trait Condition<V = ()> {
    /// The raw predicate, before inversion.
    fn compare(&mut self, ctx: &EvalContext<'_, V>) -> bool;

    fn is_inverse(&self) -> bool {
        false
    }

    /// `false` signals a misconfigured condition (e.g. an empty composite).
    fn is_valid(&self) -> bool {
        true
    }

    /// Report the states whose monitoring data this condition reads.
    fn observed_states(&self, _out: &mut Vec<StateId>) {}

    /// Move any internal reference point to `now`. Stateless conditions
    /// ignore it.
    fn rebase(&mut self, _now: Instant) {}

    fn evaluate(&mut self, ctx: &EvalContext<'_, V>) -> bool {
        self.is_inverse() ^ self.compare(ctx)
    }
}

/// Always true (or always false when inverted).
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysTrue {
    inverse: bool,
}

impl AlwaysTrue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inverted(mut self) -> Self {
        self.inverse = !self.inverse;
        self
    }
}

impl<V> Condition<V> for AlwaysTrue {
    fn compare(&mut self, _ctx: &EvalContext<'_, V>) -> bool {
        true
    }

    fn is_inverse(&self) -> bool {
        self.inverse
    }
}

/// Shared slot observed by a [`ValueCondition`].
///
/// Collaborators keep a clone and update it; the condition reads it on
/// every evaluation.
#[derive(Debug)]
pub struct SharedValue<T>(Rc<RefCell<Option<T>>>);

impl<T> SharedValue<T> {
    pub fn new(value: Option<T>) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    pub fn set(&self, value: T) {
        *self.0.borrow_mut() = Some(value);
    }

    pub fn clear(&self) {
        *self.0.borrow_mut() = None;
    }

    pub fn is_set(&self) -> bool {
        self.0.borrow().is_some()
    }
}

impl<T: Clone> SharedValue<T> {
    pub fn get(&self) -> Option<T> {
        self.0.borrow().clone()
    }
}

impl<T> Clone for SharedValue<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

/// True when the observed value equals the expected value.
///
/// Invalid while either side is absent.
///
/// # Example
///
/// ```rust
/// use std::time::Instant;
/// use tempo_fsm::core::{Condition, EvalContext, ValueCondition};
///
/// let mut key = ValueCondition::new(3, 7);
/// let ctx: EvalContext<'_, ()> = EvalContext::detached(Instant::now());
/// assert!(!key.evaluate(&ctx));
///
/// key.value_handle().set(7);
/// assert!(key.evaluate(&ctx));
/// ```
#[derive(Debug)]
pub struct ValueCondition<T> {
    value: SharedValue<T>,
    expected: Option<T>,
    inverse: bool,
}

impl<T: PartialEq> ValueCondition<T> {
    pub fn new(value: T, expected: T) -> Self {
        Self::from_options(Some(value), Some(expected))
    }

    pub fn from_options(value: Option<T>, expected: Option<T>) -> Self {
        Self {
            value: SharedValue::new(value),
            expected,
            inverse: false,
        }
    }

    /// Observe a slot owned by a collaborator.
    pub fn watching(value: SharedValue<T>, expected: T) -> Self {
        Self {
            value,
            expected: Some(expected),
            inverse: false,
        }
    }

    pub fn inverted(mut self) -> Self {
        self.inverse = !self.inverse;
        self
    }

    pub fn value_handle(&self) -> SharedValue<T> {
        self.value.clone()
    }

    pub fn expected_value(&self) -> Option<&T> {
        self.expected.as_ref()
    }

    pub fn set_expected_value(&mut self, expected: T) {
        self.expected = Some(expected);
    }
}

impl<T: PartialEq, V> Condition<V> for ValueCondition<T> {
    fn compare(&mut self, _ctx: &EvalContext<'_, V>) -> bool {
        *self.value.0.borrow() == self.expected
    }

    fn is_inverse(&self) -> bool {
        self.inverse
    }

    fn is_valid(&self) -> bool {
        self.value.is_set() && self.expected.is_some()
    }
}

/// True once `duration` has elapsed since the reference instant.
///
/// A condition built with `new` (or `reset`) has no reference yet: it takes
/// the instant of its next evaluation, so it counts on whatever clock the
/// evaluating machine owns.
///
/// # Example
///
/// ```rust
/// use std::time::{Duration, Instant};
/// use tempo_fsm::core::{Condition, EvalContext, TimedCondition};
///
/// let mut timer = TimedCondition::new(Duration::from_millis(100)).unwrap();
/// let t0 = Instant::now();
///
/// assert!(!timer.evaluate(&EvalContext::<()>::detached(t0)));
/// assert!(timer.evaluate(&EvalContext::<()>::detached(t0 + Duration::from_millis(100))));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct TimedCondition {
    duration: Duration,
    reference: Option<Instant>,
    inverse: bool,
}

impl TimedCondition {
    /// Start counting at the first evaluation. `duration` must be strictly
    /// positive.
    pub fn new(duration: Duration) -> Result<Self, FsmError> {
        check_positive(duration)?;
        Ok(Self {
            duration,
            reference: None,
            inverse: false,
        })
    }

    /// Start counting from `reference`.
    pub fn starting_at(duration: Duration, reference: Instant) -> Result<Self, FsmError> {
        let mut condition = Self::new(duration)?;
        condition.reference = Some(reference);
        Ok(condition)
    }

    pub fn inverted(mut self) -> Self {
        self.inverse = !self.inverse;
        self
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn set_duration(&mut self, duration: Duration) -> Result<(), FsmError> {
        check_positive(duration)?;
        self.duration = duration;
        Ok(())
    }

    /// `None` until the first evaluation after construction or `reset`.
    pub fn reference(&self) -> Option<Instant> {
        self.reference
    }

    /// Restart counting from the next evaluation.
    pub fn reset(&mut self) {
        self.reference = None;
    }

    pub fn reset_at(&mut self, now: Instant) {
        self.reference = Some(now);
    }
}

impl<V> Condition<V> for TimedCondition {
    fn compare(&mut self, ctx: &EvalContext<'_, V>) -> bool {
        let reference = *self.reference.get_or_insert(ctx.now());
        ctx.now().saturating_duration_since(reference) >= self.duration
    }

    fn is_inverse(&self) -> bool {
        self.inverse
    }

    fn rebase(&mut self, now: Instant) {
        self.reset_at(now);
    }
}

fn check_positive(duration: Duration) -> Result<(), FsmError> {
    if duration.is_zero() {
        return Err(FsmError::NonPositiveDuration(duration));
    }
    Ok(())
}

/// How a [`ManyConditions`] folds its children.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quantifier {
    /// Every child is true.
    All,
    /// At least one child is true.
    Any,
    /// No child is true.
    None,
}

/// A composite condition over an ordered list of children.
///
/// Children are evaluated in order and evaluation stops as soon as the
/// result is known. A composite is valid only when it has at least one
/// child and every child is valid.
///
/// # Example
///
/// ```rust
/// use std::time::Instant;
/// use tempo_fsm::core::{AlwaysTrue, Condition, EvalContext, ManyConditions, ValueCondition};
///
/// let mut guard: ManyConditions = ManyConditions::all()
///     .with(AlwaysTrue::new())
///     .with(ValueCondition::new(5, 5));
///
/// let ctx = EvalContext::detached(Instant::now());
/// assert!(guard.evaluate(&ctx));
///
/// guard.add_condition(ValueCondition::new(10, 11));
/// assert!(!guard.evaluate(&ctx));
/// ```
pub struct ManyConditions<V = ()> {
    quantifier: Quantifier,
    conditions: Vec<Box<dyn Condition<V>>>,
    inverse: bool,
}

impl<V> ManyConditions<V> {
    pub fn new(quantifier: Quantifier) -> Self {
        Self {
            quantifier,
            conditions: Vec::new(),
            inverse: false,
        }
    }

    /// Logical AND of the children.
    pub fn all() -> Self {
        Self::new(Quantifier::All)
    }

    /// Logical OR of the children.
    pub fn any() -> Self {
        Self::new(Quantifier::Any)
    }

    /// True when no child is true.
    pub fn none() -> Self {
        Self::new(Quantifier::None)
    }

    pub fn inverted(mut self) -> Self {
        self.inverse = !self.inverse;
        self
    }

    pub fn with<C>(mut self, condition: C) -> Self
    where
        C: Condition<V> + 'static,
    {
        self.add_condition(condition);
        self
    }

    pub fn add_condition<C>(&mut self, condition: C)
    where
        C: Condition<V> + 'static,
    {
        self.conditions.push(Box::new(condition));
    }

    pub fn add_conditions<I>(&mut self, conditions: I)
    where
        I: IntoIterator<Item = Box<dyn Condition<V>>>,
    {
        self.conditions.extend(conditions);
    }

    pub fn quantifier(&self) -> Quantifier {
        self.quantifier
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

impl<V> Condition<V> for ManyConditions<V> {
    fn compare(&mut self, ctx: &EvalContext<'_, V>) -> bool {
        let mut children = self.conditions.iter_mut();
        match self.quantifier {
            Quantifier::All => children.all(|c| c.evaluate(ctx)),
            Quantifier::Any => children.any(|c| c.evaluate(ctx)),
            Quantifier::None => !children.any(|c| c.evaluate(ctx)),
        }
    }

    fn is_inverse(&self) -> bool {
        self.inverse
    }

    fn is_valid(&self) -> bool {
        !self.conditions.is_empty() && self.conditions.iter().all(|c| c.is_valid())
    }

    fn observed_states(&self, out: &mut Vec<StateId>) {
        for condition in &self.conditions {
            condition.observed_states(out);
        }
    }

    fn rebase(&mut self, now: Instant) {
        for condition in &mut self.conditions {
            condition.rebase(now);
        }
    }
}
