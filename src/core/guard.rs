//! Closure-backed conditions.
//!
//! Guards let callers plug an arbitrary predicate into a transition
//! without writing a `Condition` implementation by hand.

use std::fmt;

use super::condition::{Condition, EvalContext};

/// Condition that defers to a user predicate.
///
/// The predicate is called once per evaluation and may keep its own state.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use std::time::Instant;
/// use tempo_fsm::core::{Condition, EvalContext, Guard};
///
/// let door_open = Rc::new(Cell::new(false));
/// let flag = Rc::clone(&door_open);
/// let mut guard = Guard::new(move || flag.get());
///
/// let ctx: EvalContext<'_> = EvalContext::detached(Instant::now());
/// assert!(!guard.evaluate(&ctx));
///
/// door_open.set(true);
/// assert!(guard.evaluate(&ctx));
/// ```
pub struct Guard {
    predicate: Box<dyn FnMut() -> bool>,
    inverse: bool,
}

impl Guard {
    pub fn new<F>(predicate: F) -> Self
    where
        F: FnMut() -> bool + 'static,
    {
        Self {
            predicate: Box::new(predicate),
            inverse: false,
        }
    }

    pub fn inverted(mut self) -> Self {
        self.inverse = !self.inverse;
        self
    }

    /// Call the predicate, ignoring inversion.
    pub fn check(&mut self) -> bool {
        (self.predicate)()
    }
}

impl<V> Condition<V> for Guard {
    fn compare(&mut self, _ctx: &EvalContext<'_, V>) -> bool {
        self.check()
    }

    fn is_inverse(&self) -> bool {
        self.inverse
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard")
            .field("inverse", &self.inverse)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Instant;

    fn ctx() -> EvalContext<'static, ()> {
        EvalContext::detached(Instant::now())
    }

    #[test]
    fn guard_follows_predicate() {
        let flag = Rc::new(Cell::new(true));
        let f = Rc::clone(&flag);
        let mut guard = Guard::new(move || f.get());

        assert!(Condition::<()>::evaluate(&mut guard, &ctx()));
        flag.set(false);
        assert!(!Condition::<()>::evaluate(&mut guard, &ctx()));
    }

    #[test]
    fn inverted_guard_negates_predicate() {
        let mut guard = Guard::new(|| true).inverted();
        assert!(guard.check());
        assert!(!Condition::<()>::evaluate(&mut guard, &ctx()));
    }

    #[test]
    fn guard_predicate_can_keep_state() {
        let mut calls = 0;
        let mut every_third = Guard::new(move || {
            calls += 1;
            calls % 3 == 0
        });

        let results: Vec<bool> = (0..6)
            .map(|_| Condition::<()>::evaluate(&mut every_third, &ctx()))
            .collect();
        assert_eq!(results, vec![false, false, true, false, false, true]);
    }

    #[test]
    fn guard_is_always_valid() {
        let guard = Guard::new(|| false);
        assert!(Condition::<()>::is_valid(&guard));
    }
}
