//! Ordered lists of zero-argument callbacks attached to lifecycle hooks.

use std::fmt;

/// A callback run when a lifecycle hook fires.
///
/// Actions capture whatever collaborator handles they need (an `Rc` to a
/// driver, a nested machine, a channel). The engine does not catch panics
/// raised by an action: they reach the caller of `track()` / `start()`.
pub type Action = Box<dyn FnMut()>;

/// Callbacks executed in registration order.
#[derive(Default)]
pub struct ActionList {
    actions: Vec<Action>,
}

impl ActionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action; it runs after every action already registered.
    pub fn push<F>(&mut self, action: F)
    where
        F: FnMut() + 'static,
    {
        self.actions.push(Box::new(action));
    }

    /// Run every action in registration order.
    pub fn run(&mut self) {
        for action in self.actions.iter_mut() {
            action();
        }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl fmt::Debug for ActionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionList")
            .field("len", &self.actions.len())
            .finish()
    }
}

/// The three hook lists of a state.
#[derive(Debug, Default)]
pub struct StateHooks {
    pub entering: ActionList,
    pub in_state: ActionList,
    pub exiting: ActionList,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn actions_run_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut list = ActionList::new();

        for i in 0..3 {
            let log = Rc::clone(&log);
            list.push(move || log.borrow_mut().push(i));
        }

        list.run();
        list.run();

        assert_eq!(*log.borrow(), vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn empty_list_is_a_no_op() {
        let mut list = ActionList::new();
        assert!(list.is_empty());
        list.run();
        assert_eq!(list.len(), 0);
    }

    #[test]
    fn fn_mut_actions_keep_their_own_state() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut list = ActionList::new();
        let sink = Rc::clone(&seen);
        let mut calls = 0;
        list.push(move || {
            calls += 1;
            sink.borrow_mut().push(calls);
        });

        list.run();
        list.run();

        assert_eq!(*seen.borrow(), vec![1, 2]);
    }
}
