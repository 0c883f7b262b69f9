//! Property-based tests for conditions, stepping and blink requests.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use std::time::{Duration, Instant};

use chrono::Utc;
use proptest::prelude::*;
use tempo_fsm::blink::{BlinkError, BlinkRequest, Level};
use tempo_fsm::core::{
    AlwaysTrue, Condition, EvalContext, ManualClock, ManyConditions, State,
    StateEntryCountCondition, StateTransition, TimedCondition, Transition, TransitionLog,
};
use tempo_fsm::machine::{FiniteStateMachine, Layout};

prop_compose! {
    fn arbitrary_flags()(flags in prop::collection::vec(any::<bool>(), 1..8)) -> Vec<bool> {
        flags
    }
}

fn constant(value: bool) -> AlwaysTrue {
    if value {
        AlwaysTrue::new()
    } else {
        AlwaysTrue::new().inverted()
    }
}

fn composite(mut many: ManyConditions, flags: &[bool]) -> ManyConditions {
    for &flag in flags {
        many.add_condition(constant(flag));
    }
    many
}

proptest! {
    #[test]
    fn inversion_negates_evaluation(flags in arbitrary_flags()) {
        let ctx: EvalContext<'_> = EvalContext::detached(Instant::now());
        let mut plain = composite(ManyConditions::all(), &flags);
        let mut inverted = composite(ManyConditions::all().inverted(), &flags);
        prop_assert_eq!(plain.evaluate(&ctx), !inverted.evaluate(&ctx));
    }

    #[test]
    fn composites_match_iterator_semantics(flags in arbitrary_flags()) {
        let ctx: EvalContext<'_> = EvalContext::detached(Instant::now());
        let mut all = composite(ManyConditions::all(), &flags);
        let mut any = composite(ManyConditions::any(), &flags);
        let mut none = composite(ManyConditions::none(), &flags);

        prop_assert_eq!(all.evaluate(&ctx), flags.iter().all(|&f| f));
        prop_assert_eq!(any.evaluate(&ctx), flags.iter().any(|&f| f));
        prop_assert_eq!(none.evaluate(&ctx), !flags.iter().any(|&f| f));
    }

    #[test]
    fn first_firing_transition_wins(flags in arbitrary_flags()) {
        let mut layout: Layout = Layout::new();
        let source = layout.add_state(State::new("source"));
        let mut targets = Vec::new();
        for (i, &flag) in flags.iter().enumerate() {
            let target = layout.add_state(State::new(format!("target {i}")));
            layout
                .add_transition(source, Transition::new(constant(flag)).to(target))
                .unwrap();
            targets.push(target);
        }
        layout.set_initial_state(source).unwrap();

        let mut fsm = FiniteStateMachine::with_clock(layout, ManualClock::new()).unwrap();
        fsm.track();

        let expected = flags
            .iter()
            .position(|&f| f)
            .map_or(source, |i| targets[i]);
        prop_assert_eq!(fsm.current_applicative_state(), expected);
    }

    #[test]
    fn entry_count_fires_once_per_window(expected in 1u64..6, windows in 1usize..5) {
        let mut layout: Layout = Layout::new();
        let counted = layout.add_state(State::monitored("counted"));
        let other = layout.add_state(State::monitored("other"));
        layout.add_transition(counted, Transition::always().to(other)).unwrap();
        layout.add_transition(other, Transition::always().to(counted)).unwrap();
        layout.set_initial_state(other).unwrap();

        let mut condition = StateEntryCountCondition::new(counted, expected, true);
        let mut fsm = FiniteStateMachine::with_clock(layout, ManualClock::new()).unwrap();

        let mut fired_at = Vec::new();
        let total_entries = expected as usize * windows;
        for entry in 1..=total_entries {
            // other -> counted
            fsm.track();
            let ctx = fsm.layout().eval_context(fsm.now());
            if condition.evaluate(&ctx) {
                fired_at.push(entry);
            }
            // counted -> other
            fsm.track();
        }

        let expected_at: Vec<usize> = (1..=windows).map(|w| w * expected as usize).collect();
        prop_assert_eq!(fired_at, expected_at);
    }

    #[test]
    fn timed_condition_never_flickers(duration_ms in 1u64..500, steps in prop::collection::vec(0u64..100, 1..30)) {
        let start = Instant::now();
        let mut condition =
            TimedCondition::starting_at(Duration::from_millis(duration_ms), start).unwrap();

        let mut now = start;
        let mut seen_true = false;
        for step in steps {
            now += Duration::from_millis(step);
            let ctx: EvalContext<'_> = EvalContext::detached(now);
            let value = condition.evaluate(&ctx);
            prop_assert!(!(seen_true && !value));
            prop_assert_eq!(value, now - start >= Duration::from_millis(duration_ms));
            seen_true |= value;
        }
    }

    #[test]
    fn reciprocal_is_an_involution(percent_on in 0.0f64..=1.0, begin_on in any::<bool>()) {
        let request = BlinkRequest::Continuous {
            cycle_duration: Duration::from_secs(1),
            percent_on,
            begin_on,
        };
        let BlinkRequest::Continuous { percent_on: back, begin_on: back_on, .. } =
            request.reciprocal().reciprocal()
        else {
            panic!("variant changed");
        };
        prop_assert!((back - percent_on).abs() < 1e-12);
        prop_assert_eq!(back_on, begin_on);
        prop_assert!(request.reciprocal().validate().is_ok());

        let hold = BlinkRequest::Hold(Level::On);
        prop_assert_eq!(hold.reciprocal().reciprocal(), hold);
    }

    #[test]
    fn percent_outside_unit_interval_is_rejected(percent_on in prop_oneof![-10.0f64..-1e-9, 1.0f64 + 1e-9..10.0]) {
        let request = BlinkRequest::Continuous {
            cycle_duration: Duration::from_secs(1),
            percent_on,
            begin_on: true,
        };
        prop_assert_eq!(request.validate(), Err(BlinkError::InvalidPercentOn(percent_on)));
    }

    #[test]
    fn transition_log_keeps_most_recent(capacity in 1usize..6, count in 0usize..12) {
        let mut log = TransitionLog::new(capacity);
        for i in 0..count {
            log.record(StateTransition {
                from: format!("s{i}"),
                to: format!("s{}", i + 1),
                timestamp: Utc::now(),
                forced: false,
            });
        }

        prop_assert_eq!(log.len(), count.min(capacity));
        if count > 0 {
            let last = log.iter().last().map(|t| t.to.clone());
            prop_assert_eq!(last, Some(format!("s{count}")));
        }
    }

    #[test]
    fn log_roundtrip_serialization(count in 0usize..5) {
        let mut log = TransitionLog::new(8);
        for i in 0..count {
            log.record(StateTransition {
                from: format!("s{i}"),
                to: format!("s{}", i + 1),
                timestamp: Utc::now(),
                forced: i % 2 == 0,
            });
        }

        let json = serde_json::to_string(&log).unwrap();
        let restored: TransitionLog = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(restored.iter().collect::<Vec<_>>(), log.iter().collect::<Vec<_>>());
    }
}
