//! Traffic Light State Machine
//!
//! A cyclic machine run in real time with a time budget.
//!
//! Key concepts:
//! - Monitored states and entry-duration conditions
//! - Entering and in-state hooks
//! - `start` with a time budget and a transition log
//!
//! Run with: RUST_LOG=tempo_fsm=debug cargo run --example traffic_light

use std::thread;
use std::time::Duration;

use tempo_fsm::core::{State, StateEntryDurationCondition, SystemClock, Transition};
use tempo_fsm::machine::{FiniteStateMachine, Layout, MachineConfig};
use tempo_fsm::FsmError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn light(name: &'static str) -> Result<State, FsmError> {
    let mut state = State::monitored(name);
    state
        .add_entering_action(move || println!("  light is now {name}"))?
        .add_in_state_action(|| thread::sleep(Duration::from_millis(20)))?;
    Ok(state)
}

fn main() -> Result<(), FsmError> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    println!("=== Traffic Light State Machine ===\n");

    let mut layout: Layout = Layout::new();
    let red = layout.add_state(light("red")?);
    let green = layout.add_state(light("green")?);
    let yellow = layout.add_state(light("yellow")?);

    for (from, to, secs) in [(red, green, 2.0), (green, yellow, 1.5), (yellow, red, 0.5)] {
        let held = StateEntryDurationCondition::new(Duration::from_secs_f64(secs), from);
        layout.add_transition(from, Transition::new(held).to(to))?;
    }
    layout.set_initial_state(red)?;

    let config = MachineConfig::default().with_history(32);
    let mut machine = FiniteStateMachine::with_config(layout, config, SystemClock)?;

    println!("Running for 9 seconds:");
    let outcome = machine.start(true, Some(Duration::from_secs(9)))?;
    println!("\nRun ended: {outcome:?}");

    if let Some(history) = machine.history() {
        println!("Path: {}", history.get_path().join(" -> "));
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
