//! Side Blinkers
//!
//! Two indicator channels driven by collaborator-style blink parameters.
//!
//! Key concepts:
//! - `BlinkerParams` parsed from JSON-like records
//! - Reciprocal blinking across both channels
//! - Polling `track` from a plain loop
//!
//! Run with: RUST_LOG=tempo_fsm=debug cargo run --example side_blinkers

use std::thread;
use std::time::Duration;

use tempo_fsm::blink::{BlinkError, BlinkerParams, Side, SideBlinkers};
use tempo_fsm::core::State;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const STEP: Duration = Duration::from_millis(100);

fn render(sides: &SideBlinkers) -> Result<String, BlinkError> {
    let lamp = |on: bool| if on { '*' } else { '.' };
    Ok(format!(
        "[{}] [{}]",
        lamp(sides.is_on(Side::Left)?),
        lamp(sides.is_on(Side::Right)?)
    ))
}

fn main() -> Result<(), BlinkError> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    println!("=== Side Blinkers ===\n");

    let mut sides = SideBlinkers::new(
        || State::new("left off"),
        || State::new("left on"),
        || State::new("right off"),
        || State::new("right on"),
    )?;

    let scenarios = [
        BlinkerParams::new(Side::Both).with_cycle_duration(0.8),
        BlinkerParams::new(Side::LeftReciprocal)
            .with_percent_on(0.3)
            .with_total_duration(3.0),
        BlinkerParams::new(Side::Right)
            .with_n_cycles(2)
            .with_cycle_duration(1.0)
            .with_end_off(false),
    ];

    for params in &scenarios {
        println!("{params:?}");
        sides.apply_params(params)?;
        for _ in 0..40 {
            sides.track();
            println!("  {}", render(&sides)?);
            thread::sleep(STEP);
        }
        println!();
    }

    println!("=== Example Complete ===");
    Ok(())
}
