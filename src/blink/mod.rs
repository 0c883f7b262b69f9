//! Blink patterns built on top of the generic engine.
//!
//! [`Blinkers`] turns an on/off pair of states into five timed policies;
//! [`SideBlinkers`] coordinates two of them.

mod blinkers;
mod error;
mod params;
mod request;
mod side;

pub use blinkers::Blinkers;
pub use error::BlinkError;
pub use params::BlinkerParams;
pub use request::{BlinkRequest, CycleSpan, Level};
pub use side::{Side, SideBlinkers};
