//! Errors raised by blink requests and blinker construction.

use thiserror::Error;

use super::side::Side;
use crate::core::FsmError;

/// Reasons a blink request is refused before it touches the machine.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BlinkError {
    #[error("Invalid percent_on {0}, expected a value between 0 and 1")]
    InvalidPercentOn(f64),

    #[error("Invalid {field}, expected a duration greater than 0")]
    NonPositiveDuration { field: &'static str },

    #[error("Invalid {field} of {value} seconds, expected a finite number greater than 0")]
    InvalidSeconds { field: &'static str, value: f64 },

    #[error("Invalid n_cycles {0}, expected a value greater than 0")]
    InvalidCycleCount(u32),

    #[error("Total blink duration does not fit in a Duration")]
    DurationOverflow,

    #[error("Only the left or right side can be queried, got {0:?}")]
    UnsupportedSide(Side),

    #[error("Ambiguous blink parameters: {0}")]
    AmbiguousParams(String),

    #[error(transparent)]
    Machine(#[from] FsmError),
}
