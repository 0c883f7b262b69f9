//! Two blinkers driven together: independent, synchronised or reciprocal.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::blinkers::Blinkers;
use super::error::BlinkError;
use super::params::BlinkerParams;
use super::request::{BlinkRequest, Level};
use crate::core::{Clock, FsmError, State, SystemClock};

/// Which channel(s) a command targets.
///
/// Reciprocal sides apply the request to the named channel and its
/// phase-inverted counterpart to the other one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
    Both,
    LeftReciprocal,
    RightReciprocal,
}

impl Side {
    /// Requests for the (left, right) channels.
    fn dispatch(self, request: BlinkRequest) -> (Option<BlinkRequest>, Option<BlinkRequest>) {
        match self {
            Self::Left => (Some(request), None),
            Self::Right => (None, Some(request)),
            Self::Both => (Some(request), Some(request)),
            Self::LeftReciprocal => (Some(request), Some(request.reciprocal())),
            Self::RightReciprocal => (Some(request.reciprocal()), Some(request)),
        }
    }
}

/// Left and right [`Blinkers`] behind one command surface.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use tempo_fsm::blink::{BlinkRequest, Side, SideBlinkers};
/// use tempo_fsm::core::{ManualClock, State};
///
/// let clock = ManualClock::new();
/// let mut blinkers = SideBlinkers::with_clock(
///     || State::new("left off"),
///     || State::new("left on"),
///     || State::new("right off"),
///     || State::new("right on"),
///     clock.clone(),
/// )
/// .unwrap();
///
/// blinkers.turn_on(Side::LeftReciprocal, None).unwrap();
/// assert_eq!(blinkers.is_on(Side::Left), Ok(true));
/// assert_eq!(blinkers.is_on(Side::Right), Ok(false));
/// assert!(blinkers.is_on(Side::Both).is_err());
/// ```
#[derive(Debug)]
pub struct SideBlinkers {
    left: Blinkers,
    right: Blinkers,
}

impl SideBlinkers {
    pub fn new<LF, LN, RF, RN>(
        left_off: LF,
        left_on: LN,
        right_off: RF,
        right_on: RN,
    ) -> Result<Self, FsmError>
    where
        LF: FnMut() -> State<bool>,
        LN: FnMut() -> State<bool>,
        RF: FnMut() -> State<bool>,
        RN: FnMut() -> State<bool>,
    {
        Self::with_clock(left_off, left_on, right_off, right_on, SystemClock)
    }

    /// Both channels read clones of `clock`.
    pub fn with_clock<LF, LN, RF, RN, C>(
        left_off: LF,
        left_on: LN,
        right_off: RF,
        right_on: RN,
        clock: C,
    ) -> Result<Self, FsmError>
    where
        LF: FnMut() -> State<bool>,
        LN: FnMut() -> State<bool>,
        RF: FnMut() -> State<bool>,
        RN: FnMut() -> State<bool>,
        C: Clock + Clone + 'static,
    {
        Ok(Self {
            left: Blinkers::with_clock(left_off, left_on, clock.clone())?,
            right: Blinkers::with_clock(right_off, right_on, clock)?,
        })
    }

    /// Whether a single channel is on. Only `Left` and `Right` are accepted.
    pub fn is_on(&self, side: Side) -> Result<bool, BlinkError> {
        Ok(self.single(side)?.is_on())
    }

    /// Whether a single channel is off. Only `Left` and `Right` are accepted.
    pub fn is_off(&self, side: Side) -> Result<bool, BlinkError> {
        Ok(self.single(side)?.is_off())
    }

    /// Turn on, for `duration` when given. Reciprocal sides turn the other
    /// channel off.
    pub fn turn_on(&mut self, side: Side, duration: Option<Duration>) -> Result<(), BlinkError> {
        self.dispatch(side, hold(Level::On, duration))
    }

    /// Turn off, for `duration` when given. Reciprocal sides turn the other
    /// channel on.
    pub fn turn_off(&mut self, side: Side, duration: Option<Duration>) -> Result<(), BlinkError> {
        self.dispatch(side, hold(Level::Off, duration))
    }

    /// Reset both channels, then start `request` on `side`.
    ///
    /// The request is validated before either channel is touched.
    pub fn blink(&mut self, side: Side, request: BlinkRequest) -> Result<(), BlinkError> {
        request.validate()?;
        self.left.reset();
        self.right.reset();
        self.dispatch(side, request)
    }

    /// Resolve collaborator-facing parameters and blink accordingly.
    pub fn apply_params(&mut self, params: &BlinkerParams) -> Result<(), BlinkError> {
        let request = params.into_request()?;
        self.blink(params.side, request)
    }

    /// Step both channels.
    pub fn track(&mut self) {
        self.left.track();
        self.right.track();
    }

    pub fn left(&self) -> &Blinkers {
        &self.left
    }

    pub fn left_mut(&mut self) -> &mut Blinkers {
        &mut self.left
    }

    pub fn right(&self) -> &Blinkers {
        &self.right
    }

    pub fn right_mut(&mut self) -> &mut Blinkers {
        &mut self.right
    }

    fn single(&self, side: Side) -> Result<&Blinkers, BlinkError> {
        match side {
            Side::Left => Ok(&self.left),
            Side::Right => Ok(&self.right),
            other => Err(BlinkError::UnsupportedSide(other)),
        }
    }

    fn dispatch(&mut self, side: Side, request: BlinkRequest) -> Result<(), BlinkError> {
        request.validate()?;
        let (left, right) = side.dispatch(request);
        if let Some(request) = left {
            self.left.blink(request)?;
        }
        if let Some(request) = right {
            self.right.blink(request)?;
        }
        Ok(())
    }
}

fn hold(level: Level, duration: Option<Duration>) -> BlinkRequest {
    match duration {
        Some(duration) => BlinkRequest::TimedHold { level, duration },
        None => BlinkRequest::Hold(level),
    }
}
