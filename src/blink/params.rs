//! Collaborator-facing blink parameters.
//!
//! Output drivers describe a blink as a flat record with optional fields,
//! durations in seconds. [`BlinkerParams::into_request`] resolves which
//! policy the present fields select.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::BlinkError;
use super::request::{BlinkRequest, CycleSpan};
use super::side::Side;

const DEFAULT_CYCLE: Duration = Duration::from_secs(1);

fn default_percent_on() -> f64 {
    0.5
}

fn default_begin_on() -> bool {
    true
}

/// A blink described with optional fields.
///
/// # Example
///
/// ```rust
/// use tempo_fsm::blink::{BlinkRequest, BlinkerParams, Side};
///
/// let params: BlinkerParams = serde_json::from_str(
///     r#"{ "side": "left_reciprocal", "percent_on": 0.3, "total_duration": 3.0 }"#,
/// )
/// .unwrap();
///
/// assert_eq!(params.side, Side::LeftReciprocal);
/// assert!(matches!(
///     params.into_request().unwrap(),
///     BlinkRequest::ForDuration { end_off: true, .. }
/// ));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlinkerParams {
    pub side: Side,
    #[serde(default = "default_percent_on")]
    pub percent_on: f64,
    #[serde(default = "default_begin_on")]
    pub begin_on: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_cycles: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_off: Option<bool>,
}

impl BlinkerParams {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            percent_on: default_percent_on(),
            begin_on: default_begin_on(),
            cycle_duration: None,
            total_duration: None,
            n_cycles: None,
            end_off: None,
        }
    }

    pub fn with_percent_on(mut self, percent_on: f64) -> Self {
        self.percent_on = percent_on;
        self
    }

    pub fn with_begin_on(mut self, begin_on: bool) -> Self {
        self.begin_on = begin_on;
        self
    }

    pub fn with_cycle_duration(mut self, seconds: f64) -> Self {
        self.cycle_duration = Some(seconds);
        self
    }

    pub fn with_total_duration(mut self, seconds: f64) -> Self {
        self.total_duration = Some(seconds);
        self
    }

    pub fn with_n_cycles(mut self, n_cycles: u32) -> Self {
        self.n_cycles = Some(n_cycles);
        self
    }

    pub fn with_end_off(mut self, end_off: bool) -> Self {
        self.end_off = Some(end_off);
        self
    }

    /// Pick the blink policy selected by the fields that are present.
    ///
    /// | present                                 | policy                          |
    /// |-----------------------------------------|---------------------------------|
    /// | nothing                                 | continuous, 1 s cycle           |
    /// | `cycle_duration`                        | continuous                      |
    /// | `total_duration` + `n_cycles`           | cycles, cycle = total / n       |
    /// | `total_duration` (+ `cycle_duration`)   | bounded by total, 1 s cycle default |
    /// | `n_cycles` (+ `cycle_duration`)         | cycles, 1 s cycle default       |
    ///
    /// `end_off` defaults to `true` and only makes sense for bounded blinks.
    pub fn into_request(&self) -> Result<BlinkRequest, BlinkError> {
        let percent_on = self.percent_on;
        let begin_on = self.begin_on;
        let end_off = self.end_off.unwrap_or(true);
        let cycle = self
            .cycle_duration
            .map(|s| seconds("cycle_duration", s))
            .transpose()?;
        let total = self
            .total_duration
            .map(|s| seconds("total_duration", s))
            .transpose()?;

        let request = match (cycle, total, self.n_cycles) {
            (cycle, None, None) => {
                if self.end_off.is_some() {
                    return Err(BlinkError::AmbiguousParams(
                        "end_off needs total_duration or n_cycles".into(),
                    ));
                }
                BlinkRequest::Continuous {
                    cycle_duration: cycle.unwrap_or(DEFAULT_CYCLE),
                    percent_on,
                    begin_on,
                }
            }
            (Some(_), Some(_), Some(_)) => {
                return Err(BlinkError::AmbiguousParams(
                    "cycle_duration, total_duration and n_cycles cannot all be set".into(),
                ))
            }
            (None, Some(total), Some(n_cycles)) => BlinkRequest::Cycles {
                n_cycles,
                span: CycleSpan::TotalDuration(total),
                percent_on,
                begin_on,
                end_off,
            },
            (cycle, Some(total), None) => BlinkRequest::ForDuration {
                total_duration: total,
                cycle_duration: cycle.unwrap_or(DEFAULT_CYCLE),
                percent_on,
                begin_on,
                end_off,
            },
            (cycle, None, Some(n_cycles)) => BlinkRequest::Cycles {
                n_cycles,
                span: CycleSpan::CycleDuration(cycle.unwrap_or(DEFAULT_CYCLE)),
                percent_on,
                begin_on,
                end_off,
            },
        };
        request.validate()?;
        Ok(request)
    }
}

fn seconds(field: &'static str, value: f64) -> Result<Duration, BlinkError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(BlinkError::InvalidSeconds { field, value });
    }
    Duration::try_from_secs_f64(value).map_err(|_| BlinkError::InvalidSeconds { field, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_select_one_second_continuous_blink() {
        let params: BlinkerParams = serde_json::from_str(r#"{ "side": "both" }"#).unwrap();
        assert_eq!(
            params.into_request(),
            Ok(BlinkRequest::Continuous {
                cycle_duration: Duration::from_secs(1),
                percent_on: 0.5,
                begin_on: true,
            })
        );
    }

    #[test]
    fn cycle_only_selects_continuous_blink() {
        let params = BlinkerParams::new(Side::Left).with_cycle_duration(0.4);
        assert!(matches!(
            params.into_request(),
            Ok(BlinkRequest::Continuous { cycle_duration, .. })
                if cycle_duration == Duration::from_millis(400)
        ));
    }

    #[test]
    fn total_and_count_derive_cycle_from_total() {
        let params = BlinkerParams::new(Side::Right)
            .with_total_duration(2.0)
            .with_n_cycles(4)
            .with_end_off(false);
        assert_eq!(
            params.into_request(),
            Ok(BlinkRequest::Cycles {
                n_cycles: 4,
                span: CycleSpan::TotalDuration(Duration::from_secs(2)),
                percent_on: 0.5,
                begin_on: true,
                end_off: false,
            })
        );
    }

    #[test]
    fn count_alone_uses_default_cycle() {
        let params = BlinkerParams::new(Side::Left).with_n_cycles(3);
        assert!(matches!(
            params.into_request(),
            Ok(BlinkRequest::Cycles {
                span: CycleSpan::CycleDuration(cycle),
                end_off: true,
                ..
            }) if cycle == Duration::from_secs(1)
        ));
    }

    #[test]
    fn total_with_cycle_selects_bounded_blink() {
        let params = BlinkerParams::new(Side::Left)
            .with_total_duration(3.0)
            .with_cycle_duration(0.5);
        assert!(matches!(
            params.into_request(),
            Ok(BlinkRequest::ForDuration { total_duration, cycle_duration, .. })
                if total_duration == Duration::from_secs(3)
                    && cycle_duration == Duration::from_millis(500)
        ));
    }

    #[test]
    fn ambiguous_combinations_are_rejected() {
        let end_off_alone = BlinkerParams::new(Side::Left).with_end_off(true);
        let all_three = BlinkerParams::new(Side::Left)
            .with_cycle_duration(1.0)
            .with_total_duration(4.0)
            .with_n_cycles(4);

        assert!(matches!(
            end_off_alone.into_request(),
            Err(BlinkError::AmbiguousParams(_))
        ));
        assert!(matches!(
            all_three.into_request(),
            Err(BlinkError::AmbiguousParams(_))
        ));
    }

    #[test]
    fn bad_seconds_are_rejected() {
        for bad in [0.0, -1.0, f64::INFINITY] {
            let params = BlinkerParams::new(Side::Left).with_cycle_duration(bad);
            assert!(matches!(
                params.into_request(),
                Err(BlinkError::InvalidSeconds {
                    field: "cycle_duration",
                    ..
                })
            ));
        }
    }

    #[test]
    fn percent_is_validated_with_the_request() {
        let params = BlinkerParams::new(Side::Left).with_percent_on(1.5);
        assert_eq!(
            params.into_request(),
            Err(BlinkError::InvalidPercentOn(1.5))
        );
    }

    #[test]
    fn params_round_trip_through_json() {
        let params = BlinkerParams::new(Side::RightReciprocal)
            .with_total_duration(3.0)
            .with_end_off(false);
        let json = serde_json::to_string(&params).unwrap();
        assert!(!json.contains("n_cycles"));
        assert_eq!(serde_json::from_str::<BlinkerParams>(&json).unwrap(), params);
    }
}
