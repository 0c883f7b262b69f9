//! Blink requests: one variant per policy, each carrying only its fields.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::BlinkError;

/// Output level of a blinker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    On,
    Off,
}

impl Level {
    pub fn inverse(self) -> Self {
        match self {
            Self::On => Self::Off,
            Self::Off => Self::On,
        }
    }
}

/// How the length of a cycle-count blink is given.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CycleSpan {
    /// Length of one cycle; the total is `n_cycles` times it.
    CycleDuration(Duration),
    /// Length of the whole blink; one cycle is the total over `n_cycles`.
    TotalDuration(Duration),
}

/// What a [`Blinkers`](super::Blinkers) should do next.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use tempo_fsm::blink::BlinkRequest;
///
/// let request = BlinkRequest::Continuous {
///     cycle_duration: Duration::from_secs(1),
///     percent_on: 0.25,
///     begin_on: true,
/// };
/// assert!(request.validate().is_ok());
///
/// let BlinkRequest::Continuous { percent_on, begin_on, .. } = request.reciprocal() else {
///     unreachable!()
/// };
/// assert_eq!(percent_on, 0.75);
/// assert!(!begin_on);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BlinkRequest {
    /// Stay on or off until told otherwise.
    Hold(Level),
    /// Stay at `level` for `duration`, then hold the opposite level.
    TimedHold { level: Level, duration: Duration },
    /// Alternate forever.
    Continuous {
        cycle_duration: Duration,
        percent_on: f64,
        begin_on: bool,
    },
    /// Alternate for `total_duration`, then hold off (`end_off`) or on.
    ForDuration {
        total_duration: Duration,
        cycle_duration: Duration,
        percent_on: f64,
        begin_on: bool,
        end_off: bool,
    },
    /// Alternate for `n_cycles` cycles, then hold off (`end_off`) or on.
    Cycles {
        n_cycles: u32,
        span: CycleSpan,
        percent_on: f64,
        begin_on: bool,
        end_off: bool,
    },
}

/// Durations resolved from a validated request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum BlinkPlan {
    Hold(Level),
    TimedHold {
        level: Level,
        duration: Duration,
    },
    Continuous {
        on: Duration,
        off: Duration,
        begin_on: bool,
    },
    Bounded {
        total: Duration,
        on: Duration,
        off: Duration,
        begin_on: bool,
        end_off: bool,
    },
}

impl BlinkRequest {
    /// Check every field without touching any machine.
    pub fn validate(&self) -> Result<(), BlinkError> {
        self.plan().map(|_| ())
    }

    /// The phase-inverted counterpart used by reciprocal strategies.
    ///
    /// Holds switch level; blinks use `1 - percent_on` and start on the
    /// opposite level.
    pub fn reciprocal(&self) -> Self {
        match *self {
            Self::Hold(level) => Self::Hold(level.inverse()),
            Self::TimedHold { level, duration } => Self::TimedHold {
                level: level.inverse(),
                duration,
            },
            Self::Continuous {
                cycle_duration,
                percent_on,
                begin_on,
            } => Self::Continuous {
                cycle_duration,
                percent_on: 1.0 - percent_on,
                begin_on: !begin_on,
            },
            Self::ForDuration {
                total_duration,
                cycle_duration,
                percent_on,
                begin_on,
                end_off,
            } => Self::ForDuration {
                total_duration,
                cycle_duration,
                percent_on: 1.0 - percent_on,
                begin_on: !begin_on,
                end_off,
            },
            Self::Cycles {
                n_cycles,
                span,
                percent_on,
                begin_on,
                end_off,
            } => Self::Cycles {
                n_cycles,
                span,
                percent_on: 1.0 - percent_on,
                begin_on: !begin_on,
                end_off,
            },
        }
    }

    pub(crate) fn plan(&self) -> Result<BlinkPlan, BlinkError> {
        match *self {
            Self::Hold(level) => Ok(BlinkPlan::Hold(level)),
            Self::TimedHold { level, duration } => {
                positive("duration", duration)?;
                Ok(BlinkPlan::TimedHold { level, duration })
            }
            Self::Continuous {
                cycle_duration,
                percent_on,
                begin_on,
            } => {
                check_percent(percent_on)?;
                positive("cycle_duration", cycle_duration)?;
                let (on, off) = split_cycle(cycle_duration, percent_on);
                Ok(BlinkPlan::Continuous { on, off, begin_on })
            }
            Self::ForDuration {
                total_duration,
                cycle_duration,
                percent_on,
                begin_on,
                end_off,
            } => {
                check_percent(percent_on)?;
                positive("total_duration", total_duration)?;
                positive("cycle_duration", cycle_duration)?;
                let (on, off) = split_cycle(cycle_duration, percent_on);
                Ok(BlinkPlan::Bounded {
                    total: total_duration,
                    on,
                    off,
                    begin_on,
                    end_off,
                })
            }
            Self::Cycles {
                n_cycles,
                span,
                percent_on,
                begin_on,
                end_off,
            } => {
                check_percent(percent_on)?;
                if n_cycles == 0 {
                    return Err(BlinkError::InvalidCycleCount(n_cycles));
                }
                let (total, cycle) = match span {
                    CycleSpan::TotalDuration(total) => {
                        positive("total_duration", total)?;
                        (total, total / n_cycles)
                    }
                    CycleSpan::CycleDuration(cycle) => {
                        positive("cycle_duration", cycle)?;
                        let total = cycle
                            .checked_mul(n_cycles)
                            .ok_or(BlinkError::DurationOverflow)?;
                        (total, cycle)
                    }
                };
                let (on, off) = split_cycle(cycle, percent_on);
                Ok(BlinkPlan::Bounded {
                    total,
                    on,
                    off,
                    begin_on,
                    end_off,
                })
            }
        }
    }
}

fn check_percent(percent_on: f64) -> Result<(), BlinkError> {
    if (0.0..=1.0).contains(&percent_on) {
        Ok(())
    } else {
        Err(BlinkError::InvalidPercentOn(percent_on))
    }
}

fn positive(field: &'static str, duration: Duration) -> Result<(), BlinkError> {
    if duration.is_zero() {
        Err(BlinkError::NonPositiveDuration { field })
    } else {
        Ok(())
    }
}

// percent_on is already known to lie in [0, 1], so the on phase never
// exceeds the cycle even when the f64 product rounds past Duration::MAX
fn split_cycle(cycle: Duration, percent_on: f64) -> (Duration, Duration) {
    let on = Duration::try_from_secs_f64(cycle.as_secs_f64() * percent_on)
        .map_or(cycle, |on| on.min(cycle));
    (on, cycle.saturating_sub(on))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn continuous_splits_cycle_by_percent() {
        let request = BlinkRequest::Continuous {
            cycle_duration: secs(1.0),
            percent_on: 0.25,
            begin_on: true,
        };
        assert_eq!(
            request.plan(),
            Ok(BlinkPlan::Continuous {
                on: secs(0.25),
                off: secs(0.75),
                begin_on: true,
            })
        );
    }

    #[test]
    fn percent_out_of_range_is_rejected() {
        for bad in [1.5, -0.1, f64::NAN] {
            let request = BlinkRequest::Continuous {
                cycle_duration: secs(1.0),
                percent_on: bad,
                begin_on: true,
            };
            assert!(matches!(
                request.validate(),
                Err(BlinkError::InvalidPercentOn(_))
            ));
        }
    }

    #[test]
    fn percent_bounds_are_accepted() {
        for edge in [0.0, 1.0] {
            let request = BlinkRequest::Continuous {
                cycle_duration: secs(1.0),
                percent_on: edge,
                begin_on: false,
            };
            assert!(request.validate().is_ok());
        }
    }

    #[test]
    fn zero_durations_are_rejected() {
        let hold = BlinkRequest::TimedHold {
            level: Level::On,
            duration: Duration::ZERO,
        };
        assert_eq!(
            hold.validate(),
            Err(BlinkError::NonPositiveDuration { field: "duration" })
        );

        let bounded = BlinkRequest::ForDuration {
            total_duration: secs(3.0),
            cycle_duration: Duration::ZERO,
            percent_on: 0.5,
            begin_on: true,
            end_off: true,
        };
        assert_eq!(
            bounded.validate(),
            Err(BlinkError::NonPositiveDuration {
                field: "cycle_duration"
            })
        );
    }

    #[test]
    fn cycles_from_total_divide_the_total() {
        let request = BlinkRequest::Cycles {
            n_cycles: 4,
            span: CycleSpan::TotalDuration(secs(2.0)),
            percent_on: 0.5,
            begin_on: true,
            end_off: false,
        };
        assert_eq!(
            request.plan(),
            Ok(BlinkPlan::Bounded {
                total: secs(2.0),
                on: secs(0.25),
                off: secs(0.25),
                begin_on: true,
                end_off: false,
            })
        );
    }

    #[test]
    fn cycles_from_cycle_multiply_the_cycle() {
        let request = BlinkRequest::Cycles {
            n_cycles: 3,
            span: CycleSpan::CycleDuration(secs(0.5)),
            percent_on: 0.0,
            begin_on: false,
            end_off: true,
        };
        let Ok(BlinkPlan::Bounded { total, on, off, .. }) = request.plan() else {
            panic!("expected a bounded plan");
        };
        assert_eq!(total, secs(1.5));
        assert_eq!(on, Duration::ZERO);
        assert_eq!(off, secs(0.5));
    }

    #[test]
    fn zero_cycles_are_rejected() {
        let request = BlinkRequest::Cycles {
            n_cycles: 0,
            span: CycleSpan::CycleDuration(secs(1.0)),
            percent_on: 0.5,
            begin_on: true,
            end_off: true,
        };
        assert_eq!(request.validate(), Err(BlinkError::InvalidCycleCount(0)));
    }

    #[test]
    fn cycle_count_overflow_is_reported() {
        let request = BlinkRequest::Cycles {
            n_cycles: u32::MAX,
            span: CycleSpan::CycleDuration(Duration::MAX),
            percent_on: 0.5,
            begin_on: true,
            end_off: true,
        };
        assert_eq!(request.validate(), Err(BlinkError::DurationOverflow));
    }

    #[test]
    fn longest_cycle_splits_without_overflow() {
        let full = BlinkRequest::Continuous {
            cycle_duration: Duration::MAX,
            percent_on: 1.0,
            begin_on: true,
        };
        assert_eq!(
            full.plan(),
            Ok(BlinkPlan::Continuous {
                on: Duration::MAX,
                off: Duration::ZERO,
                begin_on: true,
            })
        );

        let bounded = BlinkRequest::ForDuration {
            total_duration: Duration::MAX,
            cycle_duration: Duration::MAX,
            percent_on: 0.5,
            begin_on: false,
            end_off: true,
        };
        let Ok(BlinkPlan::Bounded { on, off, .. }) = bounded.plan() else {
            panic!("expected a bounded plan");
        };
        assert_eq!(on + off, Duration::MAX);

        let cycles = BlinkRequest::Cycles {
            n_cycles: 1,
            span: CycleSpan::TotalDuration(Duration::MAX),
            percent_on: 1.0,
            begin_on: true,
            end_off: false,
        };
        assert!(cycles.validate().is_ok());
    }

    #[test]
    fn reciprocal_of_hold_switches_level() {
        assert_eq!(
            BlinkRequest::Hold(Level::On).reciprocal(),
            BlinkRequest::Hold(Level::Off)
        );
        let timed = BlinkRequest::TimedHold {
            level: Level::Off,
            duration: secs(2.0),
        };
        assert_eq!(
            timed.reciprocal(),
            BlinkRequest::TimedHold {
                level: Level::On,
                duration: secs(2.0),
            }
        );
    }

    #[test]
    fn reciprocal_keeps_end_level() {
        let request = BlinkRequest::ForDuration {
            total_duration: secs(3.0),
            cycle_duration: secs(1.0),
            percent_on: 0.3,
            begin_on: true,
            end_off: true,
        };
        let BlinkRequest::ForDuration {
            percent_on,
            begin_on,
            end_off,
            ..
        } = request.reciprocal()
        else {
            panic!("variant changed");
        };
        assert!((percent_on - 0.7).abs() < 1e-12);
        assert!(!begin_on);
        assert!(end_off);
    }
}
