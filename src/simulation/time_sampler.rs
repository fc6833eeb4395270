//! Uniform instant sampling inside a time window
//!
//! Registration and order times are drawn uniformly at one-second resolution from a
//! closed interval. An inverted interval is not an error: it resolves to the lower bound,
//! which is also what a zero-length interval returns.

use chrono::{Duration, NaiveDateTime, Timelike};
use rand::Rng;
use tracing::debug;

/// Draws uniformly random instants inside closed time intervals
#[derive(Debug, Default, Clone, Copy)]
pub struct TemporalConstraintSampler;

impl TemporalConstraintSampler {
    /// Create a sampler
    pub fn new() -> Self {
        Self
    }

    /// Draw an instant in `[lower, upper]` at one-second resolution
    ///
    /// Returns `lower` unchanged when `upper <= lower`. Sub-second parts of the bounds are
    /// respected: the lowest candidate is the first whole second at or after `lower`, the
    /// highest is the last whole second at or before `upper`.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        lower: NaiveDateTime,
        upper: NaiveDateTime,
        rng: &mut R,
    ) -> NaiveDateTime {
        if upper <= lower {
            if upper < lower {
                debug!(%lower, %upper, "Inverted interval, falling back to lower bound");
            }
            return lower;
        }

        let first = ceil_to_second(lower);
        let last = floor_to_second(upper);
        if last < first {
            // Both bounds sit inside the same second.
            return lower;
        }

        let span = (last - first).num_seconds();
        first + Duration::seconds(rng.gen_range(0..=span))
    }
}

fn floor_to_second(value: NaiveDateTime) -> NaiveDateTime {
    value.with_nanosecond(0).unwrap_or(value)
}

fn ceil_to_second(value: NaiveDateTime) -> NaiveDateTime {
    let floor = floor_to_second(value);
    if floor == value {
        value
    } else {
        floor + Duration::seconds(1)
    }
}
