use crate::{
    Real, Time, TraceView,
    crossing::{CrossingPolicy, find_crossing},
    statistics,
};
use std::fmt::Display;
use tracing::trace;

/// Fraction of the steady-state step kept clear of each plateau when placing thresholds.
pub const DEFAULT_MARGIN_FRACTION: Real = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Rising,
    Falling,
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Rising => write!(f, "rising"),
            Direction::Falling => write!(f, "falling"),
        }
    }
}

/// One detected edge.
///
/// All fields are fixed at construction except `offset`, a time-zero
/// correction subtracted by every time-valued accessor.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    crossing_low: Time,
    crossing_high: Time,
    window_start: Time,
    window_end: Time,
    steady_low: Real,
    steady_high: Real,
    threshold_low: Real,
    threshold_high: Real,
    direction: Direction,
    offset: Time,
}

impl Transition {
    pub fn crossing_low(&self) -> Time {
        self.crossing_low - self.offset
    }

    pub fn crossing_high(&self) -> Time {
        self.crossing_high - self.offset
    }

    pub fn window_start(&self) -> Time {
        self.window_start - self.offset
    }

    pub fn window_end(&self) -> Time {
        self.window_end - self.offset
    }

    /// Time at the middle of the transition.
    pub fn midpoint(&self) -> Time {
        self.crossing_low() + self.tau() / 2.0
    }

    /// Duration of the transition.
    pub fn tau(&self) -> Time {
        self.crossing_high - self.crossing_low
    }

    pub fn window_width(&self) -> Time {
        self.window_end - self.window_start
    }

    pub fn steady_low(&self) -> Real {
        self.steady_low
    }

    pub fn steady_high(&self) -> Real {
        self.steady_high
    }

    pub fn amplitude(&self) -> Real {
        self.steady_high - self.steady_low
    }

    /// The level halfway between the two steady states.
    pub fn half_level(&self) -> Real {
        self.steady_low + self.amplitude() / 2.0
    }

    pub fn threshold_low(&self) -> Real {
        self.threshold_low
    }

    pub fn threshold_high(&self) -> Real {
        self.threshold_high
    }

    pub fn threshold_span(&self) -> Real {
        self.threshold_high - self.threshold_low
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn offset(&self) -> Time {
        self.offset
    }

    pub fn set_offset(&mut self, offset: Time) {
        self.offset = offset;
    }
}

/// Characterises the single edge inside a smoothed edge window.
///
/// The window is split after the last crossing of its mid-level. Median levels
/// either side give the steady states; thresholds sit `margin_fraction` of the
/// step inside each plateau. The transition runs from the last low-side
/// threshold crossing before the split to the first high-side crossing after it.
///
/// Returns `None` when the window holds no edge.
pub fn analyse_transition(edge: TraceView<'_>, margin_fraction: Real) -> Option<Transition> {
    let (min, max) = statistics::min_max(edge.values())?;
    let mid = 0.5 * (min + max);
    let split = find_crossing(edge, mid, CrossingPolicy::Last)
        .inspect_err(|e| trace!("Edge window: {e}"))
        .ok()?;

    let (left, right) = edge.split_after(split.index);
    let left_steady = statistics::median(left.values())?;
    let right_steady = statistics::median(right.values())?;

    let direction = if left_steady < right_steady {
        Direction::Rising
    } else {
        Direction::Falling
    };
    let margin = margin_fraction * (left_steady - right_steady).abs();
    let (left_threshold, right_threshold) = match direction {
        Direction::Rising => (left_steady + margin, right_steady - margin),
        Direction::Falling => (left_steady - margin, right_steady + margin),
    };

    let low = find_crossing(left, left_threshold, CrossingPolicy::Last)
        .inspect_err(|e| trace!("Left of split: {e}"))
        .ok()?;
    let high = find_crossing(right, right_threshold, CrossingPolicy::First)
        .inspect_err(|e| trace!("Right of split: {e}"))
        .ok()?;

    Some(Transition {
        crossing_low: low.time,
        crossing_high: high.time,
        window_start: edge.first_time()?,
        window_end: edge.last_time()?,
        steady_low: left_steady.min(right_steady),
        steady_high: left_steady.max(right_steady),
        threshold_low: left_threshold.min(right_threshold),
        threshold_high: left_threshold.max(right_threshold),
        direction,
        offset: 0.0,
    })
}
