use crate::{Real, Time, TraceView};
use itertools::Itertools;
use thiserror::Error;

/// Which crossing to report when the series crosses the level several times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossingPolicy {
    First,
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    /// Index of the sample immediately before the sign change.
    pub index: usize,
    pub time: Time,
}

/// The series never changes side of the level. This is an analysis
/// outcome (no edge in the window) rather than a fault.
#[derive(Debug, Clone, Copy, Error, PartialEq)]
#[error("No crossing of level {level} found")]
pub struct NoCrossingFound {
    pub level: Real,
}

/// Three-valued sign, so that touching the level counts as a change of side.
fn sign(value: Real) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

/// Finds where consecutive samples of `series` straddle `level`.
/// The reported time is that of the sample before the sign change.
pub fn find_crossing(
    series: TraceView<'_>,
    level: Real,
    policy: CrossingPolicy,
) -> Result<Crossing, NoCrossingFound> {
    let mut crossings = series
        .values()
        .iter()
        .map(|&value| sign(value - level))
        .tuple_windows()
        .positions(|(before, after)| before != after);

    let index = match policy {
        CrossingPolicy::First => crossings.next(),
        CrossingPolicy::Last => crossings.last(),
    }
    .ok_or(NoCrossingFound { level })?;

    let time = series
        .time()
        .get(index)
        .copied()
        .ok_or(NoCrossingFound { level })?;
    Ok(Crossing { index, time })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locate(values: &[Real], level: Real, policy: CrossingPolicy) -> Option<Crossing> {
        let time: Vec<Time> = (0..values.len()).map(|i| i as Time * 2.0).collect();
        find_crossing(TraceView::new(&time, values), level, policy).ok()
    }

    #[test]
    fn zero_data() {
        assert_eq!(locate(&[], 1.0, CrossingPolicy::First), None);
        assert_eq!(locate(&[3.0], 1.0, CrossingPolicy::Last), None);
    }

    #[test]
    fn flat_signal_has_no_crossing() {
        let values = [2.0; 10];
        let time: Vec<Time> = (0..10).map(|i| i as Time).collect();
        assert_eq!(
            find_crossing(TraceView::new(&time, &values), 1.0, CrossingPolicy::First),
            Err(NoCrossingFound { level: 1.0 })
        );
    }

    #[test]
    fn monotonic_rise() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let crossing = locate(&values, 2.5, CrossingPolicy::First);
        assert_eq!(crossing, Some(Crossing { index: 2, time: 4.0 }));
        assert_eq!(locate(&values, 2.5, CrossingPolicy::Last), crossing);
    }

    #[test]
    fn monotonic_crossing_straddles_level() {
        let values: Vec<Real> = (0..50).map(|i| (i as Real).powi(2)).collect();
        for level in [0.5, 10.0, 99.9, 1000.0, 2400.0] {
            let crossing = locate(&values, level, CrossingPolicy::First).expect("crossing");
            assert!(values[crossing.index] <= level);
            assert!(values[crossing.index + 1] > level);
        }
    }

    #[test]
    fn first_and_last_of_several() {
        //          .    x    .    x    .    x    .
        let values = [0.0, 0.0, 2.0, 2.0, 0.0, 0.0, 2.0];
        assert_eq!(
            locate(&values, 1.0, CrossingPolicy::First).map(|c| c.index),
            Some(1)
        );
        assert_eq!(
            locate(&values, 1.0, CrossingPolicy::Last).map(|c| c.index),
            Some(5)
        );
    }

    #[test]
    fn touching_the_level_counts() {
        let values = [0.0, 1.0, 1.0, 0.0];
        let first = locate(&values, 1.0, CrossingPolicy::First);
        assert_eq!(first.map(|c| c.index), Some(0));
        let last = locate(&values, 1.0, CrossingPolicy::Last);
        assert_eq!(last.map(|c| c.index), Some(2));
    }

    #[test]
    fn falling_edge() {
        let values = [10.0, 9.0, 8.0, 2.0, 1.0];
        assert_eq!(
            locate(&values, 5.0, CrossingPolicy::Last),
            Some(Crossing { index: 2, time: 4.0 })
        );
    }
}
