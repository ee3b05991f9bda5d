use crate::{AnalysisError, Real, Time, TraceView, statistics};
use std::ops::Range;

/// How far each edge window reaches away from, versus into, the plateau.
pub const DEFAULT_WINDOW_ASYMMETRY: Real = 0.8;

/// An open time interval `(start, end)` hypothesised to contain one edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeWindow {
    pub start: Time,
    pub end: Time,
}

impl EdgeWindow {
    /// A window admitting every sample.
    pub fn unbounded() -> Self {
        Self {
            start: Time::NEG_INFINITY,
            end: Time::INFINITY,
        }
    }

    pub fn contains(&self, time: Time) -> bool {
        self.start < time && time < self.end
    }

    /// The samples of a strictly increasing time axis that fall inside the window.
    pub fn index_range(&self, time: &[Time]) -> Range<usize> {
        let start = time.partition_point(|&t| t <= self.start);
        let end = time.partition_point(|&t| t < self.end).max(start);
        start..end
    }

    pub fn mask(&self, time: &[Time]) -> Vec<bool> {
        time.iter().map(|&t| self.contains(t)).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeakWindows {
    pub half_maximum: Real,
    /// Marks samples strictly above `half_maximum`.
    pub peak: Vec<bool>,
    pub peak_count: usize,
    /// Time between the first and last peak samples.
    pub span: Time,
    pub front: EdgeWindow,
    pub back: EdgeWindow,
}

/// Locates the region above half-maximum and derives the front and back edge windows
/// around its first and last samples:
/// - front: `(first − 2w·span, first + w·span)`
/// - back: `(last − w·span, last + 2w·span)`
///
/// A trace with no sample above half-maximum (zero variance) yields windows
/// covering the whole trace.
pub fn extract_peak_windows(
    series: TraceView<'_>,
    asymmetry: Real,
) -> Result<PeakWindows, AnalysisError> {
    let (min, max) = statistics::min_max(series.values()).ok_or(AnalysisError::EmptyTrace)?;
    let half_maximum = 0.5 * (min + max);

    let peak: Vec<bool> = series.values().iter().map(|&v| v > half_maximum).collect();
    let mut peak_times = series
        .iter()
        .filter(|&(_, value)| value > half_maximum)
        .map(|(time, _)| time);

    let windows = peak_times.next().map(|first| {
        let last = peak_times.last().unwrap_or(first);
        let span = last - first;
        (
            span,
            EdgeWindow {
                start: first - 2.0 * asymmetry * span,
                end: first + asymmetry * span,
            },
            EdgeWindow {
                start: last - asymmetry * span,
                end: last + 2.0 * asymmetry * span,
            },
        )
    });
    let (span, front, back) =
        windows.unwrap_or((0.0, EdgeWindow::unbounded(), EdgeWindow::unbounded()));

    Ok(PeakWindows {
        half_maximum,
        peak_count: peak.iter().filter(|&&p| p).count(),
        peak,
        span,
        front,
        back,
    })
}
