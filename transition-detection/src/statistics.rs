//! Robust order statistics over plain slices.

use crate::Real;

fn sorted(values: &[Real]) -> Vec<Real> {
    let mut sorted = values.to_vec();
    sorted.sort_by(Real::total_cmp);
    sorted
}

/// The `q`-quantile (0 ≤ q ≤ 1) using linear interpolation between the
/// two nearest order statistics. Returns `None` for an empty slice.
pub fn quantile(values: &[Real], q: Real) -> Option<Real> {
    let sorted = sorted(values);
    let last = sorted.len().checked_sub(1)?;
    let position = q.clamp(0.0, 1.0) * last as Real;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let low = *sorted.get(lower)?;
    let high = *sorted.get(upper)?;
    Some(low + (high - low) * (position - lower as Real))
}

/// Median; even-length input averages the two middle values.
pub fn median(values: &[Real]) -> Option<Real> {
    quantile(values, 0.5)
}

pub fn min_max(values: &[Real]) -> Option<(Real, Real)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(min, max), &v| (min.min(v), max.max(v))),
    )
}

pub fn peak_to_peak(values: &[Real]) -> Option<Real> {
    min_max(values).map(|(min, max)| max - min)
}

/// Scales the median absolute deviation of normal data to its standard deviation.
const MAD_TO_STANDARD_DEVIATION: Real = 1.4826;

pub fn median_absolute_deviation(values: &[Real]) -> Option<Real> {
    let centre = median(values)?;
    let deviations: Vec<Real> = values.iter().map(|v| (v - centre).abs()).collect();
    median(&deviations)
}

/// Standard deviation of the sample-to-sample noise, estimated from the median
/// absolute deviation of first differences. Steps and slow drifts in the signal
/// barely move it. Returns `None` for fewer than two samples.
pub fn noise_level(values: &[Real]) -> Option<Real> {
    let differences: Vec<Real> = values
        .iter()
        .zip(values.iter().skip(1))
        .map(|(before, after)| after - before)
        .collect();
    median_absolute_deviation(&differences)
        .map(|mad| MAD_TO_STANDARD_DEVIATION * mad / std::f64::consts::SQRT_2)
}
