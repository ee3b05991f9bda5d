//! Savitzky-Golay smoothing.
//!
//! Fits a cubic by least squares to each symmetric window of samples and
//! replaces the centre sample by the fitted value. The first and last
//! half-window samples are evaluated from the cubic fitted to the first and
//! last full window respectively, so the output has the same length as the input.

use crate::{AnalysisError, Real, SmoothingError};
use ndarray::{Array2, ArrayView1, s};
use std::{fmt::Display, str::FromStr};

pub const POLYNOMIAL_ORDER: usize = 3;
pub const MIN_WINDOW_LENGTH: usize = 11;

/// Samples of peak per unit of extra half-window.
const PEAK_SAMPLES_PER_STEP: usize = 30;
/// Samples of trace per unit of extra half-window.
const TRACE_SAMPLES_PER_STEP: usize = 60;

/// The smoothing window length, either derived from the data or fixed by the caller.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmoothingWindow {
    #[default]
    Auto,
    Fixed(usize),
}

impl SmoothingWindow {
    pub fn fixed(length: usize) -> Result<Self, SmoothingError> {
        if length % 2 == 1 && length >= MIN_WINDOW_LENGTH {
            Ok(Self::Fixed(length))
        } else {
            Err(SmoothingError::InvalidWindow(length))
        }
    }

    /// The adaptive length `2·min(peak_count/30, trace_len/60) + 11`,
    /// which is always odd and at least 11.
    pub fn auto_length(peak_count: usize, trace_len: usize) -> usize {
        2 * usize::min(
            peak_count / PEAK_SAMPLES_PER_STEP,
            trace_len / TRACE_SAMPLES_PER_STEP,
        ) + MIN_WINDOW_LENGTH
    }

    /// Resolves the length to use for a trace.
    pub fn length(&self, peak_count: usize, trace_len: usize) -> Result<usize, SmoothingError> {
        match *self {
            SmoothingWindow::Auto => Ok(Self::auto_length(peak_count, trace_len)),
            SmoothingWindow::Fixed(length) => Self::fixed(length).map(|_| length),
        }
    }
}

impl FromStr for SmoothingWindow {
    type Err = SmoothingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            Ok(SmoothingWindow::Auto)
        } else {
            let length = usize::from_str(s).map_err(|_| SmoothingError::Unparsable(s.to_owned()))?;
            SmoothingWindow::fixed(length)
        }
    }
}

impl Display for SmoothingWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SmoothingWindow::Auto => write!(f, "auto"),
            SmoothingWindow::Fixed(length) => write!(f, "{length}"),
        }
    }
}

/// A Savitzky-Golay filter with its projection matrix precomputed.
#[derive(Debug, Clone)]
pub struct SavitzkyGolay {
    window: usize,
    /// Row `r` holds the weights evaluating the fitted polynomial at window position `r`.
    projection: Array2<Real>,
}

impl SavitzkyGolay {
    pub fn new(window: usize, order: usize) -> Result<Self, SmoothingError> {
        if window % 2 == 0 || window <= order {
            return Err(SmoothingError::InvalidWindow(window));
        }
        Ok(Self {
            window,
            projection: projection_matrix(window, order)?,
        })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Weights applied to each window to produce the centre sample.
    pub fn coefficients(&self) -> ArrayView1<'_, Real> {
        self.projection.row(self.window / 2)
    }

    /// # Error Modes
    /// - `InsufficientSamples` if `values` is shorter than the window.
    pub fn smooth(&self, values: &[Real]) -> Result<Vec<Real>, AnalysisError> {
        let len = values.len();
        if len < self.window {
            return Err(AnalysisError::InsufficientSamples {
                len,
                required: self.window,
            });
        }
        let half = self.window / 2;
        let data = ArrayView1::from(values);
        let centre = self.coefficients();

        let head = data.slice(s![..self.window]);
        let tail = data.slice(s![len - self.window..]);

        let mut smoothed = Vec::with_capacity(len);
        smoothed.extend((0..half).map(|row| self.projection.row(row).dot(&head)));
        smoothed.extend(
            (half..len - half).map(|i| centre.dot(&data.slice(s![i - half..=i + half]))),
        );
        smoothed.extend((half + 1..self.window).map(|row| self.projection.row(row).dot(&tail)));
        Ok(smoothed)
    }
}

/// Builds `J (JᵀJ)⁻¹ Jᵀ` for the Vandermonde matrix `J` of the window positions,
/// rescaled to [-1, 1] to keep the normal equations well conditioned.
fn projection_matrix(window: usize, order: usize) -> Result<Array2<Real>, SmoothingError> {
    let half = (window / 2).max(1) as Real;
    let design = Array2::from_shape_fn((window, order + 1), |(i, k)| {
        ((i as Real - half) / half).powi(k as i32)
    });
    let normal = design.t().dot(&design);
    let inverse = invert(normal).ok_or(SmoothingError::SingularSystem { window })?;
    Ok(design.dot(&inverse).dot(&design.t()))
}

/// Gauss-Jordan elimination with partial pivoting.
fn invert(matrix: Array2<Real>) -> Option<Array2<Real>> {
    let n = matrix.nrows();
    let mut augmented = Array2::<Real>::zeros((n, 2 * n));
    augmented.slice_mut(s![.., ..n]).assign(&matrix);
    for i in 0..n {
        augmented[[i, n + i]] = 1.0;
    }

    for col in 0..n {
        let pivot_row = (col..n).max_by(|&a, &b| {
            augmented[[a, col]]
                .abs()
                .total_cmp(&augmented[[b, col]].abs())
        })?;
        if augmented[[pivot_row, col]].abs() < 1e-12 {
            return None;
        }
        if pivot_row != col {
            for j in 0..2 * n {
                augmented.swap([col, j], [pivot_row, j]);
            }
        }

        let pivot = augmented[[col, col]];
        augmented.row_mut(col).mapv_inplace(|v| v / pivot);
        let pivot_values = augmented.row(col).to_owned();
        for row in (0..n).filter(|&row| row != col) {
            let factor = augmented[[row, col]];
            if factor != 0.0 {
                augmented
                    .row_mut(row)
                    .scaled_add(-factor, &pivot_values);
            }
        }
    }
    Some(augmented.slice(s![.., n..]).to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::{SeedableRng, rngs::StdRng};
    use rand_distr::{Distribution, Normal};

    fn filter(window: usize) -> SavitzkyGolay {
        SavitzkyGolay::new(window, POLYNOMIAL_ORDER).expect("filter should build")
    }

    #[test]
    fn auto_length_is_odd_and_at_least_minimum() {
        for trace_len in MIN_WINDOW_LENGTH..5000 {
            for peak_count in [0, trace_len / 3, trace_len] {
                let length = SmoothingWindow::auto_length(peak_count, trace_len);
                assert_eq!(length % 2, 1);
                assert!(length >= MIN_WINDOW_LENGTH);
            }
        }
    }

    #[test]
    fn auto_length_follows_peak_and_trace() {
        assert_eq!(SmoothingWindow::auto_length(0, 1000), 11);
        assert_eq!(SmoothingWindow::auto_length(300, 6000), 31);
        assert_eq!(SmoothingWindow::auto_length(3000, 600), 31);
    }

    #[test]
    fn parse_window() {
        assert_eq!("auto".parse::<SmoothingWindow>(), Ok(SmoothingWindow::Auto));
        assert_eq!(
            "19".parse::<SmoothingWindow>(),
            Ok(SmoothingWindow::Fixed(19))
        );
        assert_eq!(
            "12".parse::<SmoothingWindow>(),
            Err(SmoothingError::InvalidWindow(12))
        );
        assert_eq!(
            "9".parse::<SmoothingWindow>(),
            Err(SmoothingError::InvalidWindow(9))
        );
        assert!(matches!(
            "wide".parse::<SmoothingWindow>(),
            Err(SmoothingError::Unparsable(_))
        ));
        assert_eq!(SmoothingWindow::Fixed(19).to_string(), "19");
    }

    #[test]
    fn coefficients_are_symmetric_and_sum_to_one() {
        let sg = filter(11);
        let coefficients = sg.coefficients();
        assert_eq!(coefficients.len(), 11);
        assert_approx_eq!(coefficients.sum(), 1.0, 1e-10);
        for i in 0..5 {
            assert_approx_eq!(coefficients[i], coefficients[10 - i], 1e-10);
        }
        // Tabulated cubic, 11 points: -36/429
        assert_approx_eq!(coefficients[0], -36.0 / 429.0, 1e-10);
        assert_approx_eq!(coefficients[5], 89.0 / 429.0, 1e-10);
    }

    #[test]
    fn too_short() {
        let sg = filter(11);
        assert_eq!(
            sg.smooth(&[1.0; 10]),
            Err(AnalysisError::InsufficientSamples {
                len: 10,
                required: 11
            })
        );
    }

    #[test]
    fn even_window_rejected() {
        assert!(SavitzkyGolay::new(12, POLYNOMIAL_ORDER).is_err());
    }

    #[test]
    fn constant_signal_unchanged() {
        let data = vec![4.2; 40];
        let smoothed = filter(15).smooth(&data).expect("long enough");
        assert_eq!(smoothed.len(), 40);
        for v in smoothed {
            assert_approx_eq!(v, 4.2, 1e-9);
        }
    }

    #[test]
    fn cubic_preserved_including_edges() {
        let data: Vec<Real> = (0..31)
            .map(|i| {
                let x = i as Real * 0.1;
                0.5 * x.powi(3) - 2.0 * x.powi(2) + x + 3.0
            })
            .collect();
        let smoothed = filter(11).smooth(&data).expect("long enough");
        for (s, d) in smoothed.iter().zip(&data) {
            assert_approx_eq!(s, d, 1e-8);
        }
    }

    #[test]
    fn exact_window_length() {
        let data: Vec<Real> = (0..11).map(|i| i as Real).collect();
        let smoothed = filter(11).smooth(&data).expect("long enough");
        for (s, d) in smoothed.iter().zip(&data) {
            assert_approx_eq!(s, d, 1e-9);
        }
    }

    #[test]
    fn reduces_noise() {
        let mut rng = StdRng::seed_from_u64(7);
        let noise = Normal::new(0.0, 1.0).expect("valid normal");
        let data: Vec<Real> = (0..500).map(|_| 10.0 + noise.sample(&mut rng)).collect();
        let smoothed = filter(21).smooth(&data).expect("long enough");

        let roughness =
            |v: &[Real]| v.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum::<Real>();
        assert!(roughness(&smoothed) < 0.2 * roughness(&data));
    }
}
