use crate::{
    AnalysisError, Channel, ChannelName, Real, Time, Trace, TraceView,
    peak_window::{DEFAULT_WINDOW_ASYMMETRY, PeakWindows, extract_peak_windows},
    smoothing::{POLYNOMIAL_ORDER, SavitzkyGolay, SmoothingWindow},
    statistics,
    transition::{DEFAULT_MARGIN_FRACTION, Transition, analyse_transition},
};
use tracing::{debug, instrument};

/// Quantile of the active channel taken as its background level.
const BASELINE_QUANTILE: Real = 0.05;

/// Smallest edge amplitude kept, in units of the trace's noise standard deviation.
pub const DEFAULT_NOISE_GATE: Real = 4.0;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub margin_fraction: Real,
    pub window_asymmetry: Real,
    pub smoothing: SmoothingWindow,
    pub noise_gate: Real,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            margin_fraction: DEFAULT_MARGIN_FRACTION,
            window_asymmetry: DEFAULT_WINDOW_ASYMMETRY,
            smoothing: SmoothingWindow::Auto,
            noise_gate: DEFAULT_NOISE_GATE,
        }
    }
}

/// The trace as analysed, with everything needed to draw it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedTrace {
    /// Input trace with the baseline removed from the active channel.
    pub trace: Trace,
    pub channel: ChannelName,
    pub baseline: Real,
    /// Sample-to-sample noise of the active channel before smoothing.
    pub noise: Real,
    pub windows: PeakWindows,
    pub front_mask: Vec<bool>,
    pub back_mask: Vec<bool>,
    /// The active channel after smoothing.
    pub smoothed: Vec<Real>,
    pub smoothing_window: usize,
}

impl AnnotatedTrace {
    pub fn active(&self) -> Option<TraceView<'_>> {
        self.trace.view(&self.channel)
    }

    pub fn smoothed(&self) -> TraceView<'_> {
        TraceView::new(self.trace.time(), &self.smoothed)
    }

    pub fn peak_mask(&self) -> &[bool] {
        &self.windows.peak
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraceAnalysis {
    pub channel: ChannelName,
    pub annotated: AnnotatedTrace,
    pub front: Option<Transition>,
    pub back: Option<Transition>,
}

impl TraceAnalysis {
    pub fn has_transitions(&self) -> bool {
        self.front.is_some() && self.back.is_some()
    }

    /// Time between the midpoints of the front and back edges.
    pub fn duration(&self) -> Option<Time> {
        Some(self.back.as_ref()?.midpoint() - self.front.as_ref()?.midpoint())
    }

    /// Moves time zero to the start of the front edge, for both transitions.
    /// Does nothing unless both are present. Returns the offset applied.
    pub fn align_to_front(&mut self) -> Option<Time> {
        let (front, back) = (self.front.as_mut()?, self.back.as_mut()?);
        let offset = front.crossing_low() + front.offset();
        front.set_offset(offset);
        back.set_offset(offset);
        Some(offset)
    }
}

/// The channel with the largest peak-to-peak amplitude; ties go to the earliest column.
pub fn select_channel(trace: &Trace) -> Result<&Channel, AnalysisError> {
    if trace.channels().is_empty() {
        return Err(AnalysisError::NoChannels);
    }
    trace
        .channels()
        .iter()
        .filter_map(|channel| {
            statistics::peak_to_peak(&channel.values).map(|amplitude| (channel, amplitude))
        })
        .reduce(|best, next| if next.1 > best.1 { next } else { best })
        .map(|(channel, _)| channel)
        .ok_or(AnalysisError::EmptyTrace)
}

/// Drops an edge whose amplitude does not clear `floor`.
fn above_noise(transition: Option<Transition>, floor: Real, edge: &str) -> Option<Transition> {
    transition.filter(|transition| {
        let keep = transition.amplitude() > floor;
        if !keep {
            debug!(
                amplitude = transition.amplitude(),
                floor, "{edge} transition is within the noise"
            );
        }
        keep
    })
}

/// Runs the full detection pipeline on one trace.
///
/// # Error Modes
/// - `NoChannels` and `EmptyTrace` if there is nothing to analyse.
/// - `InsufficientSamples` if the trace is shorter than the smoothing window.
/// - `Smoothing` if an explicit smoothing window is invalid.
///
/// An edge that cannot be located, or whose amplitude is below `noise_gate`
/// times the noise level, is not an error; it is reported as `None`.
#[instrument(skip_all, fields(samples = trace.len()))]
pub fn analyse_trace(
    trace: &Trace,
    config: &AnalysisConfig,
) -> Result<TraceAnalysis, AnalysisError> {
    let channel = select_channel(trace)?.name.clone();

    let mut corrected = trace.clone();
    let baseline = trace
        .channel(&channel)
        .and_then(|active| statistics::quantile(&active.values, BASELINE_QUANTILE))
        .ok_or(AnalysisError::EmptyTrace)?;
    corrected.map_channel(&channel, |value| value - baseline);

    let series = corrected.view(&channel).ok_or(AnalysisError::EmptyTrace)?;
    let windows = extract_peak_windows(series, config.window_asymmetry)?;
    let noise = statistics::noise_level(series.values()).unwrap_or_default();

    let smoothing_window = config.smoothing.length(windows.peak_count, series.len())?;
    debug!(
        %channel,
        baseline,
        noise,
        smoothing_window,
        peak_span = windows.span,
        "Smoothing active channel"
    );
    let smoothed =
        SavitzkyGolay::new(smoothing_window, POLYNOMIAL_ORDER)?.smooth(series.values())?;

    let time = series.time();
    let smoothed_series = TraceView::new(time, &smoothed);
    let noise_floor = config.noise_gate * noise;
    let front = above_noise(
        analyse_transition(
            smoothed_series.restrict(windows.front.index_range(time)),
            config.margin_fraction,
        ),
        noise_floor,
        "Front",
    );
    let back = above_noise(
        analyse_transition(
            smoothed_series.restrict(windows.back.index_range(time)),
            config.margin_fraction,
        ),
        noise_floor,
        "Back",
    );
    if front.is_none() {
        debug!("No front transition");
    }
    if back.is_none() {
        debug!("No back transition");
    }

    let front_mask = windows.front.mask(time);
    let back_mask = windows.back.mask(time);
    Ok(TraceAnalysis {
        channel: channel.clone(),
        annotated: AnnotatedTrace {
            trace: corrected,
            channel,
            baseline,
            noise,
            windows,
            front_mask,
            back_mask,
            smoothed,
            smoothing_window,
        },
        front,
        back,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SmoothingError;
    use assert_approx_eq::assert_approx_eq;
    use rand::{SeedableRng, rngs::StdRng};
    use rand_distr::{Distribution, Normal};

    const PULSE_START: Time = 2000.0;
    const PULSE_END: Time = 4000.0;

    /// 600 samples at 10 ms: "Cy5" is background noise, "Cy3" carries a pulse
    /// of height 80 over a background of 20 between 2 s and 4 s.
    fn injection(seed: u64) -> Trace {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Normal::new(0.0, 2.0).expect("valid normal");
        let time: Vec<Time> = (0..600).map(|i| i as Time * 10.0).collect();
        let background: Vec<Real> = time.iter().map(|_| 20.0 + noise.sample(&mut rng)).collect();
        let pulse: Vec<Real> = time
            .iter()
            .map(|&t| {
                let level = if (PULSE_START..PULSE_END).contains(&t) { 100.0 } else { 20.0 };
                level + noise.sample(&mut rng)
            })
            .collect();
        Trace::new(
            time,
            vec![Channel::new("Cy5", background), Channel::new("Cy3", pulse)],
        )
        .expect("trace should be valid")
    }

    #[test]
    fn empty_trace() {
        assert_eq!(
            analyse_trace(&Trace::default(), &AnalysisConfig::default()),
            Err(AnalysisError::NoChannels)
        );
        let trace = Trace::new(vec![], vec![Channel::new("Cy3", vec![])])
            .expect("empty trace is structurally valid");
        assert_eq!(
            analyse_trace(&trace, &AnalysisConfig::default()),
            Err(AnalysisError::EmptyTrace)
        );
    }

    #[test]
    fn selects_largest_amplitude_channel() {
        let trace = injection(1);
        assert_eq!(select_channel(&trace).map(|c| c.name.as_str()), Ok("Cy3"));
    }

    #[test]
    fn channel_tie_goes_to_first_column() {
        let trace = Trace::new(
            vec![0.0, 1.0, 2.0],
            vec![
                Channel::new("A", vec![0.0, 5.0, 0.0]),
                Channel::new("B", vec![5.0, 0.0, 5.0]),
            ],
        )
        .expect("trace should be valid");
        assert_eq!(select_channel(&trace).map(|c| c.name.as_str()), Ok("A"));
    }

    #[test]
    fn detects_both_edges_of_pulse() {
        let analysis =
            analyse_trace(&injection(2), &AnalysisConfig::default()).expect("analysis succeeds");
        assert_eq!(analysis.channel, "Cy3");
        assert_approx_eq!(analysis.annotated.baseline, 20.0, 5.0);
        assert_eq!(analysis.annotated.smoothing_window, 23);

        let front = analysis.front.as_ref().expect("front edge");
        assert_eq!(front.direction(), crate::Direction::Rising);
        assert!(front.crossing_low() < PULSE_START);
        assert!(PULSE_START <= front.crossing_high());
        assert_approx_eq!(front.amplitude(), 80.0, 2.0);

        let back = analysis.back.as_ref().expect("back edge");
        assert_eq!(back.direction(), crate::Direction::Falling);
        assert!(back.crossing_low() < PULSE_END);
        assert!(PULSE_END <= back.crossing_high());

        let duration = analysis.duration().expect("both edges present");
        assert_approx_eq!(duration, PULSE_END - PULSE_START, 60.0);
    }

    #[test]
    fn analysis_is_idempotent() {
        let trace = injection(3);
        let config = AnalysisConfig::default();
        assert_eq!(analyse_trace(&trace, &config), analyse_trace(&trace, &config));
    }

    #[test]
    fn baseline_removed_from_active_channel_only() {
        let trace = injection(4);
        let analysis =
            analyse_trace(&trace, &AnalysisConfig::default()).expect("analysis succeeds");
        let baseline = analysis.annotated.baseline;
        let active = analysis.annotated.active().expect("active channel");
        let raw = trace.view("Cy3").expect("Cy3");
        for (corrected, raw) in active.values().iter().zip(raw.values()) {
            assert_approx_eq!(corrected + baseline, *raw);
        }
        assert_eq!(analysis.annotated.trace.channel("Cy5"), trace.channel("Cy5"));
    }

    #[test]
    fn align_to_front_moves_time_zero() {
        let mut analysis =
            analyse_trace(&injection(5), &AnalysisConfig::default()).expect("analysis succeeds");
        let front_start = analysis.front.as_ref().map(Transition::crossing_low);
        let back_start = analysis.back.as_ref().map(Transition::crossing_low);
        let duration = analysis.duration();

        assert_eq!(analysis.align_to_front(), front_start);
        assert_eq!(analysis.front.as_ref().map(Transition::crossing_low), Some(0.0));
        assert_eq!(
            analysis.back.as_ref().map(Transition::crossing_low),
            back_start.zip(front_start).map(|(b, f)| b - f)
        );
        assert_approx_eq!(
            analysis.duration().unwrap_or_default(),
            duration.unwrap_or_default(),
            1e-9
        );

        // Aligning again keeps the same time zero.
        assert_eq!(analysis.align_to_front(), front_start);
        assert_eq!(analysis.front.as_ref().map(Transition::crossing_low), Some(0.0));
    }

    /// 600 samples at 10 ms of a level of 20 with N(0, 2) noise and no injection.
    fn noise_only(seed: u64) -> Trace {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Normal::new(0.0, 2.0).expect("valid normal");
        Trace::new(
            (0..600).map(|i| i as Time * 10.0).collect(),
            vec![Channel::new(
                "Cy3",
                (0..600).map(|_| 20.0 + noise.sample(&mut rng)).collect(),
            )],
        )
        .expect("trace should be valid")
    }

    #[test]
    fn noise_only_traces_have_no_transitions() {
        for seed in 0..20 {
            let analysis = analyse_trace(&noise_only(seed), &AnalysisConfig::default())
                .expect("noise is not an error");
            assert_approx_eq!(analysis.annotated.noise, 2.0, 0.4);
            assert_eq!(analysis.front, None, "seed {seed}");
            assert_eq!(analysis.back, None, "seed {seed}");
        }
    }

    #[test]
    fn injection_clears_noise_gate() {
        let analysis =
            analyse_trace(&injection(2), &AnalysisConfig::default()).expect("analysis succeeds");
        let floor = DEFAULT_NOISE_GATE * analysis.annotated.noise;
        assert!(floor > 0.0);
        for edge in [&analysis.front, &analysis.back] {
            let edge = edge.as_ref().expect("edge found");
            assert!(edge.amplitude() > floor);
        }
    }

    #[test]
    fn noise_gate_rejects_small_edges() {
        let transition = crate::transition::tests::transition(10.0, 14.0);
        assert_eq!(above_noise(Some(transition.clone()), 100.0, "Front"), None);
        assert_eq!(
            above_noise(Some(transition.clone()), 99.0, "Front"),
            Some(transition)
        );
        assert_eq!(above_noise(None, 0.0, "Back"), None);
    }

    #[test]
    fn constant_trace_has_no_transitions() {
        let trace = Trace::new(
            (0..100).map(|i| i as Time).collect(),
            vec![Channel::new("Cy3", vec![12.0; 100])],
        )
        .expect("trace should be valid");
        let mut analysis =
            analyse_trace(&trace, &AnalysisConfig::default()).expect("flat is not an error");
        assert_eq!(analysis.front, None);
        assert_eq!(analysis.back, None);
        assert!(!analysis.has_transitions());
        assert_eq!(analysis.align_to_front(), None);
        assert_eq!(analysis.annotated.front_mask, vec![true; 100]);
    }

    #[test]
    fn short_trace_is_insufficient() {
        let trace = Trace::new(
            (0..8).map(|i| i as Time).collect(),
            vec![Channel::new("Cy3", vec![0.0, 0.0, 5.0, 9.0, 9.0, 4.0, 0.0, 0.0])],
        )
        .expect("trace should be valid");
        let error = analyse_trace(&trace, &AnalysisConfig::default())
            .expect_err("trace is shorter than any window");
        assert_eq!(
            error,
            AnalysisError::InsufficientSamples {
                len: 8,
                required: 11
            }
        );
        assert!(error.is_recoverable());
    }

    #[test]
    fn invalid_explicit_window() {
        let config = AnalysisConfig {
            smoothing: SmoothingWindow::Fixed(12),
            ..Default::default()
        };
        assert_eq!(
            analyse_trace(&injection(6), &config),
            Err(AnalysisError::Smoothing(SmoothingError::InvalidWindow(12)))
        );
    }
}
