//! Per-file analysis shared by the statistics and plotting modes.
use crate::{
    graphics::{DEFAULT_PLOT_SIZE, save_analysis_as_svg},
    loader::{LoadError, LoadOptions, chop_filename, load_intensity_csv},
};
use metrics::counter;
use std::path::Path;
use thiserror::Error;
use tirf_common::metrics::{
    failures::{self, FailureKind},
    names::{FAILURES, FILES_PROCESSED, TRANSITIONS_DETECTED},
    transitions_detected::{self, EdgeKind},
};
use tracing::{debug, error, info, instrument, warn};
use transition_detection::{
    AnalysisConfig, AnalysisError, InjectionStats, TraceAnalysis, analyse_trace,
};

#[derive(Debug, Clone, Default)]
pub(crate) struct Settings {
    pub(crate) load: LoadOptions,
    pub(crate) analysis: AnalysisConfig,
}

#[derive(Debug, Error)]
pub(crate) enum ProcessingError {
    #[error("Cannot load intensity table: {0}")]
    Load(#[from] LoadError),
    #[error("Cannot analyse trace: {0}")]
    Analysis(#[from] AnalysisError),
    #[error("Cannot render plot: {0}")]
    Plot(miette::Report),
}

impl ProcessingError {
    /// Recoverable failures leave the file without transitions; the rest mean
    /// the file is skipped.
    pub(crate) fn is_recoverable(&self) -> bool {
        matches!(self, ProcessingError::Analysis(e) if e.is_recoverable())
    }

    fn failure_kind(&self) -> FailureKind {
        match self {
            ProcessingError::Load(_) => FailureKind::FileReadFailed,
            ProcessingError::Analysis(e) if e.is_recoverable() => FailureKind::AnalysisDegraded,
            ProcessingError::Analysis(_) => FailureKind::AnalysisFailed,
            ProcessingError::Plot(_) => FailureKind::PlotFailed,
        }
    }

    /// Logs and counts the failure against `path`.
    pub(crate) fn report(&self, path: &Path) {
        counter!(FAILURES, &[failures::get_label(self.failure_kind())]).increment(1);
        if self.is_recoverable() {
            warn!(path = %path.display(), "{self}");
        } else {
            error!(path = %path.display(), "{self}");
        }
    }
}

/// Loads and analyses one intensity table.
/// # Error Modes
/// - Propagates [load_intensity_csv] errors.
/// - Propagates [analyse_trace] errors.
#[instrument(skip_all, fields(path = %path.display()))]
pub(crate) fn analyse_file(
    path: &Path,
    settings: &Settings,
) -> Result<TraceAnalysis, ProcessingError> {
    let trace = load_intensity_csv(path, &settings.load)?;
    let analysis = analyse_trace(&trace, &settings.analysis)?;

    counter!(FILES_PROCESSED).increment(1);
    for (edge_kind, found) in [
        (EdgeKind::Front, analysis.front.is_some()),
        (EdgeKind::Back, analysis.back.is_some()),
    ] {
        if found {
            counter!(
                TRANSITIONS_DETECTED,
                &[transitions_detected::get_label(edge_kind)]
            )
            .increment(1);
        }
    }
    debug!(
        channel = %analysis.channel,
        front = analysis.front.is_some(),
        back = analysis.back.is_some(),
        "Trace analysed"
    );
    Ok(analysis)
}

/// The statistics row for one file. Every file yields a row; failures are
/// reported and flagged in the row's quality.
pub(crate) fn stats_row(path: &Path, settings: &Settings) -> InjectionStats {
    let filename = chop_filename(path);
    match analyse_file(path, settings) {
        Ok(analysis) => InjectionStats::from_analysis(filename, &analysis),
        Err(e) => {
            e.report(path);
            if e.is_recoverable() {
                InjectionStats::new(filename, None, None)
            } else {
                InjectionStats::failed(filename)
            }
        }
    }
}

/// Analyses one file and renders its plot to `output`. If `align` is set, time
/// zero is moved to the start of the front edge.
#[instrument(skip_all, fields(path = %path.display()))]
pub(crate) fn plot_file(
    path: &Path,
    output: &Path,
    settings: &Settings,
    align: bool,
) -> Result<(), ProcessingError> {
    let mut analysis = analyse_file(path, settings)?;
    if align {
        if let Some(offset) = analysis.align_to_front() {
            debug!(offset, "Time zero moved to front edge");
        }
    }
    save_analysis_as_svg(&analysis, &chop_filename(path), output, DEFAULT_PLOT_SIZE)
        .map_err(ProcessingError::Plot)?;
    info!(output = %output.display(), "Plot saved");
    Ok(())
}
