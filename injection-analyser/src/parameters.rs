use crate::{
    loader::{DEFAULT_SKIP_FRAMES, INTENSITY_FILE_ENDING, LoadOptions},
    processing::Settings,
};
use anyhow::{Result, ensure};
use clap::{ArgAction, Args, Subcommand};
use std::path::PathBuf;
use tirf_common::{ChannelName, Real};
use transition_detection::{
    AnalysisConfig, DEFAULT_MARGIN_FRACTION, DEFAULT_NOISE_GATE, DEFAULT_WINDOW_ASYMMETRY,
    SmoothingWindow,
};

#[derive(Debug, Clone, Args)]
pub(crate) struct AnalysisParameters {
    /// Pattern for input file names, without the "_intensity.csv" ending.
    #[clap(long, short, default_value = "*")]
    pub(crate) pattern: String,

    /// Fraction of the step between steady levels kept clear of each plateau
    /// when placing the crossing thresholds.
    #[clap(long, default_value_t = DEFAULT_MARGIN_FRACTION)]
    pub(crate) margin: Real,

    /// Reach of each edge window, as a fraction of the peak width.
    #[clap(long, default_value_t = DEFAULT_WINDOW_ASYMMETRY)]
    pub(crate) asymmetry: Real,

    /// Smallest edge amplitude kept, as a multiple of the trace's noise level.
    #[clap(long, default_value_t = DEFAULT_NOISE_GATE)]
    pub(crate) noise_gate: Real,

    /// Savitzky-Golay window length: "auto", or an odd integer of at least 11.
    #[clap(long, short, default_value = "auto")]
    pub(crate) window: SmoothingWindow,

    /// Number of leading frames to drop.
    #[clap(long, default_value_t = DEFAULT_SKIP_FRAMES)]
    pub(crate) skip_frames: usize,

    /// Maximum number of frames to analyse; zero means no limit.
    #[clap(long, short, default_value_t = 0)]
    pub(crate) n_frames: usize,

    /// Spectral channels to consider, e.g. Cy3 Cy5. All present channels are used by default.
    pub(crate) channels: Vec<ChannelName>,
}

impl AnalysisParameters {
    /// # Error Modes
    /// - `margin` outside `[0, 0.5)`, a non-positive `asymmetry` or a negative `noise_gate`.
    pub(crate) fn settings(&self) -> Result<Settings> {
        ensure!(
            (0.0..0.5).contains(&self.margin),
            "Margin {} must be at least 0 and less than 0.5",
            self.margin
        );
        ensure!(
            self.asymmetry > 0.0,
            "Asymmetry {} must be positive",
            self.asymmetry
        );
        ensure!(
            self.noise_gate >= 0.0,
            "Noise gate {} must not be negative",
            self.noise_gate
        );
        Ok(Settings {
            load: LoadOptions {
                skip_frames: self.skip_frames,
                n_frames: self.n_frames,
                channels: self.channels.clone(),
            },
            analysis: AnalysisConfig {
                margin_fraction: self.margin,
                window_asymmetry: self.asymmetry,
                smoothing: self.window,
                noise_gate: self.noise_gate,
            },
        })
    }

    pub(crate) fn glob_pattern(&self) -> String {
        format!("{}{INTENSITY_FILE_ENDING}", self.pattern)
    }
}

#[derive(Debug, Clone, Args)]
pub(crate) struct StatsParameters {
    #[clap(flatten)]
    pub(crate) analysis: AnalysisParameters,

    /// Where to write the table. Defaults to "injection_stats.csv" beside the input files.
    #[clap(long, short)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct PlotParameters {
    #[clap(flatten)]
    pub(crate) analysis: AnalysisParameters,

    /// Align t=0 with the start of the injection.
    #[clap(long, short, default_value_t = true, action = ArgAction::Set)]
    pub(crate) align: bool,

    /// Plot the files present now and exit, instead of watching for new ones.
    #[clap(long)]
    pub(crate) once: bool,

    /// How often to look for new files.
    #[clap(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
    pub(crate) poll_interval_ms: u64,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    #[clap(about = "Writes the injection statistics of every matching file to one table.")]
    Stats(StatsParameters),
    #[clap(about = "Watches for intensity files and plots the injection in each new one.")]
    Plot(PlotParameters),
}
