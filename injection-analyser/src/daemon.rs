//! Watches for intensity tables and plots each new one.
use crate::{
    graphics::FileFormat,
    processing::{Settings, plot_file},
};
use rayon::prelude::*;
use std::{collections::HashSet, path::PathBuf};
use tokio::{
    signal::unix::{SignalKind, signal},
    time::Interval,
};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone)]
pub(crate) struct PlotSettings {
    /// Glob pattern matching the intensity tables.
    pub(crate) pattern: String,
    pub(crate) align: bool,
    pub(crate) format: FileFormat,
}

/// Plots new files. A file is new if its plot does not exist yet and it has not
/// already failed during this run.
pub(crate) struct PlotDaemon {
    settings: Settings,
    plot: PlotSettings,
    failed: HashSet<PathBuf>,
}

impl PlotDaemon {
    pub(crate) fn new(settings: Settings, plot: PlotSettings) -> Self {
        Self {
            settings,
            plot,
            failed: HashSet::new(),
        }
    }

    pub(crate) fn pending(&self) -> Result<Vec<PathBuf>, glob::PatternError> {
        Ok(glob::glob(&self.plot.pattern)?
            .filter_map(|entry| entry.inspect_err(|e| warn!("{e}")).ok())
            .filter(|path| !self.failed.contains(path))
            .filter(|path| !self.plot.format.build_path(path).exists())
            .collect())
    }

    /// Plots every pending file, in parallel. Returns the number of plots written.
    /// # Error Modes
    /// - Propagates [glob::glob] pattern errors.
    #[instrument(skip_all, level = "debug")]
    pub(crate) fn run_pass(&mut self) -> Result<usize, glob::PatternError> {
        let pending = self.pending()?;
        if pending.is_empty() {
            return Ok(0);
        }
        debug!("Found {} new file(s)", pending.len());

        let failures: Vec<PathBuf> = pending
            .par_iter()
            .filter_map(|path| {
                let output = self.plot.format.build_path(path);
                plot_file(path, &output, &self.settings, self.plot.align)
                    .inspect_err(|e| e.report(path))
                    .err()
                    .map(|_| path.clone())
            })
            .collect();

        let written = pending.len() - failures.len();
        self.failed.extend(failures);
        Ok(written)
    }
}

/// Runs a pass on every tick of `interval` until interrupted.
/// Requires the multi-threaded runtime.
/// # Error Modes
/// - Propagates [tokio::signal] errors.
/// - Propagates [PlotDaemon::run_pass] errors.
#[instrument(skip_all, fields(pattern = %daemon.plot.pattern))]
pub(crate) async fn plot_daemon_task(
    mut daemon: PlotDaemon,
    mut interval: Interval,
) -> anyhow::Result<()> {
    // Is used to await any sigint signals
    let mut sigint = signal(SignalKind::interrupt())?;

    info!("Watching for new files");
    loop {
        tokio::select! {
            _ = interval.tick() => {
                // A pass blocks on rayon; an interrupt during it is seen on the next loop.
                let written = tokio::task::block_in_place(|| daemon.run_pass())?;
                if written > 0 {
                    info!("Saved {written} plot(s)");
                }
            }
            _ = sigint.recv() => {
                info!("Interrupted");
                return Ok(());
            }
        }
    }
}
