mod daemon;
mod graphics;
mod loader;
mod parameters;
mod processing;
mod writer;

use anyhow::{Context, Result};
use clap::Parser;
use daemon::{PlotDaemon, PlotSettings, plot_daemon_task};
use graphics::FileFormat;
use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use parameters::{Mode, PlotParameters, StatsParameters};
use processing::stats_row;
use rayon::prelude::*;
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use tirf_common::{
    init_tracer,
    metrics::{
        failures::{self, FailureKind},
        names::{FAILURES, FILES_PROCESSED, TRANSITIONS_DETECTED},
    },
};
use tracing::{error, info, level_filters::LevelFilter, warn};
use transition_detection::{InjectionStats, summarise};

#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Endpoint on which Prometheus text format metrics are available.
    #[clap(long, env)]
    observability_address: Option<SocketAddr>,

    #[command(subcommand)]
    mode: Mode,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _tracer = init_tracer!(LevelFilter::INFO);

    let args = Cli::parse();
    info!("{args:?}");

    if let Some(address) = args.observability_address {
        PrometheusBuilder::new()
            .with_http_listener(address)
            .install()
            .context("Prometheus metrics exporter should be set up")?;

        metrics::describe_counter!(
            FILES_PROCESSED,
            metrics::Unit::Count,
            "Number of intensity files analysed"
        );
        metrics::describe_counter!(
            TRANSITIONS_DETECTED,
            metrics::Unit::Count,
            "Number of edges detected and characterised"
        );
        metrics::describe_counter!(
            FAILURES,
            metrics::Unit::Count,
            "Number of failures encountered"
        );
        tirf_common::metrics::component_info_metric("injection-analyser");
    }

    match args.mode {
        Mode::Stats(parameters) => run_stats(parameters),
        Mode::Plot(parameters) => run_plot(parameters).await,
    }
}

/// Analyses every matching file and writes one table of their statistics.
fn run_stats(parameters: StatsParameters) -> Result<()> {
    let settings = parameters.analysis.settings()?;
    let pattern = parameters.analysis.glob_pattern();
    let paths = glob::glob(&pattern)?
        .filter_map(|entry| entry.inspect_err(|e| warn!("{e}")).ok())
        .collect::<Vec<_>>();
    if paths.is_empty() {
        warn!("No files match {pattern}");
        return Ok(());
    }
    info!("Analysing {} file(s)", paths.len());

    let rows: Vec<InjectionStats> = paths
        .par_iter()
        .map(|path| stats_row(path, &settings))
        .collect();

    let output = parameters.output.unwrap_or_else(|| {
        paths
            .last()
            .and_then(|path| path.parent())
            .map(|dir| dir.join(writer::STATS_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(writer::STATS_FILE_NAME))
    });
    writer::save_stats(&output, &rows)
        .inspect_err(|e| {
            counter!(FAILURES, &[failures::get_label(FailureKind::FileWriteFailed)]).increment(1);
            error!(output = %output.display(), "{e}");
        })
        .with_context(|| format!("Cannot write {}", output.display()))?;

    let summary = summarise(&rows);
    info!(
        output = %output.display(),
        complete = summary.complete,
        incomplete = summary.incomplete,
        failed = summary.failed,
        mean_front_tau = ?summary.mean_front_tau,
        mean_back_tau = ?summary.mean_back_tau,
        mean_duration = ?summary.mean_duration,
        "Statistics of {} file(s) saved",
        summary.files
    );
    Ok(())
}

/// Plots the matching files, once or whenever new ones appear.
async fn run_plot(parameters: PlotParameters) -> Result<()> {
    let settings = parameters.analysis.settings()?;
    let mut daemon = PlotDaemon::new(
        settings,
        PlotSettings {
            pattern: parameters.analysis.glob_pattern(),
            align: parameters.align,
            format: FileFormat::default(),
        },
    );

    if parameters.once {
        let written = daemon.run_pass()?;
        info!("Saved {written} plot(s)");
        Ok(())
    } else {
        let interval = tokio::time::interval(Duration::from_millis(parameters.poll_interval_ms));
        plot_daemon_task(daemon, interval).await
    }
}
