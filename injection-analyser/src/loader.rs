//! Reads the per-frame intensity tables written by the intensity step.
use std::path::Path;
use thiserror::Error;
use tirf_common::{ChannelName, MILLISECONDS_PER_SECOND, Real, Time};
use tracing::instrument;
use transition_detection::{Channel, Trace, TraceError};

/// Intensity tables are named `<run>_intensity.csv`.
pub(crate) const INTENSITY_SUFFIX: &str = "_intensity";
pub(crate) const INTENSITY_FILE_ENDING: &str = "_intensity.csv";

/// The first frames of a recording usually contain garbage.
pub(crate) const DEFAULT_SKIP_FRAMES: usize = 5;

const TIME_COLUMN: &str = "time";
const FRAME_COLUMN: &str = "frame";

#[derive(Debug, Error)]
pub(crate) enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("File has no header line")]
    MissingHeader,
    #[error("Header has no time column")]
    MissingTimeColumn,
    #[error("No channel columns found, requested: {requested:?}")]
    NoChannels { requested: Vec<ChannelName> },
    #[error("Line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("Line {line}, column {column}: cannot parse {value:?}")]
    Parse {
        line: usize,
        column: String,
        value: String,
    },
    #[error("Invalid trace: {0}")]
    Trace(#[from] TraceError),
}

#[derive(Debug, Clone)]
pub(crate) struct LoadOptions {
    pub(crate) skip_frames: usize,
    /// Maximum number of frames to keep; zero keeps all.
    pub(crate) n_frames: usize,
    /// Channels to keep; empty keeps all.
    pub(crate) channels: Vec<ChannelName>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            skip_frames: DEFAULT_SKIP_FRAMES,
            n_frames: 0,
            channels: Vec::new(),
        }
    }
}

/// Loads an intensity table, converting frame times from seconds to milliseconds.
/// # Error Modes
/// - Propagates [std::fs::read_to_string] errors.
/// - Propagates [parse_intensity_csv] errors.
#[instrument(skip_all, level = "debug", fields(path = %path.display()))]
pub(crate) fn load_intensity_csv(path: &Path, options: &LoadOptions) -> Result<Trace, LoadError> {
    let contents = std::fs::read_to_string(path)?;
    parse_intensity_csv(&contents, options)
}

/// Parses `frame,time,<channel>...` rows. Every column other than `frame` and
/// `time` with a non-empty name is a channel.
pub(crate) fn parse_intensity_csv(
    contents: &str,
    options: &LoadOptions,
) -> Result<Trace, LoadError> {
    let mut lines = contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header) = lines.next().ok_or(LoadError::MissingHeader)?;
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();
    let time_column = columns
        .iter()
        .position(|&name| name == TIME_COLUMN)
        .ok_or(LoadError::MissingTimeColumn)?;

    let channel_columns: Vec<(usize, &str)> = columns
        .iter()
        .copied()
        .enumerate()
        .filter(|&(index, name)| index != time_column && name != FRAME_COLUMN && !name.is_empty())
        .filter(|&(_, name)| {
            options.channels.is_empty() || options.channels.iter().any(|channel| channel == name)
        })
        .collect();
    if channel_columns.is_empty() {
        return Err(LoadError::NoChannels {
            requested: options.channels.clone(),
        });
    }

    let limit = match options.n_frames {
        0 => usize::MAX,
        n_frames => n_frames,
    };
    let mut time = Vec::<Time>::new();
    let mut values = vec![Vec::<Real>::new(); channel_columns.len()];

    for (index, line) in lines.skip(options.skip_frames).take(limit) {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != columns.len() {
            return Err(LoadError::FieldCount {
                line: index + 1,
                expected: columns.len(),
                found: fields.len(),
            });
        }
        let parse = |column: usize| {
            let value = fields.get(column).copied().unwrap_or_default();
            value.parse::<Real>().map_err(|_| LoadError::Parse {
                line: index + 1,
                column: columns.get(column).copied().unwrap_or_default().to_owned(),
                value: value.to_owned(),
            })
        };

        time.push(parse(time_column)? * MILLISECONDS_PER_SECOND);
        for (column_values, &(column, _)) in values.iter_mut().zip(&channel_columns) {
            column_values.push(parse(column)?);
        }
    }

    let channels = channel_columns
        .into_iter()
        .zip(values)
        .map(|((_, name), values)| Channel::new(name, values))
        .collect();
    Ok(Trace::new(time, channels)?)
}

/// The run name: the file stem up to `_intensity`, or the whole stem if absent.
pub(crate) fn chop_filename(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_default();
    stem.split_once(INTENSITY_SUFFIX)
        .map_or(&*stem, |(run, _)| run)
        .to_owned()
}
