use crate::{ChannelName, Real};
use thiserror::Error;

/// Structural faults in the input table. These are fatal for the file:
/// the caller should log them and skip to the next file.
#[derive(Debug, Error, PartialEq)]
pub enum TraceError {
    #[error("Channel {channel} has {found} samples, expected {expected}")]
    LengthMismatch {
        channel: ChannelName,
        expected: usize,
        found: usize,
    },
    #[error("Duplicate channel {0}")]
    DuplicateChannel(ChannelName),
    #[error("Non-finite time {time} at sample {index}")]
    NonFiniteTime { index: usize, time: Real },
    #[error("Time is not strictly increasing at sample {index}")]
    NonIncreasingTime { index: usize },
    #[error("Non-finite value {value} in channel {channel} at sample {index}")]
    NonFiniteValue {
        channel: ChannelName,
        index: usize,
        value: Real,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum SmoothingError {
    #[error("Smoothing window {0} must be odd and at least {min}", min = crate::MIN_WINDOW_LENGTH)]
    InvalidWindow(usize),
    #[error("Invalid smoothing window specification: {0}")]
    Unparsable(String),
    #[error("Singular least-squares system for window {window}")]
    SingularSystem { window: usize },
}

#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("Trace contains no samples")]
    EmptyTrace,
    #[error("Trace contains no channels")]
    NoChannels,
    #[error("Insufficient samples: {len} available, smoothing window needs {required}")]
    InsufficientSamples { len: usize, required: usize },
    #[error("{0}")]
    Smoothing(#[from] SmoothingError),
}

impl AnalysisError {
    /// Recoverable failures degrade the output to "no transition" for the trace;
    /// the rest indicate a misconfigured or malformed input.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AnalysisError::EmptyTrace | AnalysisError::InsufficientSamples { .. }
        )
    }
}
