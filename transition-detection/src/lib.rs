//! This crate detects and characterises the single transient injection event
//! recorded in a fluorescence intensity trace: the front (rising) edge when the
//! reagent enters the imaged field, and the back (falling) edge when it washes out.
//!
//! Typical usage looks like:
//! ```rust
//! use transition_detection::{analyse_trace, AnalysisConfig, Channel, Trace};
//!
//! let time: Vec<f64> = (0..300).map(|i| i as f64 * 10.0).collect();
//! let values: Vec<f64> = (0..300)
//!     .map(|i| if (100..200).contains(&i) { 100.0 } else { 0.0 })
//!     .collect();
//! let trace = Trace::new(time, vec![Channel::new("Cy3", values)]).unwrap();
//!
//! let analysis = analyse_trace(&trace, &AnalysisConfig::default()).unwrap();
//! assert_eq!(analysis.channel, "Cy3");
//! assert!(analysis.front.is_some() && analysis.back.is_some());
//! ```

pub mod aggregate;
pub mod analysis;
pub mod crossing;
pub mod error;
pub mod peak_window;
pub mod smoothing;
pub mod statistics;
pub mod trace;
pub mod transition;

pub use aggregate::{DataQuality, InjectionStats, Summary, aggregate, summarise};
pub use analysis::{
    AnalysisConfig, AnnotatedTrace, DEFAULT_NOISE_GATE, TraceAnalysis, analyse_trace,
    select_channel,
};
pub use crossing::{Crossing, CrossingPolicy, NoCrossingFound, find_crossing};
pub use error::{AnalysisError, SmoothingError, TraceError};
pub use peak_window::{DEFAULT_WINDOW_ASYMMETRY, EdgeWindow, PeakWindows, extract_peak_windows};
pub use smoothing::{MIN_WINDOW_LENGTH, POLYNOMIAL_ORDER, SavitzkyGolay, SmoothingWindow};
pub use trace::{Channel, Trace, TraceView};
pub use transition::{DEFAULT_MARGIN_FRACTION, Direction, Transition, analyse_transition};

pub use tirf_common::{ChannelName, Real, Time};
