pub mod metrics;
pub mod tracer;

/// Intensity and other sample values.
pub type Real = f64;

/// Time in milliseconds.
pub type Time = Real;

pub type ChannelName = String;

/// Number of milliseconds in one second, used when converting frame times.
pub const MILLISECONDS_PER_SECOND: Real = 1000.0;
