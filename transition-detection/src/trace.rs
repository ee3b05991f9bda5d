use crate::{ChannelName, Real, Time, TraceError};
use std::ops::Range;

/// One named column of intensity values.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub name: ChannelName,
    pub values: Vec<Real>,
}

impl Channel {
    pub fn new(name: impl Into<ChannelName>, values: Vec<Real>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// A dense multi-channel intensity table sharing one time axis (ms).
/// Channels keep the column order they were supplied in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trace {
    time: Vec<Time>,
    channels: Vec<Channel>,
}

impl Trace {
    /// Validates and builds a trace.
    /// # Error Modes
    /// - Any channel whose length differs from the time axis.
    /// - Repeated channel names.
    /// - Non-finite or non-increasing times.
    /// - Non-finite values.
    pub fn new(time: Vec<Time>, channels: Vec<Channel>) -> Result<Self, TraceError> {
        if let Some((index, &time)) = time.iter().enumerate().find(|(_, t)| !t.is_finite()) {
            return Err(TraceError::NonFiniteTime { index, time });
        }
        if let Some(index) = time
            .windows(2)
            .position(|pair| matches!(pair, [a, b] if b <= a))
        {
            return Err(TraceError::NonIncreasingTime { index: index + 1 });
        }
        for (i, channel) in channels.iter().enumerate() {
            if channel.values.len() != time.len() {
                return Err(TraceError::LengthMismatch {
                    channel: channel.name.clone(),
                    expected: time.len(),
                    found: channel.values.len(),
                });
            }
            if channels
                .iter()
                .take(i)
                .any(|other| other.name == channel.name)
            {
                return Err(TraceError::DuplicateChannel(channel.name.clone()));
            }
            if let Some((index, &value)) = channel
                .values
                .iter()
                .enumerate()
                .find(|(_, v)| !v.is_finite())
            {
                return Err(TraceError::NonFiniteValue {
                    channel: channel.name.clone(),
                    index,
                    value,
                });
            }
        }
        Ok(Self { time, channels })
    }

    pub fn time(&self) -> &[Time] {
        &self.time
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|channel| channel.name == name)
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(|channel| channel.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Borrows the named channel alongside the time axis.
    pub fn view(&self, name: &str) -> Option<TraceView<'_>> {
        self.channel(name)
            .map(|channel| TraceView::new(&self.time, &channel.values))
    }

    /// Applies `f` to every value of the named channel. Returns `false` if absent.
    pub(crate) fn map_channel<F: Fn(Real) -> Real>(&mut self, name: &str, f: F) -> bool {
        match self.channels.iter_mut().find(|channel| channel.name == name) {
            Some(channel) => {
                channel.values.iter_mut().for_each(|v| *v = f(*v));
                true
            }
            None => false,
        }
    }
}

/// A borrowed single-channel series: paired time and value slices of equal length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceView<'a> {
    time: &'a [Time],
    values: &'a [Real],
}

impl<'a> TraceView<'a> {
    /// Pairs the two slices, truncating the longer one to the common length.
    pub fn new(time: &'a [Time], values: &'a [Real]) -> Self {
        let len = time.len().min(values.len());
        Self {
            time: &time[..len],
            values: &values[..len],
        }
    }

    pub fn time(&self) -> &'a [Time] {
        self.time
    }

    pub fn values(&self) -> &'a [Real] {
        self.values
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn first_time(&self) -> Option<Time> {
        self.time.first().copied()
    }

    pub fn last_time(&self) -> Option<Time> {
        self.time.last().copied()
    }

    /// Restricts the view to `range`, clamped to the available samples.
    pub fn restrict(&self, range: Range<usize>) -> Self {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        Self {
            time: &self.time[start..end],
            values: &self.values[start..end],
        }
    }

    /// Splits into samples `..=index` and `index + 1..`.
    pub fn split_after(&self, index: usize) -> (Self, Self) {
        let mid = (index + 1).min(self.len());
        let (left_time, right_time) = self.time.split_at(mid);
        let (left_values, right_values) = self.values.split_at(mid);
        (
            Self::new(left_time, left_values),
            Self::new(right_time, right_values),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = (Time, Real)> + 'a {
        self.time.iter().copied().zip(self.values.iter().copied())
    }
}
