use crate::{Real, Time, TraceAnalysis, Transition};
use strum::{Display, EnumString};

/// How complete a row of injection statistics is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum DataQuality {
    Complete,
    MissingFront,
    MissingBack,
    MissingBoth,
    /// The file could not be analysed at all.
    Failed,
}

impl DataQuality {
    fn of(front: bool, back: bool) -> Self {
        match (front, back) {
            (true, true) => DataQuality::Complete,
            (false, true) => DataQuality::MissingFront,
            (true, false) => DataQuality::MissingBack,
            (false, false) => DataQuality::MissingBoth,
        }
    }
}

/// One row of the statistics table.
#[derive(Debug, Clone, PartialEq)]
pub struct InjectionStats {
    pub filename: String,
    pub front_start: Option<Time>,
    pub front_tau: Option<Time>,
    pub back_start: Option<Time>,
    pub back_tau: Option<Time>,
    pub amplitude: Option<Real>,
    pub duration: Option<Time>,
    pub quality: DataQuality,
}

impl InjectionStats {
    pub fn new(
        filename: impl Into<String>,
        front: Option<&Transition>,
        back: Option<&Transition>,
    ) -> Self {
        Self {
            filename: filename.into(),
            front_start: front.map(Transition::crossing_low),
            front_tau: front.map(Transition::tau),
            back_start: back.map(Transition::crossing_low),
            back_tau: back.map(Transition::tau),
            amplitude: front.map(Transition::amplitude),
            duration: front
                .zip(back)
                .map(|(front, back)| back.midpoint() - front.midpoint()),
            quality: DataQuality::of(front.is_some(), back.is_some()),
        }
    }

    pub fn from_analysis(filename: impl Into<String>, analysis: &TraceAnalysis) -> Self {
        Self::new(filename, analysis.front.as_ref(), analysis.back.as_ref())
    }

    /// A row for a file that produced no analysis.
    pub fn failed(filename: impl Into<String>) -> Self {
        Self {
            quality: DataQuality::Failed,
            ..Self::new(filename, None, None)
        }
    }
}

/// Builds one row per file, in input order. Files lacking an edge are kept
/// with the missing fields empty and the quality flag set.
pub fn aggregate<'a, I>(results: I) -> Vec<InjectionStats>
where
    I: IntoIterator<Item = (&'a str, Option<&'a Transition>, Option<&'a Transition>)>,
{
    results
        .into_iter()
        .map(|(filename, front, back)| InjectionStats::new(filename, front, back))
        .collect()
}

/// Totals over a statistics table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub files: usize,
    pub complete: usize,
    pub incomplete: usize,
    pub failed: usize,
    pub mean_front_tau: Option<Time>,
    pub mean_back_tau: Option<Time>,
    pub mean_duration: Option<Time>,
}

fn mean(values: impl Iterator<Item = Real>) -> Option<Real> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as Real)
}

pub fn summarise(rows: &[InjectionStats]) -> Summary {
    let count = |quality: fn(&DataQuality) -> bool| {
        rows.iter().filter(|row| quality(&row.quality)).count()
    };
    Summary {
        files: rows.len(),
        complete: count(|q| *q == DataQuality::Complete),
        incomplete: count(|q| {
            matches!(
                q,
                DataQuality::MissingFront | DataQuality::MissingBack | DataQuality::MissingBoth
            )
        }),
        failed: count(|q| *q == DataQuality::Failed),
        mean_front_tau: mean(rows.iter().filter_map(|row| row.front_tau)),
        mean_back_tau: mean(rows.iter().filter_map(|row| row.back_tau)),
        mean_duration: mean(rows.iter().filter_map(|row| row.duration)),
    }
}
