use tirf_common::{Real, Time};

#[derive(Default, Clone, Debug, PartialEq)]
pub(crate) struct Pair<D: Default> {
    pub(crate) time: D,
    pub(crate) intensity: D,
}

#[derive(Default, Clone, Debug, PartialEq)]
pub(crate) struct Bound {
    pub(crate) min: Real,
    pub(crate) max: Real,
}

impl Bound {
    /// The extent of `data`, widened by `buffer` times its range on each side.
    /// An empty or single-valued range is widened to unit height.
    pub(crate) fn from<I: Iterator<Item = Real>>(buffer: Real, data: I) -> Bound {
        let (min, max) = data
            .filter(|value| value.is_finite())
            .fold(None, |extent: Option<(Real, Real)>, value| {
                Some(extent.map_or((value, value), |(min, max)| {
                    (min.min(value), max.max(value))
                }))
            })
            .unwrap_or_default();
        let margin = if max > min { buffer * (max - min) } else { 0.5 };
        Bound {
            min: min - margin,
            max: max + margin,
        }
    }
}

pub(crate) type Bounds = Pair<Bound>;

impl Bounds {
    pub(crate) fn new<T, I>(buffer: Real, time: T, intensity: I) -> Self
    where
        T: Iterator<Item = Time>,
        I: Iterator<Item = Real>,
    {
        Self {
            time: Bound::from(0.0, time),
            intensity: Bound::from(buffer, intensity),
        }
    }
}
