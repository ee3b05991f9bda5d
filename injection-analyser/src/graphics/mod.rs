mod bounds;
mod svg;

use std::path::{Path, PathBuf};
use strum::{Display, EnumString};
use tirf_common::Real;

pub(crate) use bounds::Bounds;
pub(crate) use svg::save_analysis_as_svg;

/// Fraction of the intensity range left clear above and below the data.
const INTENSITY_BUFFER: Real = 0.05;

pub(crate) const DEFAULT_PLOT_SIZE: (u32, u32) = (1400, 800);

#[derive(Default, Clone, Copy, Debug, PartialEq, EnumString, Display)]
pub(crate) enum FileFormat {
    #[default]
    #[strum(to_string = "svg")]
    Svg,
}

impl FileFormat {
    /// The plot path for an input file: the same stem with this format's extension.
    pub(crate) fn build_path(self, input: &Path) -> PathBuf {
        input.with_extension(self.to_string())
    }
}
