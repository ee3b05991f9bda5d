use super::{Bounds, INTENSITY_BUFFER};
use miette::IntoDiagnostic;
use plotters::{
    chart::{ChartBuilder, ChartContext},
    coord::{Shift, types::RangedCoordf64},
    element::{PathElement, Rectangle, Text},
    prelude::{Cartesian2d, DrawingArea, IntoDrawingArea, SVGBackend},
    series::LineSeries,
    style::{
        BLACK, Color, IntoFont, RGBColor, ShapeStyle, TextStyle, WHITE,
        text_anchor::{HPos, Pos, VPos},
    },
};
use std::path::Path;
use tirf_common::Time;
use tracing::{instrument, warn};
use transition_detection::{TraceAnalysis, TraceView, Transition};

type InjectionDrawingArea<'a> = DrawingArea<SVGBackend<'a>, Shift>;
type InjectionChartContext<'a> =
    ChartContext<'a, SVGBackend<'a>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

const GREY: RGBColor = RGBColor(128, 128, 128);
const DARK_GREEN: RGBColor = RGBColor(0, 100, 0);
const NAVY: RGBColor = RGBColor(0, 0, 128);

trait InjectionChartBuilder<'a>: Sized {
    fn build_injection_graph(
        root: &InjectionDrawingArea<'a>,
        title: &str,
        bounds: &Bounds,
    ) -> miette::Result<Self>;
    fn draw_series_to_chart(
        &mut self,
        series: TraceView<'_>,
        offset: Time,
        style: ShapeStyle,
        label: &str,
    ) -> miette::Result<()>;
    fn draw_transition_to_chart(
        &mut self,
        transition: &Transition,
        colour: RGBColor,
    ) -> miette::Result<()>;
    fn draw_duration_to_chart(
        &mut self,
        front: &Transition,
        back: &Transition,
    ) -> miette::Result<()>;
}

impl<'a> InjectionChartBuilder<'a> for InjectionChartContext<'a> {
    #[instrument(skip_all, level = "debug")]
    fn build_injection_graph(
        root: &InjectionDrawingArea<'a>,
        title: &str,
        bounds: &Bounds,
    ) -> miette::Result<InjectionChartContext<'a>> {
        let mut chart = ChartBuilder::on(root)
            .x_label_area_size(35)
            .y_label_area_size(50)
            .margin(10)
            .caption(title, ("sans-serif", 24.0).into_font())
            .build_cartesian_2d(
                bounds.time.min..bounds.time.max,
                bounds.intensity.min..bounds.intensity.max,
            )
            .into_diagnostic()?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .x_desc("Time / ms")
            .y_desc("CMOS signal")
            .draw()
            .into_diagnostic()?;

        Ok(chart)
    }

    #[instrument(skip_all, level = "debug")]
    fn draw_series_to_chart(
        &mut self,
        series: TraceView<'_>,
        offset: Time,
        style: ShapeStyle,
        label: &str,
    ) -> miette::Result<()> {
        let data = series.iter().map(|(time, value)| (time - offset, value));
        self.draw_series(LineSeries::new(data, style))
            .into_diagnostic()?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x - 10, y), (x + 10, y)], style));
        Ok(())
    }

    /// Outlines the analysis window and the threshold box, and labels the rise time.
    #[instrument(skip_all, level = "debug")]
    fn draw_transition_to_chart(
        &mut self,
        transition: &Transition,
        colour: RGBColor,
    ) -> miette::Result<()> {
        let window = Rectangle::new(
            [
                (transition.window_start(), transition.steady_low()),
                (transition.window_end(), transition.steady_high()),
            ],
            colour.mix(0.5).stroke_width(1),
        );
        let thresholds = Rectangle::new(
            [
                (transition.crossing_low(), transition.threshold_low()),
                (transition.crossing_high(), transition.threshold_high()),
            ],
            BLACK.stroke_width(1),
        );
        self.draw_series([window, thresholds]).into_diagnostic()?;

        let label = Text::new(
            format!("{:.0} ms", transition.tau()),
            (
                transition.midpoint(),
                transition.threshold_high() + 0.01 * transition.amplitude(),
            ),
            label_style(),
        );
        self.draw_series(std::iter::once(label)).into_diagnostic()?;
        Ok(())
    }

    #[instrument(skip_all, level = "debug")]
    fn draw_duration_to_chart(
        &mut self,
        front: &Transition,
        back: &Transition,
    ) -> miette::Result<()> {
        let duration = back.midpoint() - front.midpoint();
        let label = Text::new(
            format!("{duration:.0} ms"),
            (
                (front.crossing_high() + back.crossing_low()) / 2.0,
                front.half_level(),
            ),
            label_style(),
        );
        self.draw_series(std::iter::once(label)).into_diagnostic()?;
        Ok(())
    }
}

fn label_style() -> TextStyle<'static> {
    TextStyle::from(("sans-serif", 14.0).into_font()).pos(Pos::new(HPos::Center, VPos::Bottom))
}

/// Renders the raw and smoothed active channel, and the detected edges if both
/// were found, to an SVG file.
/// # Error Modes
/// - Propagates any [plotters] drawing error.
#[instrument(skip_all, fields(path = %path.display()))]
pub(crate) fn save_analysis_as_svg(
    analysis: &TraceAnalysis,
    title: &str,
    path: &Path,
    (width, height): (u32, u32),
) -> miette::Result<()> {
    let annotated = &analysis.annotated;
    let raw = annotated
        .active()
        .ok_or_else(|| miette::miette!("Channel {} missing from trace", annotated.channel))?;
    let smoothed = annotated.smoothed();
    let offset = analysis
        .front
        .as_ref()
        .map(Transition::offset)
        .unwrap_or_default();

    let bounds = Bounds::new(
        INTENSITY_BUFFER,
        raw.time().iter().map(|time| time - offset),
        raw.values().iter().chain(smoothed.values()).copied(),
    );

    let root = SVGBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE).into_diagnostic()?;

    let mut chart = InjectionChartContext::build_injection_graph(&root, title, &bounds)?;
    chart.draw_series_to_chart(
        raw,
        offset,
        GREY.mix(0.3).stroke_width(1),
        &analysis.channel,
    )?;
    chart.draw_series_to_chart(smoothed, offset, BLACK.stroke_width(1), "smoothed")?;

    match (&analysis.front, &analysis.back) {
        (Some(front), Some(back)) => {
            chart.draw_transition_to_chart(front, DARK_GREEN)?;
            chart.draw_transition_to_chart(back, NAVY)?;
            chart.draw_duration_to_chart(front, back)?;
        }
        _ => warn!("Could not detect and analyse peak"),
    }

    chart
        .configure_series_labels()
        .background_style(WHITE)
        .border_style(BLACK)
        .draw()
        .into_diagnostic()?;

    root.present().into_diagnostic()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tirf_common::Real;
    use transition_detection::{AnalysisConfig, Channel, Trace, analyse_trace};

    fn pulse_analysis() -> TraceAnalysis {
        let time: Vec<Real> = (0..400).map(|i| i as Real * 10.0).collect();
        let values: Vec<Real> = (0..400)
            .map(|i| if (150..250).contains(&i) { 120.0 } else { 10.0 })
            .collect();
        let trace = Trace::new(time, vec![Channel::new("Cy5", values)]).expect("valid trace");
        analyse_trace(&trace, &AnalysisConfig::default()).expect("analysis succeeds")
    }

    #[test]
    fn renders_transitions_and_labels() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("run.svg");
        let mut analysis = pulse_analysis();
        assert!(analysis.has_transitions());
        analysis.align_to_front();

        save_analysis_as_svg(&analysis, "run", &path, (700, 400)).expect("plot is rendered");
        let svg = std::fs::read_to_string(&path).expect("svg is readable");
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Time / ms"));
        // Axis description plus two rise times and the duration
        assert!(svg.matches(" ms").count() >= 4);
        assert!(svg.contains("<rect"));
    }

    #[test]
    fn renders_without_transitions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("flat.svg");
        let trace = Trace::new(
            (0..50).map(|i| i as Real).collect(),
            vec![Channel::new("Cy3", vec![4.0; 50])],
        )
        .expect("valid trace");
        let analysis = analyse_trace(&trace, &AnalysisConfig::default()).expect("flat succeeds");
        assert!(!analysis.has_transitions());

        save_analysis_as_svg(&analysis, "flat", &path, (700, 400)).expect("plot is rendered");
        assert!(path.exists());
    }
}
