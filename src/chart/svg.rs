use super::{Chart, Color, Location, Renderer};
use crate::{Error, Max, Min, Running, Timestamp, Value};
use plotters::prelude::*;
use plotters::style::Color as _;
use std::path::{Path, PathBuf};

/// Writes every chart to `<dir>/<chart name>.svg`.
pub struct SvgRenderer {
    dir: PathBuf,
}

impl SvgRenderer {
    /// Creates a renderer writing into `dir` (created on first render).
    #[must_use]
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// File the chart is written to.
    #[must_use]
    pub fn path_of(&self, chart: &Chart) -> PathBuf {
        self.dir.join(format!("{}.svg", chart.name))
    }
}

impl Renderer for SvgRenderer {
    fn render(&mut self, chart: &Chart) -> crate::Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let path = self.path_of(chart);

        draw(chart, &path).map_err(|e| Error::Render(format!("{}: {e}", chart.name)))?;

        log::info!("Wrote {}", path.display());

        Ok(())
    }
}

fn rgb(color: Color) -> RGBColor {
    RGBColor(color.r, color.g, color.b)
}

/// Visible time and value range of a chart.
///
/// The axes start at the crossing point when the chart has one.
fn bounds(chart: &Chart) -> ((Timestamp, Timestamp), (Value, Value)) {
    let points = chart.lines.iter().flat_map(|line| line.points.iter());

    let t_min = points.clone().map(|p| p.ts).min();
    let t_max = points.clone().map(|p| p.ts).max();

    let mut v_min: Running<Min> = points.clone().map(|p| p.value).collect();
    let v_max: Running<Max> = points.map(|p| p.value).collect();

    if let Some(crossing) = chart.crossing {
        v_min.push(crossing.x_anchor);
    }

    let t_start = match (t_min, chart.crossing) {
        (Some(t), Some(crossing)) => t.min(crossing.y_anchor),
        (Some(t), None) => t,
        (None, _) => 0,
    };
    let t_end = t_max.unwrap_or(t_start).max(t_start + 1);

    let v_start = v_min.get().unwrap_or(0.0);
    let v_end = v_max.get().unwrap_or(1.0).max(v_start);

    // a flat series still needs a value range with some height
    let span = v_end - v_start;
    let headroom = if span > 0.0 {
        span * 0.05
    } else {
        v_end.abs().max(1.0) * 0.05
    };

    ((t_start, t_end), (v_start, v_end + headroom))
}

fn series_label_position(chart: &Chart) -> SeriesLabelPosition {
    let Some(legend) = chart.legend else {
        return SeriesLabelPosition::UpperRight;
    };

    match (legend.location, legend.align_x) {
        (Location::North, x) if x < 0.33 => SeriesLabelPosition::UpperLeft,
        (Location::North, x) if x > 0.66 => SeriesLabelPosition::UpperRight,
        (Location::North, _) => SeriesLabelPosition::UpperMiddle,
        (Location::South, x) if x < 0.33 => SeriesLabelPosition::LowerLeft,
        (Location::South, x) if x > 0.66 => SeriesLabelPosition::LowerRight,
        (Location::South, _) => SeriesLabelPosition::LowerMiddle,
    }
}

#[allow(clippy::cast_possible_wrap)]
fn draw(chart: &Chart, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let ((t_start, t_end), (v_start, v_end)) = bounds(chart);

    let root = SVGBackend::new(path, (chart.window.width, chart.window.height)).into_drawing_area();
    root.fill(&rgb(chart.background))?;

    let title = chart.title.replace('\n', " ");

    let mut plot = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 18))
        .margin_top(chart.insets.top as i32)
        .margin_left(chart.insets.left as i32)
        .margin_bottom(chart.insets.bottom as i32)
        .margin_right(chart.insets.right as i32)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(t_start..t_end, v_start..v_end)?;

    plot.configure_mesh()
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .x_labels(8)
        .y_labels(10)
        .x_label_formatter(&|ts| crate::time::format_tick(*ts))
        .draw()?;

    for line in &chart.lines {
        let color = rgb(line.color);

        plot.draw_series(LineSeries::new(
            line.points.iter().map(|p| (p.ts, p.value)),
            color.stroke_width(2),
        ))?
        .label(line.label.as_str())
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    if chart.legend.is_some() && !chart.lines.is_empty() {
        plot.configure_series_labels()
            .position(series_label_position(chart))
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }

    root.present()?;

    Ok(())
}
