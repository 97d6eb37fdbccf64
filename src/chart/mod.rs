//! Renderer-independent chart descriptions.
//!
//! The builders in this module run one aggregation per query and translate
//! the result into [`Chart`] values: lines, colors, titles, legend placement,
//! window geometry and the axis crossing. A [`Renderer`] turns them into
//! pixels.

mod build;
mod palette;
mod svg;

pub use build::{average_policies, individual_policy, supply_demand};
pub use palette::random_colors;
pub use svg::SvgRenderer;

use crate::{AxisAnchor, Series, TimePoint};
use std::str::FromStr;

/// An RGB color
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red
    pub r: u8,

    /// Green
    pub g: u8,

    /// Blue
    pub b: u8,
}

impl Color {
    /// White
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Line color of single-series charts
    pub const BLUE: Self = Self::rgb(0, 128, 255);

    /// Line color of the supply series
    pub const GREEN: Self = Self::rgb(77, 255, 0);

    /// Creates a color from its channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Where the legend sits relative to the plot area
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Location {
    /// Above the plot
    North,

    /// Below the plot
    South,
}

/// Legend placement
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Legend {
    /// Side of the plot
    pub location: Location,

    /// Lay entries out in one row
    pub horizontal: bool,

    /// Horizontal alignment, `0.0` = left, `1.0` = right
    pub align_x: f64,
}

impl Legend {
    /// Horizontal legend centered below the plot.
    #[must_use]
    pub fn south() -> Self {
        Self {
            location: Location::South,
            horizontal: true,
            align_x: 0.5,
        }
    }

    /// Horizontal legend right-aligned above the plot.
    #[must_use]
    pub fn north_right() -> Self {
        Self {
            location: Location::North,
            horizontal: true,
            align_x: 1.0,
        }
    }
}

/// Padding around the plot area, in pixels
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Insets {
    /// Top
    pub top: u32,

    /// Left
    pub left: u32,

    /// Bottom
    pub bottom: u32,

    /// Right
    pub right: u32,
}

impl Insets {
    /// Same padding on all sides.
    #[must_use]
    pub const fn uniform(px: u32) -> Self {
        Self {
            top: px,
            left: px,
            bottom: px,
            right: px,
        }
    }
}

/// Screen the chart windows are tiled on
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Screen {
    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,
}

impl Default for Screen {
    fn default() -> Self {
        Self {
            width: 1_920,
            height: 1_080,
        }
    }
}

impl FromStr for Screen {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;

        let width = w.trim().parse::<u32>().map_err(|e| format!("bad width: {e}"))?;
        let height = h.trim().parse::<u32>().map_err(|e| format!("bad height: {e}"))?;

        if width == 0 || height == 0 {
            return Err(format!("screen must not be empty, got {s:?}"));
        }

        Ok(Self { width, height })
    }
}

/// Position and size of one chart window
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Window {
    /// Left edge
    pub x: u32,

    /// Top edge
    pub y: u32,

    /// Width
    pub width: u32,

    /// Height
    pub height: u32,
}

impl Window {
    /// Cell `(col, row)` of a grid of `cols` x `rows` windows covering the screen.
    #[must_use]
    pub fn tile(screen: Screen, cols: u32, rows: u32, col: u32, row: u32) -> Self {
        let width = screen.width / cols.max(1);
        let height = screen.height / rows.max(1);

        Self {
            x: width * col,
            y: height * row,
            width,
            height,
        }
    }
}

/// One plotted line
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    /// Legend label
    pub label: String,

    /// Stroke color
    pub color: Color,

    /// Points in time order
    pub points: Vec<TimePoint>,
}

impl Line {
    /// Creates a line from an aggregated series, keeping its label.
    #[must_use]
    pub fn from_series<K>(series: Series<K>, color: Color) -> Self {
        let label = series.label().to_owned();

        Self {
            label,
            color,
            points: series.into_points(),
        }
    }
}

/// Everything a renderer needs to draw one chart window.
#[derive(Clone, Debug, PartialEq)]
pub struct Chart {
    /// Short identifier, also used as file name
    pub name: String,

    /// Title, may span multiple lines
    pub title: String,

    /// Label of the time axis
    pub x_label: String,

    /// Label of the value axis
    pub y_label: String,

    /// Plot background
    pub background: Color,

    /// Plotted lines
    pub lines: Vec<Line>,

    /// Legend, if shown
    pub legend: Option<Legend>,

    /// Padding around the plot
    pub insets: Insets,

    /// Window placement on screen
    pub window: Window,

    /// Where the axes cross; `None` if there was no data to anchor them
    pub crossing: Option<AxisAnchor>,

    /// Initial zoom of interactive renderers
    pub zoom: f64,
}

impl Chart {
    /// Creates an empty chart with white background and a "Time" axis.
    pub fn new<N, T, Y>(name: N, title: T, y_label: Y, window: Window) -> Self
    where
        N: Into<String>,
        T: Into<String>,
        Y: Into<String>,
    {
        Self {
            name: name.into(),
            title: title.into(),
            x_label: "Time".into(),
            y_label: y_label.into(),
            background: Color::WHITE,
            lines: Vec::new(),
            legend: None,
            insets: Insets::uniform(10),
            window,
            crossing: None,
            zoom: 1.0,
        }
    }

    /// Sets the plotted lines.
    #[must_use]
    pub fn lines(mut self, lines: Vec<Line>) -> Self {
        self.lines = lines;
        self
    }

    /// Shows a legend.
    #[must_use]
    pub fn legend(mut self, legend: Legend) -> Self {
        self.legend = Some(legend);
        self
    }

    /// Sets the padding.
    #[must_use]
    pub fn insets(mut self, insets: Insets) -> Self {
        self.insets = insets;
        self
    }

    /// Sets the axis crossing.
    #[must_use]
    pub fn crossing(mut self, crossing: Option<AxisAnchor>) -> Self {
        self.crossing = crossing;
        self
    }

    /// Sets the initial zoom.
    #[must_use]
    pub fn zoom(mut self, zoom: f64) -> Self {
        self.zoom = zoom;
        self
    }
}

/// Draws finished charts.
pub trait Renderer {
    /// Draws one chart.
    ///
    /// # Errors
    ///
    /// Returns error if the chart could not be drawn.
    fn render(&mut self, chart: &Chart) -> crate::Result<()>;
}

/// Renders every chart, logging and skipping the ones that fail.
///
/// Returns the number of charts rendered.
pub fn render_all<R: Renderer + ?Sized>(renderer: &mut R, charts: &[Chart]) -> usize {
    let mut rendered = 0;

    for chart in charts {
        match renderer.render(chart) {
            Ok(()) => rendered += 1,
            Err(e) => log::warn!("Could not render chart {:?}: {e}", chart.name),
        }
    }

    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl Renderer for Failing {
        fn render(&mut self, chart: &Chart) -> crate::Result<()> {
            if chart.name == "bad" {
                Err(crate::Error::Render("nope".into()))
            } else {
                Ok(())
            }
        }
    }

    #[test_log::test]
    fn screen_parse() {
        assert_eq!(
            Ok(Screen {
                width: 1_280,
                height: 800
            }),
            "1280x800".parse()
        );
        assert!("1280".parse::<Screen>().is_err());
        assert!("0x800".parse::<Screen>().is_err());
    }

    #[test_log::test]
    fn window_tiles() {
        let screen = Screen::default();

        let cell = Window::tile(screen, 2, 2, 1, 1);
        assert_eq!(
            Window {
                x: 960,
                y: 540,
                width: 960,
                height: 540
            },
            cell
        );

        let wide = Window::tile(screen, 1, 2, 0, 1);
        assert_eq!(1_920, wide.width);
        assert_eq!(540, wide.y);
    }

    #[test_log::test]
    fn render_all_skips_failures() {
        let window = Window::tile(Screen::default(), 1, 1, 0, 0);
        let charts = vec![
            Chart::new("good", "Good", "Value", window),
            Chart::new("bad", "Bad", "Value", window),
            Chart::new("also-good", "Good", "Value", window),
        ];

        assert_eq!(2, render_all(&mut Failing, &charts));
    }
}
