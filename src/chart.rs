//! Chart model built from a `Collection`.
//!
//! The model only describes what to draw; `render` turns it into an image.

use std::path::Path;

use crate::collection::Collection;
use crate::error::{PlotError, Result};
use crate::render::{ChartRenderer, PlottersRenderer};
use crate::series::{rss_points, vsz_points, ExtractionOptions, Point};

pub const X_LABEL: &str = "Time (Seconds)";
pub const Y_LABEL: &str = "KiloBytes";
pub const RSS_LABEL: &str = "RSS";
pub const VSZ_LABEL: &str = "VSZ";

/// Line width in points.
pub const LINE_WIDTH: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const BLUE: Rgb = Rgb(0, 0, 255);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub width: f64,
    pub color: Rgb,
}

/// A polyline over finite points.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    points: Vec<Point>,
    style: LineStyle,
}

impl Line {
    /// Fails if any coordinate is NaN or infinite.
    pub fn new(points: Vec<Point>, style: LineStyle) -> Result<Self> {
        if let Some((i, p)) = points
            .iter()
            .enumerate()
            .find(|(_, p)| !p.x.is_finite() || !p.y.is_finite())
        {
            return Err(PlotError::Render(format!(
                "non-finite point #{} ({}, {})",
                i, p.x, p.y
            )));
        }
        Ok(Self { points, style })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn style(&self) -> LineStyle {
        self.style
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendEntry {
    pub label: String,
    /// Index into `Chart::lines`.
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    title: String,
    x_label: String,
    y_label: String,
    grid: bool,
    lines: Vec<Line>,
    legend: Vec<LegendEntry>,
}

impl Chart {
    pub fn new(title: impl Into<String>, x_label: &str, y_label: &str) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            grid: true,
            lines: Vec::new(),
            legend: Vec::new(),
        }
    }

    /// Adds a line and returns its index.
    pub fn add_line(&mut self, line: Line) -> usize {
        self.lines.push(line);
        self.lines.len() - 1
    }

    /// Adds a line with a legend entry.
    pub fn add_labeled_line(&mut self, label: &str, line: Line) {
        let idx = self.add_line(line);
        self.legend.push(LegendEntry {
            label: label.to_string(),
            line: idx,
        });
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn x_label(&self) -> &str {
        &self.x_label
    }

    pub fn y_label(&self) -> &str {
        &self.y_label
    }

    pub fn grid(&self) -> bool {
        self.grid
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn legend(&self) -> &[LegendEntry] {
        &self.legend
    }

    /// Renders the chart to `path`; the format follows the extension.
    pub fn save(&self, width: u32, height: u32, path: &Path) -> Result<()> {
        PlottersRenderer.render(self, width, height, path)
    }
}

/// Builds the memory chart for `collection` with the selected metrics.
///
/// With no metric selected the chart carries only its grid and labels.
pub fn compose_chart(collection: &Collection, opts: ExtractionOptions) -> Result<Chart> {
    let mut chart = Chart::new(
        format!("Memory Plot of PID {}", collection.pid()),
        X_LABEL,
        Y_LABEL,
    );

    if opts.rss {
        let line = Line::new(
            rss_points(collection),
            LineStyle {
                width: LINE_WIDTH,
                color: Rgb::BLACK,
            },
        )?;
        chart.add_labeled_line(RSS_LABEL, line);
    }

    if opts.vsz {
        let line = Line::new(
            vsz_points(collection),
            LineStyle {
                width: LINE_WIDTH,
                color: Rgb::BLUE,
            },
        )?;
        chart.add_labeled_line(VSZ_LABEL, line);
    }

    Ok(chart)
}
