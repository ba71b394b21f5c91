//! Rendering of a `Chart` model to an image file with plotters.
//!
//! The backend is picked from the output extension: `.svg` always, raster
//! formats only when the crate is built with the `png` feature.

use std::path::Path;

#[cfg(feature = "png")]
use plotters::backend::BitMapBackendError;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters_backend::DrawingErrorKind;
use tracing::debug;

use crate::chart::Chart;
use crate::error::{PlotError, Result};

const CAPTION_FONT_SIZE: u32 = 20;
const LEGEND_SWATCH_PX: i32 = 20;

/// Draws a chart to a file of the given pixel size.
pub trait ChartRenderer {
    fn render(&self, chart: &Chart, width: u32, height: u32, path: &Path) -> Result<()>;
}

/// Output formats recognised from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Svg,
    Bitmap,
}

impl ImageFormat {
    /// Infers the format from `path`'s extension, case-insensitively.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "svg" => Ok(ImageFormat::Svg),
            "png" | "bmp" | "jpg" | "jpeg" if cfg!(feature = "png") => Ok(ImageFormat::Bitmap),
            _ => Err(PlotError::UnsupportedFormat(ext)),
        }
    }
}

/// `ChartRenderer` backed by plotters' SVG and bitmap backends.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlottersRenderer;

impl ChartRenderer for PlottersRenderer {
    fn render(&self, chart: &Chart, width: u32, height: u32, path: &Path) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(PlotError::Render(format!(
                "image size must be non-zero, got {}x{}",
                width, height
            )));
        }

        let format = ImageFormat::from_path(path)?;
        debug!(
            "Rendering {:?} chart ({} lines) to {} at {}x{}",
            format,
            chart.lines().len(),
            path.display(),
            width,
            height
        );

        match format {
            ImageFormat::Svg => {
                let root = SVGBackend::new(path, (width, height)).into_drawing_area();
                draw(chart, root).map_err(|e| backend_error(e, PlotError::Io))
            }
            ImageFormat::Bitmap => render_bitmap(chart, width, height, path),
        }
    }
}

#[cfg(feature = "png")]
fn render_bitmap(chart: &Chart, width: u32, height: u32, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    draw(chart, root).map_err(|e| {
        backend_error(e, |e| match e {
            BitMapBackendError::IOError(source) => PlotError::Io(source),
            other => encoder_error(other),
        })
    })
}

/// The image encoder wraps file errors; keep their kind when there is one.
#[cfg(feature = "png")]
fn encoder_error(err: BitMapBackendError) -> PlotError {
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<std::io::Error>() {
            return PlotError::Io(std::io::Error::new(io_err.kind(), err.to_string()));
        }
        source = cause.source();
    }
    PlotError::Render(err.to_string())
}

#[cfg(not(feature = "png"))]
fn render_bitmap(_chart: &Chart, _width: u32, _height: u32, path: &Path) -> Result<()> {
    Err(PlotError::UnsupportedFormat(
        path.extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default(),
    ))
}

/// Backend write failures surface as I/O errors; everything else is a render error.
fn backend_error<E>(err: DrawingAreaErrorKind<E>, on_io: impl FnOnce(E) -> PlotError) -> PlotError
where
    E: std::error::Error + Send + Sync,
{
    match err {
        DrawingAreaErrorKind::BackendError(DrawingErrorKind::DrawingError(e)) => on_io(e),
        other => PlotError::Render(other.to_string()),
    }
}

fn draw<DB: DrawingBackend>(
    chart: &Chart,
    root: DrawingArea<DB, Shift>,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    let (x_max, y_max) = axis_bounds(chart);
    let mut ctx = ChartBuilder::on(&root)
        .caption(chart.title(), ("sans-serif", CAPTION_FONT_SIZE))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(0f64..x_max, 0f64..y_max)?;

    let mut mesh = ctx.configure_mesh();
    mesh.x_desc(chart.x_label()).y_desc(chart.y_label());
    if !chart.grid() {
        mesh.disable_mesh();
    }
    mesh.draw()?;

    for (idx, line) in chart.lines().iter().enumerate() {
        let style = line.style();
        let color = RGBColor(style.color.0, style.color.1, style.color.2);
        let stroke = color.stroke_width(stroke_px(style.width));

        let series = ctx.draw_series(LineSeries::new(
            line.points().iter().map(|p| (p.x, p.y)),
            stroke,
        ))?;

        if let Some(entry) = chart.legend().iter().find(|e| e.line == idx) {
            series.label(entry.label.as_str()).legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + LEGEND_SWATCH_PX, y)], stroke)
            });
        }
    }

    if !chart.legend().is_empty() {
        ctx.configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

/// Upper axis bounds covering every point; empty charts get a unit square.
fn axis_bounds(chart: &Chart) -> (f64, f64) {
    let (x, y) = chart
        .lines()
        .iter()
        .flat_map(|l| l.points())
        .fold((0.0f64, 0.0f64), |(x, y), p| (x.max(p.x), y.max(p.y)));

    let x_max = if x > 0.0 { x } else { 1.0 };
    let y_max = if y > 0.0 { y * 1.1 } else { 1.0 };
    (x_max, y_max)
}

fn stroke_px(width_pt: f64) -> u32 {
    width_pt.round().max(1.0) as u32
}
