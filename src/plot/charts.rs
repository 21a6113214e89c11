//! Chart primitives: scatter plots and bar charts rendered to PNG.
//!
//! Charts are drawn with the [`plotters`] bitmap backend so they work in
//! headless environments.

use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during plot generation
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("Failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("Failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

type Result<T> = core::result::Result<T, PlotError>;

/// Colour of the common condition (blueviolet).
pub const COMMON_COLOR: RGBColor = RGBColor(138, 43, 226);

/// Colour of the rare condition (gold).
pub const RARE_COLOR: RGBColor = RGBColor(255, 215, 0);

/// The 20-colour "tab20" qualitative palette.
pub const TAB20: [RGBColor; 20] = [
    RGBColor(31, 119, 180),
    RGBColor(174, 199, 232),
    RGBColor(255, 127, 14),
    RGBColor(255, 187, 120),
    RGBColor(44, 160, 44),
    RGBColor(152, 223, 138),
    RGBColor(214, 39, 40),
    RGBColor(255, 152, 150),
    RGBColor(148, 103, 189),
    RGBColor(197, 176, 213),
    RGBColor(140, 86, 75),
    RGBColor(196, 156, 148),
    RGBColor(227, 119, 194),
    RGBColor(247, 182, 210),
    RGBColor(127, 127, 127),
    RGBColor(199, 199, 199),
    RGBColor(188, 189, 34),
    RGBColor(219, 219, 141),
    RGBColor(23, 190, 207),
    RGBColor(158, 218, 229),
];

/// Palette colour for the `index`-th distinct value, cycling after 20.
pub fn palette_color(index: usize) -> RGBColor {
    TAB20[index % TAB20.len()]
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
        }
    }
}

/// Title, axis labels and ranges shared by every chart.
#[derive(Debug, Clone)]
pub struct Axes {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_range: Range<f64>,
    pub y_range: Range<f64>,
}

/// Points drawn in a single colour, optionally shown in the legend.
#[derive(Debug, Clone)]
pub struct ScatterSeries {
    pub label: Option<String>,
    pub color: RGBColor,
    pub points: Vec<(f64, f64)>,
}

/// One bar per category, drawn side by side with the other groups.
#[derive(Debug, Clone)]
pub struct BarGroup {
    pub label: Option<String>,
    pub color: RGBColor,
    /// Bar opacity in `0.0..=1.0`.
    pub opacity: f64,
    /// One value per category; non-finite values are not drawn.
    pub values: Vec<f64>,
    /// Symmetric error bar drawn on every bar.
    pub error: Option<f64>,
    /// Dashed horizontal reference line, usually the group mean.
    pub reference: Option<f64>,
}

/// A categorical bar chart.
#[derive(Debug, Clone)]
pub struct BarChart {
    pub categories: Vec<String>,
    pub groups: Vec<BarGroup>,
    /// Width of a single bar in category units.
    pub bar_width: f64,
}

/// Offset of each group's bar from the category centre.
///
/// Two groups of width 0.4 sit at -0.2 and +0.2.
pub fn group_offsets(groups: usize, bar_width: f64) -> Vec<f64> {
    let centre = (groups as f64 - 1.0) / 2.0;
    (0..groups)
        .map(|g| (g as f64 - centre) * bar_width)
        .collect()
}

/// Horizontal dash segments spanning `x_range` at height `y`.
fn dash_segments(y: f64, x_range: &Range<f64>, dashes: usize) -> Vec<Vec<(f64, f64)>> {
    let step = (x_range.end - x_range.start) / (dashes * 2) as f64;
    (0..dashes)
        .map(|i| {
            let start = x_range.start + (2 * i) as f64 * step;
            vec![(start, y), (start + step, y)]
        })
        .collect()
}

fn category_label(categories: &[String], x: f64) -> String {
    let rounded = x.round();
    if (x - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    categories
        .get(rounded as usize)
        .cloned()
        .unwrap_or_default()
}

/// Draw a scatter plot and save it as a PNG file.
pub fn scatter_plot(
    series: &[ScatterSeries],
    axes: &Axes,
    canvas: Canvas,
    output_path: &Path,
) -> Result<()> {
    if series.iter().all(|s| s.points.is_empty()) {
        return Err(PlotError::InvalidData(
            "Scatter plot has no points".to_string(),
        ));
    }

    let drawing_area =
        BitMapBackend::new(output_path, (canvas.width, canvas.height)).into_drawing_area();
    drawing_area
        .fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let mut chart = ChartBuilder::on(&drawing_area)
        .caption(&axes.title, ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(axes.x_range.clone(), axes.y_range.clone())
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc(axes.x_label.as_str())
        .y_desc(axes.y_label.as_str())
        .label_style(("sans-serif", 16))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    let mut has_legend = false;
    for s in series {
        let color = s.color;
        let annotation = chart
            .draw_series(
                s.points
                    .iter()
                    .map(|&point| Circle::new(point, 4, color.filled())),
            )
            .map_err(|e| PlotError::Drawing(e.to_string()))?;

        if let Some(ref label) = s.label {
            annotation
                .label(label.as_str())
                .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));
            has_legend = true;
        }
    }

    if has_legend {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(|e| PlotError::Drawing(e.to_string()))?;
    }

    drawing_area
        .present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    Ok(())
}

/// X range that fits `categories` bars centred on `0, 1, ..`.
pub fn category_range(categories: usize) -> Range<f64> {
    -0.5..(categories as f64 - 0.5)
}

/// Draw a categorical bar chart and save it as a PNG file.
///
/// Category `i` is centred on `x = i`; see [`category_range`].
pub fn bar_chart(chart: &BarChart, axes: &Axes, canvas: Canvas, output_path: &Path) -> Result<()> {
    if chart.categories.is_empty() {
        return Err(PlotError::InvalidData(
            "Bar chart has no categories".to_string(),
        ));
    }
    if let Some(group) = chart
        .groups
        .iter()
        .find(|g| g.values.len() != chart.categories.len())
    {
        return Err(PlotError::InvalidData(format!(
            "Bar group has {} values for {} categories",
            group.values.len(),
            chart.categories.len()
        )));
    }

    let x_range = axes.x_range.clone();

    let drawing_area =
        BitMapBackend::new(output_path, (canvas.width, canvas.height)).into_drawing_area();
    drawing_area
        .fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let mut context = ChartBuilder::on(&drawing_area)
        .caption(&axes.title, ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range.clone(), axes.y_range.clone())
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    let formatter = |x: &f64| category_label(&chart.categories, *x);
    let mut mesh = context.configure_mesh();
    mesh.disable_x_mesh()
        .x_labels(chart.categories.len())
        .x_label_formatter(&formatter)
        .y_desc(axes.y_label.as_str())
        .label_style(("sans-serif", 16));
    if !axes.x_label.is_empty() {
        mesh.x_desc(axes.x_label.as_str());
    }
    mesh.draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    let half = chart.bar_width / 2.0;
    let cap = chart.bar_width / 4.0;
    let offsets = group_offsets(chart.groups.len(), chart.bar_width);
    let mut has_legend = false;

    for (group, offset) in chart.groups.iter().zip(offsets) {
        let color = group.color;
        let bars: Vec<(f64, f64)> = group
            .values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(i, &v)| (i as f64 + offset, v))
            .collect();

        let annotation = context
            .draw_series(bars.iter().map(|&(centre, v)| {
                Rectangle::new(
                    [(centre - half, 0.0), (centre + half, v)],
                    color.mix(group.opacity).filled(),
                )
            }))
            .map_err(|e| PlotError::Drawing(e.to_string()))?;

        if let Some(ref label) = group.label {
            annotation.label(label.as_str()).legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 15, y + 5)], color.filled())
            });
            has_legend = true;
        }

        if let Some(error) = group.error.filter(|e| e.is_finite() && *e > 0.0) {
            context
                .draw_series(bars.iter().flat_map(|&(centre, v)| {
                    [
                        vec![(centre, v - error), (centre, v + error)],
                        vec![(centre - cap, v + error), (centre + cap, v + error)],
                        vec![(centre - cap, v - error), (centre + cap, v - error)],
                    ]
                    .into_iter()
                    .map(|path| PathElement::new(path, BLACK.stroke_width(1)))
                }))
                .map_err(|e| PlotError::Drawing(e.to_string()))?;
        }

        if let Some(reference) = group.reference.filter(|r| r.is_finite()) {
            context
                .draw_series(
                    dash_segments(reference, &x_range, 40)
                        .into_iter()
                        .map(|segment| PathElement::new(segment, color.stroke_width(2))),
                )
                .map_err(|e| PlotError::Drawing(e.to_string()))?;
        }
    }

    if has_legend {
        context
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(|e| PlotError::Drawing(e.to_string()))?;
    }

    drawing_area
        .present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    Ok(())
}
