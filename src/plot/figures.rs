//! The fixed set of comparison figures.
//!
//! Each figure is first built as plain chart data from the condition tables,
//! then rendered. Figures whose inputs are empty are skipped with a warning.

use super::charts::{
    bar_chart, category_range, palette_color, scatter_plot, Axes, BarChart, BarGroup, Canvas,
    ScatterSeries, COMMON_COLOR, RARE_COLOR,
};
use crate::analysis::{
    aggregate_by_category, assemble, distinct_values, integer_axis, mean, population_std,
    ConditionTables, ADV_RT, PARTICIPANT, SENTENCE_RT, SURPRISAL, WORD_LENGTH,
};
use crate::config::Config;
use crate::models::{AdverbPair, Condition, Metric, Table, Value};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use plotters::style::RGBColor;
use std::collections::BTreeSet;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const RT_LABEL: &str = "Reading Time (sec)";
const SURPRISAL_LABEL: &str = "Surprisal (bits)";

/// Settings shared by every figure.
#[derive(Debug, Clone)]
pub struct FigureSettings {
    pub figures_dir: PathBuf,
    pub canvas: Canvas,
    /// Surprisal axis of the two-condition scatter plots.
    pub surprisal_range: Range<f64>,
    /// Bar order of the per-adverb figures.
    pub adverb_pairs: Vec<AdverbPair>,
    pub show_progress: bool,
}

impl FigureSettings {
    pub fn from_config(config: &Config, show_progress: bool) -> Self {
        Self {
            figures_dir: config.figures_dir(),
            canvas: Canvas {
                width: config.plot.width,
                height: config.plot.height,
            },
            surprisal_range: config.plot.surprisal_min..config.plot.surprisal_max,
            adverb_pairs: config.adverbs.pairs.clone(),
            show_progress,
        }
    }
}

/// Every figure the analyzer renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Figure {
    SurprisalVsAdvRt,
    SurprisalVsAdvRtCommon,
    SurprisalVsAdvRtRare,
    SurprisalVsSentRt,
    MeanRtWordLength,
    MeanRtParticipant,
    MeanAdvRtByAdverbCommon,
    MeanAdvRtByAdverbRare,
    MeanSentRtByAdverbCommon,
    MeanSentRtByAdverbRare,
}

impl Figure {
    pub const ALL: [Figure; 10] = [
        Figure::SurprisalVsAdvRt,
        Figure::SurprisalVsAdvRtCommon,
        Figure::SurprisalVsAdvRtRare,
        Figure::SurprisalVsSentRt,
        Figure::MeanRtWordLength,
        Figure::MeanRtParticipant,
        Figure::MeanAdvRtByAdverbCommon,
        Figure::MeanAdvRtByAdverbRare,
        Figure::MeanSentRtByAdverbCommon,
        Figure::MeanSentRtByAdverbRare,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Figure::SurprisalVsAdvRt => "surprisal_vs_adv_RT.png",
            Figure::SurprisalVsAdvRtCommon => "surprisal_vs_adv_RT_common.png",
            Figure::SurprisalVsAdvRtRare => "surprisal_vs_adv_RT_rare.png",
            Figure::SurprisalVsSentRt => "surprisal_vs_sent_RT.png",
            Figure::MeanRtWordLength => "mean_RT_word_len.png",
            Figure::MeanRtParticipant => "mean_RT_participant.png",
            Figure::MeanAdvRtByAdverbCommon => "mean_RT_adv_common.png",
            Figure::MeanAdvRtByAdverbRare => "mean_RT_adv_rare.png",
            Figure::MeanSentRtByAdverbCommon => "mean_RT_sent_common.png",
            Figure::MeanSentRtByAdverbRare => "mean_RT_sent_rare.png",
        }
    }
}

/// Chart data for one figure, ready to render.
#[derive(Debug, Clone)]
pub enum FigureData {
    Scatter(Vec<ScatterSeries>, Axes),
    Bars(BarChart, Axes),
}

pub fn condition_color(condition: Condition) -> RGBColor {
    match condition {
        Condition::Common => COMMON_COLOR,
        Condition::Rare => RARE_COLOR,
    }
}

/// Render every figure into the figures directory, creating it if needed.
///
/// Returns the paths of the figures that were written.
pub fn render_figures(conditions: &ConditionTables, settings: &FigureSettings) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(&settings.figures_dir).with_context(|| {
        format!(
            "Failed to create figures directory {}",
            settings.figures_dir.display()
        )
    })?;

    let pb = if settings.show_progress {
        ProgressBar::new(Figure::ALL.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let mut written = Vec::new();
    for figure in Figure::ALL {
        pb.set_message(figure.file_name());
        let path = settings.figures_dir.join(figure.file_name());

        let rendered = render_figure(figure, conditions, settings, &path)
            .with_context(|| format!("Failed to render {}", figure.file_name()))?;
        if rendered {
            debug!("Saved {}", path.display());
            written.push(path);
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    info!(
        "Rendered {} of {} figures into {}",
        written.len(),
        Figure::ALL.len(),
        settings.figures_dir.display()
    );
    Ok(written)
}

/// Render a single figure. Returns `false` if it was skipped for lack of data.
pub fn render_figure(
    figure: Figure,
    conditions: &ConditionTables,
    settings: &FigureSettings,
    path: &Path,
) -> Result<bool> {
    match build_figure(figure, conditions, settings)? {
        None => {
            warn!("Skipping {}: no data", figure.file_name());
            Ok(false)
        }
        Some(FigureData::Scatter(series, axes)) => {
            scatter_plot(&series, &axes, settings.canvas, path)?;
            Ok(true)
        }
        Some(FigureData::Bars(chart, axes)) => {
            bar_chart(&chart, &axes, settings.canvas, path)?;
            Ok(true)
        }
    }
}

/// Build the chart data of a figure, or `None` if there is nothing to draw.
pub fn build_figure(
    figure: Figure,
    conditions: &ConditionTables,
    settings: &FigureSettings,
) -> Result<Option<FigureData>> {
    match figure {
        Figure::SurprisalVsAdvRt => condition_scatter(
            conditions,
            ADV_RT,
            "Adverb Surprisal vs. Adverb RT",
            1.0,
            settings,
        ),
        Figure::SurprisalVsSentRt => condition_scatter(
            conditions,
            SENTENCE_RT,
            "Adverb Surprisal vs. Sentence RT",
            5.0,
            settings,
        ),
        Figure::SurprisalVsAdvRtCommon => surprisal_palette_scatter(conditions, Condition::Common),
        Figure::SurprisalVsAdvRtRare => surprisal_palette_scatter(conditions, Condition::Rare),
        Figure::MeanRtWordLength => word_length_bars(conditions),
        Figure::MeanRtParticipant => participant_bars(conditions),
        Figure::MeanAdvRtByAdverbCommon => {
            adverb_bars(conditions, Condition::Common, Metric::AdvRtMean, settings)
        }
        Figure::MeanAdvRtByAdverbRare => {
            adverb_bars(conditions, Condition::Rare, Metric::AdvRtMean, settings)
        }
        Figure::MeanSentRtByAdverbCommon => {
            adverb_bars(conditions, Condition::Common, Metric::SentRtMean, settings)
        }
        Figure::MeanSentRtByAdverbRare => {
            adverb_bars(conditions, Condition::Rare, Metric::SentRtMean, settings)
        }
    }
}

/// `(x, y)` pairs of two numeric columns, dropping non-finite values.
fn points(table: &Table, x_column: &str, y_column: &str) -> Result<Vec<(f64, f64)>> {
    let xs = table.numeric_column(x_column)?;
    let ys = table.numeric_column(y_column)?;
    Ok(xs
        .into_iter()
        .zip(ys)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect())
}

fn finite_max(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .max_by(f64::total_cmp)
}

/// Upper y bound for bars: the tallest bar plus error, rounded up, with headroom.
fn bar_y_max(groups: &[BarGroup]) -> f64 {
    let tallest = finite_max(groups.iter().flat_map(|g| {
        let error = g.error.filter(|e| e.is_finite()).unwrap_or(0.0);
        g.values.iter().map(move |v| v + error)
    }));
    match tallest {
        Some(max) if max > 0.0 => max.ceil() + 0.5,
        _ => 1.0,
    }
}

/// Non-empty range, widening a degenerate one by one unit.
fn padded_range(start: f64, end: f64) -> Range<f64> {
    if start < end {
        start..end
    } else {
        start..start + 1.0
    }
}

fn condition_scatter(
    conditions: &ConditionTables,
    y_column: &str,
    title: &str,
    headroom: f64,
    settings: &FigureSettings,
) -> Result<Option<FigureData>> {
    let series = Condition::ALL
        .iter()
        .map(|&condition| -> Result<ScatterSeries> {
            Ok(ScatterSeries {
                label: Some(condition.to_string()),
                color: condition_color(condition),
                points: points(conditions.get(condition), SURPRISAL, y_column)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if series.iter().all(|s| s.points.is_empty()) {
        return Ok(None);
    }

    let y_max = finite_max(conditions.all.numeric_column(y_column)?)
        .unwrap_or(0.0)
        .ceil()
        + headroom;

    let axes = Axes {
        title: title.to_string(),
        x_label: SURPRISAL_LABEL.to_string(),
        y_label: RT_LABEL.to_string(),
        x_range: settings.surprisal_range.clone(),
        y_range: 0.0..y_max,
    };
    Ok(Some(FigureData::Scatter(series, axes)))
}

/// Scatter of one condition with each distinct surprisal value in its own colour.
fn surprisal_palette_scatter(
    conditions: &ConditionTables,
    condition: Condition,
) -> Result<Option<FigureData>> {
    let mut pts = points(conditions.get(condition), SURPRISAL, ADV_RT)?;
    if pts.is_empty() {
        return Ok(None);
    }
    pts.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut series: Vec<ScatterSeries> = Vec::new();
    for (x, y) in pts {
        match series.last_mut() {
            Some(last) if last.points[0].0 == x => last.points.push((x, y)),
            _ => {
                let color = palette_color(series.len());
                series.push(ScatterSeries {
                    label: None,
                    color,
                    points: vec![(x, y)],
                });
            }
        }
    }

    let x_min = series.first().map(|s| s.points[0].0).unwrap_or(0.0).floor();
    let x_max = series.last().map(|s| s.points[0].0).unwrap_or(0.0).ceil();
    let x_range = match condition {
        Condition::Common => padded_range(x_min, x_max),
        Condition::Rare => padded_range(x_min - 1.0, x_max + 3.0),
    };

    let y_max = finite_max(conditions.all.numeric_column(ADV_RT)?)
        .unwrap_or(0.0)
        .ceil();

    let axes = Axes {
        title: format!("Adverb Surprisal vs. Adverb RT ({})", condition),
        x_label: SURPRISAL_LABEL.to_string(),
        y_label: RT_LABEL.to_string(),
        x_range,
        y_range: padded_range(0.0, y_max),
    };
    Ok(Some(FigureData::Scatter(series, axes)))
}

/// Grouped bars of mean adverb RT per condition over a shared category axis.
fn grouped_mean_bars(
    conditions: &ConditionTables,
    column: &str,
    axis: &[Value],
) -> Result<Vec<BarGroup>> {
    Condition::ALL
        .iter()
        .map(|&condition| -> Result<BarGroup> {
            let summary = aggregate_by_category(conditions.get(condition), column)?;
            let observed = summary.metric_values(Metric::AdvRtMean);
            Ok(BarGroup {
                label: Some(condition.to_string()),
                color: condition_color(condition),
                opacity: 1.0,
                values: assemble(axis, &summary.metric_map(Metric::AdvRtMean), 0.0),
                error: None,
                reference: mean(&observed),
            })
        })
        .collect()
}

fn word_length_bars(conditions: &ConditionTables) -> Result<Option<FigureData>> {
    let keys = distinct_values(&conditions.all, WORD_LENGTH)?;
    // Lengths that never occur still get a slot on the axis.
    let axis: Vec<Value> = match integer_axis(&keys) {
        Some(lengths) => lengths.into_iter().map(Value::Int).collect(),
        None => keys,
    };
    if axis.is_empty() {
        return Ok(None);
    }

    let groups = grouped_mean_bars(conditions, WORD_LENGTH, &axis)?;
    let axes = Axes {
        title: "Mean Adverb RTs by Adverb Length".to_string(),
        x_label: "Length (Characters)".to_string(),
        y_label: RT_LABEL.to_string(),
        x_range: category_range(axis.len()),
        y_range: 0.0..bar_y_max(&groups),
    };
    let chart = BarChart {
        categories: axis.iter().map(ToString::to_string).collect(),
        groups,
        bar_width: 0.4,
    };
    Ok(Some(FigureData::Bars(chart, axes)))
}

fn participant_bars(conditions: &ConditionTables) -> Result<Option<FigureData>> {
    let mut ids: BTreeSet<Value> = BTreeSet::new();
    for condition in Condition::ALL {
        ids.extend(distinct_values(conditions.get(condition), PARTICIPANT)?);
    }
    if ids.is_empty() {
        return Ok(None);
    }

    let axis: Vec<Value> = ids.into_iter().collect();
    let groups = grouped_mean_bars(conditions, PARTICIPANT, &axis)?;
    let axes = Axes {
        title: "Mean Adverb RTs by Participant".to_string(),
        x_label: "Participant ID".to_string(),
        y_label: RT_LABEL.to_string(),
        x_range: category_range(axis.len()),
        y_range: 0.0..bar_y_max(&groups),
    };
    let chart = BarChart {
        categories: axis.iter().map(ToString::to_string).collect(),
        groups,
        bar_width: 0.4,
    };
    Ok(Some(FigureData::Bars(chart, axes)))
}

/// Per-adverb bars of one condition with a population-std error bar.
fn adverb_group(
    conditions: &ConditionTables,
    condition: Condition,
    metric: Metric,
    pairs: &[AdverbPair],
) -> Result<(Vec<String>, BarGroup)> {
    let summary = conditions.adverb_summary(condition, pairs)?;
    let values = summary.metric_values(metric);
    let categories = summary.keys().iter().map(ToString::to_string).collect();

    Ok((
        categories,
        BarGroup {
            label: None,
            color: condition_color(condition),
            opacity: 0.5,
            error: population_std(&values),
            reference: mean(&values),
            values,
        },
    ))
}

fn adverb_bars(
    conditions: &ConditionTables,
    condition: Condition,
    metric: Metric,
    settings: &FigureSettings,
) -> Result<Option<FigureData>> {
    let (categories, group) = adverb_group(conditions, condition, metric, &settings.adverb_pairs)?;
    if categories.is_empty() {
        return Ok(None);
    }

    // Both conditions share one y scale so the figures can be compared.
    let mut both = Vec::new();
    for other in Condition::ALL {
        both.push(adverb_group(conditions, other, metric, &settings.adverb_pairs)?.1);
    }

    let rt_kind = match metric {
        Metric::SentRtMean | Metric::SentRtMedian => "Sentence",
        Metric::AdvRtMean | Metric::AdvRtMedian => "Adverb",
    };
    if let Some(grand_mean) = group.reference {
        info!(
            "Mean {} RT for {}: {:.4}",
            rt_kind.to_lowercase(),
            condition.to_string().to_lowercase(),
            grand_mean
        );
    }

    let axes = Axes {
        title: format!("Mean {} RTs by Adverb ({})", rt_kind, condition),
        x_label: String::new(),
        y_label: RT_LABEL.to_string(),
        x_range: category_range(categories.len()),
        y_range: 0.0..bar_y_max(&both),
    };
    let chart = BarChart {
        categories,
        groups: vec![group],
        bar_width: 0.8,
    };
    Ok(Some(FigureData::Bars(chart, axes)))
}
