//! Multi-run compare engine.
//!
//! Given the caller's selected iterations (at least two), produces the full
//! side-by-side report: per-run detail rows, parameter/metric diff tables, a
//! metrics bar chart, merged custom charts, and grouped image charts. All
//! output is plain data; rendering belongs to the view layer.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::{MlboardError, Result};
use crate::models::{Chart, ChartType, Iteration, ScalarMap};
use crate::series::{axis_kind, build_chart_series, AxisKind, LabelMode, LabeledSeries};

// ─── Display-name disambiguation ─────────────────────────────────────────────

/// Append `" (2)"`, `" (3)"`, … to repeated names, in order. The first
/// occurrence stays untouched.
pub fn disambiguate_names(names: &[String]) -> Vec<String> {
    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    names
        .iter()
        .map(|name| {
            let n = occurrences.entry(name.as_str()).or_insert(0);
            *n += 1;
            if *n == 1 {
                name.clone()
            } else {
                format!("{name} ({n})")
            }
        })
        .collect()
}

// ─── Most-frequent metadata reducer ──────────────────────────────────────────

/// Most frequent non-empty value; ties resolve to the first encountered.
/// All-empty input reduces to `""`, never to a null.
pub fn most_frequent<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for value in values {
        if value.is_empty() {
            continue;
        }
        match counts.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }
    let mut best: Option<(&str, usize)> = None;
    for &(value, count) in &counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value.to_string()).unwrap_or_default()
}

/// Shared title/subtitle/axis labels for a merged chart, each field reduced
/// independently across the group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartMeta {
    pub title: String,
    pub subtitle: String,
    pub x_label: String,
    pub y_label: String,
}

pub fn shared_metadata<'a>(charts: impl IntoIterator<Item = &'a Chart> + Clone) -> ChartMeta {
    ChartMeta {
        title: most_frequent(charts.clone().into_iter().map(|c| c.chart_title.as_str())),
        subtitle: most_frequent(charts.clone().into_iter().map(|c| c.chart_subtitle.as_str())),
        x_label: most_frequent(charts.clone().into_iter().map(|c| c.x_label.as_str())),
        y_label: most_frequent(charts.into_iter().map(|c| c.y_label.as_str())),
    }
}

// ─── Diff tables ─────────────────────────────────────────────────────────────

pub const MISSING_CELL: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffRow {
    pub key: String,
    pub cells: Vec<String>,
}

/// Union-of-keys table: one row per key in first-encountered order, one cell
/// per iteration, `"-"` where the iteration lacks the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffTable {
    /// Disambiguated iteration display names, one per column.
    pub columns: Vec<String>,
    pub rows: Vec<DiffRow>,
}

fn scalar_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => MISSING_CELL.to_string(),
        other => other.to_string(),
    }
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn diff_table(
    iterations: &[&Iteration],
    columns: &[String],
    pick: impl for<'a> Fn(&'a Iteration) -> &'a ScalarMap,
) -> DiffTable {
    let mut keys: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for &iteration in iterations {
        for key in pick(iteration).keys() {
            if seen.insert(key.clone()) {
                keys.push(key.clone());
            }
        }
    }

    let rows = keys
        .into_iter()
        .map(|key| {
            let cells = iterations
                .iter()
                .map(|&iteration| {
                    pick(iteration)
                        .get(&key)
                        .map(scalar_cell)
                        .unwrap_or_else(|| MISSING_CELL.to_string())
                })
                .collect();
            DiffRow { key, cells }
        })
        .collect();

    DiffTable {
        columns: columns.to_vec(),
        rows,
    }
}

// ─── Metrics comparison chart ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    pub name: String,
    /// One slot per category; `None` leaves a gap where the run lacks the
    /// metric or holds a non-numeric value.
    pub data: Vec<Option<f64>>,
}

/// Bar chart putting every selected run side by side per metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsBarChart {
    pub categories: Vec<String>,
    pub series: Vec<BarSeries>,
}

fn metrics_bar_chart(
    iterations: &[&Iteration],
    display_names: &[String],
    metrics: &DiffTable,
) -> Option<MetricsBarChart> {
    if metrics.rows.is_empty() {
        return None;
    }
    let categories: Vec<String> = metrics.rows.iter().map(|row| row.key.clone()).collect();
    let series = iterations
        .iter()
        .zip(display_names)
        .map(|(&iteration, name)| BarSeries {
            name: name.clone(),
            data: categories
                .iter()
                .map(|key| iteration.metrics.get(key).and_then(numeric_value))
                .collect(),
        })
        .collect();
    Some(MetricsBarChart { categories, series })
}

// ─── Custom-chart union ──────────────────────────────────────────────────────

/// A merged, cross-run chart: concatenated series from every contributing
/// iteration plus the group's shared metadata.
#[derive(Debug, Clone, Serialize)]
pub struct MergedChart {
    /// Group key: the charts' logical name.
    pub name: String,
    pub chart_type: ChartType,
    pub axis: AxisKind,
    pub meta: ChartMeta,
    pub series: Vec<LabeledSeries>,
}

/// A chart that cannot be merged across runs (pie, boxplot) and passes
/// through as a per-run chart tagged with its run.
#[derive(Debug, Clone, Serialize)]
pub struct SingleRunChart {
    pub iteration_name: String,
    pub chart: Chart,
}

#[derive(Debug, Clone, Serialize)]
pub enum CompareChartEntry {
    Merged(MergedChart),
    Single(SingleRunChart),
}

struct GroupedChart<'a> {
    chart: &'a Chart,
    iteration_name: &'a str,
}

/// Group comparable charts for merging: line/bar/scatter charts by logical
/// name, pie/boxplot charts by type. Insertion order is preserved.
fn group_comparable_charts<'a>(
    iterations: &[&'a Iteration],
    display_names: &'a [String],
) -> Vec<(String, Vec<GroupedChart<'a>>)> {
    let mut groups: Vec<(String, Vec<GroupedChart<'a>>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (&iteration, name) in iterations.iter().zip(display_names) {
        for chart in iteration.interactive_charts.iter().filter(|c| c.comparable) {
            let key = match chart.chart_type {
                ChartType::Pie | ChartType::Boxplot => chart.chart_type.to_string(),
                _ => chart.name.clone(),
            };
            let slot = *index.entry(key.clone()).or_insert_with(|| {
                groups.push((key, Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(GroupedChart {
                chart,
                iteration_name: name.as_str(),
            });
        }
    }
    groups
}

fn merge_chart_group(name: &str, group: &[GroupedChart<'_>]) -> Result<MergedChart> {
    let chart_type = group[0].chart.chart_type;
    if group.iter().any(|g| g.chart.chart_type != chart_type) {
        return Err(MlboardError::MixedChartTypes(name.to_string()));
    }
    if matches!(chart_type, ChartType::Pie | ChartType::Boxplot) {
        return Err(MlboardError::NotCombinable(chart_type.to_string()));
    }
    if chart_type == ChartType::Bar {
        let first_x = group[0].chart.x_data.first();
        if group.iter().any(|g| g.chart.x_data.first() != first_x) {
            return Err(MlboardError::BarAxisMismatch(name.to_string()));
        }
    }

    let mut series = Vec::new();
    for grouped in group {
        series.extend(build_chart_series(
            grouped.chart,
            grouped.iteration_name,
            LabelMode::Compare,
        )?);
    }
    if series.is_empty() {
        return Err(MlboardError::NoAxisData(name.to_string()));
    }

    Ok(MergedChart {
        name: name.to_string(),
        chart_type,
        axis: axis_kind(group.iter().map(|g| g.chart)),
        meta: shared_metadata(group.iter().map(|g| g.chart)),
        series,
    })
}

// ─── Image-chart gallery ─────────────────────────────────────────────────────

/// Data-URI prefix sniffed from the first character of a base64 payload.
pub fn data_image_type(encoded_image: &str) -> Option<&'static str> {
    match encoded_image.chars().next() {
        Some('/') => Some("data:image/jpeg;base64"),
        Some('i') => Some("data:image/png;base64"),
        Some('R') => Some("data:image/gif;base64"),
        Some('Q') => Some("data:image/bmp;base64"),
        Some('U') => Some("data:image/webp;base64"),
        Some('P') => Some("data:image/svg+xml;base64"),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryImage {
    /// Position in the flat `sources` list, addressable by the viewer.
    pub index: usize,
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageGroup {
    pub iteration_name: String,
    pub images: Vec<GalleryImage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSource {
    pub title: String,
    pub url: String,
}

/// Comparable image charts grouped per run, plus the flat globally-indexed
/// source list the image viewer pages through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageGallery {
    pub groups: Vec<ImageGroup>,
    pub sources: Vec<ImageSource>,
}

fn image_gallery(iterations: &[&Iteration], display_names: &[String]) -> ImageGallery {
    let mut gallery = ImageGallery::default();
    for (&iteration, name) in iterations.iter().zip(display_names) {
        let mut images = Vec::new();
        for chart in iteration.image_charts.iter().filter(|c| c.comparable) {
            // Images with an unrecognized encoding are not viewable and stay
            // out of the gallery.
            let Some(mime) = data_image_type(&chart.encoded_image) else {
                continue;
            };
            let url = format!("{mime},{}", chart.encoded_image);
            images.push(GalleryImage {
                index: gallery.sources.len(),
                name: chart.name.clone(),
                url: url.clone(),
            });
            gallery.sources.push(ImageSource {
                title: format!("{} @{}", chart.name, name),
                url,
            });
        }
        if !images.is_empty() {
            gallery.groups.push(ImageGroup {
                iteration_name: name.clone(),
                images,
            });
        }
    }
    gallery
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// How a run refers to its model: a monitored model registered with the
/// dashboard, a bare filesystem path, or nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ModelRef {
    Monitored { id: String, name: String },
    Path(String),
    None,
}

/// Everything the compare view renders, in render order.
#[derive(Debug, Clone, Serialize)]
pub struct CompareReport {
    pub ids: Vec<String>,
    /// Disambiguated run names; all other per-run vectors align with these.
    pub display_names: Vec<String>,
    pub experiment_names: Vec<String>,
    pub created_at: Vec<DateTime<Utc>>,
    pub run_by: Vec<String>,
    pub models: Vec<ModelRef>,
    pub dataset_names: Vec<String>,
    pub dataset_versions: Vec<String>,
    pub parameters: DiffTable,
    pub metrics: DiffTable,
    pub metrics_chart: Option<MetricsBarChart>,
    pub custom_charts: Vec<CompareChartEntry>,
    pub image_charts: ImageGallery,
}

/// Build the full compare report for the selected iterations.
///
/// Requires at least two iterations; a smaller selection is a caller bug, not
/// an empty-data case.
pub fn compare_iterations(iterations: &[&Iteration]) -> Result<CompareReport> {
    if iterations.len() < 2 {
        return Err(MlboardError::NotEnoughIterations(iterations.len()));
    }

    let names: Vec<String> = iterations
        .iter()
        .map(|it| it.iteration_name.clone())
        .collect();
    let display_names = disambiguate_names(&names);

    let parameters = diff_table(iterations, &display_names, |it| &it.parameters);
    let metrics = diff_table(iterations, &display_names, |it| &it.metrics);
    let metrics_chart = metrics_bar_chart(iterations, &display_names, &metrics);

    let mut custom_charts = Vec::new();
    for (name, group) in group_comparable_charts(iterations, &display_names) {
        let chart_type = group[0].chart.chart_type;
        if matches!(chart_type, ChartType::Pie | ChartType::Boxplot) {
            // Not combinable across runs; every group member passes through
            // as its own single-run chart.
            for grouped in &group {
                custom_charts.push(CompareChartEntry::Single(SingleRunChart {
                    iteration_name: grouped.iteration_name.to_string(),
                    chart: grouped.chart.clone(),
                }));
            }
        } else {
            custom_charts.push(CompareChartEntry::Merged(merge_chart_group(&name, &group)?));
        }
    }

    let image_charts = image_gallery(iterations, &display_names);

    Ok(CompareReport {
        ids: iterations.iter().map(|it| it.id.clone()).collect(),
        experiment_names: iterations
            .iter()
            .map(|it| it.experiment_name.clone())
            .collect(),
        created_at: iterations.iter().map(|it| it.created_at).collect(),
        run_by: iterations.iter().map(|it| it.user_name.clone()).collect(),
        models: iterations.iter().map(|it| model_ref(it)).collect(),
        dataset_names: iterations
            .iter()
            .map(|it| {
                it.dataset
                    .as_ref()
                    .map(|d| d.name.clone())
                    .unwrap_or_else(|| MISSING_CELL.to_string())
            })
            .collect(),
        dataset_versions: iterations
            .iter()
            .map(|it| match &it.dataset {
                Some(d) if !d.version.is_empty() => d.version.clone(),
                _ => MISSING_CELL.to_string(),
            })
            .collect(),
        display_names,
        parameters,
        metrics,
        metrics_chart,
        custom_charts,
        image_charts,
    })
}

fn model_ref(iteration: &Iteration) -> ModelRef {
    match (
        &iteration.assigned_monitored_model_id,
        &iteration.assigned_monitored_model_name,
    ) {
        (Some(id), Some(name)) => ModelRef::Monitored {
            id: id.clone(),
            name: name.clone(),
        },
        _ if !iteration.path_to_model.is_empty() => {
            ModelRef::Path(iteration.path_to_model.clone())
        }
        _ => ModelRef::None,
    }
}
