//! Chart series shaping: axis-type inference, (x, y) pairing, and labels.
//!
//! Interactive charts arrive as raw `x_data`/`y_data` arrays in one of two
//! shapes: a single shared x-axis for every y-array, or one x-array per
//! y-array. Anything else is malformed and rejected — the engine never
//! guesses a pairing.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;

use crate::error::{MlboardError, Result};
use crate::models::{Chart, ChartType};

/// A plot-ready point: `[x, y]` in emission order.
pub type Point = [Value; 2];

/// Axis type inferred from the x-axis data itself, not from any declared
/// schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisKind {
    Value,
    Time,
    Category,
}

/// Whether labels are being produced for a single run or for the compare
/// view, where each series must stay attributable to its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelMode {
    Single,
    Compare,
}

/// One named, plot-ready series.
#[derive(Debug, Clone, Serialize)]
pub struct LabeledSeries {
    pub name: String,
    pub chart_type: ChartType,
    pub points: Vec<Point>,
}

fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_f64().is_some_and(f64::is_finite),
        Value::String(s) => s.trim().parse::<f64>().is_ok_and(f64::is_finite),
        _ => false,
    }
}

fn is_timestamp(value: &Value) -> bool {
    let Value::String(s) = value else {
        return false;
    };
    let s = s.trim();
    DateTime::parse_from_rfc3339(s).is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").is_ok()
        || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Infer the shared x-axis type for one or more charts rendered together.
///
/// Every element of every x-array is sampled: all finite numbers (numeric
/// strings included) give a value axis, all timestamp-like strings give a
/// time axis, and any mix falls back to a category axis.
pub fn axis_kind<'a>(charts: impl IntoIterator<Item = &'a Chart>) -> AxisKind {
    let mut any = false;
    let mut all_numeric = true;
    let mut all_time = true;
    for chart in charts {
        for array in &chart.x_data {
            for value in array {
                any = true;
                all_numeric = all_numeric && is_numeric(value);
                all_time = all_time && is_timestamp(value);
            }
        }
    }
    if !any || all_numeric {
        AxisKind::Value
    } else if all_time {
        AxisKind::Time
    } else {
        AxisKind::Category
    }
}

/// Pair x- and y-arrays into point series.
///
/// Shared shape: one x-array reused for every y-array. Per-series shape:
/// equal counts, paired index-wise. Any other arity is a hard failure.
pub fn pair_series(x_data: &[Vec<Value>], y_data: &[Vec<Value>]) -> Result<Vec<Vec<Point>>> {
    let pair = |x: &Vec<Value>, y: &Vec<Value>| -> Vec<Point> {
        x.iter()
            .zip(y.iter())
            .map(|(xv, yv)| [xv.clone(), yv.clone()])
            .collect()
    };

    if x_data.len() == 1 {
        Ok(y_data.iter().map(|y| pair(&x_data[0], y)).collect())
    } else if x_data.len() == y_data.len() {
        Ok(x_data
            .iter()
            .zip(y_data.iter())
            .map(|(x, y)| pair(x, y))
            .collect())
    } else {
        Err(MlboardError::ShapeMismatch {
            x_arrays: x_data.len(),
            y_arrays: y_data.len(),
        })
    }
}

/// Build labeled, plot-ready series for one chart.
///
/// Declared series names win when present. Without them, multi-series charts
/// fall back to `"{run} (1)"`, `"{run} (2)"`, …, and a lone series takes the
/// bare run name. In compare mode declared names get `" - {run}"` appended so
/// they stay attributable; the fallbacks already carry the run name.
pub fn build_chart_series(
    chart: &Chart,
    iteration_name: &str,
    mode: LabelMode,
) -> Result<Vec<LabeledSeries>> {
    let series = pair_series(&chart.x_data, &chart.y_data)?;
    let declared = chart
        .y_data_names
        .as_deref()
        .filter(|names| !names.is_empty());
    let multi = series.len() >= 2;

    Ok(series
        .into_iter()
        .enumerate()
        .map(|(i, points)| {
            let name = match (declared.and_then(|names| names.get(i)), mode) {
                (Some(declared), LabelMode::Compare) => {
                    format!("{declared} - {iteration_name}")
                }
                (Some(declared), LabelMode::Single) => declared.clone(),
                (None, _) if multi => format!("{iteration_name} ({})", i + 1),
                (None, _) => iteration_name.to_string(),
            };
            LabeledSeries {
                name,
                chart_type: chart.chart_type,
                points,
            }
        })
        .collect())
}
