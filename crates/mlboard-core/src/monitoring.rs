//! Monitoring-chart computations for monitored models.
//!
//! Pure functions over a model's prediction history: histogram binning with
//! the usual bin-count rules, value counts, per-day volumes, and the
//! regression/classification quality metrics. Predictions without ground
//! truth are skipped by the metric computations.

use chrono::Datelike;
use serde::Serialize;
use serde_json::Value;

use crate::models::{MonitoringChart, MonitoringChartType, Prediction};

// ─── Histograms ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub center: f64,
    pub count: usize,
}

/// Equal-width bins over `[min, max]`; the last bin is right-closed so the
/// maximum lands in it.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = (max - min) / bins as f64;

    (0..bins)
        .map(|i| {
            let start = min + i as f64 * width;
            let end = start + width;
            let count = if i == bins - 1 {
                values.iter().filter(|v| **v >= start && **v <= max).count()
            } else {
                values.iter().filter(|v| **v >= start && **v < end).count()
            };
            HistogramBin {
                start,
                end,
                center: (start + end) / 2.0,
                count,
            }
        })
        .collect()
}

fn bins_from_width(values: &[f64], width: f64) -> usize {
    if !width.is_finite() || width <= 0.0 {
        return 1;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (((max - min) / width).ceil() as usize).max(1)
}

/// Square-root rule: `ceil(sqrt(n))` bins.
pub fn square_root_bins(values: &[f64]) -> Vec<HistogramBin> {
    histogram(values, (values.len() as f64).sqrt().ceil() as usize)
}

/// Sturges' rule: `ceil(log2(n) + 1)` bins.
pub fn sturges_bins(values: &[f64]) -> Vec<HistogramBin> {
    if values.is_empty() {
        return Vec::new();
    }
    histogram(values, ((values.len() as f64).log2() + 1.0).ceil() as usize)
}

/// Scott's rule: bin width `3.5 * stddev / n^(1/3)`.
pub fn scott_bins(values: &[f64]) -> Vec<HistogramBin> {
    if values.is_empty() {
        return Vec::new();
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
    let width = 3.5 * std / n.cbrt();
    histogram(values, bins_from_width(values, width))
}

/// Freedman-Diaconis rule: bin width `2 * IQR / n^(1/3)`. Expects the values
/// sorted ascending, as the quantiles do.
pub fn freedman_diaconis_bins(sorted: &[f64]) -> Vec<HistogramBin> {
    if sorted.is_empty() {
        return Vec::new();
    }
    let iqr = quantile(sorted, 0.75) - quantile(sorted, 0.25);
    let width = 2.0 * iqr / (sorted.len() as f64).cbrt();
    histogram(sorted, bins_from_width(sorted, width))
}

/// Linearly interpolated q-quantile of ascending-sorted data.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = (sorted.len() - 1) as f64 * q;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let fraction = index - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

// ─── Counts ──────────────────────────────────────────────────────────────────

fn value_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Unique values with their frequencies, in first-seen order. Backs the
/// countplot.
pub fn count_unique(values: &[Value]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for value in values {
        let label = value_label(value);
        match counts.iter_mut().find(|(seen, _)| *seen == label) {
            Some((_, count)) => *count += 1,
            None => counts.push((label, 1)),
        }
    }
    counts
}

/// Prediction volume per calendar day, in first-seen order. Day keys follow
/// the dashboard's `YYYY-M-DD` format (month unpadded, day padded).
pub fn predictions_per_day(predictions: &[Prediction]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for prediction in predictions {
        let date = prediction.prediction_date;
        let key = format!("{}-{}-{:02}", date.year(), date.month(), date.day());
        match counts.iter_mut().find(|(seen, _)| *seen == key) {
            Some((_, count)) => *count += 1,
            None => counts.push((key, 1)),
        }
    }
    counts
}

// ─── Quality metrics ─────────────────────────────────────────────────────────

/// Pairs of (actual, predicted) for predictions with ground truth.
fn labeled_pairs(predictions: &[Prediction]) -> Vec<(f64, f64)> {
    predictions
        .iter()
        .filter_map(|p| p.actual.map(|actual| (actual, p.prediction)))
        .filter(|(a, p)| a.is_finite() && p.is_finite())
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RegressionMetrics {
    pub r2: f64,
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub msle: f64,
    pub rmsle: f64,
    pub medae: f64,
    pub smape: f64,
}

pub fn regression_metrics(predictions: &[Prediction]) -> RegressionMetrics {
    let pairs = labeled_pairs(predictions);
    let n = pairs.len();
    if n == 0 {
        return RegressionMetrics::default();
    }
    let nf = n as f64;

    let mean_actual = pairs.iter().map(|(a, _)| a).sum::<f64>() / nf;
    let sst: f64 = pairs.iter().map(|(a, _)| (a - mean_actual).powi(2)).sum();
    let ssr: f64 = pairs.iter().map(|(a, p)| (a - p).powi(2)).sum();

    let r2 = 1.0 - ssr / sst;
    let mse = ssr / nf;
    let mae = pairs.iter().map(|(a, p)| (a - p).abs()).sum::<f64>() / nf;
    let msle = pairs
        .iter()
        .map(|(a, p)| (a.ln_1p() - p.ln_1p()).powi(2))
        .sum::<f64>()
        / nf;

    let mut absolute_errors: Vec<f64> = pairs.iter().map(|(a, p)| (a - p).abs()).collect();
    absolute_errors.sort_by(|a, b| a.total_cmp(b));
    let medae = if n % 2 == 0 {
        (absolute_errors[n / 2 - 1] + absolute_errors[n / 2]) / 2.0
    } else {
        absolute_errors[n / 2]
    };

    let smape = pairs
        .iter()
        .map(|(a, p)| {
            let denominator = (a.abs() + p.abs()) / 2.0;
            if denominator != 0.0 {
                (a - p).abs() / denominator
            } else {
                0.0
            }
        })
        .sum::<f64>()
        / nf;

    RegressionMetrics {
        r2: if r2.is_finite() { r2 } else { 0.0 },
        mse,
        rmse: mse.sqrt(),
        mae,
        msle,
        rmsle: msle.sqrt(),
        medae,
        smape,
    }
}

/// Confusion matrix plus the sorted class labels indexing its rows/columns.
/// Rows are actual classes, columns predicted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfusionMatrix {
    pub classes: Vec<f64>,
    pub matrix: Vec<Vec<usize>>,
}

pub fn confusion_matrix(predictions: &[Prediction]) -> ConfusionMatrix {
    confusion_from_pairs(&labeled_pairs(predictions))
}

fn confusion_from_pairs(pairs: &[(f64, f64)]) -> ConfusionMatrix {
    if pairs.is_empty() {
        return ConfusionMatrix::default();
    }
    let mut classes: Vec<f64> = pairs.iter().flat_map(|&(a, p)| [a, p]).collect();
    classes.sort_by(|a, b| a.total_cmp(b));
    classes.dedup();

    let class_index = |value: f64| -> usize {
        classes
            .binary_search_by(|c| c.total_cmp(&value))
            .unwrap_or(0)
    };

    let mut matrix = vec![vec![0usize; classes.len()]; classes.len()];
    for &(actual, predicted) in pairs {
        matrix[class_index(actual)][class_index(predicted)] += 1;
    }
    ConfusionMatrix { classes, matrix }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    /// Macro-averaged over classes.
    pub precision: f64,
    pub recall: f64,
    pub f1score: f64,
    pub mcc: f64,
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn classification_metrics(predictions: &[Prediction]) -> ClassificationMetrics {
    let pairs = labeled_pairs(predictions);
    if pairs.is_empty() {
        return ClassificationMetrics::default();
    }
    let confusion = confusion_from_pairs(&pairs);
    let matrix = &confusion.matrix;
    let k = matrix.len();
    let total: usize = matrix.iter().flatten().sum();
    let correct: usize = (0..k).map(|i| matrix[i][i]).sum();

    let mut precision = Vec::with_capacity(k);
    let mut recall = Vec::with_capacity(k);
    let mut f1 = Vec::with_capacity(k);
    for i in 0..k {
        let true_positive = matrix[i][i] as f64;
        let predicted_as_i: f64 = (0..k).map(|row| matrix[row][i] as f64).sum();
        let actually_i: f64 = matrix[i].iter().map(|&v| v as f64).sum();

        let p = if predicted_as_i != 0.0 {
            true_positive / predicted_as_i
        } else {
            0.0
        };
        let r = if actually_i != 0.0 {
            true_positive / actually_i
        } else {
            0.0
        };
        precision.push(p);
        recall.push(r);
        f1.push(if p + r != 0.0 { 2.0 * p * r / (p + r) } else { 0.0 });
    }

    // Multiclass MCC over the confusion matrix: t = per-class predicted
    // totals, p = per-class actual totals.
    let s = total as f64;
    let c = correct as f64;
    let t: Vec<f64> = (0..k)
        .map(|col| (0..k).map(|row| matrix[row][col] as f64).sum())
        .collect();
    let p: Vec<f64> = matrix
        .iter()
        .map(|row| row.iter().map(|&v| v as f64).sum())
        .collect();
    let numerator = c * s - dot(&t, &p);
    let denominator = (s * s - dot(&p, &p)).sqrt() * (s * s - dot(&t, &t)).sqrt();
    let mcc = if denominator != 0.0 {
        numerator / denominator
    } else {
        0.0
    };

    let kf = k as f64;
    ClassificationMetrics {
        accuracy: correct as f64 / total as f64,
        precision: precision.iter().sum::<f64>() / kf,
        recall: recall.iter().sum::<f64>() / kf,
        f1score: f1.iter().sum::<f64>() / kf,
        mcc,
    }
}

// ─── Chart titles ────────────────────────────────────────────────────────────

/// Display title generated from a monitoring chart's definition.
pub fn chart_title(chart: &MonitoringChart) -> String {
    let x = chart.x_axis_column.as_deref().unwrap_or_default();
    let y = chart
        .y_axis_columns
        .as_deref()
        .map(|columns| columns.join(","))
        .unwrap_or_default();
    match chart.chart_type {
        MonitoringChartType::Histogram => format!("Histogram of {x}"),
        MonitoringChartType::Scatter => format!("Scatter plot of {x} and {y}"),
        MonitoringChartType::ScatterWithHistograms => {
            format!("Comparison of {x} and {y} with histograms")
        }
        MonitoringChartType::Countplot => format!("Countplot of {x}"),
        MonitoringChartType::Timeseries => format!("Timeseries of {x}"),
        MonitoringChartType::RegressionMetrics => "Regression metrics".to_string(),
        MonitoringChartType::ClassificationMetrics => "Classification metrics".to_string(),
        MonitoringChartType::ConfusionMatrix => "Confusion matrix".to_string(),
    }
}
