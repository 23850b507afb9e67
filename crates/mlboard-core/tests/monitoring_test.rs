//! Integration tests for the monitoring computations.

mod common;

use chrono::{TimeZone, Utc};
use serde_json::json;

use common::*;
use mlboard_core::models::MonitoringChartType;
use mlboard_core::monitoring::{
    chart_title, classification_metrics, confusion_matrix, count_unique, histogram,
    predictions_per_day, quantile, regression_metrics, square_root_bins, sturges_bins,
};

fn approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

// ─── Histograms ──────────────────────────────────────────────────────────────

#[test]
fn histogram_splits_range_into_equal_bins() {
    let bins = histogram(&[1.0, 2.0, 3.0, 4.0], 2);
    assert_eq!(bins.len(), 2);

    approx(bins[0].start, 1.0);
    approx(bins[0].end, 2.5);
    approx(bins[0].center, 1.75);
    assert_eq!(bins[0].count, 2);

    // The last bin is right-closed so the maximum lands in it.
    approx(bins[1].start, 2.5);
    approx(bins[1].end, 4.0);
    assert_eq!(bins[1].count, 2);
}

#[test]
fn histogram_handles_degenerate_inputs() {
    assert!(histogram(&[], 4).is_empty());
    assert!(histogram(&[1.0, 2.0], 0).is_empty());

    // All-equal values collapse into the final (closed) bin.
    let bins = histogram(&[5.0, 5.0, 5.0], 3);
    assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 3);
    assert_eq!(bins[2].count, 3);
}

#[test]
fn bin_count_rules() {
    // Square root: ceil(sqrt(9)) = 3.
    let values: Vec<f64> = (1..=9).map(f64::from).collect();
    assert_eq!(square_root_bins(&values).len(), 3);

    // Sturges: ceil(log2(8) + 1) = 4.
    let values: Vec<f64> = (1..=8).map(f64::from).collect();
    assert_eq!(sturges_bins(&values).len(), 4);
}

#[test]
fn quantile_interpolates_linearly() {
    let sorted = [1.0, 2.0, 3.0, 4.0];
    approx(quantile(&sorted, 0.5), 2.5);
    approx(quantile(&sorted, 0.25), 1.75);
    approx(quantile(&sorted, 0.0), 1.0);
    approx(quantile(&sorted, 1.0), 4.0);
}

// ─── Counts ──────────────────────────────────────────────────────────────────

#[test]
fn count_unique_preserves_first_seen_order() {
    let values = vec![json!("cat"), json!("dog"), json!("cat"), json!(3)];
    assert_eq!(
        count_unique(&values),
        vec![
            ("cat".to_string(), 2),
            ("dog".to_string(), 1),
            ("3".to_string(), 1)
        ]
    );
}

#[test]
fn predictions_per_day_uses_dashboard_date_format() {
    let at = |day, hour| {
        let mut p = prediction("p", 1.0, None);
        p.prediction_date = Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap();
        p
    };
    let predictions = vec![at(5, 9), at(5, 17), at(6, 3)];

    assert_eq!(
        predictions_per_day(&predictions),
        vec![("2024-3-05".to_string(), 2), ("2024-3-06".to_string(), 1)]
    );
}

// ─── Regression metrics ──────────────────────────────────────────────────────

#[test]
fn regression_metrics_on_perfect_predictions() {
    let predictions = vec![
        prediction("p1", 1.0, Some(1.0)),
        prediction("p2", 2.0, Some(2.0)),
        prediction("p3", 3.0, Some(3.0)),
    ];
    let m = regression_metrics(&predictions);
    approx(m.r2, 1.0);
    approx(m.mse, 0.0);
    approx(m.rmse, 0.0);
    approx(m.mae, 0.0);
    approx(m.medae, 0.0);
    approx(m.smape, 0.0);
}

#[test]
fn regression_metrics_on_known_errors() {
    // actuals [1, 2, 3] vs constant prediction 2.
    let predictions = vec![
        prediction("p1", 2.0, Some(1.0)),
        prediction("p2", 2.0, Some(2.0)),
        prediction("p3", 2.0, Some(3.0)),
    ];
    let m = regression_metrics(&predictions);
    approx(m.r2, 0.0);
    approx(m.mse, 2.0 / 3.0);
    approx(m.rmse, (2.0f64 / 3.0).sqrt());
    approx(m.mae, 2.0 / 3.0);
    approx(m.medae, 1.0);
}

#[test]
fn regression_metrics_skip_unlabeled_predictions() {
    let predictions = vec![
        prediction("p1", 2.0, Some(2.0)),
        prediction("p2", 99.0, None),
    ];
    let m = regression_metrics(&predictions);
    approx(m.mse, 0.0);

    let unlabeled = vec![prediction("p1", 1.0, None)];
    let m = regression_metrics(&unlabeled);
    approx(m.r2, 0.0);
    approx(m.mse, 0.0);
    approx(m.smape, 0.0);
}

// ─── Classification metrics ──────────────────────────────────────────────────

#[test]
fn classification_metrics_on_perfect_predictions() {
    let predictions = vec![
        prediction("p1", 0.0, Some(0.0)),
        prediction("p2", 1.0, Some(1.0)),
        prediction("p3", 1.0, Some(1.0)),
    ];
    let m = classification_metrics(&predictions);
    approx(m.accuracy, 1.0);
    approx(m.precision, 1.0);
    approx(m.recall, 1.0);
    approx(m.f1score, 1.0);
    approx(m.mcc, 1.0);
}

#[test]
fn classification_metrics_on_balanced_errors() {
    // Confusion matrix [[1, 1], [1, 1]]: coin-flip quality.
    let predictions = vec![
        prediction("p1", 0.0, Some(0.0)),
        prediction("p2", 1.0, Some(0.0)),
        prediction("p3", 0.0, Some(1.0)),
        prediction("p4", 1.0, Some(1.0)),
    ];
    let m = classification_metrics(&predictions);
    approx(m.accuracy, 0.5);
    approx(m.precision, 0.5);
    approx(m.recall, 0.5);
    approx(m.f1score, 0.5);
    approx(m.mcc, 0.0);
}

#[test]
fn confusion_matrix_sorts_classes() {
    let predictions = vec![
        prediction("p1", 2.0, Some(1.0)),
        prediction("p2", 1.0, Some(1.0)),
        prediction("p3", 0.0, Some(2.0)),
    ];
    let confusion = confusion_matrix(&predictions);
    assert_eq!(confusion.classes, vec![0.0, 1.0, 2.0]);
    // Rows are actual classes, columns predicted.
    assert_eq!(confusion.matrix[1], vec![0, 1, 1]);
    assert_eq!(confusion.matrix[2], vec![1, 0, 0]);
}

// ─── Chart titles ────────────────────────────────────────────────────────────

#[test]
fn chart_titles_follow_chart_type() {
    let histogram_chart = monitoring_chart("mc-1", MonitoringChartType::Histogram);
    assert_eq!(chart_title(&histogram_chart), "Histogram of age");

    let scatter = monitoring_chart("mc-2", MonitoringChartType::Scatter);
    assert_eq!(chart_title(&scatter), "Scatter plot of age and income");

    let metrics = monitoring_chart("mc-3", MonitoringChartType::RegressionMetrics);
    assert_eq!(chart_title(&metrics), "Regression metrics");
}
