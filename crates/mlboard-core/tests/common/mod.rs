//! Shared builders for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use mlboard_core::models::*;

/// Deterministic timestamp, offset in seconds from a fixed base.
pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub fn scalar_map(pairs: &[(&str, Value)]) -> ScalarMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

pub fn iteration(id: &str, name: &str) -> Iteration {
    Iteration {
        id: id.into(),
        iteration_name: name.into(),
        parameters: ScalarMap::new(),
        metrics: ScalarMap::new(),
        path_to_model: String::new(),
        user_name: "tester".into(),
        dataset: None,
        created_at: ts(0),
        updated_at: ts(0),
        project_id: "proj-1".into(),
        project_title: "Project One".into(),
        experiment_id: "exp-1".into(),
        experiment_name: "baseline".into(),
        interactive_charts: Vec::new(),
        image_charts: Vec::new(),
        assigned_monitored_model_id: None,
        assigned_monitored_model_name: None,
    }
}

/// Experiment with `columns_metadata` derived from the given iterations, the
/// way the backend maintains it.
pub fn experiment(id: &str, name: &str, iterations: Vec<Iteration>) -> Experiment {
    let mut columns: HashMap<String, ColumnMeta> = HashMap::new();
    for it in &iterations {
        for key in it.parameters.keys() {
            columns
                .entry(key.clone())
                .and_modify(|meta| meta.count += 1)
                .or_insert(ColumnMeta {
                    kind: ColumnKind::Parameter,
                    count: 1,
                });
        }
        for key in it.metrics.keys() {
            columns
                .entry(key.clone())
                .and_modify(|meta| meta.count += 1)
                .or_insert(ColumnMeta {
                    kind: ColumnKind::Metric,
                    count: 1,
                });
        }
    }
    Experiment {
        id: id.into(),
        name: name.into(),
        description: String::new(),
        created_at: ts(0),
        updated_at: ts(0),
        iterations,
        columns_metadata: columns,
        checked: false,
    }
}

pub fn project(id: &str, title: &str, experiments: Vec<Experiment>) -> Project {
    Project {
        id: id.into(),
        title: title.into(),
        description: String::new(),
        status: ProjectStatus::InProgress,
        archived: false,
        pinned: false,
        created_at: ts(0),
        updated_at: ts(0),
        experiments,
    }
}

pub fn chart(
    id: &str,
    name: &str,
    chart_type: ChartType,
    x_data: Vec<Vec<Value>>,
    y_data: Vec<Vec<Value>>,
) -> Chart {
    Chart {
        id: id.into(),
        chart_type,
        name: name.into(),
        chart_title: String::new(),
        chart_subtitle: String::new(),
        x_data,
        y_data,
        y_data_names: None,
        x_label: String::new(),
        y_label: String::new(),
        x_min: None,
        x_max: None,
        y_min: None,
        y_max: None,
        comparable: true,
        created_at: ts(0),
        updated_at: ts(0),
    }
}

pub fn image_chart(id: &str, name: &str, encoded_image: &str, comparable: bool) -> ImageChart {
    ImageChart {
        id: id.into(),
        name: name.into(),
        encoded_image: encoded_image.into(),
        comparable,
    }
}

pub fn dataset(id: &str, name: &str) -> Dataset {
    Dataset {
        id: id.into(),
        dataset_name: name.into(),
        path_to_dataset: String::new(),
        dataset_description: String::new(),
        tags: String::new(),
        version: "1.0".into(),
        archived: false,
        pinned: false,
        linked_iterations: ScalarMap::new(),
        created_at: ts(0),
        updated_at: ts(0),
    }
}

pub fn monitoring_chart(id: &str, chart_type: MonitoringChartType) -> MonitoringChart {
    MonitoringChart {
        id: id.into(),
        monitored_model_id: "model-1".into(),
        chart_type,
        x_axis_column: Some("age".into()),
        y_axis_columns: Some(vec!["income".into()]),
        bin_method: None,
        bin_number: None,
        metrics: None,
    }
}

pub fn prediction(id: &str, predicted: f64, actual: Option<f64>) -> Prediction {
    Prediction {
        id: id.into(),
        prediction_date: ts(0),
        predicted_by: "tester".into(),
        input_data: None,
        prediction: predicted,
        actual,
    }
}

pub fn model(id: &str, name: &str) -> Model {
    Model {
        id: id.into(),
        model_name: name.into(),
        model_description: String::new(),
        model_status: ModelStatus::Active,
        pinned: false,
        iteration: None,
        ml_model: None,
        predictions_data: Vec::new(),
        interactive_charts: Vec::new(),
        created_at: ts(0),
        updated_at: ts(0),
    }
}
